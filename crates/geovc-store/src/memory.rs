use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use geovc_types::ObjectId;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobBackend, BlobEnvironment};

type BlobMap = Arc<RwLock<HashMap<ObjectId, Vec<u8>>>>;

/// In-memory, `HashMap`-based blob environment.
///
/// Intended for tests and embedding. Cloning the environment shares the
/// underlying map, so a store closed and reopened over the same
/// environment sees the same objects.
#[derive(Clone, Default)]
pub struct MemoryEnvironment {
    blobs: BlobMap,
}

impl MemoryEnvironment {
    /// Create a new empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.blobs.read().map(|m| m.len()).unwrap_or(0)
    }

    /// Returns `true` if no blobs are stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored blobs.
    pub fn total_bytes(&self) -> u64 {
        self.blobs
            .read()
            .map(|m| m.values().map(|b| b.len() as u64).sum())
            .unwrap_or(0)
    }
}

impl BlobEnvironment for MemoryEnvironment {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn open(&self, _read_only: bool) -> StoreResult<Box<dyn BlobBackend>> {
        Ok(Box::new(MemoryBackend {
            blobs: Arc::clone(&self.blobs),
        }))
    }
}

impl std::fmt::Debug for MemoryEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEnvironment")
            .field("blob_count", &self.len())
            .finish()
    }
}

struct MemoryBackend {
    blobs: BlobMap,
}

impl BlobBackend for MemoryBackend {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        let map = self.blobs.read().map_err(|_| poisoned())?;
        Ok(map.get(id).cloned())
    }

    fn write(&self, id: &ObjectId, bytes: &[u8]) -> StoreResult<bool> {
        let mut map = self.blobs.write().map_err(|_| poisoned())?;
        if map.contains_key(id) {
            return Ok(false);
        }
        map.insert(*id, bytes.to_vec());
        Ok(true)
    }

    fn contains(&self, id: &ObjectId) -> StoreResult<bool> {
        let map = self.blobs.read().map_err(|_| poisoned())?;
        Ok(map.contains_key(id))
    }
}

fn poisoned() -> StoreError {
    StoreError::Io(std::io::Error::other("memory environment lock poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_is_idempotent() {
        let env = MemoryEnvironment::new();
        let backend = env.open(false).unwrap();
        let id = ObjectId::from_bytes(b"a");
        assert!(backend.write(&id, b"a").unwrap());
        assert!(!backend.write(&id, b"a").unwrap());
        assert_eq!(env.len(), 1);
        assert_eq!(env.total_bytes(), 1);
    }

    #[test]
    fn handles_share_storage() {
        let env = MemoryEnvironment::new();
        let id = ObjectId::from_bytes(b"shared");
        env.open(false).unwrap().write(&id, b"shared").unwrap();

        let reader = env.open(true).unwrap();
        assert!(reader.contains(&id).unwrap());
        assert_eq!(reader.read(&id).unwrap().as_deref(), Some(&b"shared"[..]));
        assert!(reader.read(&ObjectId::null()).unwrap().is_none());
    }

    #[test]
    fn debug_format() {
        let debug = format!("{:?}", MemoryEnvironment::new());
        assert!(debug.contains("blob_count"));
    }
}
