use geovc_types::{ObjectId, Schema};

use crate::error::{StoreError, StoreResult};
use crate::object::{RevFeature, RevObject};

/// Content-addressed object store.
///
/// All implementations must satisfy these invariants:
/// - Objects are immutable once written. The same object always produces
///   the same ID under a given storage format.
/// - `put` is idempotent: re-putting identical content changes nothing.
/// - Concurrent reads are always safe.
/// - A read-only store rejects every write with `PermissionDenied`.
pub trait ObjectStore: Send + Sync {
    /// Encode and store an object, returning its content hash.
    fn put(&self, object: &RevObject) -> StoreResult<ObjectId>;

    /// Read an object by its content hash.
    ///
    /// Returns `Ok(None)` if the object does not exist.
    fn get_if_present(&self, id: &ObjectId) -> StoreResult<Option<RevObject>>;

    /// Check whether an object exists in the store.
    fn exists(&self, id: &ObjectId) -> StoreResult<bool>;

    /// Whether writes are rejected.
    fn is_read_only(&self) -> bool;

    /// Read an object, failing with `NotFound` if it is absent.
    fn get(&self, id: &ObjectId) -> StoreResult<RevObject> {
        self.get_if_present(id)?
            .ok_or(StoreError::NotFound(*id))
    }

    /// Read a stored schema.
    fn get_schema(&self, id: &ObjectId) -> StoreResult<Schema> {
        self.get(id)?.into_schema(*id)
    }

    /// Read a stored feature payload.
    fn get_feature(&self, id: &ObjectId) -> StoreResult<RevFeature> {
        self.get(id)?.into_feature(*id)
    }

    /// Store several objects, returning their IDs in order.
    ///
    /// Default implementation calls `put()` for each object.
    fn put_all(&self, objects: &[RevObject]) -> StoreResult<Vec<ObjectId>> {
        objects.iter().map(|obj| self.put(obj)).collect()
    }
}

/// An opened blob storage environment: raw bytes keyed by object id.
///
/// Handles are dropped to release the environment; any lock taken at open
/// time is released on drop.
pub trait BlobBackend: Send + Sync {
    /// Read the bytes stored under `id`.
    fn read(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>>;

    /// Store `bytes` under `id` unless already present.
    ///
    /// Returns `true` if the bytes were newly written.
    fn write(&self, id: &ObjectId, bytes: &[u8]) -> StoreResult<bool>;

    /// Check whether `id` is present.
    fn contains(&self, id: &ObjectId) -> StoreResult<bool>;
}

/// A storage location that can be opened into a [`BlobBackend`].
pub trait BlobEnvironment: Send + Sync {
    /// Backend identifier persisted in the repository configuration.
    fn name(&self) -> &'static str;

    /// Open the environment. Read-write opens may take an exclusive lock.
    fn open(&self, read_only: bool) -> StoreResult<Box<dyn BlobBackend>>;
}
