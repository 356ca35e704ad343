//! Filesystem blob environment.
//!
//! Layout under the environment root:
//!
//! ```text
//! <root>/env.lock           advisory writer lock, held while open read-write
//! <root>/<2 hex>/<62 hex>   one file per object
//! ```
//!
//! Objects are written to a temporary file in the root and renamed into
//! place, so readers never observe a partially written object.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use geovc_types::ObjectId;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::{BlobBackend, BlobEnvironment};

const LOCK_FILE: &str = "env.lock";

/// A loose-object directory on disk.
#[derive(Clone, Debug)]
pub struct FsEnvironment {
    root: PathBuf,
}

impl FsEnvironment {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl BlobEnvironment for FsEnvironment {
    fn name(&self) -> &'static str {
        "fs"
    }

    fn open(&self, read_only: bool) -> StoreResult<Box<dyn BlobBackend>> {
        if read_only {
            if !self.root.is_dir() {
                return Err(StoreError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("object directory {} does not exist", self.root.display()),
                )));
            }
            return Ok(Box::new(FsBackend {
                root: self.root.clone(),
                _lock: None,
            }));
        }

        fs::create_dir_all(&self.root)?;
        let lock = EnvLock::acquire(&self.root.join(LOCK_FILE))?;
        Ok(Box::new(FsBackend {
            root: self.root.clone(),
            _lock: Some(lock),
        }))
    }
}

/// Exclusive writer lock.
///
/// The lock is an OS advisory lock on `env.lock`, so it is released when the
/// file handle closes, including when the owning process dies. The file
/// itself is left in place.
#[derive(Debug)]
struct EnvLock {
    path: PathBuf,
    _file: File,
}

impl EnvLock {
    fn acquire(path: &Path) -> StoreResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;
        if let Err(e) = FileExt::try_lock_exclusive(&file) {
            if e.raw_os_error() == fs2::lock_contended_error().raw_os_error() {
                return Err(StoreError::Locked(path.to_path_buf()));
            }
            return Err(e.into());
        }
        debug!(lock = %path.display(), "object environment locked");
        Ok(Self {
            path: path.to_path_buf(),
            _file: file,
        })
    }
}

impl Drop for EnvLock {
    fn drop(&mut self) {
        debug!(lock = %self.path.display(), "object environment unlocked");
    }
}

struct FsBackend {
    root: PathBuf,
    _lock: Option<EnvLock>,
}

impl FsBackend {
    fn object_path(&self, id: &ObjectId) -> PathBuf {
        let (dir, file) = id.fanout();
        self.root.join(dir).join(file)
    }
}

impl BlobBackend for FsBackend {
    fn read(&self, id: &ObjectId) -> StoreResult<Option<Vec<u8>>> {
        match fs::read(self.object_path(id)) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, id: &ObjectId, bytes: &[u8]) -> StoreResult<bool> {
        let path = self.object_path(id);
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut tmp = tempfile::NamedTempFile::new_in(&self.root)?;
        tmp.write_all(bytes)?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;
        Ok(true)
    }

    fn contains(&self, id: &ObjectId) -> StoreResult<bool> {
        Ok(self.object_path(id).is_file())
    }
}
