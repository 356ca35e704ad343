//! The versioned object store.
//!
//! [`VersionedObjectStore`] binds a [`StorageFormat`] to a
//! [`BlobEnvironment`] and walks a fixed lifecycle:
//!
//! ```text
//! Unopened --open()--> Open(read-write) | Open(read-only) --close()--> Closed
//! ```
//!
//! `configure` and `verify` are only valid while open, and `configure` only
//! while open read-write.

use std::sync::RwLock;

use geovc_types::ObjectId;
use tracing::{debug, info, trace};

use crate::config::{ConfigDatabase, ConfigStatus, StorageType};
use crate::error::{StoreError, StoreResult};
use crate::format::StorageFormat;
use crate::object::RevObject;
use crate::traits::{BlobBackend, BlobEnvironment, ObjectStore};

/// Options fixed for the lifetime of a store instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreOptions {
    pub format: StorageFormat,
    pub read_only: bool,
}

impl StoreOptions {
    pub fn read_only(format: StorageFormat) -> Self {
        Self {
            format,
            read_only: true,
        }
    }

    pub fn read_write(format: StorageFormat) -> Self {
        Self {
            format,
            read_only: false,
        }
    }
}

/// Observable lifecycle state of a store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreState {
    Unopened,
    OpenReadWrite,
    OpenReadOnly,
    Closed,
}

enum Lifecycle {
    Unopened,
    Open(Box<dyn BlobBackend>),
    Closed,
}

/// A content-addressed object store pinned to one storage format.
pub struct VersionedObjectStore<E: BlobEnvironment> {
    env: E,
    options: StoreOptions,
    lifecycle: RwLock<Lifecycle>,
}

impl<E: BlobEnvironment> VersionedObjectStore<E> {
    /// Create an unopened store over `env`.
    pub fn new(env: E, options: StoreOptions) -> Self {
        Self {
            env,
            options,
            lifecycle: RwLock::new(Lifecycle::Unopened),
        }
    }

    /// Create and open a store in one step.
    pub fn open_with(env: E, options: StoreOptions) -> StoreResult<Self> {
        let store = Self::new(env, options);
        store.open()?;
        Ok(store)
    }

    pub fn format(&self) -> StorageFormat {
        self.options.format
    }

    pub fn backend_name(&self) -> &'static str {
        self.env.name()
    }

    pub fn environment(&self) -> &E {
        &self.env
    }

    /// Open the underlying environment. Valid once per instance.
    pub fn open(&self) -> StoreResult<()> {
        let mut lifecycle = self.lifecycle.write().map_err(|_| poisoned())?;
        if !matches!(*lifecycle, Lifecycle::Unopened) {
            return Err(StoreError::AlreadyOpen);
        }
        let backend = self.env.open(self.options.read_only)?;
        *lifecycle = Lifecycle::Open(backend);
        info!(
            backend = self.env.name(),
            format = %self.options.format,
            read_only = self.options.read_only,
            "object store opened"
        );
        Ok(())
    }

    /// Release the environment. Idempotent; later operations fail with
    /// `ResourceClosed`.
    pub fn close(&self) -> StoreResult<()> {
        let mut lifecycle = self.lifecycle.write().map_err(|_| poisoned())?;
        if matches!(*lifecycle, Lifecycle::Open(_)) {
            info!(backend = self.env.name(), "object store closed");
        }
        *lifecycle = Lifecycle::Closed;
        Ok(())
    }

    pub fn state(&self) -> StoreState {
        match self.lifecycle.read().as_deref() {
            Ok(Lifecycle::Unopened) => StoreState::Unopened,
            Ok(Lifecycle::Open(_)) if self.options.read_only => StoreState::OpenReadOnly,
            Ok(Lifecycle::Open(_)) => StoreState::OpenReadWrite,
            Ok(Lifecycle::Closed) | Err(_) => StoreState::Closed,
        }
    }

    /// Persist this store's backend and format into `config`.
    pub fn configure(&self, config: &dyn ConfigDatabase) -> StoreResult<()> {
        self.with_backend(|_| {
            if self.options.read_only {
                return Err(StoreError::PermissionDenied("configure"));
            }
            StorageType::Objects.configure(config, self.env.name(), self.options.format.version())
        })
    }

    /// Check `config` against this store's backend and format.
    pub fn verify(&self, config: &dyn ConfigDatabase) -> StoreResult<ConfigStatus> {
        self.with_backend(|_| {
            StorageType::Objects.verify(config, self.env.name(), self.options.format.version())
        })
    }

    fn with_backend<T>(&self, f: impl FnOnce(&dyn BlobBackend) -> StoreResult<T>) -> StoreResult<T> {
        let lifecycle = self.lifecycle.read().map_err(|_| poisoned())?;
        match &*lifecycle {
            Lifecycle::Open(backend) => f(backend.as_ref()),
            Lifecycle::Unopened => Err(StoreError::NotOpen),
            Lifecycle::Closed => Err(StoreError::ResourceClosed),
        }
    }
}

impl<E: BlobEnvironment> ObjectStore for VersionedObjectStore<E> {
    fn put(&self, object: &RevObject) -> StoreResult<ObjectId> {
        self.with_backend(|backend| {
            if self.options.read_only {
                return Err(StoreError::PermissionDenied("put"));
            }
            let (id, bytes) = self.options.format.encode_with_id(object)?;
            if backend.write(&id, &bytes)? {
                trace!(id = %id.short_hex(), kind = %object.kind(), len = bytes.len(), "object stored");
            }
            Ok(id)
        })
    }

    fn get_if_present(&self, id: &ObjectId) -> StoreResult<Option<RevObject>> {
        self.with_backend(|backend| {
            let Some(bytes) = backend.read(id)? else {
                return Ok(None);
            };
            let hasher = self.options.format.hasher();
            if !hasher.verify(&bytes, id) {
                let computed = hasher.hash(&bytes);
                debug!(id = %id, %computed, "stored bytes fail hash verification");
                return Err(StoreError::HashMismatch { id: *id, computed });
            }
            self.options.format.decode(*id, &bytes).map(Some)
        })
    }

    fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
        self.with_backend(|backend| backend.contains(id))
    }

    fn is_read_only(&self) -> bool {
        self.options.read_only
    }
}

impl<E: BlobEnvironment + std::fmt::Debug> std::fmt::Debug for VersionedObjectStore<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionedObjectStore")
            .field("env", &self.env)
            .field("format", &self.options.format)
            .field("state", &self.state())
            .finish()
    }
}

fn poisoned() -> StoreError {
    StoreError::Io(std::io::Error::other("object store lock poisoned"))
}
