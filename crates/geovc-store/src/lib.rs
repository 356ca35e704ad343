//! Versioned, content-addressed object storage for GeoVC.
//!
//! Objects (feature schemas and feature payloads) are encoded by a
//! [`StorageFormat`], hashed over their encoded bytes, and stored in a blob
//! environment keyed by that hash. The format is pinned per repository
//! through a configuration record, so a repository written with one format
//! is never silently read with another.
//!
//! # Object Types
//!
//! - [`RevObject::Schema`] -- a stored feature schema
//! - [`RevObject::Feature`] -- a stored feature payload ([`RevFeature`])
//!
//! # Storage Environments
//!
//! All environments implement [`BlobEnvironment`]:
//!
//! - [`MemoryEnvironment`] -- `HashMap`-based, for tests and embedding
//! - [`FsEnvironment`] -- loose objects on disk with a writer lock file
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written; re-putting identical content is a no-op.
//! 2. A store is opened once, used, and explicitly closed.
//! 3. Read-only stores never write, not even configuration.
//! 4. Concurrent reads are always safe; write serialization is the environment's job.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod config;
pub mod error;
pub mod format;
pub mod fs;
pub mod memory;
pub mod object;
pub mod store;
pub mod traits;

pub use config::{
    ConfigDatabase, ConfigStatus, FileConfigDatabase, InMemoryConfigDatabase, StorageType,
};
pub use error::{StoreError, StoreResult};
pub use format::StorageFormat;
pub use fs::FsEnvironment;
pub use memory::MemoryEnvironment;
pub use object::{ObjectKind, RevFeature, RevObject};
pub use store::{StoreOptions, StoreState, VersionedObjectStore};
pub use traits::{BlobBackend, BlobEnvironment, ObjectStore};
