use std::path::PathBuf;

use geovc_types::ObjectId;

use crate::config::StorageType;

/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested object was not found.
    #[error("object not found: {0}")]
    NotFound(ObjectId),

    /// The persisted storage configuration differs from the requested one.
    #[error("{storage} database is configured as {found}, refusing to use it as {requested}")]
    ConfigurationMismatch {
        storage: StorageType,
        requested: String,
        found: String,
    },

    /// A write was attempted on a read-only store.
    #[error("permission denied: store is read-only, cannot {0}")]
    PermissionDenied(&'static str),

    /// The store was used after being closed.
    #[error("object store has been closed")]
    ResourceClosed,

    /// The store was used before being opened.
    #[error("object store is not open")]
    NotOpen,

    /// `open` was called on a store that is already open or closed.
    #[error("object store was already opened")]
    AlreadyOpen,

    /// Another writer holds the environment lock.
    #[error("object environment is locked by another writer: {0}")]
    Locked(PathBuf),

    /// Content hash mismatch on read (data corruption).
    #[error("hash mismatch for {id}: stored bytes hash to {computed}")]
    HashMismatch { id: ObjectId, computed: ObjectId },

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Block compression or decompression failure.
    #[error("compression error: {0}")]
    Compression(String),

    /// The object data is malformed or cannot be decoded.
    #[error("corrupt object {id}: {reason}")]
    CorruptObject { id: ObjectId, reason: String },

    /// The requested storage format version is not known.
    #[error("unknown storage format version: {0}")]
    UnknownFormat(String),

    /// A configuration key is not of the form `section.name`.
    #[error("invalid configuration key: {0}")]
    InvalidConfigKey(String),

    /// The configuration file could not be parsed or written.
    #[error("configuration file error: {0}")]
    ConfigFile(String),

    /// I/O error from the underlying storage environment.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
