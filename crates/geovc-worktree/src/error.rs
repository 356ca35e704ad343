//! Error types for the working tree crate.

use std::path::PathBuf;

/// Errors that can occur while applying mutations or persisting the tree.
#[derive(Debug, thiserror::Error)]
pub enum WorktreeError {
    /// A mutation carried an unusable node path.
    #[error("invalid node path: {0:?}")]
    InvalidPath(String),

    /// Storing a feature object failed.
    #[error("store error: {0}")]
    Store(#[from] geovc_store::StoreError),

    /// The batch was rejected by the tree.
    #[error("batch rejected after {applied} mutations: {reason}")]
    Rejected { applied: usize, reason: String },

    /// Encoding or decoding the saved tree failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The saved tree has an unsupported layout version.
    #[error("unsupported working tree version {found} in {path}")]
    UnsupportedVersion { path: PathBuf, found: u32 },

    /// I/O error reading or writing the saved tree.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias for working tree results.
pub type WorktreeResult<T> = Result<T, WorktreeError>;
