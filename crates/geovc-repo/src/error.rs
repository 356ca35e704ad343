use std::path::PathBuf;

use geovc_store::StorageType;
use geovc_types::TypeError;

#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("not a geovc repository: {0}")]
    NotInitialized(PathBuf),

    #[error("repository already exists at {0}")]
    AlreadyInitialized(PathBuf),

    #[error("{0} storage is not configured")]
    NotConfigured(StorageType),

    #[error("repository was opened read-only")]
    ReadOnly,

    #[error("invalid feature {id}: {source}")]
    InvalidFeature {
        id: String,
        #[source]
        source: TypeError,
    },

    #[error("store error: {0}")]
    Store(#[from] geovc_store::StoreError),

    #[error("working tree error: {0}")]
    Worktree(#[from] geovc_worktree::WorktreeError),

    #[error("ingest error: {0}")]
    Ingest(#[from] geovc_ingest::IngestError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;
