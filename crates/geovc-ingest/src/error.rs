use geovc_store::StoreError;
use geovc_worktree::WorktreeError;

/// Errors from buffering and flushing features.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// The working tree failed to apply a flushed batch.
    ///
    /// The features for `path` stay buffered and the flush can be retried.
    #[error("working tree rejected batch for {path}: {source}")]
    Sink {
        path: String,
        #[source]
        source: WorktreeError,
    },

    /// Storing a schema failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The flush that `put` triggers past the threshold failed.
    ///
    /// The feature passed to `put` was accepted and is still buffered, as
    /// is every path the flush did not reach. Recover with `flush_all`;
    /// putting the feature again would buffer it twice.
    #[error("automatic flush with {pending} features pending failed: {source}")]
    AutoFlush {
        pending: usize,
        #[source]
        source: Box<IngestError>,
    },
}

/// Convenience alias for ingest results.
pub type IngestResult<T> = Result<T, IngestError>;
