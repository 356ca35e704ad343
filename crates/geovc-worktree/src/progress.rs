//! Progress reporting for mutation batches.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::{debug, info};

/// Receives progress callbacks while a batch is applied.
///
/// `progress` is called once per processed mutation with the running count.
pub trait ProgressListener: Send + Sync {
    fn started(&self) {}

    fn progress(&self, _count: usize) {}

    fn completed(&self) {}
}

/// Ignores every callback.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullProgress;

impl ProgressListener for NullProgress {}

/// Records how many batches ran and how many mutations they processed.
#[derive(Debug, Default)]
pub struct CountingProgress {
    batches: AtomicUsize,
    completed: AtomicUsize,
    processed: AtomicUsize,
    in_batch: AtomicBool,
}

impl CountingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches started.
    pub fn batches(&self) -> usize {
        self.batches.load(Ordering::Relaxed)
    }

    /// Batches that reached `completed`.
    pub fn completed_batches(&self) -> usize {
        self.completed.load(Ordering::Relaxed)
    }

    /// Mutations processed across all batches.
    pub fn processed(&self) -> usize {
        self.processed.load(Ordering::Relaxed)
    }

    /// Whether a batch has started and not completed.
    pub fn in_batch(&self) -> bool {
        self.in_batch.load(Ordering::Relaxed)
    }
}

impl ProgressListener for CountingProgress {
    fn started(&self) {
        self.batches.fetch_add(1, Ordering::Relaxed);
        self.in_batch.store(true, Ordering::Relaxed);
    }

    fn progress(&self, _count: usize) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    fn completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
        self.in_batch.store(false, Ordering::Relaxed);
    }
}

/// Reports batch progress through `tracing`.
#[derive(Debug)]
pub struct LoggingProgress {
    every: usize,
    last: AtomicUsize,
}

impl LoggingProgress {
    /// Log a debug line every `every` mutations (at least 1).
    pub fn new(every: usize) -> Self {
        Self {
            every: every.max(1),
            last: AtomicUsize::new(0),
        }
    }
}

impl Default for LoggingProgress {
    fn default() -> Self {
        Self::new(10_000)
    }
}

impl ProgressListener for LoggingProgress {
    fn started(&self) {
        self.last.store(0, Ordering::Relaxed);
        debug!("applying mutation batch");
    }

    fn progress(&self, count: usize) {
        self.last.store(count, Ordering::Relaxed);
        if count % self.every == 0 {
            debug!(count, "mutations applied");
        }
    }

    fn completed(&self) {
        info!(count = self.last.load(Ordering::Relaxed), "mutation batch applied");
    }
}
