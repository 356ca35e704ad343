//! Feature ingestion for GeoVC.
//!
//! Producers push features into a [`MutationBuffer`] keyed by tree path.
//! The buffer holds them in memory until a path is flushed explicitly or
//! the pending count crosses the configured threshold, then resolves each
//! feature's schema through a per-flush [`SchemaCache`] and hands the
//! resulting mutations to a [`WorkingTree`](geovc_worktree::WorkingTree)
//! in one batch per path.
//!
//! # Key Types
//!
//! - [`MutationBuffer`] -- Path-keyed feature buffer with automatic flushing
//! - [`SchemaCache`] -- Stores each distinct schema once per flush cycle
//! - [`BufferConfig`] -- Flush threshold
//! - [`IngestError`] -- Errors from buffering and flushing

pub mod buffer;
pub mod config;
pub mod error;
pub mod schema_cache;

pub use buffer::MutationBuffer;
pub use config::BufferConfig;
pub use error::{IngestError, IngestResult};
pub use schema_cache::SchemaCache;
