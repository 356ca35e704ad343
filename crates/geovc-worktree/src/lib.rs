//! Working tree for GeoVC.
//!
//! The working tree is the mutable snapshot that flushed feature batches
//! are applied to. Producers hand it a lazy, single-pass sequence of
//! [`Mutation`]s together with a [`ProgressListener`]; the tree applies the
//! whole batch or none of it.
//!
//! # Key Types
//!
//! - [`WorkingTree`] -- The sink contract for applying mutation batches
//! - [`Mutation`] -- An insert (with stored schema reference) or a delete
//! - [`InMemoryWorkingTree`] -- `BTreeMap`-backed tree with bincode persistence
//! - [`NodeRef`] -- A feature node: path, feature object id, schema id
//! - [`ProgressListener`] -- Batch progress callbacks

pub mod error;
pub mod mutation;
pub mod progress;
pub mod sink;
pub mod tree;

pub use error::{WorktreeError, WorktreeResult};
pub use mutation::Mutation;
pub use progress::{CountingProgress, LoggingProgress, NullProgress, ProgressListener};
pub use sink::WorkingTree;
pub use tree::{InMemoryWorkingTree, NodeRef};
