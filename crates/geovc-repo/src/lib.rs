//! Repository sessions for GeoVC.
//!
//! A [`Repository`] ties together the on-disk object store, the TOML
//! configuration record that pins its storage format, and the saved
//! working tree, and drives feature imports through a mutation buffer.
//!
//! ```text
//! <dir>/.geovc/config.toml    storage configuration and [ingest] settings
//! <dir>/.geovc/objects/       loose objects
//! <dir>/.geovc/worktree.bin   saved working tree
//! ```

pub mod error;
pub mod repository;

pub use error::{RepoError, RepoResult};
pub use repository::{ImportSummary, OpenOptions, Repository, CONFIG_FILE, REPO_DIR};

pub use geovc_ingest::BufferConfig;
pub use geovc_store::{ConfigStatus, RevObject, StorageFormat, StorageType};
pub use geovc_types::{Feature, ObjectId};
pub use geovc_worktree::{InMemoryWorkingTree, NodeRef};
