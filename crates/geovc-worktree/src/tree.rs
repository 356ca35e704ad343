//! The in-memory working tree.
//!
//! [`InMemoryWorkingTree`] keeps a `BTreeMap` of node path to [`NodeRef`].
//! Feature payloads live in the object store; the tree only records which
//! feature object and which schema object sit at each path.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use geovc_store::{ObjectStore, RevFeature, RevObject};
use geovc_types::{node_name, parent_path, ObjectId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{WorktreeError, WorktreeResult};
use crate::mutation::Mutation;
use crate::progress::ProgressListener;
use crate::sink::WorkingTree;

/// Layout version written by [`InMemoryWorkingTree::save`].
const SNAPSHOT_VERSION: u32 = 1;

/// A feature node in the working tree.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    /// Full node path (`<tree path>/<feature id>`).
    pub path: String,
    /// Stored feature payload.
    pub object_id: ObjectId,
    /// Stored schema of the feature.
    pub schema_id: ObjectId,
}

impl NodeRef {
    /// The feature id: the last path component.
    pub fn name(&self) -> &str {
        node_name(&self.path)
    }

    /// The tree path that holds this node.
    pub fn parent(&self) -> &str {
        parent_path(&self.path)
    }
}

enum Staged {
    Put(NodeRef),
    Remove(String),
}

/// A working tree held in memory, writing feature payloads to a store.
pub struct InMemoryWorkingTree {
    nodes: BTreeMap<String, NodeRef>,
    store: Arc<dyn ObjectStore>,
}

impl std::fmt::Debug for InMemoryWorkingTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryWorkingTree")
            .field("nodes", &self.nodes.len())
            .field("read_only", &self.store.is_read_only())
            .finish()
    }
}

impl InMemoryWorkingTree {
    /// Create an empty tree backed by `store`.
    pub fn new(store: Arc<dyn ObjectStore>) -> Self {
        Self {
            nodes: BTreeMap::new(),
            store,
        }
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&NodeRef> {
        self.nodes.get(path)
    }

    /// All node paths, in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    /// Nodes whose parent is exactly `tree_path`.
    pub fn children<'a>(&'a self, tree_path: &'a str) -> impl Iterator<Item = &'a NodeRef> + 'a {
        let tree_path = tree_path.trim_end_matches('/');
        self.nodes
            .values()
            .filter(move |node| node.parent() == tree_path)
    }

    /// Read the stored payload of the node at `path`.
    pub fn feature(&self, path: &str) -> WorktreeResult<Option<RevFeature>> {
        match self.nodes.get(path) {
            Some(node) => Ok(Some(self.store.get_feature(&node.object_id)?)),
            None => Ok(None),
        }
    }

    // ---------------------------------------------------------------
    // Persistence
    // ---------------------------------------------------------------

    /// Write the node table to `path`, replacing it atomically.
    pub fn save(&self, path: &Path) -> WorktreeResult<()> {
        let bytes = bincode::serialize(&(SNAPSHOT_VERSION, &self.nodes))
            .map_err(|e| WorktreeError::Serialization(e.to_string()))?;

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.persist(path).map_err(|e| WorktreeError::Io(e.error))?;

        debug!(path = %path.display(), nodes = self.nodes.len(), "working tree saved");
        Ok(())
    }

    /// Read a node table written by [`save`](Self::save).
    pub fn load(path: &Path, store: Arc<dyn ObjectStore>) -> WorktreeResult<Self> {
        let bytes = fs::read(path)?;
        let (version, nodes): (u32, BTreeMap<String, NodeRef>) = bincode::deserialize(&bytes)
            .map_err(|e| WorktreeError::Serialization(e.to_string()))?;
        if version != SNAPSHOT_VERSION {
            return Err(WorktreeError::UnsupportedVersion {
                path: path.to_path_buf(),
                found: version,
            });
        }

        debug!(path = %path.display(), nodes = nodes.len(), "working tree loaded");
        Ok(Self { nodes, store })
    }

    fn stage(&self, mutation: Mutation) -> WorktreeResult<Staged> {
        validate_path(mutation.path())?;
        match mutation {
            Mutation::Insert {
                path,
                feature,
                schema_id,
            } => {
                let object_id = self.store.put(&RevObject::Feature(feature))?;
                Ok(Staged::Put(NodeRef {
                    path,
                    object_id,
                    schema_id,
                }))
            }
            Mutation::Delete { path } => Ok(Staged::Remove(path)),
        }
    }
}

impl WorkingTree for InMemoryWorkingTree {
    fn insert(
        &mut self,
        mutations: &mut dyn Iterator<Item = Mutation>,
        progress: &dyn ProgressListener,
    ) -> WorktreeResult<usize> {
        let start = Instant::now();
        progress.started();

        // Nothing touches `nodes` until the whole sequence has been staged.
        let mut staged = Vec::new();
        for mutation in mutations {
            staged.push(self.stage(mutation)?);
            progress.progress(staged.len());
        }

        let count = staged.len();
        let mut removed = 0usize;
        for change in staged {
            match change {
                Staged::Put(node) => {
                    self.nodes.insert(node.path.clone(), node);
                }
                Staged::Remove(path) => {
                    if self.nodes.remove(&path).is_some() {
                        removed += 1;
                    }
                }
            }
        }
        progress.completed();

        debug!(
            count,
            removed,
            nodes = self.nodes.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "mutation batch committed"
        );
        Ok(count)
    }
}

fn validate_path(path: &str) -> WorktreeResult<()> {
    if path.is_empty() || path.split('/').any(str::is_empty) {
        return Err(WorktreeError::InvalidPath(path.to_string()));
    }
    Ok(())
}
