use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use geovc_ingest::{BufferConfig, MutationBuffer};
use geovc_store::{
    ConfigDatabase, ConfigStatus, FileConfigDatabase, FsEnvironment, ObjectStore, RevObject,
    StorageFormat, StorageType, StoreOptions, VersionedObjectStore,
};
use geovc_types::{Feature, ObjectId};
use geovc_worktree::{InMemoryWorkingTree, LoggingProgress};
use tracing::{debug, info, warn};

use crate::error::{RepoError, RepoResult};

/// Name of the repository directory inside a working directory.
pub const REPO_DIR: &str = ".geovc";

/// Configuration file inside the repository directory.
pub const CONFIG_FILE: &str = "config.toml";
const OBJECTS_DIR: &str = "objects";
const WORKTREE_FILE: &str = "worktree.bin";

const WORKTREE_BACKEND: &str = "bincode";
const WORKTREE_VERSION: &str = "1";

/// How to open an existing repository.
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenOptions {
    pub read_only: bool,
    /// Storage format to require; the recorded one when `None`.
    pub format: Option<StorageFormat>,
}

impl OpenOptions {
    pub fn read_only() -> Self {
        Self {
            read_only: true,
            format: None,
        }
    }
}

/// Outcome of [`Repository::import`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ImportSummary {
    /// Features read from the input.
    pub features: usize,
    /// Features flushed into the working tree.
    pub flushed: u64,
}

/// An open repository session.
pub struct Repository {
    root: PathBuf,
    config: FileConfigDatabase,
    store: Arc<VersionedObjectStore<FsEnvironment>>,
    tree: InMemoryWorkingTree,
    buffer_config: BufferConfig,
    read_only: bool,
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository")
            .field("root", &self.root)
            .field("format", &self.store.format())
            .field("read_only", &self.read_only)
            .field("nodes", &self.tree.len())
            .finish()
    }
}

impl Repository {
    /// Create a repository under `dir` using `format` for objects.
    pub fn init(dir: &Path, format: StorageFormat) -> RepoResult<Self> {
        let root = dir.join(REPO_DIR);
        if root.exists() {
            return Err(RepoError::AlreadyInitialized(root));
        }
        // Dropped last, after the store has released its lock.
        let created = CreatedDir::create(&root)?;

        let config = FileConfigDatabase::open(root.join(CONFIG_FILE))?;
        let store = Arc::new(VersionedObjectStore::open_with(
            FsEnvironment::new(root.join(OBJECTS_DIR)),
            StoreOptions::read_write(format),
        )?);
        store.configure(&config)?;
        StorageType::WorkingTree.configure(&config, WORKTREE_BACKEND, WORKTREE_VERSION)?;

        let store_dyn: Arc<dyn ObjectStore> = store.clone();
        let tree = InMemoryWorkingTree::new(store_dyn);
        tree.save(&root.join(WORKTREE_FILE))?;
        created.keep();

        info!(root = %root.display(), %format, "repository initialized");
        Ok(Self {
            root,
            config,
            store,
            tree,
            buffer_config: BufferConfig::default(),
            read_only: false,
        })
    }

    /// Open the repository under `dir`, verifying its storage configuration.
    pub fn open(dir: &Path, options: OpenOptions) -> RepoResult<Self> {
        let root = dir.join(REPO_DIR);
        if !root.is_dir() {
            return Err(RepoError::NotInitialized(dir.to_path_buf()));
        }

        let config = FileConfigDatabase::open(root.join(CONFIG_FILE))?;
        let format = match options.format {
            Some(format) => format,
            None => recorded_format(&config)?,
        };

        let store = Arc::new(VersionedObjectStore::open_with(
            FsEnvironment::new(root.join(OBJECTS_DIR)),
            StoreOptions {
                format,
                read_only: options.read_only,
            },
        )?);
        verify_storage(&config, &store)?;

        let buffer_config = config.section::<BufferConfig>("ingest")?.unwrap_or_default();
        let store_dyn: Arc<dyn ObjectStore> = store.clone();
        let tree = InMemoryWorkingTree::load(&root.join(WORKTREE_FILE), store_dyn)?;

        info!(
            root = %root.display(),
            %format,
            read_only = options.read_only,
            nodes = tree.len(),
            "repository opened"
        );
        Ok(Self {
            root,
            config,
            store,
            tree,
            buffer_config,
            read_only: options.read_only,
        })
    }

    /// The `.geovc` directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn format(&self) -> StorageFormat {
        self.store.format()
    }

    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    pub fn config(&self) -> &FileConfigDatabase {
        &self.config
    }

    pub fn store(&self) -> Arc<dyn ObjectStore> {
        self.store.clone()
    }

    pub fn tree(&self) -> &InMemoryWorkingTree {
        &self.tree
    }

    pub fn buffer_config(&self) -> BufferConfig {
        self.buffer_config
    }

    /// Override the buffer settings read from `[ingest]`.
    pub fn set_buffer_config(&mut self, config: BufferConfig) {
        self.buffer_config = config;
    }

    /// Re-check both storage records against this session.
    pub fn verify(&self) -> RepoResult<()> {
        verify_storage(&self.config, &self.store)
    }

    /// Read a stored object.
    pub fn object(&self, id: &ObjectId) -> RepoResult<RevObject> {
        Ok(self.store.get(id)?)
    }

    /// A mutation buffer feeding this repository's working tree.
    ///
    /// The working tree is only written to disk by [`save`](Self::save) or
    /// [`close`](Self::close).
    pub fn buffer(&mut self) -> RepoResult<MutationBuffer<&mut InMemoryWorkingTree>> {
        if self.read_only {
            return Err(RepoError::ReadOnly);
        }
        let store: Arc<dyn ObjectStore> = self.store.clone();
        Ok(MutationBuffer::with_config(
            &mut self.tree,
            store,
            self.buffer_config,
        ))
    }

    /// Buffer every feature under `tree_path`, flush, and save the tree.
    ///
    /// Import stops at the first feature with an unset non-nullable
    /// property. Features buffered since the last automatic flush are
    /// discarded and the tree is not saved.
    pub fn import<I>(&mut self, tree_path: &str, features: I) -> RepoResult<ImportSummary>
    where
        I: IntoIterator<Item = Feature>,
    {
        let mut buffer = self
            .buffer()?
            .with_progress(Arc::new(LoggingProgress::default()));

        let mut count = 0;
        for feature in features {
            feature
                .check_complete()
                .map_err(|source| RepoError::InvalidFeature {
                    id: feature.id().to_string(),
                    source,
                })?;
            buffer.put(tree_path, feature)?;
            count += 1;
        }
        buffer.flush_all()?;
        let summary = ImportSummary {
            features: count,
            flushed: buffer.flushed_total(),
        };
        drop(buffer);

        self.save()?;
        info!(tree = tree_path, features = summary.features, "import complete");
        Ok(summary)
    }

    /// Write the working tree to disk. A no-op on read-only sessions.
    pub fn save(&self) -> RepoResult<()> {
        if self.read_only {
            return Ok(());
        }
        self.tree.save(&self.root.join(WORKTREE_FILE))?;
        Ok(())
    }

    /// Save the working tree and release the object store.
    pub fn close(self) -> RepoResult<()> {
        self.save()?;
        self.store.close()?;
        debug!(root = %self.root.display(), "repository closed");
        Ok(())
    }
}

/// A freshly created repository directory, removed again on drop unless
/// [`keep`](Self::keep) is called.
struct CreatedDir {
    path: PathBuf,
    keep: bool,
}

impl CreatedDir {
    fn create(path: &Path) -> RepoResult<Self> {
        fs::create_dir_all(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            keep: false,
        })
    }

    fn keep(mut self) {
        self.keep = true;
    }
}

impl Drop for CreatedDir {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        match fs::remove_dir_all(&self.path) {
            Ok(()) => debug!(root = %self.path.display(), "removed partially initialized repository"),
            Err(e) => warn!(root = %self.path.display(), error = %e, "failed to remove partially initialized repository"),
        }
    }
}

fn recorded_format(config: &dyn ConfigDatabase) -> RepoResult<StorageFormat> {
    match StorageType::Objects.recorded(config)? {
        Some((_, version)) => Ok(version.parse()?),
        None => Err(RepoError::NotConfigured(StorageType::Objects)),
    }
}

fn verify_storage(
    config: &dyn ConfigDatabase,
    store: &VersionedObjectStore<FsEnvironment>,
) -> RepoResult<()> {
    if store.verify(config)? == ConfigStatus::Unconfigured {
        return Err(RepoError::NotConfigured(StorageType::Objects));
    }
    let tree_status =
        StorageType::WorkingTree.verify(config, WORKTREE_BACKEND, WORKTREE_VERSION)?;
    if tree_status == ConfigStatus::Unconfigured {
        return Err(RepoError::NotConfigured(StorageType::WorkingTree));
    }
    Ok(())
}
