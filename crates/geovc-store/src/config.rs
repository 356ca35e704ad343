//! Persisted storage configuration.
//!
//! Every repository carries a configuration record naming, per storage
//! type, the backend that wrote it and the storage format version. The
//! record uses flat dotted keys:
//!
//! ```text
//! storage.objects = "fs"
//! fs.version      = "0.1"
//! ```
//!
//! [`StorageType::configure`] writes the record once at initialization and
//! [`StorageType::verify`] checks it on every subsequent open.

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};

/// Key/value configuration storage associated with a repository.
pub trait ConfigDatabase: Send + Sync {
    /// Read a value. Returns `Ok(None)` if the key is unset.
    fn get(&self, key: &str) -> StoreResult<Option<String>>;

    /// Set a value, persisting it before returning.
    fn put(&self, key: &str, value: &str) -> StoreResult<()>;

    /// All key/value pairs, sorted by key.
    fn entries(&self) -> StoreResult<Vec<(String, String)>>;
}

/// The storage subsystems that pin a backend and format.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StorageType {
    Objects,
    WorkingTree,
}

/// Outcome of a successful [`StorageType::verify`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigStatus {
    /// The record matches the requested backend and version.
    Configured,
    /// No record exists for this storage type yet.
    Unconfigured,
}

impl StorageType {
    /// The name used in the `storage.<name>` key.
    pub fn key(&self) -> &'static str {
        match self {
            Self::Objects => "objects",
            Self::WorkingTree => "worktree",
        }
    }

    fn name_key(&self) -> String {
        format!("storage.{}", self.key())
    }

    fn version_key(backend: &str) -> String {
        format!("{backend}.version")
    }

    fn read(
        &self,
        config: &dyn ConfigDatabase,
        backend: &str,
    ) -> StoreResult<(Option<String>, Option<String>)> {
        Ok((
            config.get(&self.name_key())?,
            config.get(&Self::version_key(backend))?,
        ))
    }

    /// The backend and version on record, if both are set.
    pub fn recorded(&self, config: &dyn ConfigDatabase) -> StoreResult<Option<(String, String)>> {
        let Some(backend) = config.get(&self.name_key())? else {
            return Ok(None);
        };
        let version = config.get(&Self::version_key(&backend))?;
        Ok(version.map(|version| (backend, version)))
    }

    fn mismatch(
        &self,
        backend: &str,
        version: &str,
        found: (Option<String>, Option<String>),
    ) -> StoreError {
        let (name, ver) = found;
        StoreError::ConfigurationMismatch {
            storage: *self,
            requested: format!("{backend}:{version}"),
            found: format!(
                "{}:{}",
                name.as_deref().unwrap_or("<unset>"),
                ver.as_deref().unwrap_or("<unset>")
            ),
        }
    }

    /// Persist `backend` and `version` for this storage type.
    ///
    /// Idempotent when the record already matches. Fails with
    /// `ConfigurationMismatch` if a different backend or version is
    /// already recorded.
    pub fn configure(
        &self,
        config: &dyn ConfigDatabase,
        backend: &str,
        version: &str,
    ) -> StoreResult<()> {
        let found = self.read(config, backend)?;
        let name_ok = found.0.as_deref().map_or(true, |n| n == backend);
        let version_ok = found.1.as_deref().map_or(true, |v| v == version);
        if !(name_ok && version_ok) {
            return Err(self.mismatch(backend, version, found));
        }

        if found.0.is_none() {
            config.put(&self.name_key(), backend)?;
        }
        if found.1.is_none() {
            config.put(&Self::version_key(backend), version)?;
        }
        info!(storage = %self, backend, version, "storage configured");
        Ok(())
    }

    /// Check the persisted record against `backend` and `version`.
    ///
    /// A missing record is reported as [`ConfigStatus::Unconfigured`]; any
    /// partial or differing record is a `ConfigurationMismatch`.
    pub fn verify(
        &self,
        config: &dyn ConfigDatabase,
        backend: &str,
        version: &str,
    ) -> StoreResult<ConfigStatus> {
        let found = self.read(config, backend)?;
        match (&found.0, &found.1) {
            (None, None) => {
                debug!(storage = %self, "storage not configured");
                Ok(ConfigStatus::Unconfigured)
            }
            (Some(n), Some(v)) if n == backend && v == version => {
                debug!(storage = %self, backend, version, "storage configuration verified");
                Ok(ConfigStatus::Configured)
            }
            _ => Err(self.mismatch(backend, version, found)),
        }
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

/// `BTreeMap`-backed configuration, for tests and ephemeral repositories.
#[derive(Debug, Default)]
pub struct InMemoryConfigDatabase {
    values: RwLock<BTreeMap<String, String>>,
}

impl InMemoryConfigDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConfigDatabase for InMemoryConfigDatabase {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let values = self.values.read().map_err(|_| poisoned())?;
        Ok(values.get(key).cloned())
    }

    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        split_key(key)?;
        let mut values = self.values.write().map_err(|_| poisoned())?;
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        let values = self.values.read().map_err(|_| poisoned())?;
        Ok(values.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

// ---------------------------------------------------------------------------
// TOML file
// ---------------------------------------------------------------------------

/// Configuration persisted as a TOML file.
///
/// A dotted key `section.name` maps to `name` inside the `[section]` table.
/// Every `put` rewrites the file atomically.
#[derive(Debug)]
pub struct FileConfigDatabase {
    path: PathBuf,
    table: RwLock<toml::Table>,
}

impl FileConfigDatabase {
    /// Open the configuration file at `path`, treating a missing file as empty.
    pub fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let path = path.into();
        let table = match std::fs::read_to_string(&path) {
            Ok(text) => text
                .parse::<toml::Table>()
                .map_err(|e| StoreError::ConfigFile(e.to_string()))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => toml::Table::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            table: RwLock::new(table),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deserialize the `[section]` table into a typed value.
    pub fn section<T>(&self, section: &str) -> StoreResult<Option<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        let table = self.table.read().map_err(|_| poisoned())?;
        table
            .get(section)
            .map(|value| {
                value
                    .clone()
                    .try_into()
                    .map_err(|e: toml::de::Error| StoreError::ConfigFile(e.to_string()))
            })
            .transpose()
    }

    fn save(&self, table: &toml::Table) -> StoreResult<()> {
        let text =
            toml::to_string_pretty(table).map_err(|e| StoreError::ConfigFile(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

impl ConfigDatabase for FileConfigDatabase {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        let (section, name) = split_key(key)?;
        let table = self.table.read().map_err(|_| poisoned())?;
        let value = table
            .get(section)
            .and_then(|s| s.as_table())
            .and_then(|s| s.get(name));
        Ok(value.map(|v| match v {
            toml::Value::String(s) => s.clone(),
            other => other.to_string(),
        }))
    }

    fn put(&self, key: &str, value: &str) -> StoreResult<()> {
        let (section, name) = split_key(key)?;
        let mut table = self.table.write().map_err(|_| poisoned())?;
        let entry = table
            .entry(section.to_string())
            .or_insert(toml::Value::Table(toml::Table::new()));
        let toml::Value::Table(section_table) = entry else {
            return Err(StoreError::ConfigFile(format!("{section} is not a table")));
        };
        section_table.insert(name.to_string(), toml::Value::String(value.to_string()));
        self.save(&table)
    }

    fn entries(&self) -> StoreResult<Vec<(String, String)>> {
        let table = self.table.read().map_err(|_| poisoned())?;
        let mut out = Vec::new();
        for (section, value) in table.iter() {
            let Some(inner) = value.as_table() else {
                continue;
            };
            for (name, v) in inner {
                let rendered = match v {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                out.push((format!("{section}.{name}"), rendered));
            }
        }
        out.sort();
        Ok(out)
    }
}

fn split_key(key: &str) -> StoreResult<(&str, &str)> {
    match key.split_once('.') {
        Some((section, name)) if !section.is_empty() && !name.is_empty() => Ok((section, name)),
        _ => Err(StoreError::InvalidConfigKey(key.to_string())),
    }
}

fn poisoned() -> StoreError {
    StoreError::Io(std::io::Error::other("config lock poisoned"))
}
