//! Hierarchical configuration store.
//!
//! A dot-path keyed store (`global.auto_login`, `global.key`, ...) backed
//! by a TOML document at `<app dir>/config.toml`. Reads never fail
//! outward: an absent or mistyped key yields the type's default value, and
//! a missing or unparsable file opens as an empty store. Writes mark the
//! store dirty; [`ConfigStore::write_to_file`] persists only when dirty.

use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

/// Config file name inside the application directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Errors that can occur when persisting configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to create the directory holding the config file.
    #[error("failed to create config directory {}: {source}", path.display())]
    CreateDir {
        /// Directory that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to write the configuration file.
    #[error("failed to write config file {}: {source}", path.display())]
    Write {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// Failed to serialize the configuration document.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// The application directory (`~/.config/parley` on Linux).
///
/// Holds `config.toml` and the well-known credential fallbacks
/// `user.key` / `user.cert`. `None` when no config directory can be
/// determined for the platform.
#[must_use]
pub fn app_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("parley"))
}

/// Dot-path keyed TOML store with never-raising reads.
pub struct ConfigStore {
    path: PathBuf,
    root: toml::Table,
    dirty: bool,
}

impl ConfigStore {
    /// Open the store backed by `path`.
    ///
    /// A missing file is an empty store. An unreadable or unparsable file
    /// is logged and also treated as empty rather than failing startup;
    /// the next [`ConfigStore::write_to_file`] replaces it.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let root = match std::fs::read_to_string(&path) {
            Ok(contents) => match contents.parse::<toml::Table>() {
                Ok(table) => table,
                Err(error) => {
                    tracing::warn!(
                        path = %path.display(),
                        %error,
                        "config file unparsable; starting from an empty store"
                    );
                    toml::Table::new()
                }
            },
            Err(error) if error.kind() == io::ErrorKind::NotFound => toml::Table::new(),
            Err(error) => {
                tracing::warn!(
                    path = %path.display(),
                    %error,
                    "config file unreadable; starting from an empty store"
                );
                toml::Table::new()
            }
        };
        Self {
            path,
            root,
            dirty: false,
        }
    }

    /// Read the value at a dot-separated `path`.
    ///
    /// An absent key or a type mismatch yields `T::default()`; this never
    /// errors outward.
    #[must_use]
    pub fn get<T>(&self, path: &str) -> T
    where
        T: DeserializeOwned + Default,
    {
        self.get_opt(path).unwrap_or_default()
    }

    /// Like [`ConfigStore::get`] but distinguishing presence.
    ///
    /// Returns `None` when the key is absent or the stored value does not
    /// deserialize as `T`.
    #[must_use]
    pub fn get_opt<T>(&self, path: &str) -> Option<T>
    where
        T: DeserializeOwned,
    {
        lookup(&self.root, path)?.clone().try_into().ok()
    }

    /// Store `value` at a dot-separated `path`, creating intermediate
    /// tables as needed, and mark the store dirty.
    ///
    /// A non-table intermediate value is replaced by a table. A value that
    /// cannot be represented in TOML is logged and dropped.
    pub fn put<T: Serialize>(&mut self, path: &str, value: T) {
        match toml::Value::try_from(value) {
            Ok(value) => {
                insert(&mut self.root, path, value);
                self.dirty = true;
            }
            Err(error) => {
                tracing::warn!(key = path, %error, "value not representable in config; dropped");
            }
        }
    }

    /// Persist the store if it has unsaved changes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the parent directory cannot be created
    /// or the file cannot be serialized or written.
    pub fn write_to_file(&mut self) -> Result<(), ConfigError> {
        if !self.dirty {
            return Ok(());
        }
        let contents = toml::to_string_pretty(&self.root)?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::CreateDir {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(&self.path, contents).map_err(|source| ConfigError::Write {
            path: self.path.clone(),
            source,
        })?;
        self.dirty = false;
        Ok(())
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether the store has unsaved changes.
    #[must_use]
    pub const fn is_dirty(&self) -> bool {
        self.dirty
    }
}

/// Walk `root` along a dot-separated path.
fn lookup<'a>(root: &'a toml::Table, path: &str) -> Option<&'a toml::Value> {
    let mut segments = path.split('.');
    let mut current = root.get(segments.next()?)?;
    for segment in segments {
        current = current.as_table()?.get(segment)?;
    }
    Some(current)
}

/// Insert `value` at a dot-separated path, materializing tables along the
/// way.
fn insert(root: &mut toml::Table, path: &str, value: toml::Value) {
    let mut table = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            table.insert(segment.to_string(), value);
            return;
        }
        let entry = table
            .entry(segment.to_string())
            .or_insert_with(|| toml::Value::Table(toml::Table::new()));
        if !entry.is_table() {
            *entry = toml::Value::Table(toml::Table::new());
        }
        match entry.as_table_mut() {
            Some(next) => table = next,
            None => return,
        }
    }
}
