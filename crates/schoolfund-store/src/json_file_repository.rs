//! JSON-file implementation of the `DocumentRepository` trait.

use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use schoolfund_core::error::DomainError;
use schoolfund_core::repository::DocumentRepository;

use crate::config::StoreConfig;
use crate::error::RepositoryError;

/// Document repository backed by a single JSON file.
///
/// Writes go to a sibling temporary file that is synced to disk before it
/// is renamed over the target, so a crash mid-write leaves the previous
/// document intact.
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    /// Creates a repository for the file at `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Creates a repository for the document described by `config`.
    #[must_use]
    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.document_path())
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn io_error(&self, source: std::io::Error) -> RepositoryError {
        RepositoryError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn read(&self) -> Result<Option<serde_json::Value>, RepositoryError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        let value =
            serde_json::from_str(&contents).map_err(|source| RepositoryError::Serialization {
                path: self.path.display().to_string(),
                source,
            })?;
        Ok(Some(value))
    }

    fn write(&self, document: &serde_json::Value) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let json = serde_json::to_string_pretty(document).map_err(|source| {
            RepositoryError::Serialization {
                path: self.path.display().to_string(),
                source,
            }
        })?;

        let temp_path = self.temp_path();
        let replaced = write_synced(&temp_path, json.as_bytes())
            .and_then(|()| fs::rename(&temp_path, &self.path));
        if let Err(e) = replaced {
            // Best effort: the temporary file is useless once the rename failed.
            let _ = fs::remove_file(&temp_path);
            return Err(self.io_error(e));
        }
        sync_parent_dir(&self.path).map_err(|e| self.io_error(e))
    }
}

/// Writes `contents` to a fresh file at `path` and flushes it to disk.
fn write_synced(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Makes the directory entry for `path` durable after a rename.
#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(parent)?.sync_all()
}

/// Directory handles cannot be synced outside Unix.
#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}

impl DocumentRepository for JsonFileRepository {
    fn load_document(&self) -> Result<Option<serde_json::Value>, DomainError> {
        let loaded = self.read()?;
        tracing::debug!(
            path = %self.path.display(),
            found = loaded.is_some(),
            "loaded event document"
        );
        Ok(loaded)
    }

    fn save_document(&self, document: &serde_json::Value) -> Result<(), DomainError> {
        self.write(document).inspect_err(|e| {
            tracing::error!(path = %self.path.display(), error = %e, "failed to save event document");
        })?;
        tracing::debug!(path = %self.path.display(), "saved event document");
        Ok(())
    }
}
