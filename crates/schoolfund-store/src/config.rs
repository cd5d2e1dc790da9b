//! Store configuration.

use std::path::{Path, PathBuf};

use schoolfund_core::error::DomainError;

/// File name of the event assignment document inside the data root.
pub const DEFAULT_FILE_NAME: &str = "events_assignments.json";

/// Resolves the writable data-root directory of the installation.
///
/// Implemented by the application's settings layer.
pub trait DataRootResolver {
    /// Returns the data-root directory.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Persistence` if no writable location is known.
    fn data_root(&self) -> Result<PathBuf, DomainError>;
}

/// Where the event assignment document lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the document.
    pub data_root: PathBuf,
    /// File name of the document inside `data_root`.
    pub file_name: String,
}

impl StoreConfig {
    /// Creates a configuration using the default file name.
    #[must_use]
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
            file_name: DEFAULT_FILE_NAME.to_owned(),
        }
    }

    /// Overrides the document file name.
    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Builds a configuration from the application's data-root resolver.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's error.
    pub fn from_resolver(resolver: &dyn DataRootResolver) -> Result<Self, DomainError> {
        Ok(Self::new(resolver.data_root()?))
    }

    /// Full path of the document file.
    #[must_use]
    pub fn document_path(&self) -> PathBuf {
        self.data_root.join(&self.file_name)
    }

    /// The data-root directory.
    #[must_use]
    pub fn data_root(&self) -> &Path {
        &self.data_root
    }
}
