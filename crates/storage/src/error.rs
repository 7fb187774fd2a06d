//! Storage-layer error type.

use thiserror::Error;

/// Result type alias for the storage crate.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors produced by the page store.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Underlying file I/O failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A WAL or snapshot record failed its checksum or length check.
    #[error("corrupt record: {0}")]
    CorruptRecord(String),

    /// bincode (de)serialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The workspace's `metadata` table already has a type set and the
    /// caller asked to set a different one.
    #[error("workspace type already set to {existing}, cannot change to {requested}")]
    TypeAlreadySet {
        /// The type already persisted for this workspace.
        existing: String,
        /// The type the caller attempted to set.
        requested: String,
    },

    /// Another process already holds the workspace's lock file.
    #[error("workspace is locked by another process")]
    Locked,
}

impl From<StorageError> for kybase_core::Error {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Io(e) => kybase_core::Error::Io(e),
            StorageError::Locked => kybase_core::Error::Locked,
            StorageError::CorruptRecord(msg) => {
                tracing::error!(error = %msg, "corrupt store record");
                kybase_core::Error::CorruptStore(msg)
            }
            StorageError::Serialization(msg) => kybase_core::Error::Serialization(msg),
            StorageError::TypeAlreadySet { existing, requested } => kybase_core::Error::Validation(format!(
                "workspace type already set to {existing}, cannot change to {requested}"
            )),
        }
    }
}
