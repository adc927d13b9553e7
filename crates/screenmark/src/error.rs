//! Error types for screenmark.
//!
//! This module defines all error types used throughout the screenmark crate,
//! providing detailed context for debugging and user-friendly error messages.

use std::path::PathBuf;
use thiserror::Error;

use crate::entry::EntryId;

/// The main error type for screenmark operations.
#[derive(Error, Debug)]
pub enum Error {
    // === History Errors ===
    /// An operation referenced an unknown entry.
    #[error("no entry with id {id}")]
    NotFound {
        /// The id that could not be resolved.
        id: EntryId,
    },

    /// A measurement endpoint does not name an existing point.
    #[error("measurement endpoint {id} is not an existing point")]
    Reference {
        /// The offending endpoint id.
        id: EntryId,
    },

    /// Moving an entry would make a group contain itself.
    #[error("cannot move {id} into {target}: {target} is {id} or one of its descendants")]
    Cycle {
        /// The entry being moved.
        id: EntryId,
        /// The requested destination group.
        target: EntryId,
    },

    /// The destination of an insert or move is not a group.
    #[error("entry {id} is not a group")]
    NotAGroup {
        /// The entry that was used as a container.
        id: EntryId,
    },

    /// Every entry id has been issued.
    #[error("no entry ids left to allocate")]
    IdsExhausted,

    // === Storage Errors ===
    /// Writing or reading the history document failed.
    ///
    /// This is non-fatal: the in-memory history is still valid and keeps
    /// accumulating edits until a later save succeeds.
    #[error("history storage at {path} failed: {source}")]
    Storage {
        /// Path to the history document.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The history document parsed but breaks the document rules.
    #[error("invalid history document: {message}")]
    InvalidDocument {
        /// Description of the problem.
        message: String,
    },

    /// The history document could not be decoded (strict loading only).
    #[error(transparent)]
    CorruptStore(#[from] CorruptStoreWarning),

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Query Errors ===
    /// A label filter was not a valid regular expression.
    #[error("invalid label pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Raised when a persisted history document is unreadable or malformed.
///
/// By default loading reports this alongside an empty history instead of
/// failing; strict loading turns it into [`Error::CorruptStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("history at {path} is corrupt: {reason}")]
pub struct CorruptStoreWarning {
    /// Path to the document that failed to load.
    pub path: PathBuf,
    /// Why decoding failed.
    pub reason: String,
    /// Where the unreadable document was copied before being discarded.
    pub backup: Option<PathBuf>,
}

/// A specialized Result type for screenmark operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a storage error for the given document path.
    #[must_use]
    pub fn storage(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create an invalid document error.
    #[must_use]
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::InvalidDocument {
            message: message.into(),
        }
    }

    /// Check if this error only affects durability, not the in-memory history.
    #[must_use]
    pub fn is_storage_error(&self) -> bool {
        matches!(self, Self::Storage { .. })
    }

    /// Check if this error was caused by an unknown or invalid id.
    #[must_use]
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::Reference { .. } | Self::NotAGroup { .. }
        )
    }
}
