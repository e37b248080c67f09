//! Error types for the core library.

use std::path::PathBuf;

use thiserror::Error;

use crate::account::{AccountId, ValidationError};

/// Errors that can occur in account store operations.
#[derive(Debug, Error)]
pub enum Error {
    /// A required identifying parameter was absent.
    #[error("\"name\" is a required parameter")]
    MissingName,

    /// An account with this id is already present.
    #[error("{0} already exists")]
    AccountExists(AccountId),

    /// The addressed account is not in the store.
    #[error("{0} was not found")]
    AccountNotFound(AccountId),

    /// The requested name cannot be used as a storage key.
    #[error("{name:?} is not a valid account name: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Which rule it broke.
        reason: ValidationError,
    },

    /// The store directory could not be enumerated.
    #[error("unable to read store directory {}: {source}", dir.display())]
    StoreUnavailable {
        /// Store directory.
        dir: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An account file could not be read.
    #[error("unable to read account {id}: {source}")]
    NotReadable {
        /// Account that failed.
        id: AccountId,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// An account file does not contain JSON.
    #[error("account {id} is not valid JSON: {source}")]
    Malformed {
        /// Account that failed.
        id: AccountId,
        /// Parse error.
        source: serde_json::Error,
    },

    /// An account file could not be written or removed.
    #[error("unable to write account {id}: {source}")]
    NotWritable {
        /// Account that failed.
        id: AccountId,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A bulk delete finished with at least one failure.
    #[error("{failed} of {total} accounts could not be deleted, first was {id}: {source}")]
    PurgeIncomplete {
        /// First account (in listing order) that could not be deleted.
        id: AccountId,
        /// Number of failed deletions.
        failed: usize,
        /// Number of deletions attempted.
        total: usize,
        /// Error of the first failure.
        source: std::io::Error,
    },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl Error {
    /// REST code reported to clients alongside the message.
    ///
    /// Filesystem failures are not told apart; they all report
    /// `InternalError`.
    #[must_use]
    pub const fn rest_code(&self) -> &'static str {
        match self {
            Self::MissingName => "MissingName",
            Self::AccountExists(_) => "AccountExists",
            Self::AccountNotFound(_) => "AccountNotFound",
            Self::InvalidName { .. } => "InvalidName",
            Self::StoreUnavailable { .. }
            | Self::NotReadable { .. }
            | Self::Malformed { .. }
            | Self::NotWritable { .. }
            | Self::PurgeIncomplete { .. }
            | Self::Serde(_) => "InternalError",
        }
    }
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
