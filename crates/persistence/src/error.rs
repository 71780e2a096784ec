//! Error types for store operations.

use thiserror::Error;

/// Errors that can occur during store operations.
///
/// The same taxonomy is reported whether a caller talks to a backend
/// directly or through any number of cache decorators.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The store (or the store beneath a decorator) is not open.
    #[error("Database is not opened: {name}")]
    NotOpen {
        /// Descriptive name of the store.
        name: String,
    },

    /// The store could not be opened.
    #[error("Database could not be opened: {name}")]
    OpenFailed {
        /// Descriptive name of the store.
        name: String,
    },

    /// Backend-specific failure (I/O, engine error).
    #[error("Storage backend error: {message}")]
    Backend {
        /// Error message from the backend.
        message: String,
    },

    /// Invalid operation or argument.
    #[error("Invalid operation: {message}")]
    InvalidOperation {
        /// Error message.
        message: String,
    },

    /// The requested backend or feature is not compiled in.
    #[error("Unsupported: {message}")]
    Unsupported {
        /// Error message.
        message: String,
    },

    /// Configuration rejected while assembling a store.
    #[error("Configuration error: {message}")]
    Config {
        /// Error message.
        message: String,
    },
}

impl StoreError {
    /// Create a not-open error.
    pub fn not_open<S: Into<String>>(name: S) -> Self {
        Self::NotOpen { name: name.into() }
    }

    /// Create an open-failed error.
    pub fn open_failed<S: Into<String>>(name: S) -> Self {
        Self::OpenFailed { name: name.into() }
    }

    /// Create a backend error.
    pub fn backend<S: Into<String>>(message: S) -> Self {
        Self::Backend {
            message: message.into(),
        }
    }

    /// Create an invalid operation error.
    pub fn invalid_operation<S: Into<String>>(message: S) -> Self {
        Self::InvalidOperation {
            message: message.into(),
        }
    }

    /// Create an unsupported error.
    pub fn unsupported<S: Into<String>>(message: S) -> Self {
        Self::Unsupported {
            message: message.into(),
        }
    }

    /// Returns true for the not-open variant.
    pub fn is_not_open(&self) -> bool {
        matches!(self, Self::NotOpen { .. })
    }
}

impl From<ledger_config::ConfigError> for StoreError {
    fn from(err: ledger_config::ConfigError) -> Self {
        Self::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(feature = "sled")]
impl From<sled::Error> for StoreError {
    fn from(err: sled::Error) -> Self {
        Self::backend(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
