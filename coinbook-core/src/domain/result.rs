//! Result and error types for the core library

use std::path::PathBuf;

use thiserror::Error;

/// Failure to turn a persisted wallet into a ledger.
///
/// No partially populated wallet is ever returned alongside one of these.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Wallet not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Corrupt or unsupported wallet {}: {reason}", .path.display())]
    Corrupt { path: PathBuf, reason: String },

    #[error("Wallet {} requires decryption: {reason}", .path.display())]
    RequiresDecryption { path: PathBuf, reason: String },
}

impl LoadError {
    /// Create a corrupt wallet error
    pub fn corrupt(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Corrupt {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a decryption required error
    pub fn requires_decryption(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::RequiresDecryption {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Unsupported currency or otherwise unusable settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Configuration error: {0}")]
pub struct ConfigurationError(pub String);

/// Exchange rates must be strictly positive
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid exchange rate {0}: rate must be greater than zero")]
pub struct InvalidRateError(pub String);

/// I/O failure while writing an export. The whole export is aborted.
#[derive(Error, Debug)]
pub enum ExportIoError {
    #[error("Cannot create export file {}: {source}", .path.display())]
    CannotCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot write export file {}: {source}", .path.display())]
    CannotWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot close export file {}: {source}", .path.display())]
    CannotClose {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Core library error type
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    InvalidRate(#[from] InvalidRateError),

    #[error(transparent)]
    Export(#[from] ExportIoError),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a database error
    pub fn database(msg: impl Into<String>) -> Self {
        Self::Database(msg.into())
    }

    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(ConfigurationError(msg.into()))
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_error_messages() {
        let err = LoadError::NotFound(PathBuf::from("/tmp/missing.json"));
        assert_eq!(err.to_string(), "Wallet not found: /tmp/missing.json");

        let err = LoadError::corrupt("/tmp/w.json", "unsupported version 9");
        assert!(err.to_string().contains("unsupported version 9"));

        let err = LoadError::requires_decryption("/tmp/w.duckdb", "password required");
        assert!(err.to_string().contains("requires decryption"));
    }

    #[test]
    fn test_error_conversion_is_transparent() {
        let err: Error = InvalidRateError("-1".to_string()).into();
        assert!(matches!(err, Error::InvalidRate(_)));
        assert!(err.to_string().contains("greater than zero"));

        let err = Error::configuration("unsupported currency XYZ");
        assert_eq!(err.to_string(), "Configuration error: unsupported currency XYZ");
    }

    #[test]
    fn test_export_error_keeps_source() {
        use std::error::Error as _;

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ExportIoError::CannotCreate {
            path: PathBuf::from("/ro/out.csv"),
            source: io,
        };
        assert!(err.source().is_some());
        assert!(err.to_string().starts_with("Cannot create export file /ro/out.csv"));
    }
}
