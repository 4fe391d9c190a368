use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    WriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("No test scripts found in {0}")]
    NoScripts(PathBuf),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Invalid base URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Script runner error: {0}")]
    RunnerError(String),

    #[error("Script timed out after {0} ms")]
    Timeout(u64),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, MigrationError>;

impl MigrationError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrationError::ReadFailed {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MigrationError::WriteFailed {
            path: path.into(),
            source,
        }
    }
}
