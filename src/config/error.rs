//! Configuration error types

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("Configuration file not found. Searched: {searched_paths:?}")]
    ConfigFileNotFound { searched_paths: Vec<PathBuf> },

    #[error("Failed to read configuration from {path}: {reason}")]
    FileReadError { path: String, reason: String },

    #[error("Invalid configuration in {source_name}: {reason}")]
    InvalidFormat { source_name: String, reason: String },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl ConfigurationError {
    pub fn config_file_not_found(searched_paths: Vec<PathBuf>) -> Self {
        Self::ConfigFileNotFound { searched_paths }
    }

    pub fn file_read_error(path: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::FileReadError {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_format(source_name: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::InvalidFormat {
            source_name: source_name.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

pub type ConfigResult<T> = std::result::Result<T, ConfigurationError>;
