//! Error types for the pinboard application.
//!
//! Board, history and selection operations never fail: a command that has
//! nothing to do simply reports `false`. The variants here cover the edges of
//! the system, namely the note file, the configuration and the command line.

use std::{io, path::PathBuf};

use thiserror::Error;

/// The main error type for the pinboard application.
#[derive(Error, Debug)]
pub enum PinError {
    /// Errors related to file I/O operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Errors raised while reading or writing YAML documents.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Errors raised while producing JSON output.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid note file content.
    #[error("Invalid note format: {message}")]
    InvalidFormat { message: String },

    /// Errors related to configuration.
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    /// Directory creation or access failed.
    #[error("Failed to create or access directory: {path}")]
    DirectoryError { path: PathBuf },

    /// file not found
    #[error("File not found: {file_path}")]
    FileNotFound { file_path: String },

    /// Generic application error with a custom message.
    #[error("{message}")]
    ApplicationError { message: String },
}
