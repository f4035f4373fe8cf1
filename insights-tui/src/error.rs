//! Domain error types.
//!
//! Everything that validates user or backend input at a boundary returns one
//! of these. Transport failures stay in `anyhow` inside the API client.

use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// A date string did not match the expected format.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid date '{input}': expected {expected}")]
pub struct DateError {
    pub input: String,
    pub expected: &'static str,
}

/// A task could not be built from its parts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("end date {end} is before start date {start}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error(transparent)]
    Date(#[from] DateError),
}

/// Selecting or reading an audio file failed.
#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please select a valid audio file.")]
    NotAudio { path: PathBuf },

    #[error("File not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("{} is larger than the {limit_mb} MB limit", path.display())]
    TooLarge { path: PathBuf, limit_mb: u64 },

    #[error("No file selected")]
    NoFile,

    #[error("Upload the file first")]
    NotUploaded,

    #[error("Summary already generated")]
    AlreadyGenerated,

    #[error("Upload already {0}")]
    Busy(&'static str),

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}
