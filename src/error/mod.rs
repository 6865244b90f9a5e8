//! # Error Module
//!
//! Error types for the duplicate finder.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Stay local** - per-file errors are logged and the file is skipped;
//!   they never abort a scan

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
///
/// Only the outer surfaces (configuration, CLI, background threads) produce
/// this. The detection pipelines degrade to smaller result sets instead.
#[derive(Error, Debug)]
pub enum DupfreeError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Verification error: {0}")]
    Verify(#[from] VerifyError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Background scan thread panicked")]
    WorkerPanicked,
}

/// Errors that occur while walking directories
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: PathBuf },

    #[error("Permission denied accessing: {path}")]
    PermissionDenied { path: PathBuf },

    #[error("Failed to read directory {path}: {source}")]
    ReadDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read metadata for {path}: {source}")]
    Metadata {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ScanError {
    /// Classify an I/O error raised while touching `path`
    pub fn from_io(path: PathBuf, source: std::io::Error) -> Self {
        match source.kind() {
            std::io::ErrorKind::NotFound => ScanError::DirectoryNotFound { path },
            std::io::ErrorKind::PermissionDenied => ScanError::PermissionDenied { path },
            _ => ScanError::ReadDirectory { path, source },
        }
    }
}

/// Errors that occur while hashing file content or image pixels
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to decode image {path}: {reason}")]
    DecodeError { path: PathBuf, reason: String },

    #[error("Image is empty or corrupted: {path}")]
    EmptyImage { path: PathBuf },

    #[error("Resize failed: {0}")]
    Resize(String),

    #[error("Failed to open file {path}: {source}")]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that occur while verifying a candidate pair
#[derive(Error, Debug)]
pub enum VerifyError {
    #[error("No thumbnail available for {path}")]
    ThumbnailUnavailable { path: PathBuf },

    #[error("Thumbnail size mismatch: {left:?} vs {right:?}")]
    SizeMismatch {
        left: (u32, u32),
        right: (u32, u32),
    },

    #[error("Image index {index} is out of range")]
    UnknownIndex { index: usize },
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, DupfreeError>;
