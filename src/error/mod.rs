//! # Error Module
//!
//! User-friendly error types for the card ingest tool.
//!
//! ## Design Principles
//! - **Never panic** on user data - return errors instead
//! - **Include context** - paths, file names, what went wrong
//! - **Per-file errors stay per-file** - a failed file never aborts the run
//! - **Recovery hints** - suggest how to fix when possible

use std::path::PathBuf;
use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Scanning error: {0}")]
    Scan(#[from] ScanError),

    #[error("Hashing error: {0}")]
    Hash(#[from] HashError),

    #[error("Copy error: {0}")]
    Copy(#[from] CopyError),

    #[error("Invalid copy request: {0}")]
    Request(#[from] RequestError),

    #[error("Removable volume error: {0}")]
    Volume(#[from] VolumeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that occur while walking the source card
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
}

/// Errors that occur while computing a content digest
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to read file {path} for hashing: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that abort the copy of a single file
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("Failed to create folder {path}: {source}. Check free space and permissions.")]
    DirectoryCreation {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to copy {source_path} to {destination}: {source}")]
    Io {
        source_path: PathBuf,
        destination: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Hash mismatch after copy: {source_path} and {destination} differ")]
    VerifyMismatch {
        source_path: PathBuf,
        destination: PathBuf,
    },

    #[error("A different file already exists at {destination}")]
    Collision { destination: PathBuf },

    #[error(transparent)]
    Hash(#[from] HashError),
}

/// Errors in the caller-supplied copy request
#[derive(Error, Debug)]
pub enum RequestError {
    #[error("Activity label must not be empty")]
    EmptyActivityLabel,

    #[error("Invalid date '{value}' (expected YYYYMMDD or \"all\")")]
    InvalidDate { value: String },

    #[error("Neither images nor videos are selected for copying")]
    NothingSelected,

    #[error("Failed to parse copy request: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors raised by a removable volume provider
#[derive(Error, Debug)]
pub enum VolumeError {
    #[error("Failed to list removable volumes: {0}")]
    ListFailed(String),

    #[error("Failed to eject {path}: {reason}. Close any program using the card and try again.")]
    EjectFailed { path: PathBuf, reason: String },

    #[error("Removable volumes are not supported on this platform")]
    Unsupported,
}

/// Convenience Result type alias
pub type Result<T> = std::result::Result<T, IngestError>;
