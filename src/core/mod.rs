//! # Core Module
//!
//! The UI-agnostic ingest engine.
//!
//! ## Modules
//! - `classifier` - Maps file extensions to media categories
//! - `scanner` - Discovers media files on a card
//! - `hasher` - Content digests for duplicate checks and verification
//! - `destination` - Dated activity folders
//! - `ingest` - Orchestrates the copy
//! - `volumes` - Removable volume detection and monitoring

pub mod classifier;
pub mod destination;
pub mod hasher;
pub mod ingest;
pub mod scanner;
pub mod volumes;

// Re-export commonly used types
pub use classifier::Category;
pub use hasher::Digest;
pub use ingest::{CopyEngine, CopyReport, CopyRequest};
pub use scanner::MediaFile;
pub use volumes::Volume;
