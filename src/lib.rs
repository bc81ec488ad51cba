//! # Card Ingest
//!
//! A trustworthy memory-card ingest tool: copies photos and videos into
//! dated activity folders and verifies every copy.
//!
//! ## Core Philosophy
//! - **Never touch the card** - the source is only ever read
//! - **Verify everything** - a copy counts only after its digest matches
//! - **Safe to re-run** - files already at the destination are skipped
//!
//! ## Architecture
//! The library is split into a core engine (UI-agnostic) and presentation layers:
//! - `core` - The ingest engine
//! - `events` - Event-driven progress reporting (GUI-ready)
//! - `error` - User-friendly error types
//! - `logging` - Subscriber setup for binaries
//! - `cli` - Command-line interface

pub mod core;
pub mod error;
pub mod events;
pub mod logging;

// Re-export commonly used types at the crate root
pub use crate::core::ingest::{run_copy, scan_dates, CopyEngine, CopyReport, CopyRequest};
pub use error::{IngestError, Result};

/// Initialize tracing for the library
///
/// This should be called by the application entry point (CLI or GUI).
pub fn init_tracing() {
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set global default tracing subscriber");
}
