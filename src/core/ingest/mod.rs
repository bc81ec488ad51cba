//! # Ingest Module
//!
//! Copies media from a card into dated activity folders.
//!
//! ## Stages
//! 1. **Scan** - walk the card for recognized media
//! 2. **Plan** - classify, gate by category and date, compute destinations
//! 3. **Copy** - per file: duplicate check, copy, verify by content digest
//! 4. **Report** - per-file outcomes plus a final summary
//!
//! ## Guarantees
//! - Running the same request twice copies nothing the second time
//! - A file is never reported as copied unless its copy was verified
//! - One failed file never aborts the run
//!
//! ## Example
//! ```rust,ignore
//! use card_ingest::core::ingest::{CopyEngine, CopyRequest};
//!
//! let request = CopyRequest::new("/Volumes/EOS_DIGITAL", "wedding")
//!     .with_dates(["20240101"])
//!     .with_separate_raw_jpg(true);
//! let report = CopyEngine::default().run(&request);
//! println!("{}", report.message);
//! ```

mod engine;
mod planner;
mod transfer;
mod types;

pub use engine::{CancellationToken, CopyEngine, CopyEngineBuilder};
pub use planner::{plan, PlannedCopy, WorkingSet};
pub use transfer::{FileCopier, StdCopier};
pub use types::*;

pub use crate::core::scanner::scan_dates;

use crate::events::ProgressReporter;

/// Run a request with the default engine
pub fn run_copy(request: &CopyRequest, reporter: &dyn ProgressReporter) -> CopyReport {
    CopyEngine::default().run_with_reporter(request, reporter)
}
