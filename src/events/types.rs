//! Event type definitions for progress reporting.

use crate::core::volumes::Volume;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// All events emitted by the ingest library
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    /// Copy run progress
    Progress(ProgressEvent),
    /// Removable volume changes seen by the drive monitor
    Volume(VolumeEvent),
}

/// One step of a copy run, as shown to the user.
///
/// Emitted in strict file-processing order; percentages never decrease
/// within a run and the last event of a completed run reports 100.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Completion percentage (0-100), counting copied and skipped files
    pub percentage: u8,
    /// Human-readable status line
    pub message: String,
    /// The source file this event is about, if any
    pub current_file: Option<PathBuf>,
    /// Error description when the file (or the run) failed
    pub error: Option<String>,
    /// Size of the working set
    pub total_files: usize,
    /// Copied plus skipped files so far
    pub processed_files: usize,
}

impl ProgressEvent {
    /// Percentage of `processed` over `total`, rounded to the nearest integer
    pub fn percentage_of(processed: usize, total: usize) -> u8 {
        if total == 0 {
            return 100;
        }
        let pct = (processed as f64 * 100.0 / total as f64).round();
        pct.clamp(0.0, 100.0) as u8
    }
}

/// Events from the removable drive monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VolumeEvent {
    /// A new volume appeared
    Inserted(Volume),
    /// A previously seen volume disappeared
    Removed { path: PathBuf },
    /// Listing volumes failed; the previous snapshot is kept
    Error { message: String },
}
