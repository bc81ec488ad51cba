//! # Scanner Module
//!
//! Discovers media files on a card.
//!
//! ## Rules
//! - Depth-first, filesystem enumeration order (not sorted)
//! - Hidden entries and system folders (`node_modules`, `$RECYCLE.BIN`,
//!   `System Volume Information`) are skipped along with their subtrees
//! - Only files with a recognized image or video extension are yielded
//! - Unreadable subdirectories are logged and treated as empty
//!
//! ## Example
//! ```rust,ignore
//! use card_ingest::core::scanner::MediaScanner;
//!
//! for path in MediaScanner::default().scan("/Volumes/EOS_DIGITAL".as_ref())? {
//!     println!("{}", path.display());
//! }
//! ```

mod filter;
mod walker;

pub use filter::{MediaFilter, EXCLUDED_NAMES};
pub use walker::{MediaScanner, MediaWalk, ScanConfig};

use crate::core::classifier::{classify_path, Category};
use crate::error::ScanError;
use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tracing::{info, warn};

/// Date key used when a file's modification time cannot be read
pub const UNKNOWN_DATE: &str = "00000000";

/// A media file discovered on the card
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaFile {
    /// Absolute path to the source file
    pub path: PathBuf,
    /// Lowercased extension without the dot
    pub extension: String,
    /// Category derived from the extension
    pub category: Category,
    /// Local calendar date of the file's modification time
    pub modified_date: Option<NaiveDate>,
    /// File size in bytes
    pub size: u64,
}

impl MediaFile {
    /// Build a media file from a path, reading its metadata.
    ///
    /// Unreadable metadata leaves the date unknown and the size at zero;
    /// the copy itself will surface the real error.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        let category = classify_path(&path);

        let (modified_date, size) = match fs::metadata(&path) {
            Ok(metadata) => (
                metadata.modified().ok().map(local_date),
                metadata.len(),
            ),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read file metadata");
                (None, 0)
            }
        };

        Self {
            path,
            extension,
            category,
            modified_date,
            size,
        }
    }

    /// `YYYYMMDD` of the modification date, or [`UNKNOWN_DATE`]
    pub fn date_key(&self) -> String {
        self.modified_date
            .map(format_date_key)
            .unwrap_or_else(|| UNKNOWN_DATE.to_string())
    }

    /// File name component of the path
    pub fn file_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
    }
}

/// Calendar date of a timestamp in the host's local timezone
pub fn local_date(time: SystemTime) -> NaiveDate {
    let datetime: DateTime<Local> = time.into();
    datetime.date_naive()
}

/// Render a date as `YYYYMMDD`
pub fn format_date_key(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

/// Distinct `YYYYMMDD` dates of the media under `source_dir`, newest first.
///
/// Files whose date cannot be read are left out.
pub fn scan_dates(source_dir: &Path) -> Result<Vec<String>, ScanError> {
    let walk = MediaScanner::default().scan(source_dir)?;

    let dates: BTreeSet<String> = walk
        .filter_map(|path| MediaFile::from_path(path).modified_date)
        .map(format_date_key)
        .collect();

    let sorted: Vec<String> = dates.into_iter().rev().collect();
    info!(
        source = %source_dir.display(),
        count = sorted.len(),
        dates = ?sorted,
        "Scanned media dates"
    );
    Ok(sorted)
}
