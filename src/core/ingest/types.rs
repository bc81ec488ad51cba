//! Types for the ingest module.

use crate::core::classifier::Category;
use crate::error::RequestError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Which modification dates to copy
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum DateSelection {
    /// Every date on the card
    #[default]
    All,
    /// Only these `YYYYMMDD` dates
    Dates(BTreeSet<String>),
}

impl DateSelection {
    /// Sentinel accepted in date lists to mean "every date"
    pub const ALL: &'static str = "all";

    pub fn is_all(&self) -> bool {
        matches!(self, DateSelection::All)
    }

    /// Whether a `YYYYMMDD` key is selected
    pub fn includes(&self, date_key: &str) -> bool {
        match self {
            DateSelection::All => true,
            DateSelection::Dates(dates) => dates.contains(date_key),
        }
    }

    /// Every explicit date must parse as `YYYYMMDD`
    pub fn validate(&self) -> Result<(), RequestError> {
        if let DateSelection::Dates(dates) = self {
            for date in dates {
                if date.len() != 8 || NaiveDate::parse_from_str(date, "%Y%m%d").is_err() {
                    return Err(RequestError::InvalidDate {
                        value: date.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl From<Vec<String>> for DateSelection {
    fn from(dates: Vec<String>) -> Self {
        if dates.iter().any(|d| d == Self::ALL) {
            DateSelection::All
        } else {
            DateSelection::Dates(dates.into_iter().collect())
        }
    }
}

impl From<DateSelection> for Vec<String> {
    fn from(selection: DateSelection) -> Self {
        match selection {
            DateSelection::All => vec![DateSelection::ALL.to_string()],
            DateSelection::Dates(dates) => dates.into_iter().collect(),
        }
    }
}

/// What to do when a different file already has the destination name
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CollisionPolicy {
    /// Overwrite the existing file
    #[default]
    Overwrite,
    /// Copy to `name_1.ext`, `name_2.ext`, ... (identical copies are still skipped)
    Rename,
    /// Leave the existing file and report the source as failed
    KeepExisting,
}

/// What to do with a destination file that fails verification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MismatchPolicy {
    /// Leave the bad copy in place
    #[default]
    Keep,
    /// Delete the bad copy
    Remove,
}

fn default_true() -> bool {
    true
}

/// A single ingest run, as requested by the caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyRequest {
    /// Card (or any folder) to copy from
    pub source_dir: PathBuf,
    /// Base folder for RAW, JPG and other images
    pub image_target_dir: PathBuf,
    /// Base folder for videos
    pub video_target_dir: PathBuf,
    /// Used verbatim in destination folder names
    pub activity_label: String,
    #[serde(default)]
    pub selected_dates: DateSelection,
    #[serde(default)]
    pub separate_raw_jpg: bool,
    #[serde(default = "default_true")]
    pub copy_images: bool,
    #[serde(default = "default_true")]
    pub copy_videos: bool,
    #[serde(default)]
    pub collision_policy: CollisionPolicy,
    #[serde(default)]
    pub mismatch_policy: MismatchPolicy,
}

impl CopyRequest {
    /// Request copying everything on `source_dir` into the default
    /// Pictures/Videos folders
    pub fn new(source_dir: impl Into<PathBuf>, activity_label: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            image_target_dir: default_image_dir(),
            video_target_dir: default_video_dir(),
            activity_label: activity_label.into(),
            selected_dates: DateSelection::All,
            separate_raw_jpg: false,
            copy_images: true,
            copy_videos: true,
            collision_policy: CollisionPolicy::default(),
            mismatch_policy: MismatchPolicy::default(),
        }
    }

    /// Parse a request from JSON
    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_image_target(mut self, dir: impl Into<PathBuf>) -> Self {
        self.image_target_dir = dir.into();
        self
    }

    pub fn with_video_target(mut self, dir: impl Into<PathBuf>) -> Self {
        self.video_target_dir = dir.into();
        self
    }

    /// Select dates; `"all"` anywhere in the list selects every date
    pub fn with_dates<I, S>(mut self, dates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let dates: Vec<String> = dates.into_iter().map(Into::into).collect();
        self.selected_dates = DateSelection::from(dates);
        self
    }

    pub fn with_separate_raw_jpg(mut self, separate: bool) -> Self {
        self.separate_raw_jpg = separate;
        self
    }

    pub fn with_images(mut self, copy: bool) -> Self {
        self.copy_images = copy;
        self
    }

    pub fn with_videos(mut self, copy: bool) -> Self {
        self.copy_videos = copy;
        self
    }

    pub fn with_collision_policy(mut self, policy: CollisionPolicy) -> Self {
        self.collision_policy = policy;
        self
    }

    pub fn with_mismatch_policy(mut self, policy: MismatchPolicy) -> Self {
        self.mismatch_policy = policy;
        self
    }

    /// Check the request before any file is touched
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.activity_label.is_empty() {
            return Err(RequestError::EmptyActivityLabel);
        }
        self.selected_dates.validate()
    }

    /// Whether the category toggles let this category through
    pub fn allows(&self, category: Category) -> bool {
        if category.is_image() {
            self.copy_images
        } else if category.is_video() {
            self.copy_videos
        } else {
            false
        }
    }

    /// Base target folder for a category
    pub fn target_dir_for(&self, category: Category) -> Option<&Path> {
        if category.is_image() {
            Some(&self.image_target_dir)
        } else if category.is_video() {
            Some(&self.video_target_dir)
        } else {
            None
        }
    }
}

/// The user's Pictures folder, or `~/Pictures`
pub fn default_image_dir() -> PathBuf {
    dirs::picture_dir().unwrap_or_else(|| home_dir().join("Pictures"))
}

/// The user's Videos folder, or `~/Movies`
pub fn default_video_dir() -> PathBuf {
    dirs::video_dir().unwrap_or_else(|| home_dir().join("Movies"))
}

fn home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Terminal state of one file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CopyOutcome {
    /// Copied and verified
    Copied,
    /// An identical file was already at the destination
    Skipped,
    /// The file could not be copied or failed verification
    Failed { reason: String },
}

impl CopyOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, CopyOutcome::Failed { .. })
    }
}

/// Outcome of one file of the working set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileOutcome {
    pub source: PathBuf,
    /// Where the file went (or would have gone)
    pub destination: Option<PathBuf>,
    pub outcome: CopyOutcome,
}

/// A file that failed, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Result of a copy run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopyReport {
    pub run_id: Uuid,
    /// Size of the working set
    pub total_files: usize,
    pub copied: usize,
    pub skipped: usize,
    pub failures: Vec<FailedFile>,
    /// Per-file outcomes in working-set order
    pub outcomes: Vec<FileOutcome>,
    pub folders_created: usize,
    /// Non-fatal scan problems (unreadable folders on the card)
    pub scan_errors: Vec<String>,
    /// Final human-readable summary
    pub message: String,
    /// Set when the run stopped before processing files
    pub fatal_error: Option<String>,
    pub cancelled: bool,
    pub duration_ms: u64,
}

impl CopyReport {
    pub(crate) fn empty(run_id: Uuid) -> Self {
        Self {
            run_id,
            total_files: 0,
            copied: 0,
            skipped: 0,
            failures: Vec::new(),
            outcomes: Vec::new(),
            folders_created: 0,
            scan_errors: Vec::new(),
            message: String::new(),
            fatal_error: None,
            cancelled: false,
            duration_ms: 0,
        }
    }

    /// Copied plus skipped
    pub fn processed(&self) -> usize {
        self.copied + self.skipped
    }

    /// No failures, no fatal error and not cancelled
    pub fn success(&self) -> bool {
        self.failures.is_empty() && self.fatal_error.is_none() && !self.cancelled
    }
}
