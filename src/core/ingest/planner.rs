//! Builds the working set of a run.

use super::types::CopyRequest;
use crate::core::classifier::{classify_path, Category};
use crate::core::destination::DestinationResolver;
use crate::core::scanner::MediaFile;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One file of the working set, with where it is going
#[derive(Debug, Clone)]
pub struct PlannedCopy {
    pub file: MediaFile,
    /// Image or video base folder
    pub base_dir: PathBuf,
    /// Final folder, including any RAW/JPG subfolder
    pub target_dir: PathBuf,
}

/// Files that passed classification, category gating and date gating
#[derive(Debug, Default)]
pub struct WorkingSet {
    pub files: Vec<PlannedCopy>,
    pub unrecognized: usize,
    pub excluded_by_category: usize,
    pub excluded_by_date: usize,
}

impl WorkingSet {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Filter candidates down to the files this request will copy, keeping
/// enumeration order.
pub fn plan<I>(request: &CopyRequest, candidates: I) -> WorkingSet
where
    I: IntoIterator<Item = PathBuf>,
{
    let mut set = WorkingSet::default();

    for path in candidates {
        let category = classify_path(&path);
        if category == Category::Unrecognized {
            warn!(path = %path.display(), "Skipping unrecognized file type");
            set.unrecognized += 1;
            continue;
        }

        if !request.allows(category) {
            set.excluded_by_category += 1;
            continue;
        }

        let file = MediaFile::from_path(path);
        let date_key = file.date_key();
        if !request.selected_dates.includes(&date_key) {
            set.excluded_by_date += 1;
            continue;
        }

        let Some(base_dir) = request.target_dir_for(category).map(PathBuf::from) else {
            continue;
        };
        let target_dir = DestinationResolver::planned_dir(
            &base_dir,
            &date_key,
            &request.activity_label,
            category,
            request.separate_raw_jpg,
        );

        set.files.push(PlannedCopy {
            file,
            base_dir,
            target_dir,
        });
    }

    debug!(
        files = set.files.len(),
        unrecognized = set.unrecognized,
        excluded_by_category = set.excluded_by_category,
        excluded_by_date = set.excluded_by_date,
        "Planned working set"
    );

    set
}
