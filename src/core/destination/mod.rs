//! # Destination Module
//!
//! Computes and creates destination folders.
//!
//! ## Layout
//! ```text
//! {target}/{YYYYMMDD}_{activity}/{filename}
//! {target}/{YYYYMMDD}_{activity}/RAW/{filename}   (RAW, when separated)
//! {target}/{YYYYMMDD}_{activity}/JPG/{filename}   (JPG, when separated)
//! ```
//!
//! The activity label is used verbatim.

use crate::core::classifier::Category;
use crate::error::CopyError;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, error};

/// `{date}_{activity}`
pub fn folder_name(date: &str, activity: &str) -> String {
    format!("{}_{}", date, activity)
}

/// Create `{base}/{date}_{activity}` and its ancestors; idempotent
pub fn resolve_and_ensure(base: &Path, date: &str, activity: &str) -> Result<PathBuf, CopyError> {
    let dir = base.join(folder_name(date, activity));
    create_dir(&dir)?;
    Ok(dir)
}

fn create_dir(dir: &Path) -> Result<(), CopyError> {
    fs::create_dir_all(dir).map_err(|source| {
        error!(path = %dir.display(), error = %source, "Failed to create destination folder");
        CopyError::DirectoryCreation {
            path: dir.to_path_buf(),
            source,
        }
    })
}

/// Creates destination folders, remembering which ones already exist.
///
/// Creation is serialized, so concurrent workers targeting the same folder
/// never race and each new folder is counted once.
#[derive(Debug, Default)]
pub struct DestinationResolver {
    state: Mutex<ResolverState>,
}

#[derive(Debug, Default)]
struct ResolverState {
    known: HashSet<PathBuf>,
    created: usize,
}

impl DestinationResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Final directory for a file, computed without touching the filesystem
    pub fn planned_dir(
        base: &Path,
        date: &str,
        activity: &str,
        category: Category,
        separate_raw_jpg: bool,
    ) -> PathBuf {
        let dir = base.join(folder_name(date, activity));
        Self::category_dir(&dir, category, separate_raw_jpg)
    }

    /// `dir/RAW` or `dir/JPG` when separating, otherwise `dir`
    pub fn category_dir(dir: &Path, category: Category, separate_raw_jpg: bool) -> PathBuf {
        match category.subfolder() {
            Some(sub) if separate_raw_jpg => dir.join(sub),
            _ => dir.to_path_buf(),
        }
    }

    /// Create `{base}/{date}_{activity}` if needed and return it
    pub fn resolve_and_ensure(
        &self,
        base: &Path,
        date: &str,
        activity: &str,
    ) -> Result<PathBuf, CopyError> {
        let dir = base.join(folder_name(date, activity));
        self.ensure(&dir)?;
        Ok(dir)
    }

    /// Ensure the RAW/JPG subfolder for `category` under `dir`
    pub fn ensure_category_dir(
        &self,
        dir: &Path,
        category: Category,
        separate_raw_jpg: bool,
    ) -> Result<PathBuf, CopyError> {
        let target = Self::category_dir(dir, category, separate_raw_jpg);
        self.ensure(&target)?;
        Ok(target)
    }

    /// Create `dir` and its ancestors unless already known
    pub fn ensure(&self, dir: &Path) -> Result<(), CopyError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.known.contains(dir) {
            return Ok(());
        }

        if !dir.is_dir() {
            create_dir(dir)?;
            state.created += 1;
            debug!(path = %dir.display(), "Created destination folder");
        }
        state.known.insert(dir.to_path_buf());
        Ok(())
    }

    /// Number of folders this resolver actually created
    pub fn folders_created(&self) -> usize {
        self.state.lock().map(|s| s.created).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn folder_name_joins_date_and_activity() {
        assert_eq!(folder_name("20240101", "wedding"), "20240101_wedding");
        assert_eq!(folder_name("20240101", "Trip / Day 1"), "20240101_Trip / Day 1");
    }

    #[test]
    fn planned_dir_separates_raw_and_jpg() {
        let base = Path::new("/photos");
        assert_eq!(
            DestinationResolver::planned_dir(base, "20240101", "x", Category::Raw, true),
            PathBuf::from("/photos/20240101_x/RAW")
        );
        assert_eq!(
            DestinationResolver::planned_dir(base, "20240101", "x", Category::Jpg, true),
            PathBuf::from("/photos/20240101_x/JPG")
        );
        assert_eq!(
            DestinationResolver::planned_dir(base, "20240101", "x", Category::OtherImage, true),
            PathBuf::from("/photos/20240101_x")
        );
        assert_eq!(
            DestinationResolver::planned_dir(base, "20240101", "x", Category::Raw, false),
            PathBuf::from("/photos/20240101_x")
        );
    }

    #[test]
    fn resolve_creates_nested_ancestors() {
        let temp = TempDir::new().unwrap();
        let base = temp.path().join("Pictures/Imports");

        let dir = resolve_and_ensure(&base, "20240101", "hike").unwrap();
        assert!(dir.is_dir());
        assert!(dir.ends_with("20240101_hike"));
    }

    #[test]
    fn resolve_is_idempotent() {
        let temp = TempDir::new().unwrap();
        let resolver = DestinationResolver::new();

        let first = resolver.resolve_and_ensure(temp.path(), "20240101", "hike").unwrap();
        let second = resolver.resolve_and_ensure(temp.path(), "20240101", "hike").unwrap();
        assert_eq!(first, second);
        assert_eq!(resolver.folders_created(), 1);

        // A fresh resolver sees the folder on disk and creates nothing
        let fresh = DestinationResolver::new();
        fresh.resolve_and_ensure(temp.path(), "20240101", "hike").unwrap();
        assert_eq!(fresh.folders_created(), 0);
    }

    #[test]
    fn ensure_category_dir_creates_subfolder() {
        let temp = TempDir::new().unwrap();
        let resolver = DestinationResolver::new();
        let dir = resolver.resolve_and_ensure(temp.path(), "20240101", "hike").unwrap();

        let raw = resolver.ensure_category_dir(&dir, Category::Raw, true).unwrap();
        assert!(raw.ends_with("RAW"));
        assert!(raw.is_dir());

        let video = resolver.ensure_category_dir(&dir, Category::Video, true).unwrap();
        assert_eq!(video, dir);
    }

    #[test]
    fn creation_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        fs::write(&blocker, b"not a directory").unwrap();

        let result = DestinationResolver::new().resolve_and_ensure(&blocker, "20240101", "x");
        assert!(matches!(result, Err(CopyError::DirectoryCreation { .. })));
    }
}
