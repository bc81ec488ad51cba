//! Directory walking implementation using walkdir.

use super::filter::MediaFilter;
use crate::error::ScanError;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    /// Whether to follow symbolic links
    pub follow_symlinks: bool,
    /// Whether to include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
}

/// Recursive media scanner over a card's directory tree
#[derive(Debug, Clone, Default)]
pub struct MediaScanner {
    config: ScanConfig,
}

impl MediaScanner {
    /// Create a new scanner with the given configuration
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }

    /// Start a depth-first walk of `root`.
    ///
    /// Only the root itself must be readable; unreadable subdirectories
    /// are logged, recorded in [`MediaWalk::errors`] and treated as empty.
    pub fn scan(&self, root: &Path) -> Result<MediaWalk, ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let filter = MediaFilter::new().with_hidden(self.config.include_hidden);

        let mut walker = WalkDir::new(root).follow_links(self.config.follow_symlinks);
        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let entries = walker.into_iter().filter_entry(move |entry: &DirEntry| {
            entry.depth() == 0
                || entry
                    .file_name()
                    .to_str()
                    .map(|name| !filter.is_excluded_name(name))
                    .unwrap_or(true)
        });

        debug!(root = %root.display(), "Starting media scan");

        Ok(MediaWalk {
            entries: Box::new(entries),
            filter: MediaFilter::new().with_hidden(self.config.include_hidden),
            errors: Vec::new(),
        })
    }
}

/// A single pass over the media files under a root.
///
/// Yields paths in filesystem enumeration order. Once exhausted it stays
/// exhausted; start a new scan to walk again.
pub struct MediaWalk {
    entries: Box<dyn Iterator<Item = walkdir::Result<DirEntry>> + Send>,
    filter: MediaFilter,
    errors: Vec<ScanError>,
}

impl MediaWalk {
    /// Directory errors seen so far (non-fatal)
    pub fn errors(&self) -> &[ScanError] {
        &self.errors
    }

    /// Consume the walk, returning the recorded errors
    pub fn into_errors(self) -> Vec<ScanError> {
        self.errors
    }

    fn record_error(&mut self, error: walkdir::Error) {
        let path = error.path().map(Path::to_path_buf).unwrap_or_default();

        let scan_error = if error.io_error().map(|e| e.kind())
            == Some(std::io::ErrorKind::PermissionDenied)
        {
            ScanError::PermissionDenied { path: path.clone() }
        } else {
            let message = error.to_string();
            ScanError::ReadDirectory {
                path: path.clone(),
                source: error
                    .into_io_error()
                    .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, message)),
            }
        };

        warn!(path = %path.display(), error = %scan_error, "Skipping unreadable entry");
        self.errors.push(scan_error);
    }
}

impl Iterator for MediaWalk {
    type Item = PathBuf;

    fn next(&mut self) -> Option<PathBuf> {
        loop {
            match self.entries.next()? {
                Ok(entry) => {
                    if !entry.file_type().is_file() {
                        continue;
                    }
                    if self.filter.should_include(entry.path()) {
                        return Some(entry.into_path());
                    }
                }
                Err(e) => self.record_error(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_media(dir: &Path, name: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(name);
        let mut file = File::create(&path).unwrap();
        file.write_all(&[0xFF, 0xD8, 0xFF, 0xE0]).unwrap();
        path
    }

    fn scan_all(root: &Path) -> Vec<PathBuf> {
        MediaScanner::default().scan(root).unwrap().collect()
    }

    #[test]
    fn scan_empty_directory_yields_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let mut walk = MediaScanner::default().scan(temp_dir.path()).unwrap();

        assert!(walk.next().is_none());
        assert!(walk.errors().is_empty());
    }

    #[test]
    fn scan_traverses_nested_directories() {
        let temp_dir = TempDir::new().unwrap();
        create_media(temp_dir.path(), "root.jpg");
        create_media(&temp_dir.path().join("DCIM/100CANON"), "IMG_0001.CR2");
        create_media(&temp_dir.path().join("PRIVATE/M4ROOT/CLIP"), "C0001.MP4");

        assert_eq!(scan_all(temp_dir.path()).len(), 3);
    }

    #[test]
    fn scan_skips_unrecognized_files() {
        let temp_dir = TempDir::new().unwrap();
        create_media(temp_dir.path(), "photo.jpg");
        create_media(temp_dir.path(), "photo.xmp");
        create_media(temp_dir.path(), "notes.txt");

        let files = scan_all(temp_dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("photo.jpg"));
    }

    #[test]
    fn scan_prunes_excluded_directories() {
        let temp_dir = TempDir::new().unwrap();
        create_media(temp_dir.path(), "keep.jpg");
        create_media(&temp_dir.path().join("node_modules/deep"), "a.jpg");
        create_media(&temp_dir.path().join("$RECYCLE.BIN"), "b.jpg");
        create_media(&temp_dir.path().join("System Volume Information"), "c.mp4");
        create_media(&temp_dir.path().join("sub/.git/objects"), "d.png");

        let files = scan_all(temp_dir.path());
        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("keep.jpg"));
    }

    #[test]
    fn hidden_root_is_still_scanned() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join(".card");
        create_media(&root, "a.jpg");

        assert_eq!(scan_all(&root).len(), 1);
    }

    #[test]
    fn scan_can_include_hidden() {
        let temp_dir = TempDir::new().unwrap();
        create_media(&temp_dir.path().join(".thumbs"), "a.jpg");
        create_media(&temp_dir.path().join("node_modules"), "b.jpg");

        let scanner = MediaScanner::new(ScanConfig {
            include_hidden: true,
            ..Default::default()
        });
        let files: Vec<_> = scanner.scan(temp_dir.path()).unwrap().collect();

        assert_eq!(files.len(), 1);
        assert!(files[0].ends_with("a.jpg"));
    }

    #[test]
    fn max_depth_limits_descent() {
        let temp_dir = TempDir::new().unwrap();
        create_media(temp_dir.path(), "top.jpg");
        create_media(&temp_dir.path().join("a/b"), "deep.jpg");

        let scanner = MediaScanner::new(ScanConfig {
            max_depth: Some(1),
            ..Default::default()
        });
        let files: Vec<_> = scanner.scan(temp_dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn scan_nonexistent_root_is_an_error() {
        let result = MediaScanner::default().scan(Path::new("/nonexistent/card/12345"));
        assert!(matches!(result, Err(ScanError::DirectoryNotFound { .. })));
    }

    #[test]
    fn scan_file_root_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_media(temp_dir.path(), "a.jpg");
        assert!(MediaScanner::default().scan(&file).is_err());
    }
}
