//! # Classifier Module
//!
//! Maps file extensions to media categories.
//!
//! ## Categories
//! - **RAW** - camera raw formats (.cr2, .nef, .arw, ...)
//! - **JPG** - .jpg, .jpeg
//! - **Other image** - .png
//! - **Video** - .mp4, .avi, .mov
//! - **Unrecognized** - everything else
//!
//! The four recognized tables are disjoint, so every recognized extension
//! lands in exactly one category.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Camera raw extensions (lowercase, no dot)
pub const RAW_EXTENSIONS: &[&str] = &[
    "raw", "nef", "cr2", "cr3", "arw", "dng", "raf", "orf", "pef", "srw", "x3f",
];

/// JPEG extensions
pub const JPG_EXTENSIONS: &[&str] = &["jpg", "jpeg"];

/// Images that are neither RAW nor JPEG
pub const OTHER_IMAGE_EXTENSIONS: &[&str] = &["png"];

/// Video extensions
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "avi", "mov"];

/// Classification bucket for a media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Raw,
    Jpg,
    OtherImage,
    Video,
    Unrecognized,
}

impl Category {
    /// RAW, JPG and other images all count as images
    pub fn is_image(&self) -> bool {
        matches!(self, Category::Raw | Category::Jpg | Category::OtherImage)
    }

    pub fn is_video(&self) -> bool {
        matches!(self, Category::Video)
    }

    pub fn is_recognized(&self) -> bool {
        !matches!(self, Category::Unrecognized)
    }

    /// Subfolder used when RAW and JPG files are kept apart
    pub fn subfolder(&self) -> Option<&'static str> {
        match self {
            Category::Raw => Some("RAW"),
            Category::Jpg => Some("JPG"),
            _ => None,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Raw => write!(f, "RAW"),
            Category::Jpg => write!(f, "JPG"),
            Category::OtherImage => write!(f, "Image"),
            Category::Video => write!(f, "Video"),
            Category::Unrecognized => write!(f, "Unrecognized"),
        }
    }
}

/// Classify an extension. Case-insensitive; a leading dot is ignored.
pub fn classify(extension: &str) -> Category {
    let ext = extension.trim_start_matches('.').to_lowercase();
    let ext = ext.as_str();

    if RAW_EXTENSIONS.contains(&ext) {
        Category::Raw
    } else if JPG_EXTENSIONS.contains(&ext) {
        Category::Jpg
    } else if OTHER_IMAGE_EXTENSIONS.contains(&ext) {
        Category::OtherImage
    } else if VIDEO_EXTENSIONS.contains(&ext) {
        Category::Video
    } else {
        Category::Unrecognized
    }
}

/// Classify a path by its extension
pub fn classify_path(path: &Path) -> Category {
    path.extension()
        .and_then(|e| e.to_str())
        .map(classify)
        .unwrap_or(Category::Unrecognized)
}

/// Whether the extension belongs to the image or video tables
pub fn is_media_extension(extension: &str) -> bool {
    classify(extension).is_recognized()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn all_tables() -> Vec<(&'static [&'static str], Category)> {
        vec![
            (RAW_EXTENSIONS, Category::Raw),
            (JPG_EXTENSIONS, Category::Jpg),
            (OTHER_IMAGE_EXTENSIONS, Category::OtherImage),
            (VIDEO_EXTENSIONS, Category::Video),
        ]
    }

    #[test]
    fn every_table_entry_maps_to_its_category() {
        for (table, category) in all_tables() {
            for ext in table {
                assert_eq!(classify(ext), category, "extension {}", ext);
            }
        }
    }

    #[test]
    fn tables_are_pairwise_disjoint() {
        let mut seen = HashSet::new();
        for (table, _) in all_tables() {
            for ext in table {
                assert!(seen.insert(*ext), "{} appears in two tables", ext);
            }
        }
    }

    #[test]
    fn classification_ignores_case_and_dot() {
        assert_eq!(classify("CR3"), Category::Raw);
        assert_eq!(classify(".JPEG"), Category::Jpg);
        assert_eq!(classify(".Mov"), Category::Video);
        assert_eq!(classify("PNG"), Category::OtherImage);
    }

    #[test]
    fn unknown_extensions_are_unrecognized() {
        assert_eq!(classify("txt"), Category::Unrecognized);
        assert_eq!(classify("heic"), Category::Unrecognized);
        assert_eq!(classify(""), Category::Unrecognized);
        assert!(!is_media_extension("xmp"));
    }

    #[test]
    fn classify_path_uses_extension() {
        assert_eq!(classify_path(Path::new("/card/DCIM/100CANON/IMG_0001.CR2")), Category::Raw);
        assert_eq!(classify_path(Path::new("/card/clip.MP4")), Category::Video);
        assert_eq!(classify_path(Path::new("/card/README")), Category::Unrecognized);
    }

    #[test]
    fn image_and_video_predicates() {
        assert!(Category::Raw.is_image());
        assert!(Category::OtherImage.is_image());
        assert!(!Category::Video.is_image());
        assert!(Category::Video.is_video());
        assert!(!Category::Unrecognized.is_recognized());
    }

    #[test]
    fn only_raw_and_jpg_have_subfolders() {
        assert_eq!(Category::Raw.subfolder(), Some("RAW"));
        assert_eq!(Category::Jpg.subfolder(), Some("JPG"));
        assert_eq!(Category::OtherImage.subfolder(), None);
        assert_eq!(Category::Video.subfolder(), None);
    }
}
