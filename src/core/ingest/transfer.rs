//! Copies one file into its destination folder.
//!
//! ```text
//! Pending ──dest exists──▶ PreCheck ──same digest──▶ Skipped
//!    │                        │
//!    │                        └──differs (per collision policy)──┐
//!    ▼                                                           ▼
//! Copying ──────────────────────────────────────────────────▶ Verifying ──▶ Copied
//!    │                                                           │
//!    └──error──▶ Failed ◀───────────────── digests differ ───────┘
//! ```

use super::types::{CollisionPolicy, MismatchPolicy};
use crate::core::hasher::{ContentHasher, Digest};
use crate::error::CopyError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Upper bound on `name_N.ext` candidates tried under [`CollisionPolicy::Rename`]
const MAX_RENAME_ATTEMPTS: u32 = 10_000;

/// Copies file bytes from one path to another.
///
/// Implement this trait to copy through a different mechanism or to inject
/// faults in tests.
pub trait FileCopier: Send + Sync {
    /// Copy `from` to `to`, replacing `to`; returns the bytes written
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;
}

/// Copies with [`std::fs::copy`], which carries permission bits along
#[derive(Debug, Default, Clone, Copy)]
pub struct StdCopier;

impl FileCopier for StdCopier {
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        fs::copy(from, to)
    }
}

/// How a transfer ended when it did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transferred {
    Copied,
    /// An identical file was already there
    Skipped,
}

/// Per-file copy with duplicate detection and verification
pub(crate) struct Transfer<'a> {
    pub hasher: &'a dyn ContentHasher,
    pub copier: &'a dyn FileCopier,
    pub collision: CollisionPolicy,
    pub mismatch: MismatchPolicy,
}

impl Transfer<'_> {
    /// Copy `source` into `target_dir`.
    ///
    /// Returns the destination the file went to (or would have gone to)
    /// alongside the result.
    pub fn run(&self, source: &Path, target_dir: &Path) -> (PathBuf, Result<Transferred, CopyError>) {
        let file_name = source
            .file_name()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("unnamed"));
        let mut destination = target_dir.join(&file_name);

        match self.pre_check(source, &destination) {
            Ok(PreCheck::Free) => {}
            Ok(PreCheck::Identical) => {
                debug!(source = %source.display(), destination = %destination.display(), "Identical file exists, skipping");
                return (destination, Ok(Transferred::Skipped));
            }
            Ok(PreCheck::Differs) => match self.collision {
                CollisionPolicy::Overwrite => {
                    debug!(destination = %destination.display(), "Overwriting different file");
                }
                CollisionPolicy::KeepExisting => {
                    warn!(destination = %destination.display(), "Different file exists, keeping it");
                    let error = CopyError::Collision {
                        destination: destination.clone(),
                    };
                    return (destination, Err(error));
                }
                CollisionPolicy::Rename => match self.free_name(source, target_dir, &file_name) {
                    // An existing candidate already holds this content
                    Ok(Some(renamed)) if renamed.exists() => {
                        return (renamed, Ok(Transferred::Skipped));
                    }
                    Ok(Some(renamed)) => destination = renamed,
                    Ok(None) => {
                        let error = CopyError::Collision {
                            destination: destination.clone(),
                        };
                        return (destination, Err(error));
                    }
                    Err(e) => return (destination, Err(e)),
                },
            },
            Err(e) => return (destination, Err(e)),
        }

        let result = self.copy_and_verify(source, &destination);
        (destination, result)
    }

    fn pre_check(&self, source: &Path, destination: &Path) -> Result<PreCheck, CopyError> {
        if !destination.exists() {
            return Ok(PreCheck::Free);
        }
        let source_digest = self.hasher.hash_file(source)?;
        self.compare(&source_digest, destination)
    }

    fn compare(&self, source_digest: &Digest, destination: &Path) -> Result<PreCheck, CopyError> {
        let existing = self.hasher.hash_file(destination)?;
        Ok(if existing == *source_digest {
            PreCheck::Identical
        } else {
            PreCheck::Differs
        })
    }

    /// First `stem_N.ext` that is free or already holds this content
    fn free_name(
        &self,
        source: &Path,
        target_dir: &Path,
        file_name: &Path,
    ) -> Result<Option<PathBuf>, CopyError> {
        let stem = file_name
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = file_name
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        let source_digest = self.hasher.hash_file(source)?;

        for n in 1..=MAX_RENAME_ATTEMPTS {
            let candidate = target_dir.join(format!("{}_{}{}", stem, n, extension));
            if !candidate.exists() {
                debug!(destination = %candidate.display(), "Renaming to avoid collision");
                return Ok(Some(candidate));
            }
            if self.compare(&source_digest, &candidate)? == PreCheck::Identical {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    fn copy_and_verify(&self, source: &Path, destination: &Path) -> Result<Transferred, CopyError> {
        let bytes = self
            .copier
            .copy(source, destination)
            .map_err(|e| CopyError::Io {
                source_path: source.to_path_buf(),
                destination: destination.to_path_buf(),
                source: e,
            })?;
        debug!(source = %source.display(), bytes, "Copied, verifying");

        let source_digest = self.hasher.hash_file(source)?;
        let copied_digest = self.hasher.hash_file(destination)?;
        if source_digest != copied_digest {
            warn!(
                source = %source.display(),
                destination = %destination.display(),
                "Verification failed"
            );
            if self.mismatch == MismatchPolicy::Remove {
                if let Err(e) = fs::remove_file(destination) {
                    warn!(destination = %destination.display(), error = %e, "Failed to remove bad copy");
                }
            }
            return Err(CopyError::VerifyMismatch {
                source_path: source.to_path_buf(),
                destination: destination.to_path_buf(),
            });
        }

        Ok(Transferred::Copied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PreCheck {
    Free,
    Identical,
    Differs,
}
