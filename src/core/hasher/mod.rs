//! # Hasher Module
//!
//! Content digests for duplicate detection and post-copy verification.
//!
//! Files are read fully into memory before hashing. Camera media is bounded
//! in size, and the engine hashes at most two files at a time per worker.

use crate::error::HashError;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fs;
use std::path::Path;

/// A SHA-256 content digest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Digest([u8; 32]);

impl Digest {
    /// Digest of an in-memory buffer
    pub fn of_bytes(bytes: &[u8]) -> Self {
        let mut out = [0u8; 32];
        out.copy_from_slice(&Sha256::digest(bytes));
        Self(out)
    }

    /// Get the raw digest bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Get the digest as a lowercase hexadecimal string
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

impl std::fmt::Display for Digest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Computes content digests of files.
///
/// Implement this trait to swap the algorithm or to observe hashing in tests.
pub trait ContentHasher: Send + Sync {
    fn hash_file(&self, path: &Path) -> Result<Digest, HashError>;
}

/// SHA-256 over the whole file content
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn hash_file(&self, path: &Path) -> Result<Digest, HashError> {
        let bytes = fs::read(path).map_err(|source| HashError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Digest::of_bytes(&bytes))
    }
}

/// Hash a file with the default hasher
pub fn hash_file(path: &Path) -> Result<Digest, HashError> {
    Sha256Hasher.hash_file(path)
}
