//! # Content-Addressed Document Store
//!
//! Certificate documents live off-ledger. The registry only stores their
//! [`ContentRef`]; a [`ContentStore`] maps bytes to a reference and back.
//! References produced here are the lowercase hex SHA-256 of the bytes.
//!
//! ## Integrity Invariant
//!
//! [`FsContentStore`] names each blob by its digest and recomputes the
//! digest on every read. A blob whose bytes no longer match its name is
//! reported as an integrity violation, never returned.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use certreg_core::{sha256_raw, ContentDigest, ContentRef};
use parking_lot::RwLock;

/// Content store errors.
#[derive(Debug, thiserror::Error)]
pub enum ContentStoreError {
    #[error("content store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Stored bytes hash to something other than their reference.
    #[error("integrity violation: blob {reference} hashes to {actual}")]
    Integrity {
        reference: ContentRef,
        actual: String,
    },
}

/// Opaque content-addressing service.
pub trait ContentStore: Send + Sync {
    /// Store `bytes` and return their reference. Storing the same bytes
    /// twice returns the same reference.
    fn put(&self, bytes: &[u8]) -> Result<ContentRef, ContentStoreError>;

    /// Bytes for `reference`, or `None` if this store does not hold them.
    fn get(&self, reference: &ContentRef) -> Result<Option<Vec<u8>>, ContentStoreError>;

    fn contains(&self, reference: &ContentRef) -> Result<bool, ContentStoreError> {
        Ok(self.get(reference)?.is_some())
    }
}

/// Reference for `bytes`, without storing them.
pub fn content_ref_for(bytes: &[u8]) -> ContentRef {
    ContentRef::from_digest(&sha256_raw(bytes))
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MemoryContentStore {
    blobs: RwLock<HashMap<ContentRef, Vec<u8>>>,
}

impl MemoryContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.blobs.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.read().is_empty()
    }
}

impl ContentStore for MemoryContentStore {
    fn put(&self, bytes: &[u8]) -> Result<ContentRef, ContentStoreError> {
        let reference = content_ref_for(bytes);
        self.blobs
            .write()
            .entry(reference.clone())
            .or_insert_with(|| bytes.to_vec());
        Ok(reference)
    }

    fn get(&self, reference: &ContentRef) -> Result<Option<Vec<u8>>, ContentStoreError> {
        Ok(self.blobs.read().get(reference).cloned())
    }
}

// ---------------------------------------------------------------------------
// Filesystem
// ---------------------------------------------------------------------------

/// Blobs stored at `{root}/{digest_hex}.bin`.
#[derive(Debug, Clone)]
pub struct FsContentStore {
    root: PathBuf,
}

impl FsContentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, digest: &ContentDigest) -> PathBuf {
        self.root.join(format!("{}.bin", digest.to_hex()))
    }
}

impl ContentStore for FsContentStore {
    fn put(&self, bytes: &[u8]) -> Result<ContentRef, ContentStoreError> {
        let digest = sha256_raw(bytes);
        fs::create_dir_all(&self.root)?;
        let path = self.path_for(&digest);
        // Create-if-absent: an existing file with this name holds the same bytes.
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut f) => {
                use std::io::Write;
                f.write_all(bytes)?;
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => return Err(e.into()),
        }
        tracing::debug!(path = %path.display(), size = bytes.len(), "stored document blob");
        Ok(ContentRef::from_digest(&digest))
    }

    fn get(&self, reference: &ContentRef) -> Result<Option<Vec<u8>>, ContentStoreError> {
        // References not shaped like our digests were minted elsewhere.
        let Ok(digest) = ContentDigest::from_hex(reference.as_str()) else {
            return Ok(None);
        };
        let path = self.path_for(&digest);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let actual = sha256_raw(&bytes);
        if actual != digest {
            return Err(ContentStoreError::Integrity {
                reference: reference.clone(),
                actual: actual.to_hex(),
            });
        }
        Ok(Some(bytes))
    }
}
