//! # Ledger Backends
//!
//! The durable store behind the registry. A backend receives the committed
//! state and the [`WriteBatch`] about to be applied, and must persist both
//! together or not at all. The registry applies the batch in memory only
//! after [`LedgerBackend::commit`] returns `Ok`, so a failed commit leaves
//! both the durable and the in-memory state untouched.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::state::{LedgerState, WriteBatch};

/// Backend failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("ledger I/O error at {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("ledger serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored state failed its consistency checks.
    #[error("corrupt ledger at {path}: {reason}")]
    Corrupt { path: String, reason: String },

    /// The backend refused the commit.
    #[error("ledger unavailable: {0}")]
    Unavailable(String),
}

/// Durable, atomically updatable ledger.
pub trait LedgerBackend: Send + Sync {
    /// Previously committed state, or `None` for a fresh ledger.
    fn load(&self) -> Result<Option<LedgerState>, StoreError>;

    /// Persist `current` with `batch` applied, atomically.
    fn commit(&self, current: &LedgerState, batch: &WriteBatch) -> Result<(), StoreError>;
}

impl<T: LedgerBackend + ?Sized> LedgerBackend for std::sync::Arc<T> {
    fn load(&self) -> Result<Option<LedgerState>, StoreError> {
        (**self).load()
    }

    fn commit(&self, current: &LedgerState, batch: &WriteBatch) -> Result<(), StoreError> {
        (**self).commit(current, batch)
    }
}

/// Keeps nothing beyond process memory. Counts commits.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    commits: AtomicU64,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful commits.
    pub fn commits(&self) -> u64 {
        self.commits.load(Ordering::Relaxed)
    }
}

impl LedgerBackend for MemoryBackend {
    fn load(&self) -> Result<Option<LedgerState>, StoreError> {
        Ok(None)
    }

    fn commit(&self, _current: &LedgerState, _batch: &WriteBatch) -> Result<(), StoreError> {
        self.commits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

/// Whole-state JSON snapshot on disk.
///
/// Each commit writes the next state to a temporary file private to the
/// writer and renames it over the ledger file, so readers of the path see
/// either the old or the new snapshot.
///
/// Several processes may open the same file. A commit holds the sibling
/// `<ledger>.lock` file for its duration and is a compare-and-swap: it
/// succeeds only if the snapshot on disk still equals the state the
/// registry staged against. A writer whose view went stale gets
/// [`StoreError::Unavailable`] and must reopen the ledger.
#[derive(Debug, Clone)]
pub struct JsonFileBackend {
    path: PathBuf,
}

/// Exclusive hold on a ledger's lock file, released on drop.
struct CommitLock {
    path: PathBuf,
}

impl CommitLock {
    fn acquire(path: PathBuf) -> Result<Self, StoreError> {
        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
        {
            Ok(_) => Ok(Self { path }),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(StoreError::Unavailable(format!(
                    "another writer holds {}; remove it if no writer is running",
                    path.display()
                )))
            }
            Err(source) => Err(StoreError::Io {
                path: path.display().to_string(),
                source,
            }),
        }
    }
}

impl Drop for CommitLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to release ledger lock");
        }
    }
}

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

impl JsonFileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.display().to_string(),
            source,
        }
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "ledger.json".into());
        name.push(suffix);
        self.path.with_file_name(name)
    }

    /// Lock file guarding commits to this ledger.
    pub fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    fn temp_path(&self) -> PathBuf {
        let n = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        self.sibling(&format!(".{}.{n}.tmp", std::process::id()))
    }

    fn lock(&self) -> Result<CommitLock, StoreError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        CommitLock::acquire(self.lock_path())
    }

    /// Snapshot as stored, without consistency checks.
    fn read_snapshot(&self) -> Result<Option<LedgerState>, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|e| StoreError::Corrupt {
                path: self.path.display().to_string(),
                reason: e.to_string(),
            })
    }

    fn replace_snapshot(&self, state: &LedgerState) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(state)?;
        let tmp = self.temp_path();
        if let Err(e) = std::fs::write(&tmp, bytes) {
            let _ = std::fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(self.io_error(e));
        }
        Ok(())
    }

    /// Write `state` as the full ledger snapshot, under the commit lock.
    pub fn write_snapshot(&self, state: &LedgerState) -> Result<(), StoreError> {
        let _lock = self.lock()?;
        self.replace_snapshot(state)
    }
}

impl LedgerBackend for JsonFileBackend {
    fn load(&self) -> Result<Option<LedgerState>, StoreError> {
        let Some(state) = self.read_snapshot()? else {
            return Ok(None);
        };
        let corrupt = |reason: String| StoreError::Corrupt {
            path: self.path.display().to_string(),
            reason,
        };
        state.verify_indexes().map_err(&corrupt)?;
        let integrity = state.events().verify_chain();
        if !integrity.chain_valid {
            return Err(corrupt(format!(
                "event chain invalid: {} broken links, {} tampered records",
                integrity.broken_links, integrity.tampered_records
            )));
        }
        tracing::debug!(
            path = %self.path.display(),
            certificates = state.last_id().get(),
            events = state.events().len(),
            "loaded ledger snapshot"
        );
        Ok(Some(state))
    }

    fn commit(&self, current: &LedgerState, batch: &WriteBatch) -> Result<(), StoreError> {
        let _lock = self.lock()?;
        let on_disk = self.read_snapshot()?.unwrap_or_default();
        if on_disk != *current {
            tracing::warn!(
                path = %self.path.display(),
                disk_last_id = on_disk.last_id().get(),
                staged_last_id = current.last_id().get(),
                disk_events = on_disk.events().len(),
                staged_events = current.events().len(),
                "ledger changed on disk since it was loaded"
            );
            return Err(StoreError::Unavailable(format!(
                "{} was changed by another writer; reopen the ledger and retry",
                self.path.display()
            )));
        }
        let mut next = current.clone();
        next.apply(batch);
        self.replace_snapshot(&next)
    }
}
