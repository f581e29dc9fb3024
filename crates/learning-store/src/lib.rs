//! Learning Store (spec.md §4.3, §6.2, component C3).
//!
//! An advisory, persistent map from a normalized target key to the last
//! selector that successfully resolved it. The store is consulted before
//! candidate generation and updated after every successful resolution; a
//! stale entry (one that no longer resolves) is an expected condition, not
//! an error — callers fall through to regenerated candidates and overwrite
//! the entry on the next success (§4.3, last paragraph).
//!
//! Consistency model: single-writer. Every mutation serializes under a
//! process-wide lock so concurrent Sessions (C8 fans out many) never race
//! on the backing file; writes land atomically via a tempfile-then-rename
//! (mirrors the teacher's memory-center, but that crate's `fs::write` is
//! not crash-atomic — this store's on-disk contract requires it to be).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use parking_lot::Mutex;
use runner_core_types::ActionKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LearningStoreError {
    #[error("failed to read learning store at {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse learning store at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to persist learning store at {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// One remembered (key → selector) association, spec.md §6.2's on-disk row.
///
/// `extra` catches any field this build doesn't know about (spec.md §6.2,
/// "Unknown fields are preserved on rewrite") so a newer writer's entries
/// round-trip unchanged through an older reader instead of being silently
/// dropped on the next `persist`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LearnedEntry {
    pub selector: String,
    pub target: String,
    pub action: String,
    pub success_count: u64,
    pub first_learned: DateTime<Utc>,
    pub last_used: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl LearnedEntry {
    fn fresh(selector: String, target: String, action: ActionKind) -> Self {
        let now = Utc::now();
        Self {
            selector,
            target,
            action: action.wire_name().to_string(),
            success_count: 1,
            first_learned: now,
            last_used: now,
            extra: serde_json::Map::new(),
        }
    }
}

/// The on-disk schema: normalized key → entry, serialized as a JSON object
/// so the file is reasonably human-diffable (§6.2).
type OnDiskMap = BTreeMap<String, LearnedEntry>;

pub struct LearningStore {
    inner: DashMap<String, LearnedEntry>,
    storage_path: PathBuf,
    write_lock: Mutex<()>,
}

impl LearningStore {
    /// Open (or create) a store backed by `path`. Existing content is
    /// loaded eagerly; a missing file is treated as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LearningStoreError> {
        let storage_path = path.into();
        let store = Self {
            inner: DashMap::new(),
            storage_path,
            write_lock: Mutex::new(()),
        };
        store.load()?;
        Ok(store)
    }

    /// An in-memory-only store, useful for tests and for callers that
    /// persist via `snapshot`/`load` themselves.
    pub fn in_memory() -> Self {
        Self {
            inner: DashMap::new(),
            storage_path: PathBuf::new(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn lookup(&self, key: &str) -> Option<LearnedEntry> {
        self.inner.get(key).map(|e| e.clone())
    }

    /// Upsert `key`'s entry: increments `success_count` and bumps
    /// `last_used` to now. A different `selector` than previously recorded
    /// simply overwrites — the store does not keep history (§4.3).
    pub fn record_success(
        &self,
        key: &str,
        selector: &str,
        target: &str,
        action: ActionKind,
    ) -> Result<(), LearningStoreError> {
        self.inner
            .entry(key.to_string())
            .and_modify(|entry| {
                entry.selector = selector.to_string();
                entry.success_count = entry.success_count.saturating_add(1);
                entry.last_used = Utc::now();
            })
            .or_insert_with(|| {
                LearnedEntry::fresh(selector.to_string(), target.to_string(), action)
            });
        self.persist()
    }

    pub fn forget(&self, key: &str) -> Result<(), LearningStoreError> {
        self.inner.remove(key);
        self.persist()
    }

    pub fn clear_all(&self) -> Result<(), LearningStoreError> {
        self.inner.clear();
        self.persist()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// A point-in-time copy of the whole map.
    pub fn snapshot(&self) -> OnDiskMap {
        self.inner
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect()
    }

    /// Reload from disk, replacing in-memory state. A missing file is not
    /// an error: a fresh installation has no learning history yet.
    pub fn load(&self) -> Result<(), LearningStoreError> {
        if self.storage_path.as_os_str().is_empty() || !self.storage_path.exists() {
            return Ok(());
        }
        let bytes = fs::read(&self.storage_path).map_err(|source| LearningStoreError::Read {
            path: self.storage_path.clone(),
            source,
        })?;
        if bytes.is_empty() {
            return Ok(());
        }
        let map: OnDiskMap =
            serde_json::from_slice(&bytes).map_err(|source| LearningStoreError::Parse {
                path: self.storage_path.clone(),
                source,
            })?;
        self.inner.clear();
        for (key, entry) in map {
            self.inner.insert(key, entry);
        }
        Ok(())
    }

    /// Atomic write: serialize the whole map to a tempfile in the target
    /// directory, then rename over the real path. A no-op for an
    /// in-memory-only store (empty `storage_path`).
    fn persist(&self) -> Result<(), LearningStoreError> {
        if self.storage_path.as_os_str().is_empty() {
            return Ok(());
        }
        let _guard = self.write_lock.lock();
        persist_atomic(&self.storage_path, &self.snapshot())
    }
}

fn persist_atomic(path: &Path, map: &OnDiskMap) -> Result<(), LearningStoreError> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir).map_err(|source| LearningStoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    let json = serde_json::to_vec_pretty(map).expect("LearnedEntry map is always serializable");

    let mut tmp = if let Some(dir) = dir {
        tempfile::NamedTempFile::new_in(dir)
    } else {
        tempfile::NamedTempFile::new()
    }
    .map_err(|source| LearningStoreError::Write {
        path: path.to_path_buf(),
        source,
    })?;

    use std::io::Write;
    tmp.write_all(&json)
        .map_err(|source| LearningStoreError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    tmp.persist(path)
        .map_err(|err| LearningStoreError::Write {
            path: path.to_path_buf(),
            source: err.error,
        })?;
    Ok(())
}
