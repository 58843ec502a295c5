use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, info, warn};
use watchkeeper_models::{ReconciledEntry, SyncStatus};

const ENTRIES_FILE: &str = "entries.json";
const STATUS_FILE: &str = "status.json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no watchlist entry with id '{0}'")]
    NotFound(String),

    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Durable home of the reconciled entries and the singleton status record.
///
/// Entries are only ever replaced as a whole; `set_owners` is the single
/// in-place mutation.
pub trait SnapshotStore: Send + Sync {
    /// Current entries ordered by source rank
    fn load_entries(&self) -> Result<Vec<ReconciledEntry>, StoreError>;

    fn replace_entries(&self, entries: &[ReconciledEntry]) -> Result<(), StoreError>;

    /// Replace all entries with a pass result. Owners are taken from the
    /// stored entry with the same id at write time, so edits made while the
    /// pass was running are kept.
    fn replace_entries_keeping_owners(&self, entries: &[ReconciledEntry]) -> Result<(), StoreError>;

    /// Set the owners of one entry and return the updated record
    fn set_owners(&self, id: &str, owners: Vec<String>) -> Result<ReconciledEntry, StoreError>;

    /// `None` until the first pass has recorded an outcome
    fn load_status(&self) -> Result<Option<SyncStatus>, StoreError>;

    fn save_status(&self, status: &SyncStatus) -> Result<(), StoreError>;

    fn clear(&self) -> Result<(), StoreError>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn sorted_by_rank(mut entries: Vec<ReconciledEntry>) -> Vec<ReconciledEntry> {
    entries.sort_by_key(|e| e.rank);
    entries
}

fn with_current_owners(current: &[ReconciledEntry], entries: &[ReconciledEntry]) -> Vec<ReconciledEntry> {
    let owners: HashMap<&str, &Vec<String>> = current.iter().map(|e| (e.id.as_str(), &e.owners)).collect();
    entries
        .iter()
        .map(|entry| {
            let mut entry = entry.clone();
            if let Some(stored) = owners.get(entry.id.as_str()) {
                entry.owners = (*stored).clone();
            }
            entry
        })
        .collect()
}

fn apply_owners(entries: &mut [ReconciledEntry], id: &str, owners: Vec<String>) -> Result<ReconciledEntry, StoreError> {
    let entry = entries
        .iter_mut()
        .find(|e| e.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    entry.owners = owners;
    Ok(entry.clone())
}

/// JSON files under a snapshot directory
pub struct JsonSnapshotStore {
    dir: PathBuf,
    guard: Mutex<()>,
}

impl JsonSnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            guard: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn entries_path(&self) -> PathBuf {
        self.dir.join(ENTRIES_FILE)
    }

    fn status_path(&self) -> PathBuf {
        self.dir.join(STATUS_FILE)
    }

    fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
        if !path.exists() {
            debug!("Snapshot file {} does not exist", path.display());
            return Ok(None);
        }
        let content = std::fs::read_to_string(path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    /// Write to a sibling temp file, then rename over the target
    fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
        let tmp = path.with_extension("json.tmp");
        let content = serde_json::to_string_pretty(value)?;
        std::fs::write(&tmp, content)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    fn read_entries(&self) -> Result<Vec<ReconciledEntry>, StoreError> {
        let path = self.entries_path();
        match Self::read_json::<Vec<ReconciledEntry>>(&path) {
            Ok(entries) => Ok(entries.unwrap_or_default()),
            Err(StoreError::Serialization(e)) => {
                warn!("Snapshot corruption detected in {}: {}. Treating as empty.", path.display(), e);
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }
}

impl SnapshotStore for JsonSnapshotStore {
    fn load_entries(&self) -> Result<Vec<ReconciledEntry>, StoreError> {
        let _guard = lock(&self.guard);
        self.read_entries().map(sorted_by_rank)
    }

    fn replace_entries(&self, entries: &[ReconciledEntry]) -> Result<(), StoreError> {
        let _guard = lock(&self.guard);
        Self::write_json(&self.entries_path(), entries)?;
        debug!("Snapshot replaced with {} entries", entries.len());
        Ok(())
    }

    fn replace_entries_keeping_owners(&self, entries: &[ReconciledEntry]) -> Result<(), StoreError> {
        let _guard = lock(&self.guard);
        let merged = with_current_owners(&self.read_entries()?, entries);
        Self::write_json(&self.entries_path(), &merged)?;
        debug!("Snapshot replaced with {} entries", merged.len());
        Ok(())
    }

    fn set_owners(&self, id: &str, owners: Vec<String>) -> Result<ReconciledEntry, StoreError> {
        let _guard = lock(&self.guard);
        let mut entries = self.read_entries()?;
        let updated = apply_owners(&mut entries, id, owners)?;
        Self::write_json(&self.entries_path(), &entries)?;
        Ok(updated)
    }

    fn load_status(&self) -> Result<Option<SyncStatus>, StoreError> {
        let _guard = lock(&self.guard);
        Self::read_json(&self.status_path())
    }

    fn save_status(&self, status: &SyncStatus) -> Result<(), StoreError> {
        let _guard = lock(&self.guard);
        Self::write_json(&self.status_path(), status)
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = lock(&self.guard);
        for path in [self.entries_path(), self.status_path()] {
            if path.exists() {
                std::fs::remove_file(&path)?;
            }
        }
        info!("Cleared snapshot at {}", self.dir.display());
        Ok(())
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: Vec<ReconciledEntry>,
    status: Option<SyncStatus>,
}

/// In-process store for dry runs and tests
#[derive(Debug, Default)]
pub struct MemorySnapshotStore {
    state: Mutex<MemoryState>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing snapshot, e.g. one read from disk
    pub fn seeded(entries: Vec<ReconciledEntry>, status: Option<SyncStatus>) -> Self {
        Self {
            state: Mutex::new(MemoryState { entries, status }),
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn load_entries(&self) -> Result<Vec<ReconciledEntry>, StoreError> {
        Ok(sorted_by_rank(lock(&self.state).entries.clone()))
    }

    fn replace_entries(&self, entries: &[ReconciledEntry]) -> Result<(), StoreError> {
        lock(&self.state).entries = entries.to_vec();
        Ok(())
    }

    fn replace_entries_keeping_owners(&self, entries: &[ReconciledEntry]) -> Result<(), StoreError> {
        let mut state = lock(&self.state);
        let merged = with_current_owners(&state.entries, entries);
        state.entries = merged;
        Ok(())
    }

    fn set_owners(&self, id: &str, owners: Vec<String>) -> Result<ReconciledEntry, StoreError> {
        apply_owners(&mut lock(&self.state).entries, id, owners)
    }

    fn load_status(&self) -> Result<Option<SyncStatus>, StoreError> {
        Ok(lock(&self.state).status.clone())
    }

    fn save_status(&self, status: &SyncStatus) -> Result<(), StoreError> {
        lock(&self.state).status = Some(status.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *lock(&self.state) = MemoryState::default();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use watchkeeper_models::{MediaKind, RATING_UNKNOWN};

    fn entry(id: &str, rank: usize) -> ReconciledEntry {
        ReconciledEntry {
            id: id.to_string(),
            title: id.to_uppercase(),
            alternate_title: None,
            year: Some(2021),
            kind: MediaKind::Series,
            artwork_url: None,
            reference_url: String::new(),
            available: false,
            locations: Vec::new(),
            rating: RATING_UNKNOWN.to_string(),
            first_seen_at: 0,
            owners: Vec::new(),
            rank,
        }
    }

    #[test]
    fn test_json_store_round_trip_orders_by_rank() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path().join("snapshot")).unwrap();

        assert!(store.load_entries().unwrap().is_empty());
        store.replace_entries(&[entry("b", 1), entry("a", 0)]).unwrap();

        let ids: Vec<String> = store.load_entries().unwrap().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);
        assert!(!dir.path().join("snapshot/entries.json.tmp").exists());
    }

    #[test]
    fn test_json_store_replace_is_wholesale() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path()).unwrap();

        store.replace_entries(&[entry("a", 0), entry("b", 1)]).unwrap();
        store.replace_entries(&[entry("c", 0)]).unwrap();

        let entries = store.load_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, "c");
    }

    #[test]
    fn test_set_owners() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path()).unwrap();
        store.replace_entries(&[entry("a", 0)]).unwrap();

        let updated = store.set_owners("a", vec!["Alice".to_string()]).unwrap();
        assert_eq!(updated.owners, vec!["Alice".to_string()]);
        // Setting the same value again is a plain success
        store.set_owners("a", vec!["Alice".to_string()]).unwrap();
        assert_eq!(store.load_entries().unwrap()[0].owners, vec!["Alice".to_string()]);

        let missing = store.set_owners("zzz", vec![]);
        assert!(matches!(missing, Err(StoreError::NotFound(id)) if id == "zzz"));
    }

    #[test]
    fn test_replace_keeping_owners_prefers_stored_owners() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path()).unwrap();
        store.replace_entries(&[entry("a", 0), entry("b", 1)]).unwrap();
        store.set_owners("a", vec!["Alice".to_string()]).unwrap();

        let mut fresh_b = entry("b", 0);
        fresh_b.owners = vec!["Stale".to_string()];
        let mut new_c = entry("c", 1);
        new_c.owners = vec!["Carol".to_string()];
        store
            .replace_entries_keeping_owners(&[entry("a", 2), fresh_b, new_c])
            .unwrap();

        let entries = store.load_entries().unwrap();
        let owners: Vec<(&str, Vec<String>)> = entries.iter().map(|e| (e.id.as_str(), e.owners.clone())).collect();
        assert_eq!(
            owners,
            vec![
                ("b", Vec::new()),
                ("c", vec!["Carol".to_string()]),
                ("a", vec!["Alice".to_string()]),
            ]
        );
    }

    #[test]
    fn test_memory_replace_keeping_owners() {
        let store = MemorySnapshotStore::seeded(vec![entry("a", 0)], None);
        store.set_owners("a", vec!["Alice".to_string()]).unwrap();

        store.replace_entries_keeping_owners(&[entry("a", 0)]).unwrap();
        assert_eq!(store.load_entries().unwrap()[0].owners, vec!["Alice".to_string()]);
    }

    #[test]
    fn test_corrupt_entries_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("entries.json"), "{not json").unwrap();
        let store = JsonSnapshotStore::new(dir.path()).unwrap();
        assert!(store.load_entries().unwrap().is_empty());
    }

    #[test]
    fn test_status_never_run_then_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSnapshotStore::new(dir.path()).unwrap();
        assert!(store.load_status().unwrap().is_none());

        store.save_status(&SyncStatus::error("Navidad", "boom")).unwrap();
        let status = store.load_status().unwrap().unwrap();
        assert!(!status.is_success());

        store.clear().unwrap();
        assert!(store.load_status().unwrap().is_none());
        assert!(store.load_entries().unwrap().is_empty());
    }

    #[test]
    fn test_memory_store_contract() {
        let store = MemorySnapshotStore::seeded(vec![entry("b", 1), entry("a", 0)], None);
        assert_eq!(store.load_entries().unwrap()[0].id, "a");

        store.set_owners("b", vec!["Bob".to_string()]).unwrap();
        assert!(matches!(store.set_owners("x", vec![]), Err(StoreError::NotFound(_))));

        store.save_status(&SyncStatus::success("Navidad", 2, 0, 0)).unwrap();
        assert!(store.load_status().unwrap().unwrap().is_success());

        store.clear().unwrap();
        assert!(store.load_entries().unwrap().is_empty());
        assert!(store.load_status().unwrap().is_none());
    }
}
