use crate::file::CommittedFile;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::watch;

/// Result of merging freshly committed records into the store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Records appended, in the order given
    pub added: Vec<CommittedFile>,
    /// Ids already present, skipped
    pub duplicates: Vec<String>,
    /// Records refused because the store was full
    pub overflow: Vec<CommittedFile>,
}

impl MergeOutcome {
    pub fn changed(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Ordered, capacity-bounded list of server-confirmed files.
///
/// Every change is published on a watch channel so callers can re-render
/// from the latest snapshot.
pub struct CommitStore {
    files: Arc<RwLock<Vec<CommittedFile>>>,
    capacity: usize,
    changes: Arc<watch::Sender<Vec<CommittedFile>>>,
}

impl CommitStore {
    /// Create a store seeded with pre-existing files.
    ///
    /// Duplicate ids and anything past `capacity` are dropped.
    pub fn new(capacity: usize, initial: Vec<CommittedFile>) -> Self {
        let capacity = capacity.max(1);
        let mut seen = HashSet::new();
        let mut files = Vec::with_capacity(capacity.min(initial.len()));

        for file in initial {
            if !seen.insert(file.id.clone()) {
                tracing::warn!(file_id = %file.id, "duplicate initial file ignored");
                continue;
            }
            if files.len() >= capacity {
                tracing::warn!(file_id = %file.id, capacity, "initial file exceeds capacity, ignored");
                continue;
            }
            files.push(file);
        }

        let (tx, _rx) = watch::channel(files.clone());

        Self {
            files: Arc::new(RwLock::new(files)),
            capacity,
            changes: Arc::new(tx),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.capacity.saturating_sub(self.len())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.files.read().iter().any(|f| f.id == id)
    }

    pub fn get(&self, id: &str) -> Option<CommittedFile> {
        self.files.read().iter().find(|f| f.id == id).cloned()
    }

    pub fn snapshot(&self) -> Vec<CommittedFile> {
        self.files.read().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<CommittedFile>> {
        self.changes.subscribe()
    }

    /// Append new records, skipping ids already present and never growing
    /// past capacity.
    pub(crate) fn merge(&self, records: Vec<CommittedFile>) -> MergeOutcome {
        let mut outcome = MergeOutcome::default();

        let snapshot = {
            let mut files = self.files.write();
            for record in records {
                if files.iter().any(|f| f.id == record.id) {
                    outcome.duplicates.push(record.id);
                } else if files.len() >= self.capacity {
                    outcome.overflow.push(record);
                } else {
                    files.push(record.clone());
                    outcome.added.push(record);
                }
            }
            outcome.changed().then(|| files.clone())
        };

        if let Some(files) = snapshot {
            self.changes.send_replace(files);
        }
        if !outcome.duplicates.is_empty() {
            tracing::debug!(duplicates = ?outcome.duplicates, "skipped already committed files");
        }

        outcome
    }

    /// Remove a record by id, returning it if it was present.
    pub(crate) fn remove(&self, id: &str) -> Option<CommittedFile> {
        let (removed, snapshot) = {
            let mut files = self.files.write();
            let position = files.iter().position(|f| f.id == id)?;
            let removed = files.remove(position);
            (removed, files.clone())
        };

        self.changes.send_replace(snapshot);
        Some(removed)
    }
}

impl Clone for CommitStore {
    fn clone(&self) -> Self {
        Self {
            files: self.files.clone(),
            capacity: self.capacity,
            changes: self.changes.clone(),
        }
    }
}
