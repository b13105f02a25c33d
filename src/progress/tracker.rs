use crate::file::LocalId;
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Per-upload progress in whole percent (0-100).
///
/// Cloning is cheap and shares the underlying map.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    entries: Arc<DashMap<LocalId, u8>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new upload at 0%
    pub fn begin(&self, local_id: LocalId) {
        self.entries.insert(local_id, 0);
    }

    /// Record progress for a registered upload.
    ///
    /// Unknown ids are ignored so that a late event from a finished transfer
    /// cannot bring its entry back. Values never go backwards and are capped at 100.
    pub fn update(&self, local_id: LocalId, percent: u8) {
        if let Some(mut entry) = self.entries.get_mut(&local_id) {
            let percent = percent.min(100);
            if percent > *entry {
                *entry = percent;
                tracing::debug!(%local_id, percent, "upload progress");
            }
        }
    }

    pub fn clear(&self, local_id: LocalId) {
        self.entries.remove(&local_id);
    }

    pub fn clear_all(&self) {
        self.entries.clear();
    }

    pub fn get(&self, local_id: LocalId) -> Option<u8> {
        self.entries.get(&local_id).map(|e| *e.value())
    }

    pub fn snapshot(&self) -> HashMap<LocalId, u8> {
        self.entries
            .iter()
            .map(|e| (*e.key(), *e.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
