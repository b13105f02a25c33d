use crate::file::{CommittedFile, LocalId};
use crate::manager::error::DeletionResult;
use crate::manager::state_machine::DeletionState;
use crate::manager::types::{ManagerConfig, UploadTask};
use crate::policy::{FileCategory, PolicyRegistry, Validator};
use crate::progress::ProgressTracker;
use crate::store::CommitStore;
use crate::transport::StorageTransport;
use dashmap::DashMap;
use futures::future::{BoxFuture, Shared};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;

pub(crate) type SharedDeletion = Shared<BoxFuture<'static, DeletionResult<()>>>;

/// Client-side manager for a capacity-bounded set of uploaded files.
///
/// Cloning yields another handle onto the same state, so one clone can run
/// a batch while another deletes files.
pub struct UploadManager {
    pub(crate) category: FileCategory,
    pub(crate) group_tag: Option<Arc<str>>,
    pub(crate) validator: Validator,
    pub(crate) transport: Arc<dyn StorageTransport>,
    pub(crate) store: CommitStore,
    pub(crate) tracker: ProgressTracker,

    // Transfers of the running batch
    pub(crate) in_flight: Arc<DashMap<LocalId, UploadTask>>,

    // Single-flight guard for batches
    pub(crate) batch_active: Arc<AtomicBool>,
    pub(crate) disabled: Arc<AtomicBool>,

    // Deletions awaiting server confirmation, keyed by file id
    pub(crate) pending_deletions: Arc<DashMap<String, SharedDeletion>>,
}

impl UploadManager {
    pub fn new(
        config: ManagerConfig,
        registry: PolicyRegistry,
        transport: Arc<dyn StorageTransport>,
    ) -> Self {
        crate::metrics::init_metrics();

        let store = CommitStore::new(config.max_files, config.initial_committed);
        tracing::info!(
            capacity = store.capacity(),
            committed = store.len(),
            category = %config.category,
            "upload manager created"
        );

        Self {
            category: config.category,
            group_tag: config.group_tag.map(Arc::from),
            validator: Validator::new(Arc::new(registry)),
            transport,
            store,
            tracker: ProgressTracker::new(),
            in_flight: Arc::new(DashMap::new()),
            batch_active: Arc::new(AtomicBool::new(false)),
            disabled: Arc::new(AtomicBool::new(config.disabled)),
            pending_deletions: Arc::new(DashMap::new()),
        }
    }

    pub fn category(&self) -> FileCategory {
        self.category
    }

    pub fn capacity(&self) -> usize {
        self.store.capacity()
    }

    pub fn remaining_capacity(&self) -> usize {
        self.store.remaining_capacity()
    }

    /// Current committed files, in insertion order
    pub fn snapshot(&self) -> Vec<CommittedFile> {
        self.store.snapshot()
    }

    /// Receive the committed list after every merge or removal
    pub fn subscribe(&self) -> watch::Receiver<Vec<CommittedFile>> {
        self.store.subscribe()
    }

    pub fn is_batch_active(&self) -> bool {
        self.batch_active.load(Ordering::Acquire)
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Acquire)
    }

    pub fn set_disabled(&self, disabled: bool) {
        self.disabled.store(disabled, Ordering::Release);
    }

    /// Progress of every tracked upload
    pub fn progress(&self) -> HashMap<LocalId, u8> {
        self.tracker.snapshot()
    }

    pub fn progress_of(&self, local_id: LocalId) -> Option<u8> {
        self.tracker.get(local_id)
    }

    /// Transfers of the running batch with their latest progress
    pub fn in_flight(&self) -> Vec<UploadTask> {
        self.in_flight
            .iter()
            .map(|entry| {
                let mut task = entry.value().clone();
                if let Some(percent) = self.tracker.get(task.local_id) {
                    task.progress_percent = percent;
                }
                task
            })
            .collect()
    }

    pub fn pending_deletions(&self) -> Vec<String> {
        self.pending_deletions
            .iter()
            .map(|e| e.key().clone())
            .collect()
    }

    pub fn deletion_state(&self, id: &str) -> DeletionState {
        if self.pending_deletions.contains_key(id) {
            DeletionState::Deleting
        } else if self.store.contains(id) {
            DeletionState::Present
        } else {
            DeletionState::Absent
        }
    }

    /// Forget in-flight bookkeeping and progress without touching the
    /// network or the committed list.
    ///
    /// Transfers already running keep going; their late progress events are
    /// ignored and their results are still merged when the batch joins.
    pub fn reset(&self) {
        let dropped = self.in_flight.len();
        self.in_flight.clear();
        self.tracker.clear_all();
        crate::metrics::set_in_flight(0);
        tracing::info!(dropped, "upload manager reset");
    }
}

impl Clone for UploadManager {
    fn clone(&self) -> Self {
        Self {
            category: self.category,
            group_tag: self.group_tag.clone(),
            validator: self.validator.clone(),
            transport: self.transport.clone(),
            store: self.store.clone(),
            tracker: self.tracker.clone(),
            in_flight: self.in_flight.clone(),
            batch_active: self.batch_active.clone(),
            disabled: self.disabled.clone(),
            pending_deletions: self.pending_deletions.clone(),
        }
    }
}
