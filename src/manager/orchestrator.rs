use crate::file::{CandidateFile, CommittedFile, LocalId};
use crate::manager::error::BatchRejected;
use crate::manager::manager::UploadManager;
use crate::manager::types::{BatchResult, FailedUpload, FailureReason, TaskOutcome, UploadTask};
use crate::metrics;
use crate::policy::{FileCategory, Validation};
use crate::progress::{ProgressSink, ProgressTracker};
use crate::transport::TransferResult;
use dashmap::DashMap;
use futures::stream::{FuturesUnordered, StreamExt};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Releases the single-flight flag and drops in-flight bookkeeping when the
/// batch ends, including when its future is dropped mid-way.
struct BatchGuard {
    active: Arc<AtomicBool>,
    in_flight: Arc<DashMap<LocalId, UploadTask>>,
    tracker: ProgressTracker,
    launched: Vec<LocalId>,
}

impl BatchGuard {
    fn acquire(manager: &UploadManager) -> Result<Self, BatchRejected> {
        if manager.is_disabled() {
            return Err(BatchRejected::Disabled);
        }
        manager
            .batch_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| BatchRejected::Busy)?;

        Ok(Self {
            active: manager.batch_active.clone(),
            in_flight: manager.in_flight.clone(),
            tracker: manager.tracker.clone(),
            launched: Vec::new(),
        })
    }

    fn launch(&mut self, file: &CandidateFile) {
        self.in_flight.insert(
            file.local_id,
            UploadTask::new(file.local_id, file.name.clone(), file.size_bytes),
        );
        self.tracker.begin(file.local_id);
        self.launched.push(file.local_id);
        metrics::set_in_flight(self.pending());
    }

    /// Settle a task. It keeps its last progress and stays listed until the
    /// batch joins; a task dropped by `reset` is not brought back.
    fn finish(&self, local_id: LocalId, outcome: TaskOutcome) {
        let last = self.tracker.get(local_id);
        if let Some(mut task) = self.in_flight.get_mut(&local_id) {
            task.outcome = outcome;
            task.progress_percent = match outcome {
                TaskOutcome::Success => 100,
                _ => last.unwrap_or(task.progress_percent),
            };
        }
        self.tracker.clear(local_id);
        metrics::set_in_flight(self.pending());
    }

    fn pending(&self) -> usize {
        self.in_flight
            .iter()
            .filter(|task| task.outcome == TaskOutcome::Pending)
            .count()
    }
}

impl Drop for BatchGuard {
    fn drop(&mut self) {
        for local_id in &self.launched {
            self.tracker.clear(*local_id);
            self.in_flight.remove(local_id);
        }
        metrics::set_in_flight(self.pending());
        self.active.store(false, Ordering::Release);
    }
}

impl UploadManager {
    /// Validate and upload a batch using the manager's configured category.
    pub async fn submit_batch(
        &self,
        candidates: Vec<CandidateFile>,
    ) -> Result<BatchResult, BatchRejected> {
        self.submit_batch_as(candidates, self.category).await
    }

    /// Validate and upload a batch against the policy of `category`.
    ///
    /// Candidates beyond the remaining capacity are dropped up front and
    /// reported as `CapacityExceeded`. Accepted files upload concurrently;
    /// the call returns once every transfer has settled. Per-file failures
    /// never fail the batch.
    pub async fn submit_batch_as(
        &self,
        candidates: Vec<CandidateFile>,
        category: FileCategory,
    ) -> Result<BatchResult, BatchRejected> {
        let mut guard = match BatchGuard::acquire(self) {
            Ok(guard) => guard,
            Err(rejected) => {
                tracing::warn!(%rejected, batch_size = candidates.len(), "upload batch rejected");
                metrics::record_batch_rejected(&rejected);
                return Err(rejected);
            }
        };

        let started = Instant::now();
        let batch_size = candidates.len();
        let remaining = self.store.remaining_capacity();
        metrics::record_files_submitted(batch_size);
        tracing::info!(batch_size, remaining, %category, "upload batch started");

        let mut result = BatchResult::default();

        // In-flight bookkeeping is keyed by local id, so repeats never launch
        let mut seen = HashSet::new();
        let (mut candidates, repeated): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .partition(|file| seen.insert(file.local_id));
        for file in repeated {
            tracing::warn!(local_id = %file.local_id, name = %file.name, "dropped: repeated local id");
            result.failed.push(failure(&file, FailureReason::DuplicateCandidate));
        }

        let dropped = candidates.split_off(remaining.min(candidates.len()));
        for file in dropped {
            tracing::warn!(local_id = %file.local_id, name = %file.name, "dropped: capacity exceeded");
            result.failed.push(failure(&file, FailureReason::CapacityExceeded));
        }

        let mut accepted = Vec::with_capacity(candidates.len());
        for file in candidates {
            match self.validator.validate(&file, category) {
                Validation::Accepted => accepted.push(file),
                Validation::Rejected(reason) => {
                    tracing::warn!(local_id = %file.local_id, name = %file.name, %reason, "rejected by policy");
                    result.failed.push(failure(&file, reason.into()));
                }
            }
        }

        let mut transfers = FuturesUnordered::new();
        for file in accepted {
            guard.launch(&file);
            transfers.push(self.transfer(file));
        }

        // Completion order, not launch order
        let mut arrived = Vec::new();
        let mut origins: HashMap<String, VecDeque<(LocalId, String)>> = HashMap::new();
        while let Some((file, outcome)) = transfers.next().await {
            match outcome {
                Ok(committed) => {
                    guard.finish(file.local_id, TaskOutcome::Success);
                    tracing::debug!(local_id = %file.local_id, file_id = %committed.id, "upload committed");
                    origins
                        .entry(committed.id.clone())
                        .or_default()
                        .push_back((file.local_id, file.name));
                    arrived.push(committed);
                }
                Err(e) => {
                    guard.finish(file.local_id, TaskOutcome::Failure);
                    tracing::warn!(local_id = %file.local_id, name = %file.name, error = %e, "upload failed");
                    result.failed.push(failure(&file, e.into()));
                }
            }
        }

        // Merge keeps arrival order per id, so origins are consumed front first
        let outcome = self.store.merge(arrived);
        for record in &outcome.added {
            take_origin(&mut origins, &record.id, &record.original_name);
        }
        for id in outcome.duplicates {
            tracing::warn!(file_id = %id, "server returned an id that is already committed");
            let (local_id, file_name) = take_origin(&mut origins, &id, &id);
            result.failed.push(FailedUpload {
                local_id,
                file_name,
                reason: FailureReason::AlreadyCommitted(id),
            });
        }
        for record in outcome.overflow {
            tracing::warn!(file_id = %record.id, "committed file does not fit, capacity exceeded");
            let (local_id, file_name) =
                take_origin(&mut origins, &record.id, &record.original_name);
            result.failed.push(FailedUpload {
                local_id,
                file_name,
                reason: FailureReason::CapacityExceeded,
            });
        }
        result.committed = outcome.added;

        for failed in &result.failed {
            metrics::record_file_failed(&failed.reason);
        }
        metrics::record_files_committed(&result.committed);
        metrics::record_batch_duration(started.elapsed());

        drop(guard);
        tracing::info!(
            committed = result.committed.len(),
            failed = result.failed.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "upload batch finished"
        );

        Ok(result)
    }

    async fn transfer(&self, file: CandidateFile) -> (CandidateFile, TransferResult<CommittedFile>) {
        let sink = ProgressSink::new(self.tracker.clone(), file.local_id);
        let outcome = self
            .transport
            .upload(&file, self.group_tag.as_deref(), sink)
            .await;
        (file, outcome)
    }
}

fn take_origin(
    origins: &mut HashMap<String, VecDeque<(LocalId, String)>>,
    id: &str,
    fallback_name: &str,
) -> (LocalId, String) {
    origins
        .get_mut(id)
        .and_then(VecDeque::pop_front)
        .unwrap_or_else(|| (LocalId::new(), fallback_name.to_string()))
}

fn failure(file: &CandidateFile, reason: FailureReason) -> FailedUpload {
    FailedUpload {
        local_id: file.local_id,
        file_name: file.name.clone(),
        reason,
    }
}
