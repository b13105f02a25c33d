use crate::manager::error::{DeletionError, DeletionResult};
use crate::manager::manager::{SharedDeletion, UploadManager};
use crate::manager::state_machine::{DeletionEvent, DeletionState};
use crate::metrics;
use crate::transport::TransferError;
use dashmap::mapref::entry::Entry;
use futures::FutureExt;

impl UploadManager {
    /// Delete a committed file through the storage endpoint.
    ///
    /// The file stays in the committed list until the server confirms. A
    /// second call for an id that is already being deleted sends nothing and
    /// resolves with the outcome of the first.
    pub async fn delete_file(&self, id: &str) -> DeletionResult<()> {
        let deletion = {
            let entry = self.pending_deletions.entry(id.to_string());
            let current = match &entry {
                Entry::Occupied(_) => DeletionState::Deleting,
                Entry::Vacant(_) if self.store.contains(id) => DeletionState::Present,
                Entry::Vacant(_) => DeletionState::Absent,
            };

            match (current.transition(id, DeletionEvent::Begin), entry) {
                (Ok(_), Entry::Vacant(slot)) => {
                    let deletion = self.launch_deletion(id.to_string());
                    slot.insert(deletion.clone());
                    deletion
                }
                (Ok(_), Entry::Occupied(existing))
                | (Err(DeletionError::AlreadyDeleting(_)), Entry::Occupied(existing)) => {
                    tracing::debug!(file_id = %id, "joining deletion already in flight");
                    metrics::record_deletion("joined");
                    existing.get().clone()
                }
                (Err(e), _) => {
                    tracing::warn!(file_id = %id, error = %e, "deletion refused");
                    metrics::record_deletion("not_found");
                    return Err(e);
                }
            }
        };

        deletion.await
    }

    // Runs on its own task so that a caller dropping its future cannot leave
    // the id stuck in `pending_deletions`.
    fn launch_deletion(&self, id: String) -> SharedDeletion {
        let transport = self.transport.clone();
        let store = self.store.clone();
        let pending = self.pending_deletions.clone();

        let handle = tokio::spawn(async move {
            tracing::info!(file_id = %id, "deleting file");
            let result = transport.delete(&id).await;

            let event = if result.is_ok() {
                DeletionEvent::Confirmed
            } else {
                DeletionEvent::Failed
            };
            let removed = matches!(
                DeletionState::Deleting.transition(&id, event),
                Ok(state) if state.is_terminal()
            );

            // Removing from the store under the pending entry's lock keeps a
            // concurrent delete_file from observing the id in neither place.
            pending.remove_if(&id, |_, _| {
                if removed {
                    store.remove(&id);
                }
                true
            });

            match result {
                Ok(()) => {
                    tracing::info!(file_id = %id, "file deleted");
                    metrics::record_deletion("success");
                    Ok(())
                }
                Err(e) => {
                    tracing::warn!(file_id = %id, error = %e, "delete request failed, file kept");
                    metrics::record_deletion("failure");
                    Err(DeletionError::from(e))
                }
            }
        });

        async move {
            handle.await.unwrap_or_else(|e| {
                Err(DeletionError::NetworkFailure(TransferError::NetworkFailure(
                    format!("deletion task aborted: {e}"),
                )))
            })
        }
        .boxed()
        .shared()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::CommittedFile;
    use crate::manager::ManagerConfig;
    use crate::policy::PolicyRegistry;
    use crate::transport::InMemoryTransport;
    use std::sync::Arc;
    use std::time::Duration;

    fn setup(transport: InMemoryTransport) -> (UploadManager, Arc<InMemoryTransport>) {
        let files: Vec<CommittedFile> = ["a", "b"]
            .iter()
            .map(|id| CommittedFile::new(*id, format!("memory://{id}"), *id, "image/png", 1))
            .collect();
        for file in &files {
            transport.insert(file.clone());
        }

        let transport = Arc::new(transport);
        let config = ManagerConfig::default()
            .with_max_files(3)
            .with_initial(files);
        let manager = UploadManager::new(config, PolicyRegistry::default(), transport.clone());
        (manager, transport)
    }

    #[tokio::test]
    async fn test_delete_removes_on_success() {
        let (manager, transport) = setup(InMemoryTransport::new());

        manager.delete_file("a").await.unwrap();

        let ids: Vec<_> = manager.snapshot().into_iter().map(|f| f.id).collect();
        assert_eq!(ids, vec!["b"]);
        assert!(!transport.contains("a"));
        assert!(manager.pending_deletions().is_empty());
        assert_eq!(manager.deletion_state("a"), DeletionState::Absent);
    }

    #[tokio::test]
    async fn test_delete_unknown_is_not_found() {
        let (manager, transport) = setup(InMemoryTransport::new());
        let before = manager.snapshot();

        let result = manager.delete_file("missing").await;

        assert_eq!(result, Err(DeletionError::NotFound("missing".into())));
        assert_eq!(manager.snapshot(), before);
        assert_eq!(transport.delete_calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_file() {
        let (manager, transport) = setup(InMemoryTransport::new());
        transport.set_fail_deletes(true);

        let result = manager.delete_file("a").await;

        assert!(matches!(result, Err(DeletionError::NetworkFailure(_))));
        assert!(manager.snapshot().iter().any(|f| f.id == "a"));
        assert!(manager.pending_deletions().is_empty());
        assert_eq!(manager.deletion_state("a"), DeletionState::Present);
    }

    #[tokio::test]
    async fn test_concurrent_deletes_send_one_request() {
        let (manager, transport) =
            setup(InMemoryTransport::new().with_delete_latency(Duration::from_millis(30)));

        let (first, second) = tokio::join!(manager.delete_file("a"), manager.delete_file("a"));

        assert!(first.is_ok());
        assert!(second.is_ok());
        assert_eq!(transport.delete_calls(), 1);
        assert_eq!(manager.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn test_state_is_deleting_while_pending() {
        let (manager, _transport) =
            setup(InMemoryTransport::new().with_delete_latency(Duration::from_millis(50)));

        let running = tokio::spawn({
            let manager = manager.clone();
            async move { manager.delete_file("a").await }
        });
        while manager.pending_deletions().is_empty() {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }

        assert_eq!(manager.deletion_state("a"), DeletionState::Deleting);
        assert!(manager.snapshot().iter().any(|f| f.id == "a"));

        running.await.unwrap().unwrap();
        assert_eq!(manager.deletion_state("a"), DeletionState::Absent);
    }

    #[tokio::test]
    async fn test_dropped_caller_still_completes_deletion() {
        let (manager, transport) =
            setup(InMemoryTransport::new().with_delete_latency(Duration::from_millis(20)));

        let abandoned = tokio::time::timeout(Duration::from_millis(1), manager.delete_file("a")).await;
        assert!(abandoned.is_err());

        while !manager.pending_deletions().is_empty() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(!manager.snapshot().iter().any(|f| f.id == "a"));
        assert_eq!(transport.delete_calls(), 1);
    }
}
