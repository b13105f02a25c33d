//! Concurrent deletes against jittery storage

use crate::simulation::{FlakyTransport, FlakyTransportConfig};
use futures::future::join_all;
use std::sync::Arc;
use upload_manager::manager::DeletionState;
use upload_manager::{
    CandidateFile, DeletionError, FileCategory, ManagerConfig, PolicyRegistry, UploadManager,
};

async fn filled_manager(
    config: FlakyTransportConfig,
    files: usize,
) -> (UploadManager, Arc<FlakyTransport>) {
    let transport = Arc::new(FlakyTransport::new(config));
    let manager = UploadManager::new(
        ManagerConfig::default()
            .with_max_files(files)
            .with_category(FileCategory::Document),
        PolicyRegistry::default(),
        transport.clone(),
    );

    let candidates = (0..files)
        .map(|i| CandidateFile::new(format!("report-{i}.txt"), "text/plain", format!("body {i}")))
        .collect();
    let result = manager.submit_batch(candidates).await.unwrap();
    assert_eq!(result.committed.len(), files);

    (manager, transport)
}

/// Hammering one id sends a single request and every caller sees its outcome
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_repeated_delete_single_request() {
    let (manager, transport) = filled_manager(FlakyTransportConfig::reliable(), 3).await;
    let target = manager.snapshot()[1].id.clone();

    let callers = (0..20).map(|_| {
        let manager = manager.clone();
        let target = target.clone();
        async move { manager.delete_file(&target).await }
    });
    let outcomes = join_all(callers).await;

    // Late callers may arrive after removal and see NotFound
    let ok = outcomes.iter().filter(|r| r.is_ok()).count();
    assert!(ok >= 1);
    assert!(outcomes
        .iter()
        .all(|r| matches!(r, Ok(()) | Err(DeletionError::NotFound(_)))));
    assert_eq!(transport.stats().deletes_attempted, 1);
    assert_eq!(manager.snapshot().len(), 2);
    assert_eq!(manager.deletion_state(&target), DeletionState::Absent);
}

/// Every file's committed state matches what the storage confirmed
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_delete_all_under_failures() {
    let config = FlakyTransportConfig {
        delete_failure_rate: 0.3,
        ..FlakyTransportConfig::reliable()
    };
    let (manager, transport) = filled_manager(config, 12).await;
    let ids: Vec<String> = manager.snapshot().into_iter().map(|f| f.id).collect();

    let deletions = ids.iter().map(|id| {
        let manager = manager.clone();
        let id = id.clone();
        async move { (id.clone(), manager.delete_file(&id).await) }
    });
    let outcomes = join_all(deletions).await;

    for (id, outcome) in &outcomes {
        let still_committed = manager.snapshot().iter().any(|f| &f.id == id);
        match outcome {
            Ok(()) => {
                assert!(!still_committed);
                assert!(!transport.contains(id));
            }
            Err(DeletionError::NetworkFailure(_)) => assert!(still_committed),
            Err(other) => panic!("unexpected deletion error: {other}"),
        }
    }
    assert!(manager.pending_deletions().is_empty());
    assert_eq!(manager.snapshot().len(), transport.stored());
}
