//! Many batches against jittery, failing storage
//!
//! Checks the capacity and single-flight invariants hold whatever the
//! network does.

use crate::simulation::{FlakyTransport, FlakyTransportConfig};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use upload_manager::{
    BatchRejected, CandidateFile, FailureReason, FileCategory, ManagerConfig, PolicyRegistry,
    UploadManager,
};

fn batch(prefix: &str, count: usize) -> Vec<CandidateFile> {
    (0..count)
        .map(|i| CandidateFile::new(format!("{prefix}-{i}.jpg"), "image/jpeg", vec![i as u8; 4096]))
        .collect()
}

fn manager(capacity: usize, transport: Arc<FlakyTransport>) -> UploadManager {
    UploadManager::new(
        ManagerConfig::default()
            .with_max_files(capacity)
            .with_category(FileCategory::Image),
        PolicyRegistry::default(),
        transport,
    )
}

async fn fill_until_full(config: FlakyTransportConfig, capacity: usize) {
    let transport = Arc::new(FlakyTransport::new(config));
    let manager = manager(capacity, transport.clone());
    let start = Instant::now();

    let mut rounds = 0;
    while manager.remaining_capacity() > 0 && rounds < 50 {
        rounds += 1;
        let submitted = batch(&format!("round{rounds}"), 6);
        let ids: HashSet<_> = submitted.iter().map(|f| f.local_id).collect();
        let result = manager.submit_batch(submitted).await.unwrap();

        // Every candidate is accounted for exactly once
        assert_eq!(result.committed.len() + result.failed.len(), 6);
        assert!(result.failed.iter().all(|f| ids.contains(&f.local_id)));
        assert!(manager.snapshot().len() <= capacity);
        assert!(manager.in_flight().is_empty());
        assert!(!manager.is_batch_active());
    }

    let stats = transport.stats();
    println!(
        "capacity {capacity}: {rounds} rounds, {} uploads, {} failed, {:?}",
        stats.uploads_attempted,
        stats.uploads_failed,
        start.elapsed()
    );

    assert_eq!(manager.snapshot().len(), capacity);
    assert_eq!(transport.stored(), capacity);
    let unique: HashSet<_> = manager.snapshot().into_iter().map(|f| f.id).collect();
    assert_eq!(unique.len(), capacity);
}

#[tokio::test]
async fn test_fill_reliable_storage() {
    fill_until_full(FlakyTransportConfig::reliable(), 20).await;
}

#[tokio::test]
async fn test_fill_mobile_storage() {
    fill_until_full(FlakyTransportConfig::mobile(), 20).await;
}

#[tokio::test]
async fn test_fill_degraded_storage() {
    fill_until_full(FlakyTransportConfig::degraded(), 10).await;
}

/// Clones racing to submit: exactly the winners of the flag run
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submitters_single_flight() {
    let transport = Arc::new(FlakyTransport::new(FlakyTransportConfig::mobile()));
    let manager = manager(100, transport.clone());

    let mut handles = Vec::new();
    for worker in 0..16 {
        let manager = manager.clone();
        handles.push(tokio::spawn(async move {
            manager.submit_batch(batch(&format!("w{worker}"), 3)).await
        }));
    }

    let mut accepted = 0;
    let mut busy = 0;
    let mut committed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(result) => {
                accepted += 1;
                committed += result.committed.len();
                assert!(result
                    .failed
                    .iter()
                    .all(|f| matches!(f.reason, FailureReason::Transfer(_))));
            }
            Err(BatchRejected::Busy) => busy += 1,
            Err(other) => panic!("unexpected rejection: {other}"),
        }
    }

    println!("accepted {accepted}, busy {busy}, committed {committed}");
    assert!(accepted >= 1);
    assert_eq!(accepted + busy, 16);
    assert_eq!(manager.snapshot().len(), committed);
    assert!(!manager.is_batch_active());
}
