use crate::file::{CandidateFile, CommittedFile};
use crate::progress::ProgressSink;
use crate::transport::error::{TransferError, TransferResult};
use crate::transport::StorageTransport;
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;

/// Storage endpoint kept entirely in process, for tests and demos.
///
/// Supports per-file latency, failure injection by file name, and a gate
/// that holds every upload until permits are released.
#[derive(Default)]
pub struct InMemoryTransport {
    objects: DashMap<String, (CommittedFile, Bytes)>,
    next_id: AtomicU64,
    upload_calls: AtomicU64,
    delete_calls: AtomicU64,
    latency: RwLock<HashMap<String, Duration>>,
    failing_uploads: RwLock<HashSet<String>>,
    fail_deletes: AtomicBool,
    delete_latency: RwLock<Duration>,
    gate: Option<Arc<Semaphore>>,
}

impl InMemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold every upload until a permit is added to the returned semaphore
    pub fn gated() -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        let transport = Self {
            gate: Some(gate.clone()),
            ..Self::default()
        };
        (transport, gate)
    }

    pub fn with_latency(self, file_name: &str, latency: Duration) -> Self {
        self.latency.write().insert(file_name.to_string(), latency);
        self
    }

    pub fn with_failing_upload(self, file_name: &str) -> Self {
        self.failing_uploads.write().insert(file_name.to_string());
        self
    }

    pub fn with_delete_latency(self, latency: Duration) -> Self {
        *self.delete_latency.write() = latency;
        self
    }

    pub fn set_fail_deletes(&self, fail: bool) {
        self.fail_deletes.store(fail, Ordering::SeqCst);
    }

    /// Seed an object as if it had been uploaded earlier
    pub fn insert(&self, file: CommittedFile) {
        self.objects.insert(file.id.clone(), (file, Bytes::new()));
    }

    pub fn upload_calls(&self) -> u64 {
        self.upload_calls.load(Ordering::SeqCst)
    }

    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[async_trait]
impl StorageTransport for InMemoryTransport {
    async fn upload(
        &self,
        file: &CandidateFile,
        _group_tag: Option<&str>,
        progress: ProgressSink,
    ) -> TransferResult<CommittedFile> {
        self.upload_calls.fetch_add(1, Ordering::SeqCst);
        progress.report(file.size_bytes / 2, file.size_bytes);

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| TransferError::NetworkFailure(e.to_string()))?
                .forget();
        }
        let latency = self.latency.read().get(&file.name).copied();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing_uploads.read().contains(&file.name) {
            return Err(TransferError::NetworkFailure(format!(
                "connection reset while uploading {}",
                file.name
            )));
        }

        let id = format!("file-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let record = CommittedFile::new(
            id.clone(),
            format!("memory://{id}"),
            file.name.clone(),
            file.mime_type.clone(),
            file.size_bytes,
        );
        self.objects.insert(id, (record.clone(), file.data.clone()));
        progress.report(file.size_bytes, file.size_bytes);

        Ok(record)
    }

    async fn delete(&self, id: &str) -> TransferResult<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        let latency = *self.delete_latency.read();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }

        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(TransferError::NetworkFailure("connection refused".into()));
        }
        match self.objects.remove(id) {
            Some(_) => Ok(()),
            None => Err(TransferError::ServerRejected(format!("no such file: {id}"))),
        }
    }
}
