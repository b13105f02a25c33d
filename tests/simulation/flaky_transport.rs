//! Storage transport with random latency and failures

#![allow(dead_code)]

use async_trait::async_trait;
use dashmap::DashMap;
use rand::Rng;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use upload_manager::file::{CandidateFile, CommittedFile};
use upload_manager::progress::ProgressSink;
use upload_manager::transport::{StorageTransport, TransferError, TransferResult};

#[derive(Debug, Clone)]
pub struct FlakyTransportConfig {
    /// Chance that an upload fails (0.0 - 1.0)
    pub upload_failure_rate: f32,
    /// Chance that a delete fails (0.0 - 1.0)
    pub delete_failure_rate: f32,
    pub latency_ms: u64,
    pub jitter_ms: u64,
    /// Number of progress events per upload
    pub progress_steps: u64,
}

impl Default for FlakyTransportConfig {
    fn default() -> Self {
        Self {
            upload_failure_rate: 0.0,
            delete_failure_rate: 0.0,
            latency_ms: 0,
            jitter_ms: 0,
            progress_steps: 4,
        }
    }
}

impl FlakyTransportConfig {
    pub fn reliable() -> Self {
        Self {
            latency_ms: 1,
            jitter_ms: 2,
            ..Default::default()
        }
    }

    pub fn mobile() -> Self {
        Self {
            upload_failure_rate: 0.1,
            delete_failure_rate: 0.1,
            latency_ms: 5,
            jitter_ms: 15,
            ..Default::default()
        }
    }

    pub fn degraded() -> Self {
        Self {
            upload_failure_rate: 0.4,
            delete_failure_rate: 0.3,
            latency_ms: 10,
            jitter_ms: 30,
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TransportStats {
    pub uploads_attempted: u64,
    pub uploads_failed: u64,
    pub deletes_attempted: u64,
    pub deletes_failed: u64,
}

pub struct FlakyTransport {
    config: FlakyTransportConfig,
    objects: DashMap<String, CommittedFile>,
    next_id: AtomicU64,
    uploads_attempted: AtomicU64,
    uploads_failed: AtomicU64,
    deletes_attempted: AtomicU64,
    deletes_failed: AtomicU64,
}

impl FlakyTransport {
    pub fn new(config: FlakyTransportConfig) -> Self {
        Self {
            config,
            objects: DashMap::new(),
            next_id: AtomicU64::new(0),
            uploads_attempted: AtomicU64::new(0),
            uploads_failed: AtomicU64::new(0),
            deletes_attempted: AtomicU64::new(0),
            deletes_failed: AtomicU64::new(0),
        }
    }

    pub fn stored(&self) -> usize {
        self.objects.len()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn stats(&self) -> TransportStats {
        TransportStats {
            uploads_attempted: self.uploads_attempted.load(Ordering::SeqCst),
            uploads_failed: self.uploads_failed.load(Ordering::SeqCst),
            deletes_attempted: self.deletes_attempted.load(Ordering::SeqCst),
            deletes_failed: self.deletes_failed.load(Ordering::SeqCst),
        }
    }

    fn delay(&self) -> Duration {
        let jitter = if self.config.jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.config.jitter_ms)
        } else {
            0
        };
        Duration::from_millis(self.config.latency_ms + jitter)
    }

    fn roll(rate: f32) -> bool {
        rate > 0.0 && rand::thread_rng().gen::<f32>() < rate
    }
}

#[async_trait]
impl StorageTransport for FlakyTransport {
    async fn upload(
        &self,
        file: &CandidateFile,
        _group_tag: Option<&str>,
        progress: ProgressSink,
    ) -> TransferResult<CommittedFile> {
        self.uploads_attempted.fetch_add(1, Ordering::SeqCst);
        let steps = self.config.progress_steps.max(1);
        let fail_at = Self::roll(self.config.upload_failure_rate)
            .then(|| rand::thread_rng().gen_range(0..steps));

        for step in 0..steps {
            tokio::time::sleep(self.delay() / steps as u32).await;
            if fail_at == Some(step) {
                self.uploads_failed.fetch_add(1, Ordering::SeqCst);
                return Err(TransferError::NetworkFailure(format!(
                    "connection dropped at step {step}"
                )));
            }
            progress.report(file.size_bytes * (step + 1) / steps, file.size_bytes);
        }

        let id = format!("flaky-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = CommittedFile::new(
            id.clone(),
            format!("sim://{id}"),
            file.name.clone(),
            file.mime_type.clone(),
            file.size_bytes,
        );
        self.objects.insert(id, record.clone());
        Ok(record)
    }

    async fn delete(&self, id: &str) -> TransferResult<()> {
        self.deletes_attempted.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay()).await;

        if Self::roll(self.config.delete_failure_rate) {
            self.deletes_failed.fetch_add(1, Ordering::SeqCst);
            return Err(TransferError::NetworkFailure("request timed out".into()));
        }
        self.objects
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| TransferError::ServerRejected(format!("no such file: {id}")))
    }
}
