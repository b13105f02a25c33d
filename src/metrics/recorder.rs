//! Metrics recorder for upload manager operations

use crate::file::CommittedFile;
use crate::manager::{BatchRejected, FailureReason};
use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

static METRICS_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Initialize metric descriptions (call once at startup)
pub fn init_metrics() {
    if METRICS_INITIALIZED.swap(true, Ordering::SeqCst) {
        return; // Already initialized
    }

    describe_counter!(
        "upload_files_submitted_total",
        "Total number of candidate files submitted in batches"
    );
    describe_counter!(
        "upload_files_committed_total",
        "Total number of files committed by the storage endpoint"
    );
    describe_counter!(
        "upload_files_failed_total",
        "Total number of files that were dropped, rejected or failed to upload"
    );
    describe_counter!(
        "upload_bytes_committed_total",
        "Total bytes of committed files"
    );
    describe_counter!(
        "upload_batches_rejected_total",
        "Total number of batches refused before starting"
    );
    describe_counter!(
        "upload_deletions_total",
        "Total number of deletion requests by outcome"
    );

    describe_gauge!("upload_in_flight", "Number of uploads currently in flight");

    describe_histogram!(
        "upload_batch_duration_seconds",
        "Time from batch start to join"
    );
}

// ============== Batch Operations ==============

pub fn record_files_submitted(count: usize) {
    counter!("upload_files_submitted_total").increment(count as u64);
}

pub fn record_files_committed(files: &[CommittedFile]) {
    counter!("upload_files_committed_total").increment(files.len() as u64);
    counter!("upload_bytes_committed_total")
        .increment(files.iter().map(|f| f.size_bytes).sum::<u64>());
}

pub fn record_file_failed(reason: &FailureReason) {
    counter!("upload_files_failed_total", "reason" => reason.label()).increment(1);
}

pub fn record_batch_rejected(rejected: &BatchRejected) {
    let reason = match rejected {
        BatchRejected::Busy => "busy",
        BatchRejected::Disabled => "disabled",
    };
    counter!("upload_batches_rejected_total", "reason" => reason).increment(1);
}

pub fn record_batch_duration(duration: Duration) {
    histogram!("upload_batch_duration_seconds").record(duration.as_secs_f64());
}

pub fn set_in_flight(count: usize) {
    gauge!("upload_in_flight").set(count as f64);
}

// ============== Deletions ==============

pub fn record_deletion(outcome: &'static str) {
    counter!("upload_deletions_total", "outcome" => outcome).increment(1);
}
