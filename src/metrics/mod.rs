//! Metrics for upload batches and deletions
//!
//! Exposed through the `metrics` facade; the Prometheus exporter is optional
//! and installed by the storage server binary.
//!
//! Key metrics:
//! - Files submitted, committed and failed (by reason)
//! - Rejected batches, deletions by outcome
//! - Uploads in flight, batch duration

pub mod exporter;
pub mod recorder;

pub use exporter::{metrics_route, render_metrics, start_metrics_server, MetricsConfig, MetricsError};
pub use recorder::{
    init_metrics, record_batch_duration, record_batch_rejected, record_deletion,
    record_file_failed, record_files_committed, record_files_submitted, set_in_flight,
};
