//! Concurrent multi-file upload manager.
//!
//! Candidates are validated against a per-category policy, uploaded
//! concurrently through a [`transport::StorageTransport`], and merged into a
//! capacity-bounded list of committed files that callers render from.

pub mod api;
pub mod file;
pub mod manager;
pub mod metrics;
pub mod policy;
pub mod progress;
pub mod store;
pub mod transport;

pub use file::{CandidateFile, CommittedFile, LocalId};
pub use manager::{
    BatchRejected, BatchResult, DeletionError, FailedUpload, FailureReason, ManagerConfig,
    UploadManager,
};
pub use policy::{FileCategory, PolicyRegistry, UploadPolicy};
pub use transport::{HttpTransport, StorageTransport, TransferError, TransportConfig};
