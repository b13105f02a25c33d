mod deletion;
mod error;
mod manager;
mod orchestrator;
mod state_machine;
mod types;

pub use error::{BatchRejected, DeletionError, DeletionResult};
pub use manager::UploadManager;
pub use state_machine::{DeletionEvent, DeletionState};
pub use types::{BatchResult, FailedUpload, FailureReason, ManagerConfig, TaskOutcome, UploadTask};
