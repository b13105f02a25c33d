use crate::file::{CommittedFile, LocalId};
use crate::policy::{FileCategory, ValidationError};
use crate::transport::TransferError;
use serde::Serialize;
use thiserror::Error;

/// Caller-supplied settings for one manager instance.
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Maximum number of committed files; clamped to at least 1
    pub max_files: usize,
    pub category: FileCategory,
    pub initial_committed: Vec<CommittedFile>,
    pub disabled: bool,
    /// Optional grouping tag sent along with every upload
    pub group_tag: Option<String>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            max_files: 1,
            category: FileCategory::Document,
            initial_committed: Vec::new(),
            disabled: false,
            group_tag: None,
        }
    }
}

impl ManagerConfig {
    pub fn with_max_files(mut self, max_files: usize) -> Self {
        self.max_files = max_files;
        self
    }

    pub fn with_category(mut self, category: FileCategory) -> Self {
        self.category = category;
        self
    }

    pub fn with_initial(mut self, files: Vec<CommittedFile>) -> Self {
        self.initial_committed = files;
        self
    }

    pub fn with_group_tag(mut self, tag: impl Into<String>) -> Self {
        self.group_tag = Some(tag.into());
        self
    }

    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub enum TaskOutcome {
    Pending,
    Success,
    Failure,
}

/// A transfer of the running batch. It stays listed with its settled
/// outcome until the whole batch joins.
#[derive(Debug, Clone, Serialize)]
pub struct UploadTask {
    pub local_id: LocalId,
    pub file_name: String,
    pub size_bytes: u64,
    pub progress_percent: u8,
    pub outcome: TaskOutcome,
    pub started_at: i64,
}

impl UploadTask {
    pub fn new(local_id: LocalId, file_name: String, size_bytes: u64) -> Self {
        Self {
            local_id,
            file_name,
            size_bytes,
            progress_percent: 0,
            outcome: TaskOutcome::Pending,
            started_at: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    #[error("{0}")]
    Validation(#[from] ValidationError),

    #[error("{0}")]
    Transfer(#[from] TransferError),

    #[error("Capacity exceeded")]
    CapacityExceeded,

    /// The server answered with an id that is already committed
    #[error("Already committed as {0}")]
    AlreadyCommitted(String),

    /// Another candidate in the same batch carries this local id
    #[error("Duplicate candidate in batch")]
    DuplicateCandidate,
}

impl FailureReason {
    /// Short label used for metrics
    pub fn label(&self) -> &'static str {
        match self {
            FailureReason::Validation(ValidationError::TooLarge { .. }) => "too_large",
            FailureReason::Validation(ValidationError::UnsupportedType(_)) => "unsupported_type",
            FailureReason::Transfer(TransferError::NetworkFailure(_)) => "network_failure",
            FailureReason::Transfer(TransferError::ServerRejected(_)) => "server_rejected",
            FailureReason::Transfer(TransferError::InvalidConfig(_)) => "invalid_config",
            FailureReason::CapacityExceeded => "capacity_exceeded",
            FailureReason::AlreadyCommitted(_) => "already_committed",
            FailureReason::DuplicateCandidate => "duplicate_candidate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedUpload {
    pub local_id: LocalId,
    pub file_name: String,
    pub reason: FailureReason,
}

/// Outcome of one batch. Always produced, even if every file failed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    /// Newly committed files, in completion order
    pub committed: Vec<CommittedFile>,
    pub failed: Vec<FailedUpload>,
}

impl BatchResult {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }

    pub fn failed_ids(&self) -> Vec<LocalId> {
        self.failed.iter().map(|f| f.local_id).collect()
    }
}
