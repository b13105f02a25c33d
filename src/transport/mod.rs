//! Seam to the remote storage endpoint.
//!
//! The manager only talks to storage through [`StorageTransport`]; the
//! bundled [`HttpTransport`] speaks the multipart/JSON protocol served by
//! [`crate::api`].

pub mod error;
pub mod http;
pub mod memory;
pub mod types;

pub use error::{TransferError, TransferResult};
pub use http::HttpTransport;
pub use memory::InMemoryTransport;
pub use types::{CredentialsMode, DeleteResponse, TransportConfig, UploadResponse};

use crate::file::{CandidateFile, CommittedFile};
use crate::progress::ProgressSink;
use async_trait::async_trait;

#[async_trait]
pub trait StorageTransport: Send + Sync {
    /// Upload one file, reporting byte progress through `progress`.
    async fn upload(
        &self,
        file: &CandidateFile,
        group_tag: Option<&str>,
        progress: ProgressSink,
    ) -> TransferResult<CommittedFile>;

    /// Delete a committed file by its server id.
    async fn delete(&self, id: &str) -> TransferResult<()>;
}
