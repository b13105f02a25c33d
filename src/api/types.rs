use crate::file::CommittedFile;
use serde::{Deserialize, Serialize};

pub use crate::transport::{DeleteResponse, UploadResponse};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListFilesResponse {
    pub files: Vec<CommittedFile>,
    pub count: usize,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListFilesQuery {
    pub tag: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}
