use crate::file::CommittedFile;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CredentialsMode {
    #[default]
    Omit,
    /// Send `Authorization: Bearer <token>` on every request
    Bearer(String),
}

/// Connection settings handed to a transport at construction.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: String,
    pub upload_path: String,
    pub delete_path: String,
    pub base_headers: HashMap<String, String>,
    pub credentials: CredentialsMode,
    /// Per-request timeout. `None` waits indefinitely.
    pub timeout: Option<Duration>,
    /// Size of the slices the request body is streamed in
    pub stream_chunk_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            upload_path: "/api/v1/files".to_string(),
            delete_path: "/api/v1/files".to_string(),
            base_headers: HashMap::new(),
            credentials: CredentialsMode::Omit,
            timeout: None,
            stream_chunk_size: 64 * 1024,
        }
    }
}

impl TransportConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.base_headers.insert(name.into(), value.into());
        self
    }

    pub fn bearer(mut self, token: impl Into<String>) -> Self {
        self.credentials = CredentialsMode::Bearer(token.into());
        self
    }

    pub fn upload_url(&self) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), self.upload_path)
    }

    pub fn delete_url(&self, id: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            self.delete_path.trim_end_matches('/'),
            id
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub success: bool,
    #[serde(default)]
    pub file: Option<CommittedFile>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
}
