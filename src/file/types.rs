use crate::policy::FileCategory;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Client-side identifier of a candidate, unique for the lifetime of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LocalId(Uuid);

impl LocalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A file the caller wants uploaded. Not yet known to the server.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub local_id: LocalId,
    pub name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub data: Bytes,
}

impl CandidateFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let data = data.into();
        Self {
            local_id: LocalId::new(),
            name: name.into(),
            mime_type: mime_type.into(),
            size_bytes: data.len() as u64,
            data,
        }
    }

    /// Read a file from disk, guessing its MIME type from the extension
    pub async fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self::new(name, mime_type, data))
    }
}

/// A file the server has acknowledged. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "RawCommittedFile")]
pub struct CommittedFile {
    pub id: String,
    pub url: String,
    pub original_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub category: FileCategory,
}

impl CommittedFile {
    pub fn new(
        id: impl Into<String>,
        url: impl Into<String>,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        size_bytes: u64,
    ) -> Self {
        let mime_type = mime_type.into();
        Self {
            id: id.into(),
            url: url.into(),
            original_name: original_name.into(),
            category: FileCategory::classify(&mime_type),
            mime_type,
            size_bytes,
        }
    }
}

// Servers are not required to send a category; it is derived from the MIME type.
#[derive(Deserialize)]
struct RawCommittedFile {
    id: String,
    url: String,
    original_name: String,
    mime_type: String,
    size_bytes: u64,
    #[serde(default)]
    category: Option<FileCategory>,
}

impl From<RawCommittedFile> for CommittedFile {
    fn from(raw: RawCommittedFile) -> Self {
        let category = raw
            .category
            .unwrap_or_else(|| FileCategory::classify(&raw.mime_type));
        Self {
            id: raw.id,
            url: raw.url,
            original_name: raw.original_name,
            mime_type: raw.mime_type,
            size_bytes: raw.size_bytes,
            category,
        }
    }
}
