use crate::api::error::ApiResult;
use crate::file::CommittedFile;
use bytes::Bytes;
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub record: CommittedFile,
    pub data: Bytes,
    pub tag: Option<String>,
    pub created_at: i64,
}

/// Object store backing the reference endpoint.
///
/// Objects live in memory; when a directory is configured each object is
/// also written to `<dir>/<id>`.
#[derive(Clone)]
pub struct FileStorage {
    objects: Arc<DashMap<String, StoredObject>>,
    public_url: Arc<str>,
    dir: Option<PathBuf>,
}

impl FileStorage {
    pub fn in_memory(public_url: &str) -> Self {
        Self {
            objects: Arc::new(DashMap::new()),
            public_url: Arc::from(public_url.trim_end_matches('/')),
            dir: None,
        }
    }

    pub async fn on_disk(public_url: &str, dir: PathBuf) -> ApiResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self {
            dir: Some(dir),
            ..Self::in_memory(public_url)
        })
    }

    pub async fn put(
        &self,
        original_name: String,
        mime_type: String,
        data: Bytes,
        tag: Option<String>,
    ) -> ApiResult<CommittedFile> {
        let id = uuid::Uuid::new_v4().simple().to_string();
        let record = CommittedFile::new(
            id.clone(),
            format!("{}/api/v1/files/{id}", self.public_url),
            original_name,
            mime_type,
            data.len() as u64,
        );

        if let Some(dir) = &self.dir {
            tokio::fs::write(dir.join(&id), &data).await?;
        }

        self.objects.insert(
            id,
            StoredObject {
                record: record.clone(),
                data,
                tag,
                created_at: chrono::Utc::now().timestamp(),
            },
        );

        Ok(record)
    }

    pub fn get(&self, id: &str) -> Option<StoredObject> {
        self.objects.get(id).map(|o| o.value().clone())
    }

    /// Remove an object. Returns false if it did not exist.
    ///
    /// The file on disk goes first, so a failed removal leaves the object
    /// listed and the delete can be retried.
    pub async fn delete(&self, id: &str) -> ApiResult<bool> {
        if !self.objects.contains_key(id) {
            return Ok(false);
        }
        if let Some(dir) = &self.dir {
            match tokio::fs::remove_file(dir.join(id)).await {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(self.objects.remove(id).is_some())
    }

    /// Records sorted by creation time, optionally filtered by tag
    pub fn list(&self, tag: Option<&str>) -> Vec<CommittedFile> {
        let mut objects: Vec<StoredObject> = self
            .objects
            .iter()
            .filter(|o| tag.is_none() || o.tag.as_deref() == tag)
            .map(|o| o.value().clone())
            .collect();
        objects.sort_by_key(|o| o.created_at);
        objects.into_iter().map(|o| o.record).collect()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
