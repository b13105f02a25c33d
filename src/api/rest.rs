use crate::api::error::{ApiError, ApiResult};
use crate::api::storage::FileStorage;
use crate::api::types::*;
use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Json, Router,
};

pub struct StorageApi {
    storage: FileStorage,
}

impl StorageApi {
    pub fn new(storage: FileStorage) -> Self {
        Self { storage }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(health_check))
            .route("/api/v1/files", get(list_files).post(upload_file))
            .route("/api/v1/files/:id", get(download_file).delete(delete_file))
            .with_state(self.storage.clone())
    }
}

async fn health_check() -> &'static str {
    "OK"
}

async fn upload_file(
    State(storage): State<FileStorage>,
    mut multipart: Multipart,
) -> ApiResult<(StatusCode, Json<UploadResponse>)> {
    let mut upload = None;
    let mut tag = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::InvalidRequest(format!("Failed to read multipart field: {e}")))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            let filename = field
                .file_name()
                .ok_or_else(|| ApiError::InvalidRequest("No filename provided".to_string()))?
                .to_string();
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::InvalidRequest(format!("Failed to read file data: {e}")))?;

            upload = Some((filename, mime_type, data));
        } else if name == "tag" {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::InvalidRequest(format!("Failed to read tag: {e}")))?;
            tag = Some(value).filter(|t| !t.is_empty());
        }
    }

    let (filename, mime_type, data) =
        upload.ok_or_else(|| ApiError::InvalidRequest("No file uploaded".to_string()))?;

    let record = storage.put(filename, mime_type, data, tag).await?;
    tracing::info!(file_id = %record.id, size = record.size_bytes, "stored file");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            success: true,
            file: Some(record),
            error: None,
        }),
    ))
}

async fn delete_file(
    State(storage): State<FileStorage>,
    Path(id): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !storage.delete(&id).await? {
        return Err(ApiError::NotFound(id));
    }
    tracing::info!(file_id = %id, "deleted file");

    Ok(Json(DeleteResponse {
        success: true,
        error: None,
    }))
}

async fn download_file(
    State(storage): State<FileStorage>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let object = storage.get(&id).ok_or(ApiError::NotFound(id))?;

    Ok((
        [(header::CONTENT_TYPE, object.record.mime_type)],
        object.data,
    ))
}

async fn list_files(
    State(storage): State<FileStorage>,
    Query(query): Query<ListFilesQuery>,
) -> Json<ListFilesResponse> {
    let files = storage.list(query.tag.as_deref());
    let count = files.len();

    Json(ListFilesResponse { files, count })
}
