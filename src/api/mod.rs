//! Reference storage endpoint
//!
//! A small axum service speaking the protocol [`crate::transport::HttpTransport`]
//! expects. Used by the `upload-storage-server` binary and by integration tests.

mod error;
mod rest;
mod storage;
mod types;

pub use error::{ApiError, ApiResult};
pub use rest::StorageApi;
pub use storage::{FileStorage, StoredObject};
pub use types::*;

use axum::extract::DefaultBodyLimit;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Create the storage endpoint router with CORS, tracing and a body limit
pub fn create_api_server(storage: FileStorage, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    StorageApi::new(storage)
        .router()
        .route("/metrics", crate::metrics::metrics_route())
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
