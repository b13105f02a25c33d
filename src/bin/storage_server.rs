use anyhow::Context;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use upload_manager::api::{create_api_server, FileStorage};
use upload_manager::metrics::{start_metrics_server, MetricsConfig};

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let addr: SocketAddr = env_or("UPLOAD_SERVER_ADDR", "0.0.0.0:3000")
        .parse()
        .context("invalid UPLOAD_SERVER_ADDR")?;
    let public_url = env_or("UPLOAD_PUBLIC_URL", &format!("http://localhost:{}", addr.port()));
    let max_upload_bytes: usize = env_or("UPLOAD_MAX_BYTES", "104857600")
        .parse()
        .context("invalid UPLOAD_MAX_BYTES")?;

    let metrics_config = match std::env::var("UPLOAD_METRICS_ADDR") {
        Ok(raw) => MetricsConfig::with_addr(raw.parse().context("invalid UPLOAD_METRICS_ADDR")?),
        Err(_) => MetricsConfig::embedded(),
    };
    start_metrics_server(metrics_config).context("failed to start metrics")?;

    let storage = match std::env::var("UPLOAD_STORAGE_DIR") {
        Ok(dir) => FileStorage::on_disk(&public_url, PathBuf::from(dir))
            .await
            .context("failed to prepare storage directory")?,
        Err(_) => FileStorage::in_memory(&public_url),
    };

    let app = create_api_server(storage, max_upload_bytes);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    tracing::info!(%addr, %public_url, max_upload_bytes, "storage server listening");
    println!("\n📚 API Endpoints:");
    println!("   POST   /api/v1/files      - Upload a file (multipart: file, tag)");
    println!("   GET    /api/v1/files      - List stored files (?tag=)");
    println!("   GET    /api/v1/files/:id  - Download a file");
    println!("   DELETE /api/v1/files/:id  - Delete a file");
    println!("   GET    /metrics           - Prometheus metrics");
    println!("\n🛑 Press Ctrl+C to stop the server\n");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
