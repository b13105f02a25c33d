use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use upload_manager::{
    CandidateFile, FileCategory, HttpTransport, ManagerConfig, PolicyRegistry, TransportConfig,
    UploadManager,
};

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .init();

    let paths: Vec<String> = std::env::args().skip(1).collect();
    if paths.is_empty() {
        anyhow::bail!("usage: upload-cli <file>...");
    }

    let mut transport_config = TransportConfig::with_base_url(env_or("UPLOAD_BASE_URL", "http://localhost:3000"));
    if let Ok(token) = std::env::var("UPLOAD_TOKEN") {
        transport_config = transport_config.bearer(token);
    }
    let transport = HttpTransport::new(transport_config).context("invalid transport config")?;

    let max_files: usize = env_or("UPLOAD_MAX_FILES", &paths.len().to_string())
        .parse()
        .context("invalid UPLOAD_MAX_FILES")?;
    let category = FileCategory::resolve(&env_or("UPLOAD_CATEGORY", "document"));
    let mut config = ManagerConfig::default()
        .with_max_files(max_files)
        .with_category(category);
    if let Ok(tag) = std::env::var("UPLOAD_TAG") {
        config = config.with_group_tag(tag);
    }

    let manager = UploadManager::new(config, PolicyRegistry::default(), Arc::new(transport));

    let mut candidates = Vec::with_capacity(paths.len());
    for path in &paths {
        let file = CandidateFile::from_path(path)
            .await
            .with_context(|| format!("failed to read {path}"))?;
        candidates.push(file);
    }

    let result = manager.submit_batch(candidates).await?;

    for file in &result.committed {
        println!("✓ {} -> {} ({} bytes)", file.original_name, file.url, file.size_bytes);
    }
    for failed in &result.failed {
        println!("✗ {}: {}", failed.file_name, failed.reason);
    }

    if !result.is_complete_success() {
        anyhow::bail!("{} of {} files failed", result.failed.len(), paths.len());
    }
    Ok(())
}
