//! Prometheus metrics exporter

use crate::metrics::recorder::init_metrics;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::net::SocketAddr;
use std::sync::OnceLock;

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Metrics server configuration
#[derive(Debug, Clone)]
pub struct MetricsConfig {
    /// Address for a standalone scrape listener. `None` installs the
    /// recorder only; serve it with [`metrics_route`].
    pub listen_addr: Option<SocketAddr>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            listen_addr: Some(SocketAddr::from(([0, 0, 0, 0], 9090))),
        }
    }
}

impl MetricsConfig {
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            listen_addr: Some(addr),
        }
    }

    pub fn embedded() -> Self {
        Self { listen_addr: None }
    }
}

/// Install the Prometheus recorder.
///
/// Only the first call installs anything; later calls return the existing handle.
pub fn start_metrics_server(
    config: MetricsConfig,
) -> Result<&'static PrometheusHandle, MetricsError> {
    init_metrics();

    if let Some(handle) = PROMETHEUS_HANDLE.get() {
        return Ok(handle);
    }

    let handle = match config.listen_addr {
        Some(addr) => {
            let (recorder, exporter) = PrometheusBuilder::new()
                .with_http_listener(addr)
                .build()
                .map_err(|e| MetricsError::SetupFailed(e.to_string()))?;
            let handle = recorder.handle();
            metrics::set_global_recorder(recorder).map_err(|_| {
                MetricsError::SetupFailed("a global metrics recorder is already installed".into())
            })?;
            tokio::spawn(async move {
                if let Err(e) = exporter.await {
                    tracing::warn!("metrics listener stopped: {:?}", e);
                }
            });
            handle
        }
        None => PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| MetricsError::SetupFailed(e.to_string()))?,
    };

    Ok(PROMETHEUS_HANDLE.get_or_init(|| handle))
}

/// Render metrics as a string (for custom endpoints)
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("Failed to setup metrics: {0}")]
    SetupFailed(String),
}

/// Axum route serving the rendered metrics
pub fn metrics_route() -> axum::routing::MethodRouter {
    use axum::response::IntoResponse;

    axum::routing::get(|| async {
        match render_metrics() {
            Some(metrics) => (
                [(
                    axum::http::header::CONTENT_TYPE,
                    "text/plain; charset=utf-8",
                )],
                metrics,
            )
                .into_response(),
            None => (
                axum::http::StatusCode::SERVICE_UNAVAILABLE,
                "Metrics not initialized",
            )
                .into_response(),
        }
    })
}
