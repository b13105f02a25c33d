use crate::file::{CandidateFile, CommittedFile};
use crate::progress::ProgressSink;
use crate::transport::error::{TransferError, TransferResult};
use crate::transport::types::{CredentialsMode, DeleteResponse, TransportConfig, UploadResponse};
use crate::transport::StorageTransport;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use std::str::FromStr;

/// Multipart/JSON client for the storage endpoint.
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> TransferResult<Self> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.base_headers {
            let name = HeaderName::from_str(name)
                .map_err(|e| TransferError::InvalidConfig(format!("header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransferError::InvalidConfig(format!("header value for {name}: {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| TransferError::InvalidConfig(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.config.credentials {
            CredentialsMode::Omit => request,
            CredentialsMode::Bearer(token) => request.bearer_auth(token),
        }
    }

    /// Stream the file body in fixed slices, reporting each slice as it is
    /// pulled by the HTTP client.
    fn streaming_part(&self, file: &CandidateFile, progress: ProgressSink) -> TransferResult<Part> {
        let data = file.data.clone();
        let total = file.size_bytes;
        let chunk_size = self.config.stream_chunk_size.max(1);
        let mut sent = 0u64;

        let slices = (0..data.len()).step_by(chunk_size).map(move |start| {
            let end = (start + chunk_size).min(data.len());
            let slice: Bytes = data.slice(start..end);
            sent += slice.len() as u64;
            progress.report(sent, total);
            Ok::<Bytes, std::io::Error>(slice)
        });

        let body = reqwest::Body::wrap_stream(futures::stream::iter(slices));
        let part = Part::stream_with_length(body, total)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;

        Ok(part)
    }
}

async fn rejection(response: Response) -> TransferError {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("error").and_then(|e| e.as_str()).map(str::to_string))
        .unwrap_or(body);

    TransferError::ServerRejected(format!("HTTP {status}: {message}"))
}

#[async_trait]
impl StorageTransport for HttpTransport {
    async fn upload(
        &self,
        file: &CandidateFile,
        group_tag: Option<&str>,
        progress: ProgressSink,
    ) -> TransferResult<CommittedFile> {
        let part = self.streaming_part(file, progress.clone())?;
        let mut form = Form::new().part("file", part);
        if let Some(tag) = group_tag {
            form = form.text("tag", tag.to_string());
        }

        let request = self.client.post(self.config.upload_url()).multipart(form);
        let response = self.authorize(request).send().await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: UploadResponse = response.json().await?;
        match (body.success, body.file) {
            (true, Some(committed)) => {
                progress.report(file.size_bytes, file.size_bytes);
                Ok(committed)
            }
            (_, _) => Err(TransferError::ServerRejected(
                body.error
                    .unwrap_or_else(|| "upload was not acknowledged".to_string()),
            )),
        }
    }

    async fn delete(&self, id: &str) -> TransferResult<()> {
        let request = self.client.delete(self.config.delete_url(id));
        let response = self.authorize(request).send().await?;

        if !response.status().is_success() {
            return Err(rejection(response).await);
        }

        let body: DeleteResponse = response.json().await?;
        if body.success {
            Ok(())
        } else {
            Err(TransferError::ServerRejected(
                body.error
                    .unwrap_or_else(|| "deletion was not acknowledged".to_string()),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_header_rejected() {
        let config = TransportConfig::default().header("bad header", "x");
        let result = HttpTransport::new(config);

        assert!(matches!(result, Err(TransferError::InvalidConfig(_))));
    }

    #[test]
    fn test_build_with_headers_and_timeout() {
        let mut config = TransportConfig::with_base_url("http://127.0.0.1:1")
            .header("x-client", "upload-manager")
            .bearer("secret");
        config.timeout = Some(std::time::Duration::from_secs(5));

        let transport = HttpTransport::new(config).unwrap();
        assert_eq!(
            transport.config().credentials,
            CredentialsMode::Bearer("secret".into())
        );
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_failure() {
        use crate::progress::ProgressTracker;

        // Port 1 on loopback is reserved and refuses connections
        let transport =
            HttpTransport::new(TransportConfig::with_base_url("http://127.0.0.1:1")).unwrap();
        let file = CandidateFile::new("a.txt", "text/plain", b"hello".to_vec());
        let sink = ProgressSink::new(ProgressTracker::new(), file.local_id);

        let result = transport.upload(&file, None, sink).await;
        assert!(matches!(result, Err(TransferError::NetworkFailure(_))));
    }
}
