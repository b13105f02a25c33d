use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Server rejected request: {0}")]
    ServerRejected(String),

    #[error("Invalid transport configuration: {0}")]
    InvalidConfig(String),
}

impl From<reqwest::Error> for TransferError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => TransferError::ServerRejected(format!("HTTP {status}: {err}")),
            // A 2xx with an unreadable body is a bad acknowledgement, not a lost connection
            None if err.is_decode() => {
                TransferError::ServerRejected(format!("malformed response: {err}"))
            }
            None => TransferError::NetworkFailure(err.to_string()),
        }
    }
}

pub type TransferResult<T> = Result<T, TransferError>;
