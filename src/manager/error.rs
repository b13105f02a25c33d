use crate::transport::TransferError;
use thiserror::Error;

/// Why a whole batch was refused before any file was looked at.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BatchRejected {
    #[error("An upload batch is already in progress")]
    Busy,

    #[error("Uploads are disabled")]
    Disabled,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeletionError {
    #[error("File is already being deleted: {0}")]
    AlreadyDeleting(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Delete request failed: {0}")]
    NetworkFailure(#[from] TransferError),

    #[error("Invalid deletion transition: {0}")]
    InvalidTransition(String),
}

pub type DeletionResult<T> = Result<T, DeletionError>;
