use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PolicyError {
    #[error("Unknown file category: {0}")]
    UnknownCategory(String),
}

pub type PolicyResult<T> = Result<T, PolicyError>;

/// Why a candidate was refused before reaching the network.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("File is too large: {size} bytes exceeds limit of {max} bytes")]
    TooLarge { size: u64, max: u64 },

    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),
}
