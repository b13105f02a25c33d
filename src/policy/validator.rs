use crate::file::CandidateFile;
use crate::policy::error::ValidationError;
use crate::policy::registry::PolicyRegistry;
use crate::policy::types::FileCategory;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validation {
    Accepted,
    Rejected(ValidationError),
}

impl Validation {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted)
    }

    pub fn into_result(self) -> Result<(), ValidationError> {
        match self {
            Validation::Accepted => Ok(()),
            Validation::Rejected(e) => Err(e),
        }
    }
}

/// Checks candidates against the registry. Pure: no I/O, no state.
#[derive(Debug, Clone, Default)]
pub struct Validator {
    registry: Arc<PolicyRegistry>,
}

impl Validator {
    pub fn new(registry: Arc<PolicyRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &PolicyRegistry {
        &self.registry
    }

    /// Size is checked before type, so an oversized file of the wrong type
    /// reports `TooLarge`.
    pub fn validate(&self, file: &CandidateFile, category: FileCategory) -> Validation {
        let policy = self.registry.policy_for(category);

        if file.size_bytes > policy.max_bytes {
            return Validation::Rejected(ValidationError::TooLarge {
                size: file.size_bytes,
                max: policy.max_bytes,
            });
        }

        if !policy.accepts(&file.mime_type, &file.name) {
            return Validation::Rejected(ValidationError::UnsupportedType(
                file.mime_type.clone(),
            ));
        }

        Validation::Accepted
    }
}
