pub mod error;
pub mod registry;
pub mod types;
pub mod validator;

pub use error::{PolicyError, PolicyResult, ValidationError};
pub use registry::PolicyRegistry;
pub use types::{FileCategory, UploadPolicy};
pub use validator::{Validation, Validator};
