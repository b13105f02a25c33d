pub mod types;

pub use types::{CandidateFile, CommittedFile, LocalId};
