pub mod commit_store;

pub use commit_store::{CommitStore, MergeOutcome};
