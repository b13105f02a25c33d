pub mod sink;
pub mod tracker;

pub use sink::ProgressSink;
pub use tracker::ProgressTracker;
