use crate::file::LocalId;
use crate::progress::tracker::ProgressTracker;

/// Handle given to a transport so it can report byte counters for one upload.
#[derive(Debug, Clone)]
pub struct ProgressSink {
    tracker: ProgressTracker,
    local_id: LocalId,
}

impl ProgressSink {
    pub fn new(tracker: ProgressTracker, local_id: LocalId) -> Self {
        Self { tracker, local_id }
    }

    /// Report bytes transferred so far out of `total_bytes`.
    pub fn report(&self, bytes_sent: u64, total_bytes: u64) {
        let percent = if total_bytes == 0 {
            100
        } else {
            ((bytes_sent.min(total_bytes) as u128 * 100) / total_bytes as u128) as u8
        };
        self.tracker.update(self.local_id, percent);
    }
}
