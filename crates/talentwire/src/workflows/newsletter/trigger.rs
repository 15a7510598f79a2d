use chrono::{DateTime, Duration, Utc};

/// Size and freshness gates for one notification stream. The window is a
/// parameter rather than a constant: the post-creation path and a scheduled
/// catch-up path legitimately want different freshness semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TriggerConfig {
    pub batch_size: u32,
    pub recency_window: Duration,
}

impl TriggerConfig {
    pub fn new(batch_size: u32, recency_window: Duration) -> Self {
        Self {
            batch_size,
            recency_window,
        }
    }
}

/// True when a fresh batch milestone has been reached: some candidates are
/// active, the count sits exactly on a multiple of the batch size, and the
/// newest candidate is within the recency window.
///
/// This predicate is stateless and may be re-evaluated concurrently; the
/// [`NotificationWatermark`] is what makes a milestone fire at most once.
pub fn should_notify(
    config: &TriggerConfig,
    active_count: u64,
    most_recent_created_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> bool {
    if config.batch_size == 0 || active_count == 0 {
        return false;
    }
    if active_count % u64::from(config.batch_size) != 0 {
        return false;
    }
    now.signed_duration_since(most_recent_created_at) <= config.recency_window
}

/// Milestone index for an active count: the number of complete batches.
pub fn milestone(active_count: u64, batch_size: u32) -> u64 {
    if batch_size == 0 {
        0
    } else {
        active_count / u64::from(batch_size)
    }
}

/// Persisted high-water mark for the notification stream. The stored value
/// is the active-candidate count recorded by the last cycle that notified;
/// it only moves through the compare-and-swap `advance`, so concurrent
/// cycles observing the same milestone elect exactly one notifier.
pub trait NotificationWatermark: Send + Sync {
    fn last_notified(&self) -> Result<u64, WatermarkError>;
    /// Move the watermark from `expected` to `to`. Returns false when the
    /// stored value no longer equals `expected` (another writer won).
    fn advance(&self, expected: u64, to: u64) -> Result<bool, WatermarkError>;
}

/// Error enumeration for watermark store failures.
#[derive(Debug, thiserror::Error)]
pub enum WatermarkError {
    #[error("watermark store unavailable: {0}")]
    Unavailable(String),
}
