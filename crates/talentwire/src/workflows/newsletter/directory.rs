use super::domain::{Candidate, Subscriber};

/// Read-only view over the candidate store so the orchestrator can be
/// exercised in isolation.
pub trait CandidateDirectory: Send + Sync {
    /// Number of candidates currently marked active.
    fn active_count(&self) -> Result<u64, DirectoryError>;
    /// The most recently created active candidate, if any.
    fn most_recent_active(&self) -> Result<Option<Candidate>, DirectoryError>;
    /// Up to `limit` active candidates, newest first.
    fn recent_active(&self, limit: usize) -> Result<Vec<Candidate>, DirectoryError>;
}

/// Read-only view over the subscriber store.
pub trait SubscriberDirectory: Send + Sync {
    fn active_subscribers(&self) -> Result<Vec<Subscriber>, DirectoryError>;
}

/// Error enumeration for directory failures.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory unavailable: {0}")]
    Unavailable(String),
}
