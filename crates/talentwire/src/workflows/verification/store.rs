use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ephemeral proof-of-ownership token for one subscription email. At most
/// one live record exists per email; a re-issue replaces the whole record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRecord {
    pub email: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
    pub attempts: u8,
}

/// TTL-aware key/value contract backing the verifier, keyed by email. The
/// backing store may be a native TTL store or a relational table with an
/// expiry column; the verifier only relies on these four operations.
pub trait CodeVault: Send + Sync {
    /// Insert the record, silently replacing any live record for the email.
    fn upsert(&self, record: VerificationRecord) -> Result<(), VaultError>;
    fn fetch(&self, email: &str) -> Result<Option<VerificationRecord>, VaultError>;
    /// Atomically increment the attempt counter, returning the new value.
    /// Two concurrent validations for the same email race only here, so the
    /// increment must not be a read-modify-write on the caller's side.
    fn increment_attempts(&self, email: &str) -> Result<u8, VaultError>;
    fn remove(&self, email: &str) -> Result<(), VaultError>;
}

/// Error enumeration for vault failures.
#[derive(Debug, thiserror::Error)]
pub enum VaultError {
    #[error("verification store unavailable: {0}")]
    Unavailable(String),
    #[error("no verification record for {0}")]
    Missing(String),
}
