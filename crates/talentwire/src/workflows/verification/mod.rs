//! Mailbox-ownership verification gating newsletter subscriptions.
//!
//! A subscription only activates once the would-be subscriber proves control
//! of the destination mailbox by echoing back a short-lived, attempt-limited
//! code. Per email the lifecycle is issued -> confirmed, expired, or
//! exhausted, and every terminal state deletes the record.

pub mod router;
pub mod store;

#[cfg(test)]
mod tests;

pub use router::{verification_router, VerificationState};
pub use store::{CodeVault, VaultError, VerificationRecord};

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;

/// TTL and attempt budget for issued codes.
#[derive(Debug, Clone)]
pub struct VerificationPolicy {
    pub code_ttl: Duration,
    pub max_attempts: u8,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            code_ttl: Duration::minutes(10),
            max_attempts: 3,
        }
    }
}

/// Issues and checks one-time codes proving ownership of a mailbox.
pub struct MailboxVerifier<V> {
    vault: Arc<V>,
    policy: VerificationPolicy,
}

impl<V> MailboxVerifier<V>
where
    V: CodeVault + 'static,
{
    pub fn new(vault: Arc<V>, policy: VerificationPolicy) -> Self {
        Self { vault, policy }
    }

    pub fn issue(&self, email: &str) -> Result<IssuedVerification, VaultError> {
        self.issue_at(email, Utc::now())
    }

    /// Issue a fresh uniformly random six-digit code with attempts reset to
    /// zero, replacing any live record for the email.
    pub fn issue_at(
        &self,
        email: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedVerification, VaultError> {
        let code = rand::rng().random_range(100_000..=999_999).to_string();
        let expires_at = now + self.policy.code_ttl;
        self.vault.upsert(VerificationRecord {
            email: email.to_string(),
            code: code.clone(),
            expires_at,
            attempts: 0,
        })?;
        Ok(IssuedVerification { code, expires_at })
    }

    pub fn validate(
        &self,
        email: &str,
        submitted_code: &str,
    ) -> Result<VerificationOutcome, VaultError> {
        self.validate_at(email, submitted_code, Utc::now())
    }

    /// Check a submitted code. Expiry and exhaustion are detected at read
    /// time and delete the record; otherwise the attempt is counted before
    /// the comparison, so even a successful final attempt consumes budget.
    pub fn validate_at(
        &self,
        email: &str,
        submitted_code: &str,
        now: DateTime<Utc>,
    ) -> Result<VerificationOutcome, VaultError> {
        let record = match self.vault.fetch(email)? {
            Some(record) => record,
            None => return Ok(VerificationOutcome::Rejected(RejectionReason::NotFound)),
        };

        if now > record.expires_at {
            self.vault.remove(email)?;
            return Ok(VerificationOutcome::Rejected(RejectionReason::Expired));
        }

        if record.attempts >= self.policy.max_attempts {
            self.vault.remove(email)?;
            return Ok(VerificationOutcome::Rejected(
                RejectionReason::TooManyAttempts,
            ));
        }

        self.vault.increment_attempts(email)?;

        if record.code == submitted_code {
            self.vault.remove(email)?;
            Ok(VerificationOutcome::Confirmed)
        } else {
            Ok(VerificationOutcome::Rejected(RejectionReason::WrongCode))
        }
    }
}

/// Result of issuing a code. The code itself only travels to the mailbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedVerification {
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// Result of checking a submitted code. Rejections are expected, frequent
/// outcomes and therefore values rather than errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationOutcome {
    Confirmed,
    Rejected(RejectionReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectionReason {
    NotFound,
    Expired,
    TooManyAttempts,
    WrongCode,
}

impl RejectionReason {
    /// Actionable message for the subscription flow.
    pub fn summary(&self) -> &'static str {
        match self {
            RejectionReason::NotFound => {
                "no pending verification for this email; request a new code"
            }
            RejectionReason::Expired => "verification code expired; request a new code",
            RejectionReason::TooManyAttempts => {
                "too many failed attempts; request a new code"
            }
            RejectionReason::WrongCode => "wrong code; check the email and try again",
        }
    }
}
