use std::time::Duration;

use async_trait::async_trait;
use tokio::time::timeout;
use tracing::warn;

/// Message handed to the provider chain; the body is pre-rendered HTML.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Error a single provider reports for one send attempt.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("message rejected: {0}")]
    Rejected(String),
    #[error("provider unreachable: {0}")]
    Unreachable(String),
}

/// One interchangeable email-sending capability. Multiple providers form an
/// ordered fallback chain inside [`DeliveryRouter`].
#[async_trait]
pub trait EmailProvider: Send + Sync {
    /// Stable name used in logs and delivery reports.
    fn name(&self) -> &str;
    async fn send(&self, message: &EmailMessage) -> Result<(), ProviderError>;
}

/// Successful delivery, recording which provider accepted the message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub provider: String,
}

/// One failed attempt against a provider in the chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderFailure {
    pub provider: String,
    pub reason: String,
}

/// Router failure. Intermittent provider outages are the expected failure
/// mode, so the total-failure variant keeps every provider's reason.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("no delivery providers configured")]
    NoProviders,
    #[error("all delivery providers failed: {}", summarize(.attempts))]
    AllProvidersFailed { attempts: Vec<ProviderFailure> },
}

fn summarize(attempts: &[ProviderFailure]) -> String {
    attempts
        .iter()
        .map(|attempt| format!("{}: {}", attempt.provider, attempt.reason))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Tries an ordered chain of providers for one message and stops at the
/// first success, so a message is never handed to two providers.
pub struct DeliveryRouter {
    providers: Vec<Box<dyn EmailProvider>>,
    send_timeout: Duration,
}

impl DeliveryRouter {
    pub fn new(providers: Vec<Box<dyn EmailProvider>>, send_timeout: Duration) -> Self {
        Self {
            providers,
            send_timeout,
        }
    }

    /// Attempt providers strictly in order. Each attempt is bounded by the
    /// configured timeout; a timed-out provider counts as failed and the
    /// chain falls through to the next one. Retries across time belong to
    /// the orchestrator, not here.
    pub async fn deliver(&self, message: &EmailMessage) -> Result<Delivery, DeliveryError> {
        if self.providers.is_empty() {
            return Err(DeliveryError::NoProviders);
        }

        let mut attempts = Vec::with_capacity(self.providers.len());
        for provider in &self.providers {
            match timeout(self.send_timeout, provider.send(message)).await {
                Ok(Ok(())) => {
                    return Ok(Delivery {
                        provider: provider.name().to_string(),
                    })
                }
                Ok(Err(err)) => {
                    warn!(provider = provider.name(), %err, "provider declined message");
                    attempts.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        reason: err.to_string(),
                    });
                }
                Err(_) => {
                    let reason = format!("timed out after {}s", self.send_timeout.as_secs());
                    warn!(provider = provider.name(), %reason, "provider send timed out");
                    attempts.push(ProviderFailure {
                        provider: provider.name().to_string(),
                        reason,
                    });
                }
            }
        }

        Err(DeliveryError::AllProvidersFailed { attempts })
    }
}
