use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::info;

use talentwire::config::{NotificationConfig, VerificationConfig};
use talentwire::workflows::newsletter::{
    Candidate, CandidateDirectory, DirectoryError, EmailMessage, EmailProvider,
    NotificationWatermark, ProviderError, Subscriber, SubscriberDirectory, TriggerConfig,
    WatermarkError,
};
use talentwire::workflows::verification::{
    CodeVault, VaultError, VerificationPolicy, VerificationRecord,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// In-memory candidate directory. Production reads the listings database;
/// local runs and the demo seed this board instead.
#[derive(Default, Clone)]
pub(crate) struct CandidateBoard {
    candidates: Arc<Mutex<Vec<Candidate>>>,
}

impl CandidateBoard {
    pub(crate) fn seed(&self, batch: Vec<Candidate>) {
        let mut guard = self.candidates.lock().expect("board mutex poisoned");
        guard.extend(batch);
    }
}

impl CandidateDirectory for CandidateBoard {
    fn active_count(&self) -> Result<u64, DirectoryError> {
        let guard = self.candidates.lock().expect("board mutex poisoned");
        Ok(guard.iter().filter(|c| c.active).count() as u64)
    }

    fn most_recent_active(&self) -> Result<Option<Candidate>, DirectoryError> {
        let guard = self.candidates.lock().expect("board mutex poisoned");
        Ok(guard
            .iter()
            .filter(|c| c.active)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    fn recent_active(&self, limit: usize) -> Result<Vec<Candidate>, DirectoryError> {
        let guard = self.candidates.lock().expect("board mutex poisoned");
        let mut active: Vec<Candidate> = guard.iter().filter(|c| c.active).cloned().collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        active.truncate(limit);
        Ok(active)
    }
}

/// In-memory subscriber roster mirroring the subscription store.
#[derive(Default, Clone)]
pub(crate) struct SubscriberRoster {
    subscribers: Arc<Mutex<Vec<Subscriber>>>,
}

impl SubscriberRoster {
    pub(crate) fn seed(&self, batch: Vec<Subscriber>) {
        let mut guard = self.subscribers.lock().expect("roster mutex poisoned");
        guard.extend(batch);
    }
}

impl SubscriberDirectory for SubscriberRoster {
    fn active_subscribers(&self) -> Result<Vec<Subscriber>, DirectoryError> {
        let guard = self.subscribers.lock().expect("roster mutex poisoned");
        Ok(guard.iter().filter(|s| s.active).cloned().collect())
    }
}

/// Compare-and-swap watermark held in process memory. A deployment with
/// multiple replicas must back this with a shared store.
#[derive(Default)]
pub(crate) struct CasWatermark {
    value: Mutex<u64>,
}

impl NotificationWatermark for CasWatermark {
    fn last_notified(&self) -> Result<u64, WatermarkError> {
        Ok(*self.value.lock().expect("watermark mutex poisoned"))
    }

    fn advance(&self, expected: u64, to: u64) -> Result<bool, WatermarkError> {
        let mut guard = self.value.lock().expect("watermark mutex poisoned");
        if *guard != expected {
            return Ok(false);
        }
        *guard = to;
        Ok(true)
    }
}

/// In-memory verification code vault keyed by email.
#[derive(Default, Clone)]
pub(crate) struct MemoryCodeVault {
    records: Arc<Mutex<HashMap<String, VerificationRecord>>>,
}

impl CodeVault for MemoryCodeVault {
    fn upsert(&self, record: VerificationRecord) -> Result<(), VaultError> {
        let mut guard = self.records.lock().expect("vault mutex poisoned");
        guard.insert(record.email.clone(), record);
        Ok(())
    }

    fn fetch(&self, email: &str) -> Result<Option<VerificationRecord>, VaultError> {
        let guard = self.records.lock().expect("vault mutex poisoned");
        Ok(guard.get(email).cloned())
    }

    fn increment_attempts(&self, email: &str) -> Result<u8, VaultError> {
        let mut guard = self.records.lock().expect("vault mutex poisoned");
        match guard.get_mut(email) {
            Some(record) => {
                record.attempts += 1;
                Ok(record.attempts)
            }
            None => Err(VaultError::Missing(email.to_string())),
        }
    }

    fn remove(&self, email: &str) -> Result<(), VaultError> {
        let mut guard = self.records.lock().expect("vault mutex poisoned");
        guard.remove(email);
        Ok(())
    }
}

/// Provider that writes messages to the log instead of the wire. Stands in
/// for transactional providers on developer machines and in the demo.
pub(crate) struct ConsoleMailProvider {
    name: &'static str,
}

impl ConsoleMailProvider {
    pub(crate) fn new(name: &'static str) -> Self {
        Self { name }
    }
}

#[async_trait]
impl EmailProvider for ConsoleMailProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), ProviderError> {
        info!(
            provider = self.name,
            to = %message.to,
            subject = %message.subject,
            "outbound email"
        );
        Ok(())
    }
}

pub(crate) fn trigger_config(config: &NotificationConfig) -> TriggerConfig {
    TriggerConfig::new(config.batch_size, config.recency_window())
}

pub(crate) fn verification_policy(config: &VerificationConfig) -> VerificationPolicy {
    VerificationPolicy {
        code_ttl: config.code_ttl(),
        max_attempts: config.max_code_attempts,
    }
}
