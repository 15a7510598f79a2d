use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::workflows::newsletter::delivery::{
    DeliveryRouter, EmailMessage, EmailProvider, ProviderError,
};
use crate::workflows::newsletter::directory::{
    CandidateDirectory, DirectoryError, SubscriberDirectory,
};
use crate::workflows::newsletter::domain::{Candidate, CandidateId, PreferenceVector, Subscriber};
use crate::workflows::newsletter::orchestrator::NotificationOrchestrator;
use crate::workflows::newsletter::trigger::{
    NotificationWatermark, TriggerConfig, WatermarkError,
};

pub(super) fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 1, 12, 0, 0).unwrap()
}

pub(super) fn candidate(id: &str, created_at: DateTime<Utc>) -> Candidate {
    Candidate {
        id: CandidateId(id.to_string()),
        active: true,
        created_at,
        city: Some("Tel Aviv".to_string()),
        category: Some("Hospitality".to_string()),
        employment_type: Some("Full time".to_string()),
        languages: vec!["Hebrew".to_string(), "English".to_string()],
        gender: Some("female".to_string()),
        document_type: Some("Passport, work visa".to_string()),
        demanded: false,
    }
}

pub(super) fn candidate_in(id: &str, city: &str, created_at: DateTime<Utc>) -> Candidate {
    let mut candidate = candidate(id, created_at);
    candidate.city = Some(city.to_string());
    candidate
}

pub(super) fn subscriber(email: &str, preferences: PreferenceVector) -> Subscriber {
    Subscriber {
        email: email.to_string(),
        active: true,
        preferences,
    }
}

pub(super) fn city_preferences(city: &str) -> PreferenceVector {
    PreferenceVector {
        cities: vec![city.to_string()],
        ..PreferenceVector::default()
    }
}

pub(super) struct StaticCandidates {
    candidates: Vec<Candidate>,
}

impl StaticCandidates {
    pub(super) fn new(candidates: Vec<Candidate>) -> Self {
        Self { candidates }
    }
}

impl CandidateDirectory for StaticCandidates {
    fn active_count(&self) -> Result<u64, DirectoryError> {
        Ok(self.candidates.iter().filter(|c| c.active).count() as u64)
    }

    fn most_recent_active(&self) -> Result<Option<Candidate>, DirectoryError> {
        Ok(self
            .candidates
            .iter()
            .filter(|c| c.active)
            .max_by_key(|c| c.created_at)
            .cloned())
    }

    fn recent_active(&self, limit: usize) -> Result<Vec<Candidate>, DirectoryError> {
        let mut active: Vec<Candidate> = self
            .candidates
            .iter()
            .filter(|c| c.active)
            .cloned()
            .collect();
        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        active.truncate(limit);
        Ok(active)
    }
}

pub(super) struct UnavailableCandidates;

impl CandidateDirectory for UnavailableCandidates {
    fn active_count(&self) -> Result<u64, DirectoryError> {
        Err(DirectoryError::Unavailable("candidate store offline".to_string()))
    }

    fn most_recent_active(&self) -> Result<Option<Candidate>, DirectoryError> {
        Err(DirectoryError::Unavailable("candidate store offline".to_string()))
    }

    fn recent_active(&self, _limit: usize) -> Result<Vec<Candidate>, DirectoryError> {
        Err(DirectoryError::Unavailable("candidate store offline".to_string()))
    }
}

pub(super) struct StaticSubscribers(pub(super) Vec<Subscriber>);

impl SubscriberDirectory for StaticSubscribers {
    fn active_subscribers(&self) -> Result<Vec<Subscriber>, DirectoryError> {
        Ok(self.0.iter().filter(|s| s.active).cloned().collect())
    }
}

#[derive(Default)]
pub(super) struct MemoryWatermark {
    value: Mutex<u64>,
}

impl MemoryWatermark {
    pub(super) fn at(value: u64) -> Self {
        Self {
            value: Mutex::new(value),
        }
    }

    pub(super) fn current(&self) -> u64 {
        *self.value.lock().expect("watermark mutex poisoned")
    }
}

impl NotificationWatermark for MemoryWatermark {
    fn last_notified(&self) -> Result<u64, WatermarkError> {
        Ok(self.current())
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

/// Watermark whose CAS always fails, simulating a concurrent winner.
pub(super) struct ContendedWatermark;

impl NotificationWatermark for ContendedWatermark {
    fn last_notified(&self) -> Result<u64, WatermarkError> {
        Ok(0)
    }

    fn advance(&self, _expected: u64, _to: u64) -> Result<bool, WatermarkError> {
        Ok(false)
    }
}

#[derive(Clone, Default)]
pub(super) struct Mailbox {
    messages: Arc<Mutex<Vec<EmailMessage>>>,
}

impl Mailbox {
    pub(super) fn push(&self, message: EmailMessage) {
        self.messages
            .lock()
            .expect("mailbox mutex poisoned")
            .push(message);
    }

    pub(super) fn messages(&self) -> Vec<EmailMessage> {
        self.messages.lock().expect("mailbox mutex poisoned").clone()
    }
}

#[derive(Clone, Default)]
pub(super) struct CallCounter(Arc<Mutex<u32>>);

impl CallCounter {
    pub(super) fn get(&self) -> u32 {
        *self.0.lock().expect("counter mutex poisoned")
    }

    fn bump(&self) {
        *self.0.lock().expect("counter mutex poisoned") += 1;
    }
}

pub(super) enum StubMode {
    Accept,
    Reject(&'static str),
    RejectRecipient(&'static str),
    Stall,
}

pub(super) struct StubProvider {
    name: &'static str,
    mode: StubMode,
    mailbox: Mailbox,
    calls: CallCounter,
}

impl StubProvider {
    pub(super) fn accepting(name: &'static str) -> Self {
        Self::with_mode(name, StubMode::Accept)
    }

    pub(super) fn rejecting(name: &'static str, reason: &'static str) -> Self {
        Self::with_mode(name, StubMode::Reject(reason))
    }

    pub(super) fn rejecting_recipient(name: &'static str, recipient: &'static str) -> Self {
        Self::with_mode(name, StubMode::RejectRecipient(recipient))
    }

    pub(super) fn stalling(name: &'static str) -> Self {
        Self::with_mode(name, StubMode::Stall)
    }

    fn with_mode(name: &'static str, mode: StubMode) -> Self {
        Self {
            name,
            mode,
            mailbox: Mailbox::default(),
            calls: CallCounter::default(),
        }
    }

    pub(super) fn mailbox(&self) -> Mailbox {
        self.mailbox.clone()
    }

    pub(super) fn counter(&self) -> CallCounter {
        self.calls.clone()
    }
}

#[async_trait]
impl EmailProvider for StubProvider {
    fn name(&self) -> &str {
        self.name
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), ProviderError> {
        self.calls.bump();
        match &self.mode {
            StubMode::Accept => {
                self.mailbox.push(message.clone());
                Ok(())
            }
            StubMode::Reject(reason) => Err(ProviderError::Unreachable((*reason).to_string())),
            StubMode::RejectRecipient(recipient) => {
                if message.to == *recipient {
                    Err(ProviderError::Rejected(format!(
                        "recipient {recipient} blocked"
                    )))
                } else {
                    self.mailbox.push(message.clone());
                    Ok(())
                }
            }
            StubMode::Stall => {
                tokio::time::sleep(StdDuration::from_secs(3600)).await;
                Ok(())
            }
        }
    }
}

pub(super) fn delivery_router(providers: Vec<Box<dyn EmailProvider>>) -> DeliveryRouter {
    DeliveryRouter::new(providers, StdDuration::from_millis(200))
}

pub(super) fn orchestrator<W>(
    candidates: StaticCandidates,
    subscribers: Vec<Subscriber>,
    watermark: W,
    router: DeliveryRouter,
) -> NotificationOrchestrator<StaticCandidates, StaticSubscribers, W>
where
    W: NotificationWatermark + 'static,
{
    NotificationOrchestrator::new(
        Arc::new(candidates),
        Arc::new(StaticSubscribers(subscribers)),
        Arc::new(watermark),
        Arc::new(router),
        TriggerConfig::new(3, Duration::minutes(10)),
        4,
    )
}
