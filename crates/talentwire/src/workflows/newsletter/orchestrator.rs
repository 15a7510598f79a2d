use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use super::delivery::DeliveryRouter;
use super::directory::{CandidateDirectory, DirectoryError, SubscriberDirectory};
use super::domain::{Candidate, Subscriber};
use super::filter::matching_candidates;
use super::message;
use super::trigger::{self, NotificationWatermark, TriggerConfig, WatermarkError};

/// Runs one notification cycle: trigger evaluation, milestone claim, and the
/// per-subscriber filter-then-deliver fan-out. Invoked after candidate
/// creation and by an external scheduler; both paths share this entry point.
pub struct NotificationOrchestrator<C, S, W> {
    candidates: Arc<C>,
    subscribers: Arc<S>,
    watermark: Arc<W>,
    delivery: Arc<DeliveryRouter>,
    trigger: TriggerConfig,
    max_concurrent_sends: usize,
}

impl<C, S, W> NotificationOrchestrator<C, S, W>
where
    C: CandidateDirectory + 'static,
    S: SubscriberDirectory + 'static,
    W: NotificationWatermark + 'static,
{
    pub fn new(
        candidates: Arc<C>,
        subscribers: Arc<S>,
        watermark: Arc<W>,
        delivery: Arc<DeliveryRouter>,
        trigger: TriggerConfig,
        max_concurrent_sends: usize,
    ) -> Self {
        Self {
            candidates,
            subscribers,
            watermark,
            delivery,
            trigger,
            max_concurrent_sends,
        }
    }

    pub async fn run_cycle(&self) -> Result<CycleReport, CycleError> {
        self.run_cycle_at(Utc::now()).await
    }

    /// Run one cycle against an explicit clock reading. A skipped cycle is a
    /// report, not an error; only directory and watermark failures abort the
    /// invocation (the scheduled re-run is the recovery path).
    pub async fn run_cycle_at(&self, now: DateTime<Utc>) -> Result<CycleReport, CycleError> {
        let active_count = self.candidates.active_count()?;
        let most_recent = match self.candidates.most_recent_active()? {
            Some(candidate) => candidate,
            None => return Ok(CycleReport::skipped(SkipReason::NoActiveCandidates)),
        };

        if !trigger::should_notify(&self.trigger, active_count, most_recent.created_at, now) {
            let off_milestone = self.trigger.batch_size == 0
                || active_count % u64::from(self.trigger.batch_size) != 0;
            let reason = if off_milestone {
                SkipReason::BetweenMilestones
            } else {
                SkipReason::StaleBatch
            };
            return Ok(CycleReport::skipped(reason));
        }

        let last_notified = self.watermark.last_notified()?;
        let current = trigger::milestone(active_count, self.trigger.batch_size);
        let recorded = trigger::milestone(last_notified, self.trigger.batch_size);
        if current <= recorded {
            return Ok(CycleReport::skipped(SkipReason::MilestoneAlreadyNotified));
        }

        let batch = self
            .candidates
            .recent_active(self.trigger.batch_size as usize)?;
        let subscribers = self.subscribers.active_subscribers()?;

        // Claim the milestone only once the reads succeeded; the loser of a
        // concurrent claim skips without sending anything.
        if !self.watermark.advance(last_notified, active_count)? {
            return Ok(CycleReport::skipped(SkipReason::LostMilestoneRace));
        }

        let outcomes = self.fan_out(Arc::new(batch), subscribers).await;
        let report = CycleReport::from_outcomes(outcomes);
        info!(
            attempted = report.attempted,
            delivered = report.delivered,
            failed = report.failed,
            skipped_empty_filter = report.skipped_empty_filter,
            "notification cycle completed"
        );
        Ok(report)
    }

    /// Fan out one batch to every subscriber, bounded by the concurrent-send
    /// cap. Each subscriber runs to completion independently; a failure is
    /// collected, never propagated to its siblings.
    async fn fan_out(
        &self,
        batch: Arc<Vec<Candidate>>,
        subscribers: Vec<Subscriber>,
    ) -> Vec<SubscriberOutcome> {
        let limiter = Arc::new(Semaphore::new(self.max_concurrent_sends.max(1)));
        let mut handles = Vec::with_capacity(subscribers.len());

        for subscriber in subscribers {
            let limiter = limiter.clone();
            let delivery = self.delivery.clone();
            let batch = batch.clone();
            let email = subscriber.email.clone();
            let handle = tokio::spawn(async move {
                let _permit = limiter.acquire_owned().await.expect("send limiter closed");
                notify_subscriber(&delivery, &batch, subscriber).await
            });
            handles.push((email, handle));
        }

        let mut outcomes = Vec::with_capacity(handles.len());
        for (email, handle) in handles {
            match handle.await {
                Ok(outcome) => outcomes.push(outcome),
                Err(err) => {
                    warn!(subscriber = %email, %err, "subscriber notification task aborted");
                    outcomes.push(SubscriberOutcome::Failed {
                        email,
                        reason: format!("notification task aborted: {err}"),
                    });
                }
            }
        }
        outcomes
    }
}

async fn notify_subscriber(
    delivery: &DeliveryRouter,
    batch: &[Candidate],
    subscriber: Subscriber,
) -> SubscriberOutcome {
    let matches = matching_candidates(batch, &subscriber.preferences);
    if matches.is_empty() {
        return SubscriberOutcome::NoMatches {
            email: subscriber.email,
        };
    }

    let digest = message::render_digest(&subscriber.email, &matches);
    match delivery.deliver(&digest).await {
        Ok(delivery) => SubscriberOutcome::Delivered {
            email: subscriber.email,
            provider: delivery.provider,
        },
        Err(err) => {
            warn!(subscriber = %subscriber.email, %err, "digest delivery failed");
            SubscriberOutcome::Failed {
                email: subscriber.email,
                reason: err.to_string(),
            }
        }
    }
}

/// Per-subscriber result of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SubscriberOutcome {
    Delivered { email: String, provider: String },
    NoMatches { email: String },
    Failed { email: String, reason: String },
}

/// Why a cycle chose not to notify.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoActiveCandidates,
    BetweenMilestones,
    StaleBatch,
    MilestoneAlreadyNotified,
    LostMilestoneRace,
}

/// Whether the trigger fired for this invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerDisposition {
    Fired,
    Skipped(SkipReason),
}

/// Delivery failure detail surfaced to operators through the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryFailureEntry {
    pub email: String,
    pub reason: String,
}

/// Aggregate outcome of one orchestrator invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleReport {
    pub disposition: TriggerDisposition,
    pub attempted: usize,
    pub delivered: usize,
    pub failed: usize,
    pub skipped_empty_filter: usize,
    pub failures: Vec<DeliveryFailureEntry>,
}

impl CycleReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            disposition: TriggerDisposition::Skipped(reason),
            attempted: 0,
            delivered: 0,
            failed: 0,
            skipped_empty_filter: 0,
            failures: Vec::new(),
        }
    }

    fn from_outcomes(outcomes: Vec<SubscriberOutcome>) -> Self {
        let mut report = Self {
            disposition: TriggerDisposition::Fired,
            attempted: 0,
            delivered: 0,
            failed: 0,
            skipped_empty_filter: 0,
            failures: Vec::new(),
        };

        for outcome in outcomes {
            match outcome {
                SubscriberOutcome::Delivered { .. } => {
                    report.attempted += 1;
                    report.delivered += 1;
                }
                SubscriberOutcome::NoMatches { .. } => {
                    report.skipped_empty_filter += 1;
                }
                SubscriberOutcome::Failed { email, reason } => {
                    report.attempted += 1;
                    report.failed += 1;
                    report.failures.push(DeliveryFailureEntry { email, reason });
                }
            }
        }
        report
    }

    /// True when the trigger fired for this invocation.
    pub fn fired(&self) -> bool {
        self.disposition == TriggerDisposition::Fired
    }
}

/// Fatal failure of one orchestrator invocation.
#[derive(Debug, thiserror::Error)]
pub enum CycleError {
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Watermark(#[from] WatermarkError),
}
