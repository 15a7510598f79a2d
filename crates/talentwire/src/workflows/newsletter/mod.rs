//! Candidate digest notifications for newsletter subscribers.
//!
//! The pipeline is composed of small seams: read-only directories over the
//! candidate and subscriber stores, a pure preference filter, an ordered
//! provider chain with fallback, a milestone watermark, and the orchestrator
//! that runs one notification cycle end to end.

pub mod delivery;
pub mod directory;
pub mod domain;
pub(crate) mod filter;
pub mod message;
pub mod orchestrator;
pub mod router;
pub mod trigger;

#[cfg(test)]
mod tests;

pub use delivery::{
    Delivery, DeliveryError, DeliveryRouter, EmailMessage, EmailProvider, ProviderError,
    ProviderFailure,
};
pub use directory::{CandidateDirectory, DirectoryError, SubscriberDirectory};
pub use domain::{Candidate, CandidateId, PreferenceVector, Subscriber};
pub use filter::matching_candidates;
pub use orchestrator::{
    CycleError, CycleReport, DeliveryFailureEntry, NotificationOrchestrator, SkipReason,
    TriggerDisposition,
};
pub use router::newsletter_router;
pub use trigger::{should_notify, NotificationWatermark, TriggerConfig, WatermarkError};
