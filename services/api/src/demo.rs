use crate::infra::{
    trigger_config, verification_policy, CandidateBoard, CasWatermark, ConsoleMailProvider,
    MemoryCodeVault, SubscriberRoster,
};
use chrono::{Duration, Utc};
use clap::Args;
use std::sync::Arc;

use talentwire::config::AppConfig;
use talentwire::error::AppError;
use talentwire::telemetry;
use talentwire::workflows::newsletter::{
    Candidate, CandidateId, DeliveryRouter, EmailProvider, NotificationOrchestrator,
    PreferenceVector, Subscriber,
};
use talentwire::workflows::verification::{MailboxVerifier, VerificationOutcome};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// City used for the matching subscriber and two of the seeded candidates
    #[arg(long, default_value = "Tel Aviv")]
    pub(crate) city: String,
    /// Skip the mailbox verification portion of the demo
    #[arg(long)]
    pub(crate) skip_verification: bool,
}

pub(crate) async fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;

    println!("Talentwire notification pipeline demo");
    println!("=====================================");

    let now = Utc::now();
    let candidates = Arc::new(CandidateBoard::default());
    candidates.seed(vec![
        seeded_candidate("cand-001", &args.city, now - Duration::minutes(3)),
        seeded_candidate("cand-002", &args.city, now - Duration::minutes(2)),
        seeded_candidate("cand-003", "Elsewhere", now - Duration::minutes(1)),
    ]);

    let subscribers = Arc::new(SubscriberRoster::default());
    subscribers.seed(vec![
        city_subscriber("match@example.com", &args.city),
        city_subscriber("nomatch@example.com", "Nowhere"),
    ]);

    let providers: Vec<Box<dyn EmailProvider>> =
        vec![Box::new(ConsoleMailProvider::new("console-primary"))];
    let delivery = Arc::new(DeliveryRouter::new(
        providers,
        config.notifications.send_timeout(),
    ));

    let orchestrator = NotificationOrchestrator::new(
        candidates,
        subscribers,
        Arc::new(CasWatermark::default()),
        delivery,
        trigger_config(&config.notifications),
        config.notifications.max_concurrent_sends,
    );

    println!(
        "\nSeeded 3 active candidates (2 in {}) and 2 subscribers.",
        args.city
    );
    let report = orchestrator.run_cycle().await?;
    println!(
        "Cycle outcome: attempted {}, delivered {}, failed {}, skipped (empty filter) {}",
        report.attempted, report.delivered, report.failed, report.skipped_empty_filter
    );
    for failure in &report.failures {
        println!("  delivery failure for {}: {}", failure.email, failure.reason);
    }

    let replay = orchestrator.run_cycle().await?;
    println!(
        "Replaying the same milestone fires nothing: fired = {}",
        replay.fired()
    );

    if args.skip_verification {
        return Ok(());
    }

    println!("\nMailbox verification round trip");
    let verifier = MailboxVerifier::new(
        Arc::new(MemoryCodeVault::default()),
        verification_policy(&config.verification),
    );
    let issued = verifier.issue("match@example.com")?;
    println!(
        "Issued code {} (expires {})",
        issued.code,
        issued.expires_at.format("%H:%M:%S UTC")
    );

    match verifier.validate("match@example.com", "000000")? {
        VerificationOutcome::Rejected(reason) => {
            println!("Wrong code rejected: {}", reason.summary())
        }
        VerificationOutcome::Confirmed => println!("Unexpected confirmation"),
    }

    match verifier.validate("match@example.com", &issued.code)? {
        VerificationOutcome::Confirmed => println!("Correct code confirmed the subscription"),
        VerificationOutcome::Rejected(reason) => {
            println!("Unexpected rejection: {}", reason.summary())
        }
    }

    Ok(())
}

fn seeded_candidate(id: &str, city: &str, created_at: chrono::DateTime<Utc>) -> Candidate {
    Candidate {
        id: CandidateId(id.to_string()),
        active: true,
        created_at,
        city: Some(city.to_string()),
        category: Some("Hospitality".to_string()),
        employment_type: Some("Full time".to_string()),
        languages: vec!["Hebrew".to_string(), "English".to_string()],
        gender: None,
        document_type: Some("Passport".to_string()),
        demanded: false,
    }
}

fn city_subscriber(email: &str, city: &str) -> Subscriber {
    Subscriber {
        email: email.to_string(),
        active: true,
        preferences: PreferenceVector {
            cities: vec![city.to_string()],
            ..PreferenceVector::default()
        },
    }
}
