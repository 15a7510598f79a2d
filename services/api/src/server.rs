use crate::cli::ServeArgs;
use crate::infra::{
    trigger_config, verification_policy, AppState, CandidateBoard, CasWatermark,
    ConsoleMailProvider, MemoryCodeVault, SubscriberRoster,
};
use crate::routes::with_pipeline_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

use talentwire::config::AppConfig;
use talentwire::error::AppError;
use talentwire::telemetry;
use talentwire::workflows::newsletter::{DeliveryRouter, EmailProvider, NotificationOrchestrator};
use talentwire::workflows::verification::{MailboxVerifier, VerificationState};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    // The listings and subscription subsystems populate these stores in
    // production; the process starts empty and serves whatever they hold.
    let candidates = Arc::new(CandidateBoard::default());
    let subscribers = Arc::new(SubscriberRoster::default());
    let watermark = Arc::new(CasWatermark::default());
    let vault = Arc::new(MemoryCodeVault::default());

    let providers: Vec<Box<dyn EmailProvider>> = vec![
        Box::new(ConsoleMailProvider::new("console-primary")),
        Box::new(ConsoleMailProvider::new("console-fallback")),
    ];
    let delivery = Arc::new(DeliveryRouter::new(
        providers,
        config.notifications.send_timeout(),
    ));

    let orchestrator = Arc::new(NotificationOrchestrator::new(
        candidates,
        subscribers,
        watermark,
        delivery.clone(),
        trigger_config(&config.notifications),
        config.notifications.max_concurrent_sends,
    ));

    let verifier = Arc::new(MailboxVerifier::new(
        vault,
        verification_policy(&config.verification),
    ));
    let verification = VerificationState { verifier, delivery };

    let app = with_pipeline_routes(orchestrator, verification)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "candidate notification pipeline ready");

    axum::serve(listener, app).await?;
    Ok(())
}
