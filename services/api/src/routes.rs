use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

use talentwire::workflows::newsletter::{
    newsletter_router, CandidateDirectory, NotificationOrchestrator, NotificationWatermark,
    SubscriberDirectory,
};
use talentwire::workflows::verification::{verification_router, CodeVault, VerificationState};

pub(crate) fn with_pipeline_routes<C, S, W, V>(
    orchestrator: Arc<NotificationOrchestrator<C, S, W>>,
    verification: VerificationState<V>,
) -> axum::Router
where
    C: CandidateDirectory + 'static,
    S: SubscriberDirectory + 'static,
    W: NotificationWatermark + 'static,
    V: CodeVault + 'static,
{
    newsletter_router(orchestrator)
        .merge(verification_router(verification))
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}
