use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde_json::json;

use super::directory::{CandidateDirectory, SubscriberDirectory};
use super::orchestrator::NotificationOrchestrator;
use super::trigger::NotificationWatermark;

/// Router builder exposing the on-demand notification cycle. The same
/// endpoint serves the post-creation hook and the scheduled catch-up call.
pub fn newsletter_router<C, S, W>(
    orchestrator: Arc<NotificationOrchestrator<C, S, W>>,
) -> Router
where
    C: CandidateDirectory + 'static,
    S: SubscriberDirectory + 'static,
    W: NotificationWatermark + 'static,
{
    Router::new()
        .route("/api/v1/newsletter/run", post(run_cycle_handler::<C, S, W>))
        .with_state(orchestrator)
}

pub(crate) async fn run_cycle_handler<C, S, W>(
    State(orchestrator): State<Arc<NotificationOrchestrator<C, S, W>>>,
) -> Response
where
    C: CandidateDirectory + 'static,
    S: SubscriberDirectory + 'static,
    W: NotificationWatermark + 'static,
{
    match orchestrator.run_cycle().await {
        Ok(report) => (StatusCode::OK, axum::Json(report)).into_response(),
        Err(err) => {
            let payload = json!({
                "error": err.to_string(),
            });
            (StatusCode::SERVICE_UNAVAILABLE, axum::Json(payload)).into_response()
        }
    }
}
