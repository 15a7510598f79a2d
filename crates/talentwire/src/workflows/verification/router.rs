use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::{CodeVault, MailboxVerifier, VerificationOutcome};
use crate::workflows::newsletter::delivery::DeliveryRouter;
use crate::workflows::newsletter::message;

/// Shared state for the verification endpoints: the verifier plus the
/// provider chain used to deliver the code to the mailbox.
pub struct VerificationState<V> {
    pub verifier: Arc<MailboxVerifier<V>>,
    pub delivery: Arc<DeliveryRouter>,
}

impl<V> Clone for VerificationState<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: self.verifier.clone(),
            delivery: self.delivery.clone(),
        }
    }
}

/// Router builder for issuing and confirming mailbox verification codes.
pub fn verification_router<V>(state: VerificationState<V>) -> Router
where
    V: CodeVault + 'static,
{
    Router::new()
        .route(
            "/api/v1/newsletter/verifications",
            post(issue_handler::<V>),
        )
        .route(
            "/api/v1/newsletter/verifications/confirm",
            post(confirm_handler::<V>),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub(crate) struct IssueRequest {
    pub(crate) email: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ConfirmRequest {
    pub(crate) email: String,
    pub(crate) code: String,
}

/// Issue a code and send it to the mailbox. The code is never echoed back
/// in the response; possession of the mailbox is the whole point.
pub(crate) async fn issue_handler<V>(
    State(state): State<VerificationState<V>>,
    axum::Json(request): axum::Json<IssueRequest>,
) -> Response
where
    V: CodeVault + 'static,
{
    let issued = match state.verifier.issue(&request.email) {
        Ok(issued) => issued,
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            return (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response();
        }
    };

    let email = message::render_verification(&request.email, &issued.code, issued.expires_at);
    match state.delivery.deliver(&email).await {
        Ok(_) => {
            let payload = json!({
                "email": request.email,
                "expires_at": issued.expires_at,
            });
            (StatusCode::ACCEPTED, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

pub(crate) async fn confirm_handler<V>(
    State(state): State<VerificationState<V>>,
    axum::Json(request): axum::Json<ConfirmRequest>,
) -> Response
where
    V: CodeVault + 'static,
{
    match state.verifier.validate(&request.email, &request.code) {
        Ok(VerificationOutcome::Confirmed) => {
            let payload = json!({
                "email": request.email,
                "status": "confirmed",
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Ok(VerificationOutcome::Rejected(reason)) => {
            let payload = json!({
                "reason": reason,
                "error": reason.summary(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, axum::Json(payload)).into_response()
        }
        Err(err) => {
            let payload = json!({ "error": err.to_string() });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
