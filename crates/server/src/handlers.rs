//! Webhook handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use callguard_core::{normalize_national_id, normalize_phone_number};
use serde_json::json;

use crate::models::{CheckRequest, QueryAccepted, QueryRequest, WebhookResponse};
use crate::state::AppState;

/// Health check endpoint
pub async fn healthcheck() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

/// Answer whether the caller's number is blocked.
///
/// Only the block list is consulted. A body that does not carry a caller id
/// gets a 400 with the blocking envelope.
pub async fn check_phone_number(
    State(state): State<AppState>,
    body: Result<Json<CheckRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match body {
        Ok(Json(request)) => request,
        Err(rejection) => {
            tracing::error!(error = %rejection.body_text(), "Request validation failed");
            return (StatusCode::BAD_REQUEST, Json(WebhookResponse::malformed()));
        }
    };

    let phone_number = normalize_phone_number(&request.payload.telephony.caller_id);
    if !has_identifier(&phone_number) {
        tracing::error!(
            caller_id = %request.payload.telephony.caller_id,
            "Caller id is empty after normalization"
        );
        return (StatusCode::BAD_REQUEST, Json(WebhookResponse::malformed()));
    }

    tracing::info!(phone_number = %phone_number, "Received check request");

    let response = if state.gate.decide(&phone_number).await.is_blocked() {
        WebhookResponse::blocked()
    } else {
        WebhookResponse::allowed()
    };

    tracing::info!(
        phone_number = %phone_number,
        block = response.is_block(),
        "Sending webhook response"
    );
    (StatusCode::OK, Json(response))
}

/// Record a query. Responds once the event is durable; evaluation runs in
/// the background. A caller id with nothing left after normalization is
/// rejected with 422 and nothing is recorded.
pub async fn register_query(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Response {
    let phone_number = normalize_phone_number(&request.payload.telephony.caller_id);
    let national_id = normalize_national_id(&request.session_info.parameters.national_id);
    if !has_identifier(&phone_number) {
        tracing::error!(
            caller_id = %request.payload.telephony.caller_id,
            "Caller id is empty after normalization"
        );
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({ "status": "error" })),
        )
            .into_response();
    }

    tracing::info!(
        phone_number = %phone_number,
        national_id = %national_id,
        "Received query request"
    );

    match state.gate.submit_query(&phone_number, &national_id).await {
        Ok(ack) => {
            tracing::debug!(
                query_id = %ack.query_id,
                evaluation_queued = ack.evaluation_queued,
                "Query acknowledged"
            );
            (StatusCode::OK, Json(QueryAccepted::new(ack.query_id))).into_response()
        }
        Err(e) => {
            tracing::error!(phone_number = %phone_number, error = %e, "Query not recorded");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "error" })),
            )
                .into_response()
        }
    }
}

fn has_identifier(phone_number: &str) -> bool {
    phone_number.chars().any(|c| c.is_ascii_alphanumeric())
}
