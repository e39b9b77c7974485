//! Webhook routes

use axum::{
    body::Body,
    extract::{FromRequest, State},
    http::{Method, Request, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::models::CheckRequest;
use crate::state::AppState;

/// Paths the agent calls for the block check. The colon form is matched in
/// [`fallback`] because `:` starts a capture in route patterns.
const CHECK_PATHS: [&str; 2] = ["/phone-numbers:check", "/phone-numbers:check/"];

pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/healthcheck", get(handlers::healthcheck))
        // Block check
        .route("/phone-numbers/check", post(handlers::check_phone_number))
        .route("/phone-numbers/check/", post(handlers::check_phone_number))
        // Query recording
        .route("/queries", post(handlers::register_query))
        .route("/queries/", post(handlers::register_query))
        .fallback(fallback)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback(State(state): State<AppState>, request: Request<Body>) -> Response {
    let path = request.uri().path();
    if !CHECK_PATHS.contains(&path) {
        return StatusCode::NOT_FOUND.into_response();
    }
    if request.method() != Method::POST {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let body = Json::<CheckRequest>::from_request(request, &state).await;
    handlers::check_phone_number(State(state), body)
        .await
        .into_response()
}
