//! HTTP REST API routes

mod character_routes;
mod event_routes;
mod loot_routes;
mod session_routes;

use std::sync::Arc;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::application::error::CoreError;
use crate::infrastructure::state::AppState;

/// Create all API routes
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Session lifecycle
        .route(
            "/api/missions/{mission_id}/sessions",
            post(session_routes::start_session),
        )
        .route("/api/sessions/{id}", get(session_routes::get_session))
        .route(
            "/api/sessions/{id}/abandon",
            post(session_routes::abandon_session),
        )
        .route("/api/sessions/{id}/rest", post(session_routes::choose_rest))
        // Active event
        .route("/api/sessions/{id}/event", get(event_routes::get_event))
        .route(
            "/api/sessions/{id}/event/actions",
            post(event_routes::submit_action),
        )
        // Combat
        .route(
            "/api/sessions/{id}/combat/attack",
            post(event_routes::submit_attack),
        )
        .route(
            "/api/sessions/{id}/combat/guard",
            post(event_routes::submit_guard),
        )
        .route(
            "/api/sessions/{id}/combat/revive",
            post(event_routes::revive),
        )
        // Loot
        .route("/api/sessions/{id}/loot", get(loot_routes::list_drops))
        .route(
            "/api/sessions/{id}/loot/{drop_id}/roll",
            post(loot_routes::submit_roll),
        )
        .route(
            "/api/sessions/{id}/loot/{drop_id}/assign",
            post(loot_routes::assign_drop),
        )
        // Currency
        .route(
            "/api/characters/{id}/balance",
            get(character_routes::get_balance),
        )
}

/// Wrapper mapping core errors onto HTTP responses with a `{code, message}`
/// JSON body
pub struct ApiError(CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
            CoreError::Unauthorized(_) => StatusCode::FORBIDDEN,
            CoreError::InvalidState(_) => StatusCode::CONFLICT,
            CoreError::InsufficientFunds { .. } => StatusCode::CONFLICT,
            CoreError::Port(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!(error = %self.0, "request failed");
        }
        let body = serde_json::json!({
            "code": self.0.code(),
            "message": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}
