//! API layer -- axum routes, handlers, and error mapping.

mod routes;
pub mod state;

use self::state::AppState;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router};
use serde_json::json;
use thiserror::Error;
use tower_http::trace::TraceLayer;

use crate::tracker::TrackerError;
use crate::users::UserError;

/// Build the application router with all API routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes())
        .fallback(fallback)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn fallback() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "not found")
}

/// Errors a handler can return; each maps to one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Tracker(#[from] TrackerError),

    #[error(transparent)]
    User(#[from] UserError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Tracker(TrackerError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Tracker(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::User(UserError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::User(UserError::Invalid(_)) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
