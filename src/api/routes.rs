//! API route definitions.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};

use super::state::AppState;
use super::ApiError;
use crate::users::NewUser;

type ApiResult<T> = Result<T, ApiError>;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(ready))
        .route("/health/live", get(live))
        .route("/users", get(list_users).post(create_user))
        .route("/users/search", get(search_users))
        .route(
            "/users/{id}",
            get(get_user).put(update_user).delete(delete_user),
        )
        .route("/tests/run", post(run_all_tests))
        .route("/tests/run/{test_class}/{test_method}", post(run_specific_test))
        .route("/tests/execution/{execution_id}", get(get_execution))
        .route("/tests/executions", get(list_executions))
        .route("/tests/status/{execution_id}", get(execution_status))
        .route("/tests/available", get(available_tests))
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

async fn health() -> Json<Value> {
    Json(json!({
        "data": {
            "status": "UP",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        },
        "meta": {
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "version": env!("CARGO_PKG_VERSION")
        }
    }))
}

async fn ready() -> Json<Value> {
    Json(json!({ "data": { "status": "READY" } }))
}

async fn live() -> Json<Value> {
    Json(json!({ "data": { "status": "LIVE" } }))
}

// ---------------------------------------------------------------------------
// Users
// ---------------------------------------------------------------------------

async fn list_users(State(state): State<AppState>) -> Json<Value> {
    let users = state.users.list().await;
    Json(json!({ "data": users, "meta": { "total": users.len() } }))
}

async fn get_user(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<Json<Value>> {
    let user = state.users.get(id).await?;
    Ok(Json(json!({ "data": user })))
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<NewUser>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user = state.users.create(body).await?;
    Ok((StatusCode::CREATED, Json(json!({ "data": user }))))
}

async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(body): Json<NewUser>,
) -> ApiResult<Json<Value>> {
    let user = state.users.update(id, body).await?;
    Ok(Json(json!({ "data": user })))
}

async fn delete_user(State(state): State<AppState>, Path(id): Path<u64>) -> ApiResult<StatusCode> {
    state.users.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    username: Option<String>,
}

async fn search_users(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Value>> {
    let username = params
        .username
        .filter(|u| !u.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("Username parameter is required".to_string()))?;
    let user = state
        .users
        .find_by_username(&username)
        .await
        .ok_or_else(|| ApiError::NotFound(format!("no user named {}", username)))?;
    Ok(Json(json!({ "data": user })))
}

// ---------------------------------------------------------------------------
// Test runner
// ---------------------------------------------------------------------------

fn accepted(execution_id: String, message: String) -> (StatusCode, Json<Value>) {
    (
        StatusCode::ACCEPTED,
        Json(json!({
            "data": {
                "executionId": execution_id,
                "status": "STARTED",
                "message": message
            }
        })),
    )
}

async fn run_all_tests(State(state): State<AppState>) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.tests.start_all().await?;
    Ok(accepted(id, "Test execution started".to_string()))
}

async fn run_specific_test(
    State(state): State<AppState>,
    Path((test_class, test_method)): Path<(String, String)>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let id = state.tests.start_one(&test_class, &test_method).await?;
    Ok(accepted(
        id,
        format!("Test execution started for {}.{}", test_class, test_method),
    ))
}

async fn get_execution(
    State(state): State<AppState>,
    Path(execution_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let rec = state.tests.get_execution(&execution_id).await?;
    Ok(Json(json!({ "data": rec })))
}

async fn list_executions(State(state): State<AppState>) -> Json<Value> {
    let executions = state.tests.list_executions().await;
    Json(json!({ "data": executions, "meta": { "total": executions.len() } }))
}

async fn execution_status(
    State(state): State<AppState>,
    Path(execution_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let summary = state.tests.status_summary(&execution_id).await?;
    Ok(Json(json!({ "data": summary })))
}

async fn available_tests(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "data": state.tests.catalog_info() }))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
