//! Route handlers for the status page and the override endpoints

use crate::error::{ClimateError, ErrorReporter};
use crate::server::dashboard::{render_index, STYLE_CSS};
use crate::server::models::{HealthResponse, StatusResponse};
use crate::server::AppState;
use axum::{
    extract::{Path, State},
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Json,
};
use tracing::debug;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let status = state.api.status().await;
    Html(render_index(&status, &state.policy))
}

pub async fn style() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS)
}

pub async fn is_active(State(state): State<AppState>) -> String {
    state.api.is_active().await.to_string()
}

pub async fn is_locked(State(state): State<AppState>) -> String {
    state.api.is_locked().await.to_string()
}

/// `/lock/<on|off>/<minutes>`; redirects back to the status page
pub async fn lock(State(state): State<AppState>, Path(path): Path<String>) -> Response {
    match state.api.apply_path(&path).await {
        Ok(receipt) => {
            debug!(
                active = receipt.active,
                minutes = receipt.minutes,
                "Override accepted"
            );
            Redirect::temporary("/").into_response()
        }
        Err(error) => {
            ErrorReporter::log_error(&error, "http", "lock");
            error.into_response()
        }
    }
}

pub async fn api_status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        status: state.api.status().await,
        policy: state.policy,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}

/// Anything under `/lock` that is not `<state>/<minutes>` is a bad request.
pub async fn fallback(uri: Uri) -> Response {
    let path = uri.path();
    if path == "/lock" || path.starts_with("/lock/") {
        let error = ClimateError::invalid_input(format!(
            "expected /lock/<on|off>/<minutes>, got '{path}'"
        ));
        ErrorReporter::log_error(&error, "http", "lock");
        return error.into_response();
    }

    (StatusCode::NOT_FOUND, "not found").into_response()
}
