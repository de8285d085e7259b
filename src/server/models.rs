//! Response models for the HTTP shell

use crate::climate::gate::GateStatus;
use crate::climate::policy::ThresholdPolicy;
use crate::error::{ClimateError, ErrorReporter};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Body of `GET /api/status`
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    #[serde(flatten)]
    pub status: GateStatus,
    pub policy: ThresholdPolicy,
}

/// Body of `GET /health`
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

impl IntoResponse for ClimateError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.to_error_code().http_status())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorReporter::format_api_error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (ClimateError::invalid_input("bad"), StatusCode::BAD_REQUEST),
            (ClimateError::actuator("line"), StatusCode::BAD_GATEWAY),
            (ClimateError::config("x"), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (error, expected) in cases {
            assert_eq!(error.into_response().status(), expected);
        }
    }
}
