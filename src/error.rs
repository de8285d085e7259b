//! Error types for the climate relay controller
//!
//! Every fallible operation in the crate returns [`Result`]. Errors carry a
//! machine-readable [`ErrorCode`] so the HTTP shell can render a stable JSON
//! body and pick a status code without string matching.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for controller operations
pub type Result<T> = std::result::Result<T, ClimateError>;

/// Error types for the climate relay controller
#[derive(Error, Debug)]
pub enum ClimateError {
    /// Indoor sensor read failed
    #[error("Sensor error: {0}")]
    Sensor(String),

    /// Outdoor weather lookup failed
    #[error("Weather error: {0}")]
    Weather(String),

    /// Relay command could not be applied
    #[error("Actuator error: {0}")]
    Actuator(String),

    /// Hardware handle could not be acquired or released
    #[error("Hardware error: {0}")]
    Hardware(String),

    /// Invalid input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Timeout errors
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// External service errors
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Parsing errors
    #[error("Parsing error: {0}")]
    Parsing(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing errors
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Layered configuration loading errors
    #[error("Configuration loading failed: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// Generic I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors
    #[error("Generic error: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Structured error code for machine-readable error handling
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Configuration errors (1200-1299)
    ConfigurationInvalid,

    // Device errors (1300-1399)
    SensorReadFailed,
    DeviceControlFailed,
    HardwareUnavailable,

    // Data errors (1400-1499)
    ParsingFailed,
    InvalidInput,

    // Service errors (1600-1699)
    ServiceTimeout,
    ExternalServiceError,

    // Internal errors (1900-1999)
    InternalError,
}

impl ErrorCode {
    /// Get numeric error code
    pub fn as_number(&self) -> u32 {
        match self {
            ErrorCode::ConfigurationInvalid => 1202,

            ErrorCode::SensorReadFailed => 1301,
            ErrorCode::DeviceControlFailed => 1303,
            ErrorCode::HardwareUnavailable => 1304,

            ErrorCode::ParsingFailed => 1401,
            ErrorCode::InvalidInput => 1402,

            ErrorCode::ServiceTimeout => 1602,
            ErrorCode::ExternalServiceError => 1603,

            ErrorCode::InternalError => 1901,
        }
    }

    /// Get error category
    pub fn category(&self) -> &'static str {
        match self.as_number() {
            1200..=1299 => "configuration",
            1300..=1399 => "device",
            1400..=1499 => "data",
            1600..=1699 => "service",
            1900..=1999 => "internal",
            _ => "unknown",
        }
    }

    /// HTTP status the presentation layer answers with
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorCode::InvalidInput | ErrorCode::ParsingFailed => 400,
            ErrorCode::DeviceControlFailed
            | ErrorCode::SensorReadFailed
            | ErrorCode::ExternalServiceError => 502,
            ErrorCode::HardwareUnavailable => 503,
            ErrorCode::ServiceTimeout => 504,
            ErrorCode::ConfigurationInvalid | ErrorCode::InternalError => 500,
        }
    }
}

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Low severity - information only
    Info,
    /// Medium severity - warning condition
    Warning,
    /// High severity - error condition
    Error,
    /// Critical severity - the process cannot continue
    Critical,
}

impl ClimateError {
    /// Create a sensor error
    pub fn sensor<S: Into<String>>(msg: S) -> Self {
        Self::Sensor(msg.into())
    }

    /// Create a weather error
    pub fn weather<S: Into<String>>(msg: S) -> Self {
        Self::Weather(msg.into())
    }

    /// Create an actuator error
    pub fn actuator<S: Into<String>>(msg: S) -> Self {
        Self::Actuator(msg.into())
    }

    /// Create a hardware acquisition error
    pub fn hardware<S: Into<String>>(msg: S) -> Self {
        Self::Hardware(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a configuration error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    /// Create a timeout error
    pub fn timeout<S: Into<String>>(msg: S) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create an external service error
    pub fn external_service<S: Into<String>>(msg: S) -> Self {
        Self::ExternalService(msg.into())
    }

    /// Create a parsing error
    pub fn parsing<S: Into<String>>(msg: S) -> Self {
        Self::Parsing(msg.into())
    }

    /// Map the error to its structured error code
    pub fn to_error_code(&self) -> ErrorCode {
        match self {
            ClimateError::Sensor(_) => ErrorCode::SensorReadFailed,
            ClimateError::Weather(_) => ErrorCode::ExternalServiceError,
            ClimateError::Actuator(_) => ErrorCode::DeviceControlFailed,
            ClimateError::Hardware(_) => ErrorCode::HardwareUnavailable,
            ClimateError::InvalidInput(_) => ErrorCode::InvalidInput,
            ClimateError::Config(_) | ClimateError::ConfigLoad(_) => {
                ErrorCode::ConfigurationInvalid
            }
            ClimateError::Timeout(_) => ErrorCode::ServiceTimeout,
            ClimateError::ExternalService(_) | ClimateError::Http(_) => {
                ErrorCode::ExternalServiceError
            }
            ClimateError::Parsing(_) | ClimateError::Json(_) => ErrorCode::ParsingFailed,
            ClimateError::Io(_) | ClimateError::Generic(_) => ErrorCode::InternalError,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            ClimateError::Hardware(_) | ClimateError::Config(_) | ClimateError::ConfigLoad(_) => {
                ErrorSeverity::Critical
            }
            ClimateError::Sensor(_)
            | ClimateError::Weather(_)
            | ClimateError::Timeout(_)
            | ClimateError::Http(_)
            | ClimateError::ExternalService(_) => ErrorSeverity::Warning,
            ClimateError::InvalidInput(_) => ErrorSeverity::Info,
            _ => ErrorSeverity::Error,
        }
    }

    /// Check if error is transient and the operation may be retried
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ClimateError::Sensor(_)
                | ClimateError::Weather(_)
                | ClimateError::Timeout(_)
                | ClimateError::Http(_)
                | ClimateError::Io(_)
        )
    }
}

/// Error logging and reporting utilities
pub struct ErrorReporter;

impl ErrorReporter {
    /// Log an error at the level matching its severity
    pub fn log_error(error: &ClimateError, component: &str, operation: &str) {
        let code = error.to_error_code();

        match error.severity() {
            ErrorSeverity::Critical | ErrorSeverity::Error => {
                tracing::error!(
                    error_code = code.as_number(),
                    category = code.category(),
                    component,
                    operation,
                    "{}",
                    error
                );
            }
            ErrorSeverity::Warning => {
                tracing::warn!(
                    error_code = code.as_number(),
                    category = code.category(),
                    component,
                    operation,
                    "{}",
                    error
                );
            }
            ErrorSeverity::Info => {
                tracing::info!(
                    error_code = code.as_number(),
                    category = code.category(),
                    component,
                    operation,
                    "{}",
                    error
                );
            }
        }
    }

    /// Format error for API responses
    pub fn format_api_error(error: &ClimateError) -> serde_json::Value {
        let code = error.to_error_code();

        serde_json::json!({
            "error": {
                "code": code.as_number(),
                "category": code.category(),
                "message": error.to_string(),
                "retryable": error.is_retryable(),
            }
        })
    }
}
