//! Manual override requests and the API surface exposed to presentation

use crate::climate::gate::{CommandGate, CommandOutcome, GateStatus};
use crate::error::{ClimateError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Validated manual override
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OverrideRequest {
    pub active: bool,
    pub minutes: u32,
}

impl OverrideRequest {
    /// Parse `state` ("on" or "off") and `minutes` (non-negative integer).
    pub fn parse(state: &str, minutes: &str) -> Result<Self> {
        let active = match state {
            "on" => true,
            "off" => false,
            other => {
                return Err(ClimateError::invalid_input(format!(
                    "state must be 'on' or 'off', got '{other}'"
                )))
            }
        };

        let minutes = minutes.parse::<u32>().map_err(|_| {
            ClimateError::invalid_input(format!(
                "minutes must be a non-negative integer, got '{minutes}'"
            ))
        })?;

        Ok(Self { active, minutes })
    }

    /// Parse the `<state>/<minutes>` tail of a lock path.
    pub fn from_path(path: &str) -> Result<Self> {
        let segments: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        match segments.as_slice() {
            [state, minutes] => Self::parse(state, minutes),
            _ => Err(ClimateError::invalid_input(format!(
                "expected <on|off>/<minutes>, got '{path}'"
            ))),
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::minutes(i64::from(self.minutes))
    }
}

/// Result of an accepted override
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideReceipt {
    pub active: bool,
    pub minutes: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

/// Operations the HTTP layer needs, backed by the command gate
#[derive(Debug, Clone)]
pub struct OverrideApi {
    gate: Arc<CommandGate>,
}

impl OverrideApi {
    pub fn new(gate: Arc<CommandGate>) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &Arc<CommandGate> {
        &self.gate
    }

    /// Force the relay and lock out automatic control.
    ///
    /// The lock is armed even when the actuator rejects the command; the
    /// error is still returned so the caller can report it.
    pub async fn apply(&self, request: OverrideRequest) -> Result<OverrideReceipt> {
        info!(
            active = request.active,
            minutes = request.minutes,
            "Manual override requested"
        );

        match self
            .gate
            .manual_override(request.active, request.duration())
            .await
        {
            CommandOutcome::Applied => {
                let status = self.gate.status().await;
                Ok(OverrideReceipt {
                    active: request.active,
                    minutes: request.minutes,
                    locked_until: status.locked_until,
                })
            }
            CommandOutcome::Failed(reason) => Err(ClimateError::actuator(format!(
                "override could not be applied: {reason}"
            ))),
            // manual_override clears the lock before applying
            CommandOutcome::Locked { until } => Err(ClimateError::actuator(format!(
                "relay unexpectedly locked until {until}"
            ))),
        }
    }

    /// Parse and apply a `<state>/<minutes>` path
    pub async fn apply_path(&self, path: &str) -> Result<OverrideReceipt> {
        let request = OverrideRequest::from_path(path)?;
        self.apply(request).await
    }

    pub async fn status(&self) -> GateStatus {
        self.gate.status().await
    }

    pub async fn is_active(&self) -> bool {
        self.gate.is_active().await
    }

    pub async fn is_locked(&self) -> bool {
        self.gate.is_locked().await
    }
}
