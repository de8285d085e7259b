//! Background thermostat loop
//!
//! One cycle: read the indoor sensor, read the outdoor weather when it is
//! configured, pick a command from the policy table, push it through the
//! command gate, record the readings. Read failures skip the affected
//! signal for that cycle only.

use crate::climate::gate::{CommandGate, CommandOutcome};
use crate::climate::policy::{PolicyInputs, PolicyTable, ThresholdPolicy};
use crate::error::ErrorReporter;
use crate::hardware::{SensorReading, SensorSource, WeatherReading, WeatherSource};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Outdoor lookup wired to a fixed location
pub struct WeatherLink {
    pub source: Box<dyn WeatherSource>,
    pub location_code: String,
}

/// What a single cycle did
#[derive(Debug, Clone, PartialEq)]
pub struct CycleReport {
    pub indoor: Option<SensorReading>,
    pub outdoor: Option<WeatherReading>,
    /// Name of the rule that fired, `None` in the dead band or when skipped
    pub rule: Option<&'static str>,
    /// Gate outcome, `None` when no command was issued
    pub outcome: Option<CommandOutcome>,
}

impl CycleReport {
    pub fn commanded(&self) -> bool {
        self.outcome.is_some()
    }
}

/// The thermostat state machine driving the command gate
pub struct ControlLoop {
    gate: Arc<CommandGate>,
    sensor: Box<dyn SensorSource>,
    weather: Option<WeatherLink>,
    policy: ThresholdPolicy,
    table: PolicyTable,
    poll_interval: Duration,
}

impl ControlLoop {
    pub fn new(
        gate: Arc<CommandGate>,
        sensor: Box<dyn SensorSource>,
        policy: ThresholdPolicy,
        poll_interval: Duration,
    ) -> Self {
        Self {
            gate,
            sensor,
            weather: None,
            policy,
            table: PolicyTable::standard(),
            poll_interval,
        }
    }

    /// Enable outdoor readings from `source` for `location_code`
    pub fn with_weather(
        mut self,
        source: Box<dyn WeatherSource>,
        location_code: impl Into<String>,
    ) -> Self {
        self.weather = Some(WeatherLink {
            source,
            location_code: location_code.into(),
        });
        self
    }

    pub fn with_policy_table(mut self, table: PolicyTable) -> Self {
        self.table = table;
        self
    }

    pub fn policy(&self) -> &ThresholdPolicy {
        &self.policy
    }

    /// Run one decision cycle
    pub async fn run_cycle(&self) -> CycleReport {
        let indoor = match self.sensor.read().await {
            Ok(reading) => Some(reading),
            Err(error) => {
                ErrorReporter::log_error(&error, "control_loop", "read_sensor");
                None
            }
        };

        let outdoor = match &self.weather {
            Some(link) => match link.source.read(&link.location_code).await {
                Ok(reading) => Some(reading),
                Err(error) => {
                    ErrorReporter::log_error(&error, "control_loop", "read_weather");
                    None
                }
            },
            None => None,
        };

        let mut report = CycleReport {
            indoor,
            outdoor,
            rule: None,
            outcome: None,
        };

        // Unknown indoor temperature: no commands this cycle.
        if let Some(reading) = indoor {
            let inputs = PolicyInputs {
                indoor_temperature: reading.temperature,
                outdoor_temperature: outdoor.map(|w| w.temperature),
            };

            match self.table.evaluate(&inputs, &self.policy) {
                Some(rule) => {
                    debug!(
                        rule = rule.name,
                        indoor = inputs.indoor_temperature,
                        outdoor = ?inputs.outdoor_temperature,
                        active = rule.command.active,
                        "Policy rule matched"
                    );
                    report.rule = Some(rule.name);
                    report.outcome = Some(self.gate.attempt_command(rule.command).await);
                }
                None => {
                    debug!(
                        indoor = inputs.indoor_temperature,
                        low = self.policy.lower_bound(),
                        high = self.policy.upper_bound(),
                        "Inside dead band, relay holds"
                    );
                }
            }
        }

        self.gate.record_readings(indoor, outdoor).await;
        report
    }

    /// Run cycles every `poll_interval` until `shutdown` is cancelled.
    pub async fn run(self, shutdown: CancellationToken) {
        info!(
            interval = ?self.poll_interval,
            desired = self.policy.desired_temperature,
            hysteresis = self.policy.hysteresis,
            outdoor_override = self.weather.is_some()
                && self.policy.outside_temperature_threshold.is_some(),
            "Control loop started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = self.run_cycle() => {}
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.poll_interval) => {}
            }
        }

        info!("Control loop stopped");
    }
}
