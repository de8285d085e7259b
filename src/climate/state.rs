//! Last observed readings and relay status

use crate::hardware::{SensorReading, WeatherReading};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What the relay is driving when it is energised
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacMode {
    #[default]
    Heating,
    Cooling,
}

/// Mutable controller state. Owned by the command gate.
#[derive(Debug, Clone, Default)]
pub struct ClimateState {
    indoor: Option<SensorReading>,
    outdoor: Option<WeatherReading>,
    relay_active: bool,
    mode: HvacMode,
    last_command_at: Option<DateTime<Utc>>,
}

impl ClimateState {
    /// Record fresh readings. `None` keeps the previous (stale) value.
    pub fn record_readings(
        &mut self,
        indoor: Option<SensorReading>,
        outdoor: Option<WeatherReading>,
    ) {
        if indoor.is_some() {
            self.indoor = indoor;
        }
        if outdoor.is_some() {
            self.outdoor = outdoor;
        }
    }

    /// Record a command the actuator has applied.
    pub(crate) fn record_command(
        &mut self,
        active: bool,
        mode: Option<HvacMode>,
        at: DateTime<Utc>,
    ) {
        self.relay_active = active;
        if let Some(mode) = mode {
            self.mode = mode;
        }
        self.last_command_at = Some(at);
    }

    pub fn relay_active(&self) -> bool {
        self.relay_active
    }

    pub fn mode(&self) -> HvacMode {
        self.mode
    }

    pub fn indoor(&self) -> Option<&SensorReading> {
        self.indoor.as_ref()
    }

    pub fn outdoor(&self) -> Option<&WeatherReading> {
        self.outdoor.as_ref()
    }

    pub fn snapshot(&self) -> ClimateSnapshot {
        ClimateSnapshot {
            indoor_temperature: self.indoor.map(|r| r.temperature),
            indoor_humidity: self.indoor.map(|r| r.humidity),
            indoor_read_at: self.indoor.map(|r| r.taken_at),
            outdoor_temperature: self.outdoor.map(|r| r.temperature),
            outdoor_humidity: self.outdoor.map(|r| r.humidity),
            outdoor_read_at: self.outdoor.map(|r| r.taken_at),
            relay_active: self.relay_active,
            mode: self.mode,
            cooling: self.relay_active && self.mode == HvacMode::Cooling,
            last_command_at: self.last_command_at,
        }
    }
}

/// Read-only copy of [`ClimateState`] handed to status consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClimateSnapshot {
    pub indoor_temperature: Option<f64>,
    pub indoor_humidity: Option<f64>,
    pub indoor_read_at: Option<DateTime<Utc>>,
    pub outdoor_temperature: Option<f64>,
    pub outdoor_humidity: Option<f64>,
    pub outdoor_read_at: Option<DateTime<Utc>>,
    pub relay_active: bool,
    pub mode: HvacMode,
    /// Relay is on because the outdoor rule asked for cooling
    pub cooling: bool,
    pub last_command_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indoor(temperature: f64) -> SensorReading {
        SensorReading {
            temperature,
            humidity: 40.0,
            taken_at: Utc::now(),
        }
    }

    #[test]
    fn test_cold_start_is_off_and_unknown() {
        let snapshot = ClimateState::default().snapshot();

        assert!(!snapshot.relay_active);
        assert_eq!(snapshot.indoor_temperature, None);
        assert_eq!(snapshot.outdoor_temperature, None);
        assert_eq!(snapshot.last_command_at, None);
    }

    #[test]
    fn test_missing_readings_keep_stale_values() {
        let mut state = ClimateState::default();
        state.record_readings(Some(indoor(18.5)), None);
        state.record_readings(None, None);

        assert_eq!(state.snapshot().indoor_temperature, Some(18.5));
    }

    #[test]
    fn test_manual_command_keeps_mode() {
        let mut state = ClimateState::default();
        state.record_command(true, Some(HvacMode::Cooling), Utc::now());
        state.record_command(false, None, Utc::now());

        assert_eq!(state.mode(), HvacMode::Cooling);
        assert!(!state.snapshot().cooling);
    }
}
