//! Shared fixtures for the integration tests
//!
//! Every harness wires the real command gate, control loop and override API
//! to in-memory adapters and a manually advanced clock.

#![allow(dead_code)]

pub mod weather_mock;

use climate_relay::climate::{
    CommandGate, ControlLoop, OverrideApi, ThresholdPolicy,
};
use climate_relay::mock::{ManualClock, MockActuator, MockSensor, MockWeather};
use climate_relay::server::{router, AppState};
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;

pub const LOCATION: &str = "90210";

pub struct Harness {
    pub gate: Arc<CommandGate>,
    pub api: OverrideApi,
    pub control: ControlLoop,
    pub sensor: MockSensor,
    pub weather: MockWeather,
    pub actuator: MockActuator,
    pub clock: Arc<ManualClock>,
    pub policy: ThresholdPolicy,
}

impl Harness {
    pub fn new(policy: ThresholdPolicy, indoor: f64, outdoor: f64) -> Self {
        let actuator = MockActuator::new();
        let clock = Arc::new(ManualClock::default());
        let gate = Arc::new(CommandGate::new(Box::new(actuator.clone()), clock.clone()));
        let sensor = MockSensor::new(indoor, 45.0);
        let weather = MockWeather::new(outdoor, 60.0);

        let control = ControlLoop::new(
            gate.clone(),
            Box::new(sensor.clone()),
            policy,
            Duration::from_millis(5),
        )
        .with_weather(Box::new(weather.clone()), LOCATION);

        Self {
            api: OverrideApi::new(gate.clone()),
            gate,
            control,
            sensor,
            weather,
            actuator,
            clock,
            policy,
        }
    }

    /// In-process router over this harness' gate
    pub fn router(&self) -> axum::Router {
        router(
            AppState {
                api: self.api.clone(),
                policy: self.policy,
            },
            false,
        )
    }
}

/// Default policy (19 ± 1, outdoor threshold 15.56), mild indoor and cool outdoor
#[fixture]
pub fn harness() -> Harness {
    Harness::new(ThresholdPolicy::default(), 19.0, 10.0)
}
