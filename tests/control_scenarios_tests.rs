//! End-to-end thermostat scenarios
//!
//! Each test drives single control cycles against the in-memory harness and
//! checks the relay line, the recorded state and the lock.

mod common;

use chrono::Duration;
use climate_relay::climate::{CommandOutcome, HvacMode, ThresholdPolicy};
use common::{harness, Harness};
use pretty_assertions::assert_eq;
use rstest::rstest;

#[rstest]
#[tokio::test]
async fn test_hysteresis_sequence_does_not_flap(harness: Harness) {
    let mut line_changes = Vec::new();
    let mut last = harness.actuator.line();

    // Falls through the band, climbs back through it, overshoots, settles.
    for indoor in [19.5, 18.5, 18.0, 18.6, 19.4, 20.0, 20.3, 19.9, 18.2] {
        harness.sensor.set(indoor, 45.0);
        harness.control.run_cycle().await;

        let line = harness.actuator.line();
        if line != last {
            line_changes.push((indoor, line));
            last = line;
        }
    }

    assert_eq!(line_changes, vec![(18.0, true), (20.3, false)]);
    assert!(!harness.gate.is_active().await);
}

#[rstest]
#[tokio::test]
async fn test_dead_band_after_heating_keeps_relay_on(harness: Harness) {
    harness.sensor.set(17.5, 45.0);
    harness.control.run_cycle().await;
    assert!(harness.gate.is_active().await);

    harness.sensor.set(19.2, 45.0);
    let report = harness.control.run_cycle().await;

    assert!(!report.commanded());
    assert!(harness.gate.is_active().await);
    assert_eq!(harness.actuator.commands(), vec![true]);
}

#[rstest]
#[tokio::test]
async fn test_manual_off_suppresses_heating_until_expiry(harness: Harness) {
    harness.sensor.set(17.0, 45.0);
    harness.api.apply_path("off/30").await.unwrap();

    for _ in 0..3 {
        let report = harness.control.run_cycle().await;
        assert!(matches!(report.outcome, Some(CommandOutcome::Locked { .. })));
        harness.clock.advance(Duration::minutes(5));
    }
    assert!(!harness.gate.is_active().await);
    assert!(harness.gate.is_locked().await);

    harness.clock.advance(Duration::minutes(15));
    assert!(!harness.gate.is_locked().await);

    let report = harness.control.run_cycle().await;
    assert_eq!(report.outcome, Some(CommandOutcome::Applied));
    assert!(harness.gate.is_active().await);
    assert_eq!(harness.actuator.commands(), vec![false, true]);
}

#[rstest]
#[tokio::test]
async fn test_zero_minute_override_returns_control_immediately(harness: Harness) {
    harness.sensor.set(21.0, 45.0);

    harness.api.apply_path("on/0").await.unwrap();
    assert!(harness.gate.is_active().await);
    assert!(!harness.gate.is_locked().await);

    harness.control.run_cycle().await;

    assert!(!harness.gate.is_active().await);
    assert_eq!(harness.actuator.commands(), vec![true, false]);
}

#[rstest]
#[tokio::test]
async fn test_override_round_trip(harness: Harness) {
    harness.api.apply_path("on/10").await.unwrap();

    assert!(harness.api.is_active().await);
    assert!(harness.api.is_locked().await);

    harness.clock.advance(Duration::minutes(10));
    assert!(!harness.api.is_locked().await);
    // The relay stays where the override left it until the loop decides.
    assert!(harness.api.is_active().await);
}

#[rstest]
#[tokio::test]
async fn test_outdoor_heat_preempts_warm_room(harness: Harness) {
    harness.sensor.set(25.0, 45.0);
    harness.weather.set(30.0, 40.0);

    let report = harness.control.run_cycle().await;

    assert_eq!(report.rule, Some("outdoor_heat"));
    let snapshot = harness.gate.snapshot().await;
    assert!(snapshot.relay_active);
    assert_eq!(snapshot.mode, HvacMode::Cooling);
    assert!(snapshot.cooling);
}

#[rstest]
#[tokio::test]
async fn test_lock_wins_over_outdoor_override(harness: Harness) {
    harness.weather.set(30.0, 40.0);
    harness.api.apply_path("off/60").await.unwrap();

    let report = harness.control.run_cycle().await;

    assert!(matches!(report.outcome, Some(CommandOutcome::Locked { .. })));
    assert!(!harness.gate.is_active().await);

    harness.clock.advance(Duration::minutes(60));
    harness.control.run_cycle().await;
    assert!(harness.gate.snapshot().await.cooling);
}

#[rstest]
#[tokio::test]
async fn test_manual_override_keeps_recorded_mode(harness: Harness) {
    harness.weather.set(30.0, 40.0);
    harness.control.run_cycle().await;
    assert_eq!(harness.gate.snapshot().await.mode, HvacMode::Cooling);

    harness.api.apply_path("off/10").await.unwrap();

    let snapshot = harness.gate.snapshot().await;
    assert!(!snapshot.relay_active);
    assert_eq!(snapshot.mode, HvacMode::Cooling);
    assert!(!snapshot.cooling);
}

#[rstest]
#[tokio::test]
async fn test_sensor_outage_holds_relay_and_keeps_last_reading(harness: Harness) {
    harness.sensor.set(17.0, 45.0);
    harness.control.run_cycle().await;

    harness.sensor.set_failing();
    harness.weather.set(30.0, 40.0);
    for _ in 0..3 {
        let report = harness.control.run_cycle().await;
        assert!(!report.commanded());
    }

    let snapshot = harness.gate.snapshot().await;
    assert!(snapshot.relay_active);
    assert_eq!(snapshot.mode, HvacMode::Heating);
    assert_eq!(snapshot.indoor_temperature, Some(17.0));
    assert_eq!(snapshot.outdoor_temperature, Some(30.0));
}

#[tokio::test]
async fn test_weather_disabled_policy_ignores_outdoor() {
    let policy = ThresholdPolicy {
        outside_temperature_threshold: None,
        ..ThresholdPolicy::default()
    };
    let harness = Harness::new(policy, 19.0, 35.0);

    let report = harness.control.run_cycle().await;

    assert!(!report.commanded());
    assert!(!harness.gate.is_active().await);
    assert_eq!(harness.gate.snapshot().await.outdoor_temperature, Some(35.0));
}
