//! The command gate: single choke point for every relay command
//!
//! The gate owns the actuator handle, the override lock and the climate
//! state. All relay commands, automatic or manual, pass through it:
//!
//! ```text
//!   ControlLoop ──┐
//!                 ├──▶ CommandGate ──(lock check)──▶ Actuator.set
//!   OverrideApi ──┘          │
//!                            └──▶ ClimateState (relay_active, mode)
//! ```
//!
//! The actuator and lock share one async mutex. Holding it across the
//! `set` call means two `set` calls can never overlap, and a manual
//! override's clear → command → re-arm sequence is never interleaved with
//! an automatic command. Status reads take the same mutex, so no reader
//! can observe the cleared lock in the middle of an override.
//!
//! Lock order: `control` before `state`. Nothing holds `state` while
//! waiting for `control`.

use crate::climate::lock::{Clock, LockGuard};
use crate::climate::policy::RelayCommand;
use crate::climate::state::{ClimateSnapshot, ClimateState};
use crate::error::{ClimateError, ErrorReporter, Result};
use crate::hardware::{Actuator, SensorReading, WeatherReading};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, trace};

/// Result of one command attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "outcome", content = "detail")]
pub enum CommandOutcome {
    /// The actuator applied the command and the state was updated
    Applied,
    /// A manual lock suppressed the command; nothing changed
    Locked { until: DateTime<Utc> },
    /// The actuator rejected the command; the state was not updated
    Failed(String),
}

impl CommandOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, CommandOutcome::Applied)
    }
}

/// Status projection handed to presentation layers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateStatus {
    #[serde(flatten)]
    pub snapshot: ClimateSnapshot,
    pub locked: bool,
    pub locked_until: Option<DateTime<Utc>>,
}

struct RelayControl {
    actuator: Box<dyn Actuator>,
    lock: LockGuard,
}

/// Serialized access to the relay, its lock and the climate state
pub struct CommandGate {
    control: Mutex<RelayControl>,
    state: RwLock<ClimateState>,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for CommandGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandGate")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl CommandGate {
    pub fn new(actuator: Box<dyn Actuator>, clock: Arc<dyn Clock>) -> Self {
        Self {
            control: Mutex::new(RelayControl {
                actuator,
                lock: LockGuard::default(),
            }),
            state: RwLock::new(ClimateState::default()),
            clock,
        }
    }

    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    /// Forward `command` to the actuator unless a manual lock is active.
    pub async fn attempt_command(&self, command: RelayCommand) -> CommandOutcome {
        let mut control = self.control.lock().await;
        let now = self.clock.now();

        if let Some(until) = control.lock.locked_until(now) {
            trace!(
                active = command.active,
                %until,
                "Relay is locked, not setting relay"
            );
            return CommandOutcome::Locked { until };
        }

        self.apply(&mut control, command, now).await
    }

    /// Force the relay to `active` and lock out automatic control for
    /// `duration`. The whole sequence runs under the gate mutex.
    pub async fn manual_override(&self, active: bool, duration: Duration) -> CommandOutcome {
        let mut control = self.control.lock().await;
        let now = self.clock.now();

        control.lock.clear();
        let outcome = self.apply(&mut control, RelayCommand::manual(active), now).await;
        control.lock.arm(self.clock.now(), duration);

        info!(
            active,
            minutes = duration.num_minutes(),
            applied = outcome.is_accepted(),
            "Manual override armed"
        );

        outcome
    }

    /// Caller must hold the control mutex and have checked the lock.
    async fn apply(
        &self,
        control: &mut RelayControl,
        command: RelayCommand,
        now: DateTime<Utc>,
    ) -> CommandOutcome {
        match control.actuator.set(command.active).await {
            Ok(()) => {
                let mut state = self.state.write().await;
                let changed = state.relay_active() != command.active;
                state.record_command(command.active, command.mode, now);
                drop(state);

                if changed {
                    info!(active = command.active, mode = ?command.mode, "Relay switched");
                } else {
                    debug!(active = command.active, "Relay command re-applied");
                }
                CommandOutcome::Applied
            }
            Err(error) => {
                ErrorReporter::log_error(&error, "command_gate", "set_relay");
                CommandOutcome::Failed(error.to_string())
            }
        }
    }

    /// Store fresh readings. `None` keeps the stale value.
    pub async fn record_readings(
        &self,
        indoor: Option<SensorReading>,
        outdoor: Option<WeatherReading>,
    ) {
        self.state.write().await.record_readings(indoor, outdoor);
    }

    pub async fn snapshot(&self) -> ClimateSnapshot {
        self.state.read().await.snapshot()
    }

    pub async fn is_active(&self) -> bool {
        self.state.read().await.relay_active()
    }

    pub async fn is_locked(&self) -> bool {
        let control = self.control.lock().await;
        control.lock.is_locked(self.clock.now())
    }

    /// Lock flag and state, read consistently with respect to commands
    pub async fn status(&self) -> GateStatus {
        let control = self.control.lock().await;
        let locked_until = control.lock.locked_until(self.clock.now());
        let snapshot = self.state.read().await.snapshot();
        drop(control);

        GateStatus {
            snapshot,
            locked: locked_until.is_some(),
            locked_until,
        }
    }

    /// Release the actuator handle. Later commands fail at the actuator.
    pub async fn close(&self) -> Result<()> {
        let mut control = self.control.lock().await;
        control
            .actuator
            .close()
            .await
            .map_err(|e| ClimateError::hardware(format!("closing relay: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{ManualClock, MockActuator};

    fn gate() -> (CommandGate, MockActuator, Arc<ManualClock>) {
        let actuator = MockActuator::new();
        let clock = Arc::new(ManualClock::default());
        let gate = CommandGate::new(Box::new(actuator.clone()), clock.clone());
        (gate, actuator, clock)
    }

    #[tokio::test]
    async fn test_unlocked_command_is_applied() {
        let (gate, actuator, _) = gate();

        let outcome = gate.attempt_command(RelayCommand::heat()).await;

        assert_eq!(outcome, CommandOutcome::Applied);
        assert!(gate.is_active().await);
        assert_eq!(actuator.commands(), vec![true]);
    }

    #[tokio::test]
    async fn test_locked_command_is_rejected_without_side_effects() {
        let (gate, actuator, clock) = gate();
        gate.manual_override(false, Duration::minutes(10)).await;
        let before = gate.snapshot().await;

        let outcome = gate.attempt_command(RelayCommand::heat()).await;

        assert_eq!(
            outcome,
            CommandOutcome::Locked {
                until: clock.now() + Duration::minutes(10)
            }
        );
        assert_eq!(gate.snapshot().await, before);
        assert_eq!(actuator.commands(), vec![false]);
    }

    #[tokio::test]
    async fn test_failed_actuator_does_not_update_state() {
        let (gate, actuator, _) = gate();
        actuator.fail_next();

        let outcome = gate.attempt_command(RelayCommand::heat()).await;

        assert!(matches!(outcome, CommandOutcome::Failed(_)));
        assert!(!gate.is_active().await);
        assert_eq!(gate.snapshot().await.last_command_at, None);
    }

    #[tokio::test]
    async fn test_override_replaces_existing_lock() {
        let (gate, actuator, clock) = gate();
        gate.manual_override(true, Duration::minutes(60)).await;

        let outcome = gate.manual_override(false, Duration::minutes(5)).await;

        assert_eq!(outcome, CommandOutcome::Applied);
        assert!(!gate.is_active().await);
        assert_eq!(actuator.commands(), vec![true, false]);

        clock.advance(Duration::minutes(5));
        assert!(!gate.is_locked().await);
    }

    #[tokio::test]
    async fn test_failed_override_still_arms_lock() {
        let (gate, actuator, _) = gate();
        actuator.fail_next();

        let outcome = gate.manual_override(true, Duration::minutes(10)).await;

        assert!(matches!(outcome, CommandOutcome::Failed(_)));
        assert!(gate.is_locked().await);
        assert!(!gate.is_active().await);
    }

    #[tokio::test]
    async fn test_status_is_a_pure_projection() {
        let (gate, actuator, _) = gate();
        gate.manual_override(true, Duration::minutes(10)).await;

        let first = gate.status().await;
        let second = gate.status().await;

        assert_eq!(first, second);
        assert!(first.locked);
        assert!(first.snapshot.relay_active);
        assert_eq!(actuator.commands().len(), 1);
    }

    #[tokio::test]
    async fn test_close_releases_actuator() {
        let (gate, actuator, _) = gate();
        gate.close().await.unwrap();

        assert!(actuator.is_closed());
        assert!(matches!(
            gate.attempt_command(RelayCommand::off()).await,
            CommandOutcome::Failed(_)
        ));
    }
}
