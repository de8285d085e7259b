//! Thermostat core: climate state, override lock, policy table, command
//! gate, control loop and the override API
//!
//! Every relay command flows through [`CommandGate`]. The [`ControlLoop`]
//! issues automatic commands from [`PolicyTable`] decisions; the
//! [`OverrideApi`] issues manual ones and arms the [`LockGuard`].

pub mod control_loop;
pub mod gate;
pub mod lock;
pub mod overrides;
pub mod policy;
pub mod state;

pub use control_loop::{ControlLoop, CycleReport};
pub use gate::{CommandGate, CommandOutcome, GateStatus};
pub use lock::{Clock, LockGuard, SystemClock};
pub use overrides::{OverrideApi, OverrideReceipt, OverrideRequest};
pub use policy::{PolicyInputs, PolicyRule, PolicyTable, RelayCommand, ThresholdPolicy};
pub use state::{ClimateSnapshot, ClimateState, HvacMode};
