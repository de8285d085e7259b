//! Hysteresis thermostat for a single heating/cooling relay
//!
//! A background control loop reads an indoor temperature/humidity sensor
//! and, optionally, the outdoor temperature, and switches one relay through
//! a command gate. A manual override pins the relay for a number of minutes
//! and is exposed over a small HTTP interface.
//!
//! # Features
//!
//! - Hysteresis band around a desired temperature
//! - Outdoor override that runs the relay in cooling mode
//! - Manual lock with expiry, atomic with respect to automatic commands
//! - IIO sysfs sensor, sysfs GPIO relay and OpenWeatherMap adapters
//! - In-memory adapters for tests and bench runs

// Core modules
pub mod climate;
pub mod config;
pub mod error;
pub mod error_recovery;
pub mod hardware;
pub mod logging;
pub mod server;

// In-memory adapters, used by unit tests, integration tests and `--simulate`
pub mod mock;

// Re-export main types for convenience
pub use config::ServerConfig;
pub use error::{ClimateError, Result};
