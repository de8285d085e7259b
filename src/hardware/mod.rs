//! Capability traits for the hardware and services the controller talks to
//!
//! The control core never touches sysfs or HTTP directly. It reads the
//! indoor sensor through [`SensorSource`], the outdoor conditions through
//! [`WeatherSource`] and drives the relay through [`Actuator`]. Production
//! adapters live in the submodules; in-memory ones live in [`crate::mock`].

pub mod iio_sensor;
pub mod openweather;
pub mod sysfs_gpio;

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use iio_sensor::IioHumiditySensor;
pub use openweather::OpenWeatherClient;
pub use sysfs_gpio::SysfsGpioRelay;

/// One indoor sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    pub taken_at: DateTime<Utc>,
}

/// One outdoor sample for the configured location
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Temperature in degrees Celsius
    pub temperature: f64,
    /// Relative humidity in percent
    pub humidity: f64,
    pub taken_at: DateTime<Utc>,
}

/// Indoor temperature/humidity sensor
#[async_trait]
pub trait SensorSource: Send + Sync {
    /// Take a fresh reading. Transient failures are reported as errors.
    async fn read(&self) -> Result<SensorReading>;
}

/// Outdoor weather lookup keyed by a location code
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Fetch current conditions for `location_code`.
    async fn read(&self, location_code: &str) -> Result<WeatherReading>;
}

/// Binary output driving the heating/cooling relay
///
/// Implementations are never called concurrently; the command gate owns
/// the only handle and serializes every call.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Drive the line. `true` energises the relay.
    async fn set(&mut self, active: bool) -> Result<()>;

    /// Release the hardware handle. Called once at shutdown.
    async fn close(&mut self) -> Result<()>;
}
