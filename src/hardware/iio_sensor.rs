//! DHT11/DHT22 sensor read through the Linux IIO sysfs interface
//!
//! With the `dht11` kernel driver bound, the sensor shows up as an IIO
//! device exposing two attributes in milli-units:
//!
//! ```text
//! /sys/bus/iio/devices/iio:device0/in_temp_input              21300  (m°C)
//! /sys/bus/iio/devices/iio:device0/in_humidityrelative_input  45000  (m%RH)
//! ```
//!
//! Reads fail with `EIO`/`ETIMEDOUT` whenever the driver misses the
//! response pulse train, so every read goes through a [`RetryPolicy`].

use crate::error::{ClimateError, Result};
use crate::error_recovery::RetryPolicy;
use crate::hardware::{SensorReading, SensorSource};
use async_trait::async_trait;
use chrono::Utc;
use std::path::{Path, PathBuf};
use tracing::trace;

const TEMPERATURE_ATTR: &str = "in_temp_input";
const HUMIDITY_ATTR: &str = "in_humidityrelative_input";

/// Indoor sensor backed by an IIO device directory
#[derive(Debug, Clone)]
pub struct IioHumiditySensor {
    device_dir: PathBuf,
    retry: RetryPolicy,
}

impl IioHumiditySensor {
    pub fn new(device_dir: impl Into<PathBuf>, retry: RetryPolicy) -> Self {
        Self {
            device_dir: device_dir.into(),
            retry,
        }
    }

    pub fn device_dir(&self) -> &Path {
        &self.device_dir
    }

    async fn read_once(&self) -> Result<SensorReading> {
        let temperature = read_milli_attr(&self.device_dir.join(TEMPERATURE_ATTR)).await?;
        let humidity = read_milli_attr(&self.device_dir.join(HUMIDITY_ATTR)).await?;

        if !(0.0..=100.0).contains(&humidity) {
            return Err(ClimateError::sensor(format!(
                "humidity {humidity:.1}% out of range"
            )));
        }

        trace!(temperature, humidity, "IIO sensor sample");

        Ok(SensorReading {
            temperature,
            humidity,
            taken_at: Utc::now(),
        })
    }
}

#[async_trait]
impl SensorSource for IioHumiditySensor {
    async fn read(&self) -> Result<SensorReading> {
        self.retry.execute("indoor sensor read", || self.read_once()).await
    }
}

/// Read an integer milli-unit attribute and scale it to units.
///
/// I/O failures map to [`ClimateError::Sensor`] so they are retried; a
/// malformed value is a parsing error and is not.
async fn read_milli_attr(path: &Path) -> Result<f64> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ClimateError::sensor(format!("reading {}: {}", path.display(), e)))?;

    let milli: i64 = raw.trim().parse().map_err(|_| {
        ClimateError::parsing(format!(
            "{} contains {:?}, expected an integer",
            path.display(),
            raw.trim()
        ))
    })?;

    Ok(milli as f64 / 1000.0)
}
