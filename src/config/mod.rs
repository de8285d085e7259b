//! Configuration management for the climate relay controller
//!
//! Values are layered: built-in defaults, then an optional TOML file, then
//! `CLIMATE__SECTION__KEY` environment variables.

use crate::climate::policy::ThresholdPolicy;
use crate::error::{ClimateError, Result};
use crate::error_recovery::RetryPolicy;
use crate::hardware::openweather::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Environment variable prefix for configuration overrides
pub const ENV_PREFIX: &str = "CLIMATE";

/// Separator between prefix, section and key in environment variables
pub const ENV_SEPARATOR: &str = "__";

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Setpoint, dead band and outdoor threshold
    pub policy: ThresholdPolicy,

    /// Control loop timing
    pub control: ControlConfig,

    /// Indoor sensor device
    pub sensor: SensorConfig,

    /// Relay GPIO line
    pub relay: RelayConfig,

    /// Outdoor weather lookup
    pub weather: WeatherConfig,

    /// Status and override HTTP listener
    pub http: HttpConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Control loop configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ControlConfig {
    /// Pause between decision cycles
    #[serde(with = "humantime_serde")]
    pub poll_interval: Duration,

    /// Retry policy for flaky indoor sensor reads
    pub sensor_retry: RetryPolicy,
}

impl Default for ControlConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            sensor_retry: RetryPolicy::default(),
        }
    }
}

/// IIO sysfs sensor configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SensorConfig {
    /// IIO device directory exposing `in_temp_input` and
    /// `in_humidityrelative_input`
    pub device_dir: PathBuf,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            device_dir: PathBuf::from("/sys/bus/iio/devices/iio:device0"),
        }
    }
}

/// Sysfs GPIO relay configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RelayConfig {
    /// GPIO sysfs root
    pub gpio_base: PathBuf,

    /// GPIO line number driving the relay
    pub line: u32,

    /// Relay energises when the line is driven low
    pub active_low: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            gpio_base: PathBuf::from("/sys/class/gpio"),
            line: 4,
            active_low: false,
        }
    }
}

/// OpenWeatherMap configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WeatherConfig {
    /// Postal code the outdoor temperature is looked up for
    pub location_code: String,

    /// API key; the outdoor lookup is disabled without one
    pub api_key: Option<String>,

    /// API root
    pub base_url: String,

    /// Request timeout
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            location_code: "90210".to_string(),
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

impl WeatherConfig {
    /// API key when the outdoor lookup is enabled
    pub fn enabled_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    pub fn base_url(&self) -> Result<Url> {
        Url::parse(&self.base_url)
            .map_err(|e| ClimateError::config(format!("Invalid weather base URL: {e}")))
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,

    /// Answer cross-origin requests with permissive CORS headers
    pub cors: bool,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            cors: false,
        }
    }
}

impl HttpConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| ClimateError::config(format!("Invalid listen address: {e}")))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: String,

    /// Log file path (daily rotation)
    pub file: Option<PathBuf>,

    /// Emit JSON lines instead of human-readable text
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            json: false,
        }
    }
}

impl ServerConfig {
    /// Load defaults, then `path` if given, then environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&ServerConfig::default())?;
        let mut builder = config::Config::builder().add_source(defaults);

        if let Some(path) = path {
            debug!("Loading configuration from {}", path.display());
            builder = builder.add_source(
                config::File::from(path)
                    .format(config::FileFormat::Toml)
                    .required(true),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator(ENV_SEPARATOR)
                .separator(ENV_SEPARATOR)
                .try_parsing(true),
        );

        let config: ServerConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.policy.validate()?;

        if self.control.poll_interval.is_zero() {
            return Err(ClimateError::config(
                "Poll interval must be greater than zero",
            ));
        }

        if self.control.sensor_retry.max_attempts == 0 {
            return Err(ClimateError::config(
                "Sensor retry policy needs at least one attempt",
            ));
        }

        if self.weather.location_code.trim().is_empty() {
            return Err(ClimateError::config("Weather location code cannot be empty"));
        }

        if self.weather.timeout.is_zero() {
            return Err(ClimateError::config(
                "Weather timeout must be greater than zero",
            ));
        }

        self.weather.base_url()?;

        if self.http.port == 0 {
            return Err(ClimateError::config("HTTP port cannot be zero"));
        }

        self.http.socket_addr()?;
        Ok(())
    }
}
