//! OpenWeatherMap current-conditions client
//!
//! Looks up the outdoor temperature by postal code:
//! `GET {base}/data/2.5/weather?zip={code}&appid={key}&units=metric`.
//! Only `main.temp` and `main.humidity` are used.

use crate::error::{ClimateError, Result};
use crate::hardware::{WeatherReading, WeatherSource};
use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use std::time::Duration;
use tracing::trace;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

#[derive(Debug, Deserialize)]
struct CurrentWeather {
    main: MainBlock,
}

#[derive(Debug, Deserialize)]
struct MainBlock {
    temp: f64,
    humidity: f64,
}

/// HTTP client for the OpenWeatherMap API
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    client: reqwest::Client,
    base_url: Url,
    api_key: String,
}

impl OpenWeatherClient {
    pub fn new(base_url: Url, api_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("climate-relay/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key: api_key.into(),
        })
    }

    fn endpoint(&self) -> Result<Url> {
        self.base_url
            .join("data/2.5/weather")
            .map_err(|e| ClimateError::config(format!("invalid weather base URL: {e}")))
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn read(&self, location_code: &str) -> Result<WeatherReading> {
        let response = self
            .client
            .get(self.endpoint()?)
            .query(&[
                ("zip", location_code),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ClimateError::timeout(format!("weather lookup for {location_code}"))
                } else {
                    ClimateError::weather(format!("weather lookup for {location_code}: {e}"))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClimateError::weather(format!(
                "weather service answered {status} for {location_code}"
            )));
        }

        let body: CurrentWeather = response
            .json()
            .await
            .map_err(|e| ClimateError::parsing(format!("weather response: {e}")))?;

        trace!(?body, "Weather data");

        Ok(WeatherReading {
            temperature: body.main.temp,
            humidity: body.main.humidity,
            taken_at: Utc::now(),
        })
    }
}
