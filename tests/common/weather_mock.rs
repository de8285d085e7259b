//! WireMock-based OpenWeatherMap API mocking

use serde_json::json;
use wiremock::{
    matchers::{method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const API_KEY: &str = "test-api-key";

/// Mock OpenWeatherMap server
pub struct MockOpenWeather {
    pub server: MockServer,
    pub base_url: String,
}

impl MockOpenWeather {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// Answer the current-weather endpoint for `zip` with the given conditions
    pub async fn mock_current(&self, zip: &str, temp: f64, humidity: f64) {
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("zip", zip))
            .and(query_param("appid", API_KEY))
            .and(query_param("units", "metric"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "coord": { "lon": -118.41, "lat": 34.09 },
                "weather": [{ "id": 800, "main": "Clear", "description": "clear sky" }],
                "main": {
                    "temp": temp,
                    "feels_like": temp,
                    "pressure": 1015,
                    "humidity": humidity
                },
                "name": "Beverly Hills",
                "cod": 200
            })))
            .mount(&self.server)
            .await;
    }

    /// Answer every request with `status` and a plain body
    pub async fn mock_status(&self, status: u16, body: &str) {
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(ResponseTemplate::new(status).set_body_string(body))
            .mount(&self.server)
            .await;
    }

    /// Answer after `delay`
    pub async fn mock_slow(&self, delay: std::time::Duration) {
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(delay)
                    .set_body_json(json!({ "main": { "temp": 20.0, "humidity": 50.0 } })),
            )
            .mount(&self.server)
            .await;
    }
}
