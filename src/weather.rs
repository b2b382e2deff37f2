//! # Weather Fetcher (OpenWeatherMap)
//!
//! Pulls the current-weather observation used by the live exporter. The UV
//! index lives behind a separate endpoint that the free API tier lacks, so
//! a failed UV lookup degrades to a configured constant instead of failing
//! the cycle.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{LocationConfig, WeatherConfig};
use crate::domain::WeatherReading;
use crate::error::ExporterError;

pub struct WeatherClient {
    client: Client,
    base_url: String,
    api_key: String,
    latitude: f64,
    longitude: f64,
    default_uv_index: f64,
}

impl WeatherClient {
    pub fn new(weather: &WeatherConfig, location: &LocationConfig) -> Result<Self> {
        // The bounded timeout is the whole point of this client; a builder
        // failure must surface at startup rather than degrade to an
        // unbounded default client.
        let client = Client::builder()
            .timeout(Duration::from_secs(weather.http_timeout_seconds))
            .build()
            .context("failed to build weather HTTP client")?;
        Ok(Self {
            client,
            base_url: weather.base_url.trim_end_matches('/').to_string(),
            api_key: weather.api_key.clone(),
            latitude: location.latitude,
            longitude: location.longitude,
            default_uv_index: weather.default_uv_index,
        })
    }

    /// Fetch the current weather observation. Network failure, a non-2xx
    /// status, or an undecodable body all map to
    /// [`ExporterError::FetchUnavailable`].
    pub async fn fetch_current(&self) -> Result<WeatherReading, ExporterError> {
        let url = format!(
            "{}/data/2.5/weather?lat={}&lon={}&appid={}&units=metric",
            self.base_url, self.latitude, self.longitude, self.api_key
        );
        debug!(lat = self.latitude, lon = self.longitude, "fetching current weather");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ExporterError::FetchUnavailable(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ExporterError::FetchUnavailable(format!(
                "weather API returned status {status}"
            )));
        }

        let body: CurrentWeatherResponse = response
            .json()
            .await
            .map_err(|e| ExporterError::FetchUnavailable(format!("undecodable body: {e}")))?;

        let uv_index = self.fetch_uv_index().await;

        Ok(WeatherReading {
            cloud_cover_percent: body.clouds.all,
            temperature_c: body.main.temp,
            humidity_percent: body.main.humidity,
            wind_speed_ms: body.wind.speed,
            uv_index,
        })
    }

    /// Best-effort UV lookup; any failure falls back to the configured
    /// default so the cycle still publishes.
    async fn fetch_uv_index(&self) -> f64 {
        let url = format!(
            "{}/data/2.5/uvi?lat={}&lon={}&appid={}",
            self.base_url, self.latitude, self.longitude, self.api_key
        );

        let result = async {
            let response = self.client.get(&url).send().await?;
            let response = response.error_for_status()?;
            response.json::<UvResponse>().await
        }
        .await;

        match result {
            Ok(body) => body.value,
            Err(e) => {
                debug!(error = %e, fallback = self.default_uv_index, "UV endpoint unavailable");
                self.default_uv_index
            }
        }
    }
}

/// Warn once at startup when running without a real API key.
pub fn warn_if_demo(weather: &WeatherConfig) {
    if weather.is_demo() {
        warn!(
            "using demo mode - set PV__WEATHER__API_KEY for live data; \
            weather fetches will fail until a real key is supplied"
        );
    }
}

// OpenWeatherMap response structures. Absent fields read as zero, matching
// the tolerant reads of the upstream exporter.
#[derive(Debug, Deserialize)]
struct CurrentWeatherResponse {
    #[serde(default)]
    clouds: Clouds,
    #[serde(default)]
    main: MainConditions,
    #[serde(default)]
    wind: Wind,
}

#[derive(Debug, Default, Deserialize)]
struct Clouds {
    #[serde(default)]
    all: f64,
}

#[derive(Debug, Default, Deserialize)]
struct MainConditions {
    #[serde(default)]
    temp: f64,
    #[serde(default)]
    humidity: f64,
}

#[derive(Debug, Default, Deserialize)]
struct Wind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct UvResponse {
    value: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_fields_default_to_zero() {
        let body: CurrentWeatherResponse = serde_json::from_str("{}").unwrap();
        assert_eq!(body.clouds.all, 0.0);
        assert_eq!(body.main.temp, 0.0);
        assert_eq!(body.main.humidity, 0.0);
        assert_eq!(body.wind.speed, 0.0);
    }

    #[test]
    fn full_response_parses() {
        let json = r#"{
            "clouds": {"all": 40},
            "main": {"temp": 21.5, "humidity": 65, "pressure": 1013},
            "wind": {"speed": 3.2, "deg": 180}
        }"#;
        let body: CurrentWeatherResponse = serde_json::from_str(json).unwrap();
        assert_eq!(body.clouds.all, 40.0);
        assert_eq!(body.main.temp, 21.5);
        assert_eq!(body.main.humidity, 65.0);
        assert_eq!(body.wind.speed, 3.2);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let weather = WeatherConfig {
            base_url: "http://localhost:9999/".to_string(),
            ..Default::default()
        };
        let client = WeatherClient::new(&weather, &LocationConfig::default()).unwrap();
        assert_eq!(client.base_url, "http://localhost:9999");
    }
}
