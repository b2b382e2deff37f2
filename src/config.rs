use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub exporter: ExporterConfig,
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub weather: WeatherConfig,
    #[serde(default)]
    pub model: ModelConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr> {
        Ok(format!("{}:{}", self.host, self.port).parse()?)
    }
}

/// Which pipeline this process runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Csv,
    Weather,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExporterConfig {
    #[serde(default = "default_source")]
    pub source: Source,
    /// Seconds between refresh cycles. When unset, defaults per source:
    /// 30s for the CSV exporter, 300s for the weather exporter.
    #[serde(default)]
    pub poll_interval_seconds: Option<u64>,
    #[serde(default = "default_data_file")]
    pub data_file: PathBuf,
}

impl ExporterConfig {
    pub fn poll_interval_seconds(&self) -> u64 {
        self.poll_interval_seconds.unwrap_or(match self.source {
            Source::Csv => 30,
            Source::Weather => 300,
        })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocationConfig {
    #[serde(default = "default_latitude")]
    pub latitude: f64,
    #[serde(default = "default_longitude")]
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WeatherConfig {
    /// OpenWeatherMap API key. The literal "demo" enables demo mode:
    /// the process starts and serves metrics, but live fetches will fail
    /// until a real key is supplied.
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_weather_base_url")]
    pub base_url: String,
    #[serde(default = "default_http_timeout")]
    pub http_timeout_seconds: u64,
    /// Fallback UV index when the UV endpoint is unavailable (free tier).
    #[serde(default = "default_uv_index")]
    pub default_uv_index: f64,
}

impl WeatherConfig {
    pub fn is_demo(&self) -> bool {
        self.api_key == "demo"
    }
}

/// Policy constants for the derived-metric model. These are fixed ratios
/// and thresholds, not measured physics; they live in config so tests and
/// future calibration can override them.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Nameplate system output in watts (5 kW system).
    #[serde(default = "default_max_power")]
    pub max_power_watts: f64,
    #[serde(default = "default_exported_share")]
    pub exported_share: f64,
    #[serde(default = "default_self_use_share")]
    pub self_use_share: f64,
    #[serde(default = "default_direct_share")]
    pub direct_share: f64,
    #[serde(default = "default_battery_share")]
    pub battery_share: f64,
    #[serde(default = "default_grid_share")]
    pub grid_share: f64,
    /// Panel temperature above which output derates, in celsius.
    #[serde(default = "default_derate_threshold")]
    pub derate_threshold_c: f64,
    /// Fractional output lost per degree above the threshold.
    #[serde(default = "default_derate_per_c")]
    pub derate_per_c: f64,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8000 }
fn default_request_timeout() -> u64 { 10 }
fn default_source() -> Source { Source::Csv }
fn default_data_file() -> PathBuf { PathBuf::from("data/pv_data.csv") }
fn default_latitude() -> f64 { 48.1351 }
fn default_longitude() -> f64 { 11.5820 }
fn default_api_key() -> String { "demo".to_string() }
fn default_weather_base_url() -> String { "https://api.openweathermap.org".to_string() }
fn default_http_timeout() -> u64 { 10 }
fn default_uv_index() -> f64 { 5.0 }
fn default_max_power() -> f64 { 5000.0 }
fn default_exported_share() -> f64 { 0.40 }
fn default_self_use_share() -> f64 { 0.60 }
fn default_direct_share() -> f64 { 0.48 }
fn default_battery_share() -> f64 { 0.35 }
fn default_grid_share() -> f64 { 0.17 }
fn default_derate_threshold() -> f64 { 25.0 }
fn default_derate_per_c() -> f64 { 0.005 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            source: default_source(),
            poll_interval_seconds: None,
            data_file: default_data_file(),
        }
    }
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            latitude: default_latitude(),
            longitude: default_longitude(),
        }
    }
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            api_key: default_api_key(),
            base_url: default_weather_base_url(),
            http_timeout_seconds: default_http_timeout(),
            default_uv_index: default_uv_index(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            max_power_watts: default_max_power(),
            exported_share: default_exported_share(),
            self_use_share: default_self_use_share(),
            direct_share: default_direct_share(),
            battery_share: default_battery_share(),
            grid_share: default_grid_share(),
            derate_threshold_c: default_derate_threshold(),
            derate_per_c: default_derate_per_c(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file("config/default.toml"))
            .merge(Env::prefixed("PV__").split("__"));
        Ok(figment.extract()?)
    }
}
