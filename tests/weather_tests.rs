//! Weather fetcher integration tests against a mocked OpenWeatherMap.

use pv_exporter::config::{LocationConfig, WeatherConfig};
use pv_exporter::error::ExporterError;
use pv_exporter::weather::WeatherClient;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, timeout_seconds: u64) -> WeatherClient {
    let weather = WeatherConfig {
        api_key: "test-key".to_string(),
        base_url: server.uri(),
        http_timeout_seconds: timeout_seconds,
        default_uv_index: 5.0,
    };
    WeatherClient::new(&weather, &LocationConfig::default()).unwrap()
}

fn weather_body() -> serde_json::Value {
    serde_json::json!({
        "clouds": {"all": 40},
        "main": {"temp": 21.5, "humidity": 65, "pressure": 1013},
        "wind": {"speed": 3.2, "deg": 180}
    })
}

#[tokio::test]
async fn fetches_current_conditions() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .and(query_param("appid", "test-key"))
        .and(query_param("units", "metric"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/uvi"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"value": 7.2})))
        .mount(&server)
        .await;

    let reading = client_for(&server, 5).fetch_current().await.unwrap();
    assert_eq!(reading.cloud_cover_percent, 40.0);
    assert_eq!(reading.temperature_c, 21.5);
    assert_eq!(reading.humidity_percent, 65.0);
    assert_eq!(reading.wind_speed_ms, 3.2);
    assert_eq!(reading.uv_index, 7.2);
}

#[tokio::test]
async fn missing_uv_endpoint_falls_back_to_default() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(weather_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/uvi"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let reading = client_for(&server, 5).fetch_current().await.unwrap();
    assert_eq!(reading.uv_index, 5.0);
}

#[tokio::test]
async fn non_2xx_is_fetch_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let err = client_for(&server, 5).fetch_current().await.unwrap_err();
    assert!(matches!(err, ExporterError::FetchUnavailable(_)));
    assert!(err.to_string().contains("503"));
}

#[tokio::test]
async fn malformed_body_is_fetch_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
        .mount(&server)
        .await;

    let err = client_for(&server, 5).fetch_current().await.unwrap_err();
    assert!(matches!(err, ExporterError::FetchUnavailable(_)));
}

#[tokio::test]
async fn timeout_is_fetch_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(weather_body())
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let err = client_for(&server, 1).fetch_current().await.unwrap_err();
    assert!(matches!(err, ExporterError::FetchUnavailable(_)));
}

#[tokio::test]
async fn absent_fields_default_to_zero() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/weather"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/data/2.5/uvi"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let reading = client_for(&server, 5).fetch_current().await.unwrap();
    assert_eq!(reading.cloud_cover_percent, 0.0);
    assert_eq!(reading.temperature_c, 0.0);
    assert_eq!(reading.wind_speed_ms, 0.0);
}
