//! Tests for the OpenWeather client and the IP locator against a mock server.

use geoweather_core::{
    Coordinates, FetchError, FetchFailure, GeoProvider, LocationError, Precision, Units,
    WeatherProvider, WeatherQuery,
    geo::IpLocator,
    provider::openweather::OpenWeatherProvider,
};
use reqwest::StatusCode;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path, query_param},
};

// =============================================================================
// Test Helpers
// =============================================================================

const WEATHER_PATH: &str = "/data/2.5/weather";

fn san_francisco_body() -> serde_json::Value {
    serde_json::json!({
        "weather": [{"main": "Clear", "description": "clear sky", "icon": "01d"}],
        "main": {"temp": 18.5, "humidity": 60, "temp_min": 16.0, "temp_max": 21.0},
        "wind": {"speed": 3.1},
        "name": "San Francisco",
        "sys": {"country": "US", "sunrise": 1700000000, "sunset": 1700040000}
    })
}

fn query(units: Units) -> WeatherQuery {
    WeatherQuery {
        coordinates: Coordinates::new(37.7749, -122.4194),
        units,
        api_key: "test_key".to_string(),
    }
}

fn provider(server: &MockServer) -> OpenWeatherProvider {
    OpenWeatherProvider::with_base_url(format!("{}{WEATHER_PATH}", server.uri()))
}

async fn respond_with_status(status: u16) -> FetchError {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .respond_with(
            ResponseTemplate::new(status)
                .set_body_json(serde_json::json!({"cod": status, "message": "nope"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    provider(&server)
        .current_weather(&query(Units::Metric))
        .await
        .unwrap_err()
}

// =============================================================================
// Current Weather Tests
// =============================================================================

#[tokio::test]
async fn sends_coordinates_units_and_key_as_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("lat", "37.7749"))
        .and(query_param("lon", "-122.4194"))
        .and(query_param("units", "metric"))
        .and(query_param("appid", "test_key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(san_francisco_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider(&server)
        .current_weather(&query(Units::Metric))
        .await
        .unwrap();

    assert_eq!(result.temperature, 18.5);
    assert_eq!(result.temperature_min, 16.0);
    assert_eq!(result.temperature_max, 21.0);
    assert_eq!(result.humidity_percent, 60);
    assert_eq!(result.wind_speed, 3.1);
    assert_eq!(result.location_name, "San Francisco");
    assert_eq!(result.country_code, "US");
    assert_eq!(result.sunrise_unix_seconds, 1_700_000_000);
    assert_eq!(result.sunset_unix_seconds, 1_700_040_000);

    let condition = result.primary_condition().unwrap();
    assert_eq!(condition.main, "Clear");
    assert_eq!(condition.description, "clear sky");
    assert_eq!(condition.icon_code, "01d");
}

#[tokio::test]
async fn imperial_units_are_requested() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .and(query_param("units", "imperial"))
        .respond_with(ResponseTemplate::new(200).set_body_json(san_francisco_body()))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider(&server)
        .current_weather(&query(Units::Imperial))
        .await;
    assert!(result.is_ok());
}

#[tokio::test]
async fn bad_request_is_client_error() {
    let err = respond_with_status(400).await;
    assert_eq!(err.status(), Some(StatusCode::BAD_REQUEST));
    assert_eq!(err.classify(), FetchFailure::BadRequest);
}

#[tokio::test]
async fn not_found_is_reported() {
    let err = respond_with_status(404).await;
    assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
    assert_eq!(err.classify(), FetchFailure::NotFound);
}

#[tokio::test]
async fn server_errors_are_generic() {
    for status in [401, 500, 503] {
        let err = respond_with_status(status).await;
        assert!(matches!(err, FetchError::Http(_)));
        assert_eq!(err.classify(), FetchFailure::Generic, "status {status}");
    }
}

#[tokio::test]
async fn missing_fields_fail_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"name": "Nowhere"})),
        )
        .mount(&server)
        .await;

    let err = provider(&server)
        .current_weather(&query(Units::Metric))
        .await
        .unwrap_err();

    assert!(matches!(err, FetchError::Decode(_)));
    assert_eq!(err.classify(), FetchFailure::Generic);
}

#[tokio::test]
async fn non_json_body_fails_to_decode() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(WEATHER_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = provider(&server)
        .current_weather(&query(Units::Metric))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decode(_)));
}

// =============================================================================
// IP Locator Tests
// =============================================================================

#[tokio::test]
async fn ip_locator_returns_first_fix() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .and(query_param("fields", "status,message,lat,lon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "lat": 52.3676,
            "lon": 4.9041
        })))
        .expect(1)
        .mount(&server)
        .await;

    let locator = IpLocator::with_lookup_url(format!("{}/json/", server.uri()));
    let fix = locator
        .current_position(Precision::HighAccuracy)
        .await
        .unwrap();

    assert_eq!(fix, Coordinates::new(52.3676, 4.9041));
}

#[tokio::test]
async fn ip_locator_failure_status_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "fail",
            "message": "reserved range"
        })))
        .mount(&server)
        .await;

    let locator = IpLocator::with_lookup_url(format!("{}/json/", server.uri()));
    let err = locator
        .current_position(Precision::HighAccuracy)
        .await
        .unwrap_err();

    match err {
        LocationError::Unavailable(reason) => assert!(reason.contains("reserved range")),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn ip_locator_http_error_is_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/json/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let locator = IpLocator::with_lookup_url(format!("{}/json/", server.uri()));
    let err = locator
        .current_position(Precision::HighAccuracy)
        .await
        .unwrap_err();
    assert!(matches!(err, LocationError::Unavailable(_)));
}
