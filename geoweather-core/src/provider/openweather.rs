use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{
    error::FetchError,
    model::{Condition, WeatherQuery, WeatherResult},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

/// Client for the OpenWeather "current weather data" endpoint.
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    base_url: String,
    http: Client,
}

impl Default for OpenWeatherProvider {
    fn default() -> Self {
        Self::with_base_url(DEFAULT_BASE_URL)
    }
}

impl OpenWeatherProvider {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_weather(&self, query: &WeatherQuery) -> Result<WeatherResult, FetchError> {
        let lat = query.coordinates.latitude.to_string();
        let lon = query.coordinates.longitude.to_string();

        tracing::debug!(
            url = %self.base_url,
            lat = %lat,
            lon = %lon,
            units = %query.units,
            "Requesting current weather"
        );

        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", lat.as_str()),
                ("lon", lon.as_str()),
                ("units", query.units.as_str()),
                ("appid", query.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() {
                    FetchError::NetworkUnavailable
                } else {
                    FetchError::Transport(e)
                }
            })?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            tracing::warn!(
                %status,
                body = %truncate_body(&body),
                "OpenWeather current request failed"
            );
            return Err(FetchError::Http(status));
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        Ok(parsed.into())
    }
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    main: String,
    description: String,
    icon: String,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    temp_min: f64,
    temp_max: f64,
    humidity: u8,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f64,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: String,
    sunrise: i64,
    sunset: i64,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    weather: Vec<OwWeather>,
    main: OwMain,
    wind: OwWind,
    name: String,
    sys: OwSys,
}

impl From<OwCurrentResponse> for WeatherResult {
    fn from(parsed: OwCurrentResponse) -> Self {
        let conditions = parsed
            .weather
            .into_iter()
            .map(|w| Condition {
                main: w.main,
                description: w.description,
                icon_code: w.icon,
            })
            .collect();

        WeatherResult {
            conditions,
            temperature: parsed.main.temp,
            temperature_min: parsed.main.temp_min,
            temperature_max: parsed.main.temp_max,
            humidity_percent: parsed.main.humidity,
            wind_speed: parsed.wind.speed,
            location_name: parsed.name,
            country_code: parsed.sys.country,
            sunrise_unix_seconds: parsed.sys.sunrise,
            sunset_unix_seconds: parsed.sys.sunset,
        }
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
