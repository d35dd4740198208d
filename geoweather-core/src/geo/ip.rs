//! Network-based location: ask an IP geolocation service where we are.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{Coordinates, LocationError};

use super::{GeoProvider, Precision};

pub const DEFAULT_LOOKUP_URL: &str = "http://ip-api.com/json/";

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct IpLocator {
    lookup_url: String,
    http: Client,
}

impl Default for IpLocator {
    fn default() -> Self {
        Self::with_lookup_url(DEFAULT_LOOKUP_URL)
    }
}

impl IpLocator {
    pub fn with_lookup_url(lookup_url: impl Into<String>) -> Self {
        Self {
            lookup_url: lookup_url.into(),
            http: Client::new(),
        }
    }
}

#[async_trait]
impl GeoProvider for IpLocator {
    async fn current_position(&self, precision: Precision) -> Result<Coordinates, LocationError> {
        tracing::debug!(url = %self.lookup_url, ?precision, "Requesting IP-based position");

        let response = self
            .http
            .get(&self.lookup_url)
            .query(&[("fields", "status,message,lat,lon")])
            .send()
            .await
            .map_err(|e| LocationError::Unavailable(format!("lookup request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(LocationError::Unavailable(format!(
                "lookup returned status {}",
                response.status()
            )));
        }

        let body: IpApiResponse = response
            .json()
            .await
            .map_err(|e| LocationError::Unavailable(format!("unreadable lookup response: {e}")))?;

        if body.status != "success" {
            let reason = body.message.unwrap_or_else(|| body.status.clone());
            return Err(LocationError::Unavailable(format!("lookup failed: {reason}")));
        }

        match (body.lat, body.lon) {
            (Some(lat), Some(lon)) => {
                let fix = Coordinates::new(lat, lon);
                tracing::info!(%fix, "Got position fix");
                Ok(fix)
            }
            _ => Err(LocationError::Unavailable(
                "lookup response had no coordinates".to_string(),
            )),
        }
    }
}
