use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::LookupError;
use crate::model::WeatherObservation;

use super::WeatherProvider;

const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org";

/// Data the One Call endpoint is asked to leave out of the response.
const ONECALL_EXCLUDE: &str = "minutely,hourly,daily,alerts";

/// Fixed per-request timeout on every provider call.
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for the OpenWeatherMap One Call 3.0 and geocoding APIs.
///
/// <https://openweathermap.org/api/one-call-3>
#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Result<Self, LookupError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL.to_string())
    }

    /// Point the provider at a different host. Used by tests.
    pub fn with_base_url(api_key: String, base_url: String) -> Result<Self, LookupError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(LookupError::Client)?;

        Ok(Self { api_key, base_url, http })
    }

    fn onecall_url(&self) -> String {
        format!("{}/data/3.0/onecall", self.base_url)
    }

    /// Resolve a postal code to coordinates via the geocoding API.
    ///
    /// <https://openweathermap.org/api/geocoding-api#direct_zip>
    pub async fn locate_postal(
        &self,
        zip: &str,
        country: &str,
    ) -> Result<(f64, f64), LookupError> {
        let url = format!("{}/geo/1.0/zip", self.base_url);
        let query = format!("{zip},{country}");

        let res = self
            .http
            .get(&url)
            .query(&[("zip", query.as_str()), ("appid", self.api_key.as_str())])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body = %truncate_body(&body), "geocoding lookup failed");
            return Err(LookupError::Status(status));
        }

        let parsed: GeoResponse = res.json().await?;
        match (parsed.lat, parsed.lon) {
            (Some(lat), Some(lon)) => Ok((lat, lon)),
            _ => Err(LookupError::MissingCoordinates),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherObservation, LookupError> {
        let res = self
            .http
            .get(self.onecall_url())
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("exclude", ONECALL_EXCLUDE.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            // No data is not a hard failure; the classifier treats the
            // unknown sentinel as clear weather.
            let body = res.text().await.unwrap_or_default();
            warn!(%status, body = %truncate_body(&body), "weather lookup returned non-success");
            return Ok(WeatherObservation::unknown());
        }

        let parsed: OneCallResponse = serde_json::from_str(&res.text().await?)?;

        let observation_time = DateTime::from_timestamp(parsed.current.dt, 0)
            .unwrap_or_else(Utc::now);

        let Some(condition) = parsed.current.weather.first() else {
            warn!("weather lookup succeeded but carried no condition entry");
            return Ok(WeatherObservation::unknown());
        };

        debug!(code = condition.id, label = %condition.main, "fetched current conditions");

        Ok(WeatherObservation {
            condition_code: condition.id,
            condition_label: Some(condition.main.clone()),
            observation_time,
        })
    }

    async fn probe(&self, latitude: f64, longitude: f64) -> Result<(), LookupError> {
        let res = self
            .http
            .head(self.onecall_url())
            .query(&[
                ("lat", latitude.to_string()),
                ("lon", longitude.to_string()),
                ("exclude", ONECALL_EXCLUDE.to_string()),
                ("appid", self.api_key.clone()),
            ])
            .send()
            .await?;

        let status = res.status();
        if status.is_success() { Ok(()) } else { Err(LookupError::Status(status)) }
    }
}

#[derive(Debug, Deserialize)]
struct OwCondition {
    id: i32,
    main: String,
}

#[derive(Debug, Deserialize)]
struct OwCurrent {
    dt: i64,
    #[serde(default)]
    weather: Vec<OwCondition>,
}

#[derive(Debug, Deserialize)]
struct OneCallResponse {
    current: OwCurrent,
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    lat: Option<f64>,
    lon: Option<f64>,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }

    // Never cut a multibyte character in half.
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
