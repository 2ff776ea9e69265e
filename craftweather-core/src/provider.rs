use std::fmt::Debug;

use async_trait::async_trait;

use crate::error::LookupError;
use crate::model::WeatherObservation;

pub mod openweather;

/// A source of current weather conditions for a coordinate pair.
///
/// A failed or empty lookup in `current_conditions` is represented as an
/// observation carrying the unknown sentinel, not an error; only transport
/// failures surface as [`LookupError`].
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    async fn current_conditions(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<WeatherObservation, LookupError>;

    /// Lightweight reachability check against the provider. Never parses a
    /// body and never touches the console client.
    async fn probe(&self, latitude: f64, longitude: f64) -> Result<(), LookupError>;
}
