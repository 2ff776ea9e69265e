use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sentinel condition code meaning "lookup failed / no data".
pub const CONDITION_UNKNOWN: i32 = -1;

/// One observation pulled from the weather provider.
///
/// Only `condition_code` feeds the classifier; `condition_label` is kept for
/// log output and is never inspected programmatically.
#[derive(Debug, Clone)]
pub struct WeatherObservation {
    /// OpenWeatherMap condition code, or [`CONDITION_UNKNOWN`].
    pub condition_code: i32,
    /// Human-readable condition group, e.g. "Rain" or "Clouds".
    pub condition_label: Option<String>,
    pub observation_time: DateTime<Utc>,
}

impl WeatherObservation {
    /// Observation standing in for a failed or empty lookup.
    pub fn unknown() -> Self {
        Self {
            condition_code: CONDITION_UNKNOWN,
            condition_label: None,
            observation_time: Utc::now(),
        }
    }

    pub fn classify(&self) -> MinecraftWeather {
        MinecraftWeather::from_condition_code(self.condition_code)
    }
}

/// The closed set of weather states a Minecraft server understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MinecraftWeather {
    Clear,
    Rain,
    Thunder,
}

impl MinecraftWeather {
    /// Map an OpenWeatherMap condition code onto a Minecraft weather state
    /// using code ranges:
    ///
    /// - `200..=299` (thunderstorm group) => `Thunder`
    /// - `300..=699` (drizzle, rain, snow, and everything in between) => `Rain`
    /// - anything else, including the `-1` unknown sentinel and the `7xx`
    ///   atmosphere / `800+` clouds groups => `Clear`
    ///
    /// See <https://openweathermap.org/weather-conditions> for the code table.
    #[must_use]
    pub const fn from_condition_code(code: i32) -> Self {
        match code {
            200..=299 => Self::Thunder,
            300..=699 => Self::Rain,
            _ => Self::Clear,
        }
    }

    /// The argument the `weather` console command expects.
    #[must_use]
    pub const fn as_command(&self) -> &'static str {
        match self {
            Self::Clear => "clear",
            Self::Rain => "rain",
            Self::Thunder => "thunder",
        }
    }
}

impl std::fmt::Display for MinecraftWeather {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_command())
    }
}
