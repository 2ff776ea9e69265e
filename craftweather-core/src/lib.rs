//! Core library for the `craftweather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The weather provider abstraction and its OpenWeatherMap implementation
//! - The condition-code classifier
//! - The remote console client wrapping the `mcrcon` binary
//!
//! It is used by `craftweather-cli`, but can also be reused by other
//! binaries (a scheduled systemd unit, for instance).

pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod rcon;

pub use config::Config;
pub use error::{ConfigError, ExecutionError, LookupError};
pub use model::{MinecraftWeather, WeatherObservation};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider};
pub use rcon::{DEFAULT_WEATHER_DURATION, RemoteConsoleTarget};
