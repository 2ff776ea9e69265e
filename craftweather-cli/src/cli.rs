use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use inquire::{CustomType, Text};
use tracing::info;

use craftweather_core::{Config, OpenWeatherProvider, RemoteConsoleTarget, WeatherProvider};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "craftweather",
    version,
    about = "Mirror the real-world weather onto a Minecraft server"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the current weather and push it to the server's console.
    Set {
        /// Postal code to resolve instead of the configured coordinates.
        #[arg(long)]
        zip: Option<String>,

        /// Two-letter country code used together with --zip.
        #[arg(long, default_value = "US")]
        country: String,

        /// How long the pushed weather lasts, in seconds.
        #[arg(long, default_value_t = craftweather_core::DEFAULT_WEATHER_DURATION.as_secs())]
        duration: u64,
    },

    /// Check that the weather provider is reachable with the configured key.
    Test,

    /// Interactively configure credentials, location, and the console target.
    Configure,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Command::Set { zip, country, duration } => {
                set_weather(zip, &country, Duration::from_secs(duration)).await
            }
            Command::Test => probe().await,
            Command::Configure => configure(),
        }
    }
}

/// The full sequence: load config, resolve coordinates, fetch, classify,
/// push. Stops at the first failure; nothing is retried.
async fn set_weather(zip: Option<String>, country: &str, duration: Duration) -> Result<()> {
    let config = Config::load()?;

    let api_key = config.api_key()?;
    let provider = OpenWeatherProvider::new(api_key)?;

    let (latitude, longitude) = match zip {
        Some(zip) => provider
            .locate_postal(&zip, country)
            .await
            .with_context(|| format!("Failed to resolve postal code {zip},{country}"))?,
        None => (config.location.latitude, config.location.longitude),
    };

    let observation = provider
        .current_conditions(latitude, longitude)
        .await
        .context("Failed to fetch the current weather")?;

    let state = observation.classify();
    info!(
        code = observation.condition_code,
        label = observation.condition_label.as_deref().unwrap_or("unknown"),
        observed_at = %observation.observation_time,
        %state,
        "classified current conditions"
    );

    let target = RemoteConsoleTarget::with_password(
        config.rcon.executable.clone(),
        config.rcon_hostname(),
        config.rcon.port,
        config.rcon_password()?,
    )?;

    target
        .set_weather(state, duration)
        .await
        .context("Failed to set the weather on the server")?;

    println!("Set the server weather to {state}");
    Ok(())
}

/// Reachability check only; never contacts the console client.
async fn probe() -> Result<()> {
    let config = Config::load()?;
    let provider = OpenWeatherProvider::new(config.api_key()?)?;

    provider
        .probe(config.location.latitude, config.location.longitude)
        .await
        .context("Weather provider is not reachable with the configured key")?;

    println!("Weather provider is reachable");
    Ok(())
}

fn configure() -> Result<()> {
    let mut config = Config::load()?;

    let api_file = Text::new("Path to the OpenWeatherMap API key file:")
        .with_initial_value(
            &config.api.credentials_file.as_deref().map(|p| p.display().to_string()).unwrap_or_default(),
        )
        .prompt()?;
    config.api.credentials_file =
        if api_file.trim().is_empty() { None } else { Some(PathBuf::from(api_file.trim())) };

    config.location.latitude = CustomType::<f64>::new("Latitude:")
        .with_default(config.location.latitude)
        .prompt()?;
    config.location.longitude = CustomType::<f64>::new("Longitude:")
        .with_default(config.location.longitude)
        .prompt()?;

    let executable = Text::new("Path to the mcrcon binary:")
        .with_initial_value(&config.rcon.executable.display().to_string())
        .prompt()?;
    config.rcon.executable = PathBuf::from(executable.trim());

    config.rcon.hostname = Text::new("Console hostname:")
        .with_initial_value(&config.rcon.hostname)
        .prompt()?
        .trim()
        .to_string();

    config.rcon.port = CustomType::<i64>::new("Console port:")
        .with_default(config.rcon.port)
        .prompt()?;

    let pass_file = Text::new("Path to the console password file:")
        .with_initial_value(
            &config.rcon.credentials_file.as_deref().map(|p| p.display().to_string()).unwrap_or_default(),
        )
        .prompt()?;
    config.rcon.credentials_file =
        if pass_file.trim().is_empty() { None } else { Some(PathBuf::from(pass_file.trim())) };

    config.save()?;
    println!("Saved configuration to {}", Config::config_file_path()?.display());
    Ok(())
}
