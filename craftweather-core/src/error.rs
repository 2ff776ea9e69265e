use std::path::PathBuf;

use thiserror::Error;

/// Errors detected while validating configuration, credentials, or the
/// remote console target. All of these are raised before any network or
/// process activity and are always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unable to find {}", .0.display())]
    NotFound(PathBuf),

    #[error("{} is not a regular file", .0.display())]
    NotAFile(PathBuf),

    #[error("{} is not readable", .0.display())]
    NotReadable(PathBuf),

    #[error("{} is not executable", .0.display())]
    NotExecutable(PathBuf),

    #[error("'{0}' is not a valid hostname")]
    InvalidHostname(String),

    #[error("{0} is not a valid port")]
    InvalidPort(i64),

    #[error("credentials file {} is empty", .0.display())]
    EmptyCredentials(PathBuf),

    #[error("missing {what}: set the {env_var} environment variable or configure it")]
    MissingSecret {
        what: &'static str,
        env_var: &'static str,
    },

    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Errors talking to the weather data provider.
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("failed to initialize HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("request to weather provider failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("weather provider returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("geocoding response is missing lat/lon coordinates")]
    MissingCoordinates,

    #[error("failed to parse provider response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Errors executing the external console client. A single failed attempt is
/// terminal; nothing here is retried.
#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("failed to launch {}: {source}", .program.display())]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {diagnostics}")]
    CommandFailed {
        program: String,
        status: String,
        diagnostics: String,
    },
}
