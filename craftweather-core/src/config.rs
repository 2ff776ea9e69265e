use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable overriding the OpenWeatherMap API key file.
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";
/// Environment variable overriding the configured console hostname.
pub const RCON_HOST_ENV: &str = "MCRCON_HOST";
/// Environment variable overriding the console password file.
pub const RCON_PASS_ENV: &str = "MCRCON_PASS";

/// Location the weather is fetched for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct LocationConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        // Durham, NC — the server's home town.
        Self { latitude: 36.0178911, longitude: -78.8083965 }
    }
}

/// Weather provider credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// Plain-text file whose first line (trimmed) is the API key.
    pub credentials_file: Option<PathBuf>,
}

/// Remote console settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RconConfig {
    /// Path to the mcrcon client binary.
    pub executable: PathBuf,
    pub hostname: String,
    pub port: i64,
    /// Plain-text file whose first line (trimmed) is the console password.
    pub credentials_file: Option<PathBuf>,
}

impl Default for RconConfig {
    fn default() -> Self {
        Self {
            executable: PathBuf::from("/usr/local/bin/mcrcon"),
            hostname: "localhost".to_string(),
            port: 25575,
            credentials_file: None,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// [location]
/// latitude = 36.0178911
/// longitude = -78.8083965
///
/// [api]
/// credentials_file = "/etc/craftweather/api_key"
///
/// [rcon]
/// executable = "/usr/local/bin/mcrcon"
/// hostname = "localhost"
/// port = 25575
/// credentials_file = "/etc/craftweather/rcon_pass"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub location: LocationConfig,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub rcon: RconConfig,
}

impl Config {
    /// Load config from disk, or return defaults if it doesn't exist yet.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(cfg)
    }

    /// Save config to disk, creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::config_file_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml =
            toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")?;

        fs::write(path, toml)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        Ok(())
    }

    /// Path to the config file.
    pub fn config_file_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "craftweather", "craftweather")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Resolve the weather API key: the environment variable wins, then the
    /// configured credentials file. Absence of both is a fatal
    /// configuration error, reported before any network activity.
    pub fn api_key(&self) -> Result<String, ConfigError> {
        if let Ok(key) = env::var(API_KEY_ENV) {
            let key = key.trim().to_string();
            if !key.is_empty() {
                return Ok(key);
            }
        }

        match &self.api.credentials_file {
            Some(path) => read_secret(path),
            None => Err(ConfigError::MissingSecret { what: "weather API key", env_var: API_KEY_ENV }),
        }
    }

    /// Resolve the console hostname, honoring the environment override.
    pub fn rcon_hostname(&self) -> String {
        env::var(RCON_HOST_ENV)
            .ok()
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| self.rcon.hostname.clone())
    }

    /// Resolve the console password: the environment variable wins, then the
    /// configured credentials file.
    pub fn rcon_password(&self) -> Result<String, ConfigError> {
        if let Ok(pass) = env::var(RCON_PASS_ENV) {
            let pass = pass.trim().to_string();
            if !pass.is_empty() {
                return Ok(pass);
            }
        }

        match &self.rcon.credentials_file {
            Some(path) => read_secret(path),
            None => {
                Err(ConfigError::MissingSecret { what: "console password", env_var: RCON_PASS_ENV })
            }
        }
    }
}

/// Read a secret from a plain-text file: the first line, trimmed of
/// surrounding whitespace. No other parsing.
pub fn read_secret(path: &Path) -> Result<String, ConfigError> {
    let meta = fs::metadata(path).map_err(|_| ConfigError::NotFound(path.to_path_buf()))?;
    if !meta.is_file() {
        return Err(ConfigError::NotAFile(path.to_path_buf()));
    }

    let contents = fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::PermissionDenied => ConfigError::NotReadable(path.to_path_buf()),
        _ => ConfigError::Read { path: path.to_path_buf(), source },
    })?;

    let secret = contents.lines().next().unwrap_or("").trim().to_string();
    if secret.is_empty() {
        return Err(ConfigError::EmptyCredentials(path.to_path_buf()));
    }

    Ok(secret)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn default_config_points_at_localhost() {
        let cfg = Config::default();
        assert_eq!(cfg.rcon.hostname, "localhost");
        assert_eq!(cfg.rcon.port, 25575);
        assert_eq!(cfg.rcon.executable, PathBuf::from("/usr/local/bin/mcrcon"));
    }

    #[test]
    fn config_toml_round_trip() {
        let mut cfg = Config::default();
        cfg.location.latitude = 51.5;
        cfg.location.longitude = -0.12;
        cfg.api.credentials_file = Some(PathBuf::from("/tmp/api_key"));
        cfg.rcon.hostname = "mc.example.com".to_string();

        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.toml");
        cfg.save_to(&path).expect("save");

        let loaded = Config::load_from(&path).expect("load");
        assert_eq!(loaded.rcon.hostname, "mc.example.com");
        assert_eq!(loaded.api.credentials_file, Some(PathBuf::from("/tmp/api_key")));
        assert!((loaded.location.latitude - 51.5).abs() < f64::EPSILON);
    }

    #[test]
    fn load_returns_defaults_when_file_is_absent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cfg = Config::load_from(&dir.path().join("nope.toml")).expect("load");
        assert_eq!(cfg.rcon.hostname, "localhost");
    }

    #[test]
    fn read_secret_takes_the_first_line_trimmed() {
        let mut file = NamedTempFile::new().expect("tempfile");
        writeln!(file, "  s3cr3t-key  ").expect("write");
        writeln!(file, "ignored second line").expect("write");

        let secret = read_secret(file.path()).expect("read_secret");
        assert_eq!(secret, "s3cr3t-key");
    }

    #[test]
    fn read_secret_rejects_missing_file() {
        let err = read_secret(Path::new("/definitely/not/here")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn read_secret_rejects_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_secret(dir.path()).unwrap_err();
        assert!(matches!(err, ConfigError::NotAFile(_)));
    }

    #[test]
    fn read_secret_rejects_empty_files() {
        let mut file = NamedTempFile::new().expect("tempfile");
        writeln!(file).expect("write");

        let err = read_secret(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyCredentials(_)));
    }

    #[test]
    fn environment_overrides_resolve_before_config_values() {
        fn set_env(key: &str, value: Option<&str>) {
            // SAFETY: all environment mutation in this crate's tests lives
            // in this one test body, so no other thread reads these
            // variables while they change.
            unsafe {
                match value {
                    Some(v) => env::set_var(key, v),
                    None => env::remove_var(key),
                }
            }
        }

        let saved: Vec<(&str, Option<String>)> = [API_KEY_ENV, RCON_HOST_ENV, RCON_PASS_ENV]
            .into_iter()
            .map(|key| (key, env::var(key).ok()))
            .collect();
        for (key, _) in &saved {
            set_env(key, None);
        }

        let mut key_file = NamedTempFile::new().expect("tempfile");
        writeln!(key_file, "file-api-key").expect("write");
        let mut pass_file = NamedTempFile::new().expect("tempfile");
        writeln!(pass_file, "file-pass").expect("write");

        let mut cfg = Config::default();

        // Nothing configured and no environment: fatal before any network.
        assert!(matches!(cfg.api_key(), Err(ConfigError::MissingSecret { .. })));
        assert!(matches!(cfg.rcon_password(), Err(ConfigError::MissingSecret { .. })));
        assert_eq!(cfg.rcon_hostname(), "localhost");

        cfg.api.credentials_file = Some(key_file.path().to_path_buf());
        cfg.rcon.credentials_file = Some(pass_file.path().to_path_buf());

        // Credentials files alone resolve.
        assert_eq!(cfg.api_key().expect("api key"), "file-api-key");
        assert_eq!(cfg.rcon_password().expect("password"), "file-pass");

        // Environment variables win over the files, trimmed.
        set_env(API_KEY_ENV, Some("  env-api-key  "));
        set_env(RCON_PASS_ENV, Some("env-pass"));
        set_env(RCON_HOST_ENV, Some("  mc.override.net  "));
        assert_eq!(cfg.api_key().expect("api key"), "env-api-key");
        assert_eq!(cfg.rcon_password().expect("password"), "env-pass");
        assert_eq!(cfg.rcon_hostname(), "mc.override.net");

        // Empty environment values fall through to the configured sources.
        set_env(API_KEY_ENV, Some(""));
        set_env(RCON_PASS_ENV, Some("   "));
        set_env(RCON_HOST_ENV, Some(""));
        assert_eq!(cfg.api_key().expect("api key"), "file-api-key");
        assert_eq!(cfg.rcon_password().expect("password"), "file-pass");
        assert_eq!(cfg.rcon_hostname(), "localhost");

        for (key, value) in saved {
            set_env(key, value.as_deref());
        }
    }
}
