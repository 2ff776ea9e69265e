use std::fs;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info};

use crate::config::read_secret;
use crate::error::{ConfigError, ExecutionError};
use crate::model::MinecraftWeather;

/// How long a pushed weather state lasts on the server, unless overridden.
pub const DEFAULT_WEATHER_DURATION: Duration = Duration::from_secs(3600);

/// `localhost`, or dot-separated labels ending in a 2+ letter label. A
/// deliberately loose shape check, not full RFC hostname validation.
static HOSTNAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(localhost|[\w.-]+\.[A-Za-z]{2,})$").unwrap()
});

/// ANSI escape sequences: ESC plus a CSI/OSC-style parameter-and-terminator
/// run, or a bare C1 control.
static ANSI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:\x1B[@-_]|[\x{80}-\x{9F}])[0-?]*[ -/]*[@-~]").unwrap()
});

static PLAYER_COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^.*?are\s+(\d+)\s+of\s+a\s+max").unwrap());

/// Lines other console sessions interleave into the output stream.
const SESSION_NOISE: [&str; 3] = [
    "Automatic saving is now disabled",
    "Automatic saving is now enabled",
    "Saved the game",
];

/// A validated handle on one Minecraft server's remote console, reached
/// through the external `mcrcon` client binary.
///
/// All four fields are checked eagerly at construction; a target that fails
/// any check is never observable.
#[derive(Debug, Clone)]
pub struct RemoteConsoleTarget {
    executable: PathBuf,
    hostname: String,
    port: u16,
    password: String,
}

impl RemoteConsoleTarget {
    /// Build a target, reading the console password from the first line
    /// (trimmed) of `password_file`.
    pub fn new(
        executable: impl Into<PathBuf>,
        hostname: impl Into<String>,
        port: i64,
        password_file: &Path,
    ) -> Result<Self, ConfigError> {
        let password = read_secret(password_file)?;
        Self::with_password(executable, hostname, port, password)
    }

    /// Build a target with the password supplied directly (e.g. from the
    /// environment). Performs the same non-credential validations.
    pub fn with_password(
        executable: impl Into<PathBuf>,
        hostname: impl Into<String>,
        port: i64,
        password: String,
    ) -> Result<Self, ConfigError> {
        let executable = executable.into();
        let hostname = hostname.into();

        let meta = fs::metadata(&executable)
            .map_err(|_| ConfigError::NotFound(executable.clone()))?;
        if !meta.is_file() {
            return Err(ConfigError::NotAFile(executable));
        }
        if !is_executable(&meta) {
            return Err(ConfigError::NotExecutable(executable));
        }

        if !HOSTNAME_RE.is_match(&hostname) {
            return Err(ConfigError::InvalidHostname(hostname));
        }

        let port = u16::try_from(port)
            .ok()
            .filter(|p| *p >= 1)
            .ok_or(ConfigError::InvalidPort(port))?;

        Ok(Self { executable, hostname, port, password })
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Push a weather state to the server for the given duration.
    ///
    /// The console's informational reply ("Set the weather to clear") is
    /// discarded; a zero exit status is the only success signal.
    pub async fn set_weather(
        &self,
        state: MinecraftWeather,
        duration: Duration,
    ) -> Result<(), ExecutionError> {
        let command = format!("weather {} {}", state.as_command(), duration.as_secs());
        self.run_command(&command).await?;
        info!(state = %state, seconds = duration.as_secs(), "set the server weather");
        Ok(())
    }

    /// Count of players currently online, from the `list` console command.
    /// Output that doesn't look like a player listing counts as zero.
    pub async fn online_player_count(&self) -> Result<u32, ExecutionError> {
        let lines = self.run_command("list").await?;

        let count = lines
            .first()
            .and_then(|line| PLAYER_COUNT_RE.captures(line))
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0);

        Ok(count)
    }

    /// Run one console command through the client binary and return its
    /// cleaned output lines.
    ///
    /// Blocks for the process round-trip; no timeout is imposed here, and a
    /// failed attempt is terminal. Non-zero exit surfaces the captured
    /// stderr (stdout when stderr is empty) as the error payload.
    pub async fn run_command(&self, command: &str) -> Result<Vec<String>, ExecutionError> {
        debug!(host = %self.hostname, port = self.port, command, "invoking console client");

        let output = Command::new(&self.executable)
            .arg("-H")
            .arg(&self.hostname)
            .arg("-P")
            .arg(self.port.to_string())
            .arg("-p")
            .arg(&self.password)
            .arg(command)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| ExecutionError::Spawn {
                program: self.executable.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);

        if !output.status.success() {
            let diagnostics =
                if stderr.trim().is_empty() { stdout.trim() } else { stderr.trim() };
            return Err(ExecutionError::CommandFailed {
                program: self.program_name(),
                status: output.status.to_string(),
                diagnostics: diagnostics.to_string(),
            });
        }

        let cleaned = strip_session_noise(&strip_ansi(&stdout));
        Ok(cleaned.lines().map(str::to_string).collect())
    }

    fn program_name(&self) -> String {
        self.executable
            .file_name()
            .map_or_else(|| self.executable.display().to_string(), |n| n.to_string_lossy().into_owned())
    }
}

fn is_executable(meta: &fs::Metadata) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        meta.permissions().mode() & 0o111 != 0
    }
    #[cfg(not(unix))]
    {
        let _ = meta;
        true
    }
}

/// Strip ANSI escape sequences from console client output.
pub fn strip_ansi(output: &str) -> String {
    ANSI_RE.replace_all(output, "").into_owned()
}

/// Remove lines contributed by concurrently connected console sessions.
pub fn strip_session_noise(output: &str) -> String {
    let mut cleaned = output.to_string();
    for noise in SESSION_NOISE {
        cleaned = cleaned.replace(noise, "");
    }
    cleaned
}
