// src/config/model.rs

use std::time::Duration;

use regex::Regex;
use serde::Deserialize;

use crate::config::options::LaunchOptions;

/// Settings as read from a TOML file.
///
/// ```toml
/// [copy]
/// launcher = "scp"
/// options = "-q"
///
/// [shell]
/// launcher = "ssh"
/// options = "-q"
///
/// [timing]
/// poll_timeout = "2s"
/// settle_delay = "2s"
/// tunnel_timeout = "5s"
///
/// [remote]
/// python = "python"
/// profile = ".bash_profile"
/// server_dir = "~/bin"
/// ready_pattern = "^serving on"
/// ```
///
/// All sections are optional and have reasonable defaults. Use
/// `Settings::try_from(raw)` to validate and resolve them.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSettings {
    /// Defaults applied to every copy launcher built from these settings.
    #[serde(default)]
    pub copy: LaunchOptions,

    /// Defaults applied to every shell launcher built from these settings.
    #[serde(default)]
    pub shell: LaunchOptions,

    #[serde(default)]
    pub timing: RawTiming,

    #[serde(default)]
    pub remote: RawRemote,
}

/// `[timing]` section, durations as strings (`"250ms"`, `"2s"`, `"1m"`).
#[derive(Debug, Clone, Deserialize)]
pub struct RawTiming {
    /// How long a background `response()` waits for output.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout: String,

    /// How long `serve()` sleeps after launching when no `ready_pattern` is
    /// configured.
    #[serde(default = "default_settle_delay")]
    pub settle_delay: String,

    /// Deadline for a tunnel (or a server handshake) to become ready.
    #[serde(default = "default_tunnel_timeout")]
    pub tunnel_timeout: String,
}

fn default_poll_timeout() -> String {
    "2s".to_string()
}

fn default_settle_delay() -> String {
    "2s".to_string()
}

fn default_tunnel_timeout() -> String {
    "5s".to_string()
}

impl Default for RawTiming {
    fn default() -> Self {
        Self {
            poll_timeout: default_poll_timeout(),
            settle_delay: default_settle_delay(),
            tunnel_timeout: default_tunnel_timeout(),
        }
    }
}

/// `[remote]` section: what the orchestration helpers expect to find on the
/// remote host.
#[derive(Debug, Clone, Deserialize)]
pub struct RawRemote {
    /// Interpreter fed the port-picking script by `pickport`.
    #[serde(default = "default_python")]
    pub python: String,

    /// Profile sourced before starting a server.
    #[serde(default = "default_profile")]
    pub profile: String,

    /// Directory holding `<server>.py` scripts.
    #[serde(default = "default_server_dir")]
    pub server_dir: String,

    /// Regex a server prints once it accepts requests.
    #[serde(default)]
    pub ready_pattern: Option<String>,
}

fn default_python() -> String {
    "python".to_string()
}

fn default_profile() -> String {
    ".bash_profile".to_string()
}

fn default_server_dir() -> String {
    "~/bin".to_string()
}

impl Default for RawRemote {
    fn default() -> Self {
        Self {
            python: default_python(),
            profile: default_profile(),
            server_dir: default_server_dir(),
            ready_pattern: None,
        }
    }
}

/// Validated settings.
///
/// Construct via `Settings::try_from(raw_settings)` or
/// [`crate::config::load_and_validate`]; `Settings::default()` gives the
/// built-in defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    pub copy: LaunchOptions,
    pub shell: LaunchOptions,
    pub timing: Timing,
    pub remote: RemoteSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub poll_timeout: Duration,
    pub settle_delay: Duration,
    pub tunnel_timeout: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(2),
            settle_delay: Duration::from_secs(2),
            tunnel_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteSettings {
    pub python: String,
    pub profile: String,
    pub server_dir: String,
    pub ready_pattern: Option<Regex>,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            python: default_python(),
            profile: default_profile(),
            server_dir: default_server_dir(),
            ready_pattern: None,
        }
    }
}

impl Settings {
    pub(crate) fn new_unchecked(
        copy: LaunchOptions,
        shell: LaunchOptions,
        timing: Timing,
        remote: RemoteSettings,
    ) -> Self {
        Self {
            copy,
            shell,
            timing,
            remote,
        }
    }

    /// Built-in copy defaults: `scp -q`.
    pub fn default_copy() -> LaunchOptions {
        LaunchOptions::new().launcher("scp").options("-q")
    }

    /// Built-in shell defaults: `ssh -q`.
    pub fn default_shell() -> LaunchOptions {
        LaunchOptions::new().launcher("ssh").options("-q")
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::new_unchecked(
            Self::default_copy(),
            Self::default_shell(),
            Timing::default(),
            RemoteSettings::default(),
        )
    }
}

/// Parse a simple duration string like `"3s"`, `"250ms"`, `"1m"`, `"2h"`.
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let idx = s
        .chars()
        .position(|c| !c.is_ascii_digit())
        .ok_or_else(|| "duration missing unit suffix".to_string())?;

    let (num_part, unit_part) = s.split_at(idx);
    let value: u64 = num_part
        .parse()
        .map_err(|e| format!("invalid duration number '{}': {}", num_part, e))?;
    let unit = unit_part.trim().to_lowercase();

    let scaled = |factor: u64| {
        value
            .checked_mul(factor)
            .map(Duration::from_secs)
            .ok_or_else(|| format!("duration '{s}' is too large"))
    };

    match unit.as_str() {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => scaled(60),
        "h" => scaled(60 * 60),
        _ => Err(format!(
            "unsupported duration unit '{}'; expected ms, s, m, or h",
            unit
        )),
    }
}
