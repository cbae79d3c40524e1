// src/config/validate.rs

use std::sync::LazyLock;
use std::time::Duration;

use regex::Regex;

use crate::config::model::{parse_duration, RawSettings, RemoteSettings, Settings, Timing};
use crate::errors::{LaunchError, Result};

impl TryFrom<RawSettings> for Settings {
    type Error = LaunchError;

    fn try_from(raw: RawSettings) -> std::result::Result<Self, Self::Error> {
        let copy = Settings::default_copy().merge(raw.copy);
        let shell = Settings::default_shell().merge(raw.shell);
        ensure_launcher_named("copy", copy.launcher.as_deref())?;
        ensure_launcher_named("shell", shell.launcher.as_deref())?;

        let timing = Timing {
            poll_timeout: non_zero("poll_timeout", &raw.timing.poll_timeout)?,
            settle_delay: duration("settle_delay", &raw.timing.settle_delay)?,
            tunnel_timeout: non_zero("tunnel_timeout", &raw.timing.tunnel_timeout)?,
        };

        let ready_pattern = match raw.remote.ready_pattern.as_deref() {
            Some(p) => Some(Regex::new(p).map_err(|e| {
                LaunchError::ConfigError(format!("[remote].ready_pattern is not a valid regex: {e}"))
            })?),
            None => None,
        };
        if raw.remote.python.trim().is_empty() {
            return Err(LaunchError::ConfigError(
                "[remote].python must not be empty".to_string(),
            ));
        }

        let remote = RemoteSettings {
            python: raw.remote.python,
            profile: raw.remote.profile,
            server_dir: raw.remote.server_dir,
            ready_pattern,
        };

        Ok(Settings::new_unchecked(copy, shell, timing, remote))
    }
}

/// Validate an already constructed `Settings` value.
pub fn validate_settings(settings: &Settings) -> Result<()> {
    ensure_launcher_named("copy", settings.copy.launcher.as_deref())?;
    ensure_launcher_named("shell", settings.shell.launcher.as_deref())?;
    if settings.timing.poll_timeout.is_zero() {
        return Err(LaunchError::ConfigError(
            "[timing].poll_timeout must be > 0".to_string(),
        ));
    }
    if settings.timing.tunnel_timeout.is_zero() {
        return Err(LaunchError::ConfigError(
            "[timing].tunnel_timeout must be > 0".to_string(),
        ));
    }
    Ok(())
}

fn ensure_launcher_named(section: &str, launcher: Option<&str>) -> Result<()> {
    match launcher {
        Some(l) if !l.trim().is_empty() => Ok(()),
        _ => Err(LaunchError::ConfigError(format!(
            "[{section}].launcher must not be empty"
        ))),
    }
}

fn duration(key: &str, value: &str) -> Result<Duration> {
    parse_duration(value)
        .map_err(|e| LaunchError::ConfigError(format!("[timing].{key}: {e}")))
}

fn non_zero(key: &str, value: &str) -> Result<Duration> {
    let d = duration(key, value)?;
    if d.is_zero() {
        return Err(LaunchError::ConfigError(format!(
            "[timing].{key} must be > 0 (got {value})"
        )));
    }
    Ok(d)
}

// `[user@]host:path`, host may be a bracketed IPv6 literal.
static REMOTE_ENDPOINT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[^@/:\s]+@)?(?:\[[0-9A-Fa-f:.]+\]|[^@/:\[\]\s]+):")
        .expect("remote endpoint regex is valid")
});

/// Check a copy source or destination before it reaches the command line.
///
/// Local paths pass as long as they are non-empty. A value is treated as
/// remote when it has a `:` with no `/` before it (the same rule `scp`
/// uses); remote values need a non-empty host with no whitespace.
pub fn validate_endpoint(role: &str, value: &str) -> Result<()> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LaunchError::BadEndpoint(format!("{role} is empty")));
    }

    let Some(colon) = trimmed.find(':') else {
        return Ok(());
    };
    if trimmed[..colon].contains('/') && !trimmed.starts_with('[') {
        return Ok(());
    }
    if colon == 0 {
        return Err(LaunchError::BadEndpoint(format!(
            "{role} '{value}' has no host before ':'"
        )));
    }
    if !REMOTE_ENDPOINT.is_match(trimmed) {
        return Err(LaunchError::BadEndpoint(format!(
            "{role} '{value}' is not of the form [user@]host:path"
        )));
    }
    Ok(())
}

/// Check a remote host name for the shell launcher.
pub fn validate_rhost(rhost: &str) -> Result<()> {
    let rhost = rhost.trim();
    if rhost.is_empty() {
        return Err(LaunchError::BadEndpoint("remote host is empty".to_string()));
    }
    if rhost.chars().any(char::is_whitespace) || rhost.starts_with('-') {
        return Err(LaunchError::BadEndpoint(format!(
            "remote host '{rhost}' is not a valid host name"
        )));
    }
    Ok(())
}
