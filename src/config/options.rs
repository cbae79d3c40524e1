// src/config/options.rs

//! Per-launch configuration records.
//!
//! [`LaunchOptions`] is a *partial update*: every field is optional and only
//! the supplied ones are written into a launcher's record. The same type is
//! deserialized from the `[copy]` / `[shell]` sections of the settings file,
//! so TOML defaults and runtime `config()` calls merge the same way.
//!
//! [`CopyConfig`] and [`ShellConfig`] are the full records owned by the two
//! launcher variants. Each one applies only the keys on its own allow-list
//! and silently drops the rest.

use serde::Deserialize;
use tracing::debug;

use crate::errors::{LaunchError, Result};
use crate::types::Input;

/// Keys a copy launcher accepts.
pub const COPY_KEYS: &[&str] = &[
    "source",
    "destination",
    "launcher",
    "options",
    "background",
    "stdin",
];

/// Keys a shell launcher accepts.
pub const SHELL_KEYS: &[&str] = &["command", "rhost", "launcher", "options", "background", "stdin"];

/// A partial set of launcher options.
///
/// ```toml
/// [shell]
/// launcher = "ssh"
/// options = "-q -o BatchMode=yes"
/// fgbg = "background"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LaunchOptions {
    /// Executable that performs the operation (`scp`, `cp`, `ssh`, ...).
    pub launcher: Option<String>,

    /// Extra flags placed right after the launcher name.
    pub options: Option<String>,

    /// Copy source, `[user@]host:path` or a local path.
    pub source: Option<String>,

    /// Copy destination, `[user@]host:path` or a local path.
    pub destination: Option<String>,

    /// Remote command for the shell launcher.
    pub command: Option<String>,

    /// Remote host for the shell launcher.
    pub rhost: Option<String>,

    /// Run detached and collect output with a bounded poll.
    pub background: Option<bool>,

    /// Older spelling of `background`: `"bg"` / `"background"` mean true,
    /// anything else means false. An explicit `background` wins.
    pub fgbg: Option<String>,

    /// Standard input for the child. Not settable from TOML.
    #[serde(skip)]
    pub stdin: Option<Input>,
}

impl LaunchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn launcher(mut self, value: impl Into<String>) -> Self {
        self.launcher = Some(value.into());
        self
    }

    pub fn options(mut self, value: impl Into<String>) -> Self {
        self.options = Some(value.into());
        self
    }

    pub fn source(mut self, value: impl Into<String>) -> Self {
        self.source = Some(value.into());
        self
    }

    pub fn destination(mut self, value: impl Into<String>) -> Self {
        self.destination = Some(value.into());
        self
    }

    pub fn command(mut self, value: impl Into<String>) -> Self {
        self.command = Some(value.into());
        self
    }

    pub fn rhost(mut self, value: impl Into<String>) -> Self {
        self.rhost = Some(value.into());
        self
    }

    pub fn background(mut self, value: bool) -> Self {
        self.background = Some(value);
        self
    }

    pub fn fgbg(mut self, value: impl Into<String>) -> Self {
        self.fgbg = Some(value.into());
        self
    }

    pub fn stdin(mut self, value: Input) -> Self {
        self.stdin = Some(value);
        self
    }

    /// Build a partial update from loose `key = value` pairs.
    ///
    /// Unknown keys are dropped. `stdin` cannot be expressed as a string and
    /// is treated as unknown here.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut opts = Self::default();
        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let value = value.into();
            match key {
                "launcher" => opts.launcher = Some(value),
                "options" => opts.options = Some(value),
                "source" => opts.source = Some(value),
                "destination" => opts.destination = Some(value),
                "command" => opts.command = Some(value),
                "rhost" => opts.rhost = Some(value),
                "background" => opts.background = Some(parse_bool(key, &value)?),
                "fgbg" => opts.fgbg = Some(value),
                other => debug!(key = %other, "dropping unrecognised launcher option"),
            }
        }
        Ok(opts)
    }

    /// Parse a single `key=value` string (as given on the command line).
    pub fn parse_pair(s: &str) -> std::result::Result<(String, String), String> {
        let (key, value) = s
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got '{s}'"))?;
        let key = key.trim();
        if key.is_empty() {
            return Err(format!("missing key in '{s}'"));
        }
        Ok((key.to_string(), value.to_string()))
    }

    /// Overlay `later` on top of `self`; keys supplied in `later` win.
    pub fn merge(mut self, later: LaunchOptions) -> Self {
        if later.launcher.is_some() {
            self.launcher = later.launcher;
        }
        if later.options.is_some() {
            self.options = later.options;
        }
        if later.source.is_some() {
            self.source = later.source;
        }
        if later.destination.is_some() {
            self.destination = later.destination;
        }
        if later.command.is_some() {
            self.command = later.command;
        }
        if later.rhost.is_some() {
            self.rhost = later.rhost;
        }
        if later.background.is_some() || later.fgbg.is_some() {
            self.background = later.background;
            self.fgbg = later.fgbg;
        }
        if later.stdin.is_some() {
            self.stdin = later.stdin;
        }
        self
    }

    /// Resolved background flag, honouring the `fgbg` alias.
    pub fn effective_background(&self) -> Option<bool> {
        self.background.or_else(|| {
            self.fgbg
                .as_deref()
                .map(|v| matches!(v.trim(), "bg" | "background"))
        })
    }

    fn warn_dropped(&self, variant: &str, allowed: &[&str]) {
        let supplied = [
            ("launcher", self.launcher.is_some()),
            ("options", self.options.is_some()),
            ("source", self.source.is_some()),
            ("destination", self.destination.is_some()),
            ("command", self.command.is_some()),
            ("rhost", self.rhost.is_some()),
        ];
        for (key, present) in supplied {
            if present && !allowed.contains(&key) {
                debug!(key, variant, "option not recognised by this launcher; ignored");
            }
        }
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" | "" => Ok(false),
        other => Err(LaunchError::ConfigError(format!(
            "invalid boolean for '{key}': {other}"
        ))),
    }
}

/// Record owned by a copy launcher.
#[derive(Debug, Clone)]
pub struct CopyConfig {
    pub launcher: String,
    pub options: String,
    pub source: String,
    pub destination: String,
    pub background: bool,
    pub stdin: Input,
}

impl Default for CopyConfig {
    fn default() -> Self {
        Self {
            launcher: "scp".to_string(),
            options: String::new(),
            source: String::new(),
            destination: String::new(),
            background: false,
            stdin: Input::Null,
        }
    }
}

impl CopyConfig {
    /// Write the allow-listed keys of `update` into this record.
    pub fn apply(&mut self, update: LaunchOptions) {
        update.warn_dropped("copy", COPY_KEYS);
        let background = update.effective_background();
        if let Some(v) = update.launcher {
            self.launcher = v;
        }
        if let Some(v) = update.options {
            self.options = v;
        }
        if let Some(v) = update.source {
            self.source = v;
        }
        if let Some(v) = update.destination {
            self.destination = v;
        }
        if let Some(v) = background {
            self.background = v;
        }
        if let Some(v) = update.stdin {
            self.stdin = v;
        }
    }

    /// The record as a fully populated update, allow-listed keys only.
    pub fn to_options(&self) -> LaunchOptions {
        LaunchOptions {
            launcher: Some(self.launcher.clone()),
            options: Some(self.options.clone()),
            source: Some(self.source.clone()),
            destination: Some(self.destination.clone()),
            background: Some(self.background),
            stdin: Some(self.stdin.clone()),
            ..LaunchOptions::default()
        }
    }
}

/// Record owned by a shell launcher.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    pub launcher: String,
    pub options: String,
    pub command: String,
    pub rhost: String,
    pub background: bool,
    pub stdin: Input,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            launcher: "ssh".to_string(),
            options: String::new(),
            command: String::new(),
            rhost: String::new(),
            background: false,
            stdin: Input::Null,
        }
    }
}

impl ShellConfig {
    pub fn apply(&mut self, update: LaunchOptions) {
        update.warn_dropped("shell", SHELL_KEYS);
        let background = update.effective_background();
        if let Some(v) = update.launcher {
            self.launcher = v;
        }
        if let Some(v) = update.options {
            self.options = v;
        }
        if let Some(v) = update.command {
            self.command = v;
        }
        if let Some(v) = update.rhost {
            self.rhost = v;
        }
        if let Some(v) = background {
            self.background = v;
        }
        if let Some(v) = update.stdin {
            self.stdin = v;
        }
    }

    pub fn to_options(&self) -> LaunchOptions {
        LaunchOptions {
            launcher: Some(self.launcher.clone()),
            options: Some(self.options.clone()),
            command: Some(self.command.clone()),
            rhost: Some(self.rhost.clone()),
            background: Some(self.background),
            stdin: Some(self.stdin.clone()),
            ..LaunchOptions::default()
        }
    }
}
