#![allow(dead_code)]

use std::time::Duration;

use rlaunch::config::{LaunchOptions, RawSettings, Settings};

/// Builder for `Settings` to simplify test setup.
///
/// Timings default to short windows so tests don't sit on the 2s
/// production defaults.
pub struct SettingsBuilder {
    raw: RawSettings,
}

impl SettingsBuilder {
    pub fn new() -> Self {
        let mut raw = RawSettings::default();
        raw.timing.poll_timeout = "500ms".to_string();
        raw.timing.settle_delay = "100ms".to_string();
        raw.timing.tunnel_timeout = "1s".to_string();
        Self { raw }
    }

    pub fn copy_launcher(mut self, launcher: &str) -> Self {
        self.raw.copy = self.raw.copy.launcher(launcher);
        self
    }

    pub fn copy_options(mut self, options: &str) -> Self {
        self.raw.copy = self.raw.copy.options(options);
        self
    }

    pub fn shell_launcher(mut self, launcher: &str) -> Self {
        self.raw.shell = self.raw.shell.launcher(launcher);
        self
    }

    pub fn shell_options(mut self, options: &str) -> Self {
        self.raw.shell = self.raw.shell.options(options);
        self
    }

    pub fn shell(mut self, options: LaunchOptions) -> Self {
        self.raw.shell = self.raw.shell.merge(options);
        self
    }

    pub fn poll_timeout(mut self, d: Duration) -> Self {
        self.raw.timing.poll_timeout = format!("{}ms", d.as_millis());
        self
    }

    pub fn settle_delay(mut self, d: Duration) -> Self {
        self.raw.timing.settle_delay = format!("{}ms", d.as_millis());
        self
    }

    pub fn tunnel_timeout(mut self, d: Duration) -> Self {
        self.raw.timing.tunnel_timeout = format!("{}ms", d.as_millis());
        self
    }

    pub fn python(mut self, interpreter: &str) -> Self {
        self.raw.remote.python = interpreter.to_string();
        self
    }

    pub fn profile(mut self, profile: &str) -> Self {
        self.raw.remote.profile = profile.to_string();
        self
    }

    pub fn server_dir(mut self, dir: &str) -> Self {
        self.raw.remote.server_dir = dir.to_string();
        self
    }

    pub fn ready_pattern(mut self, pattern: &str) -> Self {
        self.raw.remote.ready_pattern = Some(pattern.to_string());
        self
    }

    pub fn build(self) -> Settings {
        Settings::try_from(self.raw).expect("Failed to build valid settings from builder")
    }
}

impl Default for SettingsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
