// src/launcher/shell.rs

//! Remote shell launcher (`ssh` by default).
//!
//! The command line is `<launcher> <options> <rhost> "<command>"`. An empty
//! command drops the quoted part, which is what a port forward
//! (`ssh -N -L ...`) needs.

use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;
use std::time::Duration;

use regex::Regex;

use crate::config::{validate_rhost, LaunchOptions, Settings, ShellConfig};
use crate::errors::Result;
use crate::launcher::{LaunchState, Launcher};
use crate::selector::Handshake;

#[derive(Debug)]
pub struct ShellLauncher {
    config: ShellConfig,
    state: LaunchState,
}

impl ShellLauncher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: ShellConfig::default(),
            state: LaunchState::new(name),
        }
    }

    /// A launcher preloaded with the `[shell]` defaults and poll window from
    /// `settings`.
    pub fn from_settings(name: impl Into<String>, settings: &Settings) -> Self {
        let mut launcher = Self::new(name).with_poll_timeout(settings.timing.poll_timeout);
        launcher.config.apply(settings.shell.clone());
        launcher
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.state.set_poll_timeout(timeout);
        self
    }

    pub fn poll_timeout(&self) -> Duration {
        self.state.poll_timeout()
    }

    pub fn record(&self) -> &ShellConfig {
        &self.config
    }

    /// Exit status of the current child if it has already terminated.
    pub fn exit_status(&mut self) -> Result<Option<ExitStatus>> {
        self.state.exit_status()
    }

    /// Read background output until a line matches `pattern`, bounded by
    /// `timeout`. A match is cached as the response.
    pub async fn wait_for(&mut self, pattern: &Regex, timeout: Duration) -> Result<Handshake> {
        self.state.wait_for(pattern, timeout).await
    }
}

impl Launcher for ShellLauncher {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn config(&mut self, options: LaunchOptions) -> LaunchOptions {
        self.config.apply(options);
        self.config.to_options()
    }

    fn command(&self) -> Result<String> {
        let c = &self.config;
        validate_rhost(&c.rhost)?;
        if c.command.is_empty() {
            Ok(format!("{} {} {}", c.launcher, c.options, c.rhost))
        } else {
            Ok(format!(
                "{} {} {} \"{}\"",
                c.launcher, c.options, c.rhost, c.command
            ))
        }
    }

    fn launch(&mut self) -> Result<()> {
        let command = self.command()?;
        self.state
            .start(&command, self.config.background, &self.config.stdin)
    }

    fn response(&mut self) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + '_>> {
        Box::pin(self.state.response())
    }

    fn pid(&self) -> u32 {
        self.state.pid()
    }

    fn kill(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        Box::pin(self.state.kill())
    }
}
