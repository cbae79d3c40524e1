// src/launcher/copy.rs

//! Copy launcher (`scp` by default, anything with `cp` semantics works).
//!
//! ```no_run
//! # async fn demo() -> rlaunch::errors::Result<()> {
//! use rlaunch::config::LaunchOptions;
//! use rlaunch::launcher::{CopyLauncher, Launcher};
//!
//! let mut copier = CopyLauncher::new("copier");
//! copier.config(LaunchOptions::new().source("~/foo.txt").destination("remote.host.edu:~"));
//! copier.launch()?;
//!
//! copier.config(LaunchOptions::new().source("remote.host.edu:~/foo.txt").destination("."));
//! copier.launch()?;
//! println!("{:?}", copier.response().await?);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use crate::config::{validate_endpoint, CopyConfig, LaunchOptions, Settings};
use crate::errors::Result;
use crate::launcher::{LaunchState, Launcher};

#[derive(Debug)]
pub struct CopyLauncher {
    config: CopyConfig,
    state: LaunchState,
}

impl CopyLauncher {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: CopyConfig::default(),
            state: LaunchState::new(name),
        }
    }

    /// A launcher preloaded with the `[copy]` defaults and poll window from
    /// `settings`.
    pub fn from_settings(name: impl Into<String>, settings: &Settings) -> Self {
        let mut launcher = Self::new(name).with_poll_timeout(settings.timing.poll_timeout);
        launcher.config.apply(settings.copy.clone());
        launcher
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.state.set_poll_timeout(timeout);
        self
    }

    pub fn poll_timeout(&self) -> Duration {
        self.state.poll_timeout()
    }

    /// The typed record.
    pub fn record(&self) -> &CopyConfig {
        &self.config
    }
}

impl Launcher for CopyLauncher {
    fn name(&self) -> &str {
        self.state.name()
    }

    fn config(&mut self, options: LaunchOptions) -> LaunchOptions {
        self.config.apply(options);
        self.config.to_options()
    }

    fn command(&self) -> Result<String> {
        let c = &self.config;
        validate_endpoint("source", &c.source)?;
        validate_endpoint("destination", &c.destination)?;
        Ok(format!(
            "{} {} {} {}",
            c.launcher, c.options, c.source, c.destination
        ))
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
