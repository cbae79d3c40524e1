// src/launcher/mod.rs

//! Launchers: build one external command, spawn it, collect its output.
//!
//! - [`copy`] builds `scp`/`cp` style invocations.
//! - [`shell`] builds `ssh` style remote-command invocations.
//! - [`process`] owns the spawned child and its output pipe.
//!
//! Both variants implement the [`Launcher`] trait and share the
//! pid/response bookkeeping in [`LaunchState`].

pub mod copy;
pub(crate) mod process;
pub mod shell;

use std::future::Future;
use std::pin::Pin;
use std::process::ExitStatus;
use std::time::Duration;

use regex::Regex;
use tracing::{debug, warn};

use crate::config::LaunchOptions;
use crate::errors::{LaunchError, Result};
use crate::selector::{lossy, Handshake, Readiness, Selector, DEFAULT_POLL_TIMEOUT};
use crate::types::Input;

pub use copy::CopyLauncher;
pub use shell::ShellLauncher;

use process::Supervised;

/// Common interface of the copy and shell launchers.
///
/// A launcher is configured (possibly repeatedly), then launched; every
/// `launch()` spawns a fresh child and forgets the previous response.
pub trait Launcher: Send {
    /// Identifier given at construction, used in logs.
    fn name(&self) -> &str;

    /// Merge `options` into the record and return the resulting record,
    /// restricted to the keys this launcher recognises.
    fn config(&mut self, options: LaunchOptions) -> LaunchOptions;

    /// Older name for [`Launcher::config`].
    fn stage(&mut self, options: LaunchOptions) -> LaunchOptions {
        self.config(options)
    }

    /// The exact command line the next `launch()` runs.
    fn command(&self) -> Result<String>;

    /// Spawn the configured command.
    fn launch(&mut self) -> Result<()>;

    /// Output of the last launch; `None` while a background process has
    /// produced nothing within the poll window.
    fn response(&mut self) -> Pin<Box<dyn Future<Output = Result<Option<String>>> + Send + '_>>;

    /// Pid of the live background child, 0 otherwise.
    fn pid(&self) -> u32;

    /// Terminate and reap the background child, if any.
    fn kill(&mut self) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Pid, cached response and child handle shared by both launcher variants.
#[derive(Debug)]
pub(crate) struct LaunchState {
    name: String,
    process: Option<Supervised>,
    response: Option<String>,
    launched: bool,
    selector: Selector,
}

impl LaunchState {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            process: None,
            response: None,
            launched: false,
            selector: Selector::new(DEFAULT_POLL_TIMEOUT),
        }
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn set_poll_timeout(&mut self, timeout: Duration) {
        self.selector = Selector::new(timeout);
    }

    pub(crate) fn poll_timeout(&self) -> Duration {
        self.selector.timeout()
    }

    pub(crate) fn start(&mut self, command: &str, background: bool, input: &Input) -> Result<()> {
        self.response = None;
        if let Some(prev) = self.process.take() {
            if prev.is_background() {
                warn!(
                    launcher = %self.name,
                    pid = prev.pid(),
                    "relaunching without kill(); previous background process is left running"
                );
            }
        }
        self.process = Some(process::spawn(&self.name, command, background, input)?);
        self.launched = true;
        Ok(())
    }

    pub(crate) async fn response(&mut self) -> Result<Option<String>> {
        if let Some(cached) = &self.response {
            return Ok(Some(cached.clone()));
        }
        if !self.launched {
            return Err(LaunchError::NotLaunched(self.name.clone()));
        }
        let Some(process) = self.process.as_mut() else {
            return Ok(None);
        };

        if !process.is_background() {
            let data = process.read_to_end().await?;
            // Reaped; the handle has nothing left to offer.
            self.process = None;
            let text = lossy(&data);
            self.response = Some(text.clone());
            return Ok(Some(text));
        }

        match process.poll(&self.selector).await? {
            Readiness::Ready(data) => {
                let text = lossy(&data);
                self.response = Some(text.clone());
                Ok(Some(text))
            }
            Readiness::Idle => {
                debug!(launcher = %self.name, "no response from background process yet");
                Ok(None)
            }
        }
    }

    /// Read background output until `pattern` shows up or `timeout` passes.
    pub(crate) async fn wait_for(&mut self, pattern: &Regex, timeout: Duration) -> Result<Handshake> {
        if !self.launched {
            return Err(LaunchError::NotLaunched(self.name.clone()));
        }
        let Some(process) = self.process.as_mut() else {
            return Ok(Handshake::Closed(String::new()));
        };
        let handshake = process.wait_for(&Selector::new(timeout), pattern).await?;
        if let Handshake::Matched(text) = &handshake {
            self.response = Some(text.clone());
        }
        Ok(handshake)
    }

    pub(crate) fn exit_status(&mut self) -> Result<Option<ExitStatus>> {
        match self.process.as_mut() {
            Some(p) => p.try_exited(),
            None => Ok(None),
        }
    }

    pub(crate) fn pid(&self) -> u32 {
        self.process.as_ref().map(Supervised::pid).unwrap_or(0)
    }

    pub(crate) async fn kill(&mut self) -> Result<()> {
        match self.process.take() {
            Some(p) if p.is_background() => p.terminate().await,
            other => {
                self.process = other;
                Ok(())
            }
        }
    }
}
