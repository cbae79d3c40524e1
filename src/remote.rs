// src/remote.rs

//! Orchestration helpers composed from launchers and tunnels.
//!
//! Each helper builds its own launcher from the shared [`Settings`], so the
//! `[copy]` / `[shell]` defaults and the `[timing]` windows apply
//! everywhere. Steps run strictly in sequence; a step's output is checked
//! before the next one starts.

use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::config::{LaunchOptions, Settings};
use crate::errors::{LaunchError, Result};
use crate::launcher::{CopyLauncher, Launcher, ShellLauncher};
use crate::selector::Handshake;
use crate::tunnel::Tunnel;
use crate::types::Input;

/// Script fed to the remote interpreter by [`Remote::pickport`]: bind an
/// ephemeral port, print it, release it.
pub const PORTPICKER_SCRIPT: &str = "\
import socket
s = socket.socket(socket.AF_INET, socket.SOCK_STREAM)
s.bind(('', 0))
print(s.getsockname()[1])
s.close()
";

/// Entry point for the orchestration helpers.
#[derive(Debug, Clone, Default)]
pub struct Remote {
    settings: Settings,
}

impl Remote {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn copy_launcher(&self, name: impl Into<String>) -> CopyLauncher {
        CopyLauncher::from_settings(name, &self.settings)
    }

    pub fn shell_launcher(&self, name: impl Into<String>) -> ShellLauncher {
        ShellLauncher::from_settings(name, &self.settings)
    }

    /// Copy `file` to `dest` on `rhost`.
    ///
    /// The copy runs in the foreground; the launcher is handed back so the
    /// caller can wait on its `response()`.
    pub fn copy(&self, file: &str, rhost: &str, dest: &str) -> Result<CopyLauncher> {
        let mut copier = self.copy_launcher(format!("copy_{file}"));
        let destination = format!("{rhost}:{dest}");
        info!("executing {{scp {} {}}}", file, destination);
        copier.config(
            LaunchOptions::new()
                .source(file)
                .destination(destination)
                .background(false),
        );
        copier.launch()?;
        Ok(copier)
    }

    /// Execute `command` on `rhost` and return its response.
    ///
    /// For `background = true` the response is whatever arrived within the
    /// poll window (possibly `None`), and the remote process keeps running.
    pub async fn run(&self, command: &str, rhost: &str, background: bool) -> Result<Option<String>> {
        let mut launcher = self.shell_launcher(command);
        info!("executing {{ssh {} \"{}\"}}", rhost, command);
        launcher.config(
            LaunchOptions::new()
                .command(command)
                .rhost(rhost)
                .background(background),
        );
        launcher.launch()?;
        launcher.response().await
    }

    /// Send SIGTERM to `pid` on `rhost`.
    ///
    /// The remote exit status is not observed.
    pub async fn kill(&self, pid: u32, rhost: &str) -> Result<Option<String>> {
        self.run(&kill_command(pid), rhost, false).await
    }

    /// Best-effort pid lookup of a process named `target` on `rhost`.
    ///
    /// Only meant as a last resort when a spawned pid was never recorded;
    /// with several matches the first line wins.
    pub async fn getpid(&self, target: &str, rhost: &str) -> Result<Option<String>> {
        let command = getpid_command(target);
        let response = self.run(&command, rhost, false).await?;
        Ok(response.as_deref().and_then(parse_pid))
    }

    /// Select an open port on `rhost`.
    pub async fn pickport(&self, rhost: &str) -> Result<u16> {
        let python = &self.settings.remote.python;
        let mut launcher = self.shell_launcher("pickport");
        launcher.config(
            LaunchOptions::new()
                .command(python.as_str())
                .rhost(rhost)
                .background(false)
                .stdin(Input::bytes(PORTPICKER_SCRIPT)),
        );
        info!("executing {{{} <portpicker}} on {}", python, rhost);
        launcher.launch()?;
        let response = launcher.response().await?;
        parse_port(response.as_deref())
    }

    /// Open a tunnel from a local port to `rport` on `rhost`.
    pub async fn connect(&self, rhost: &str, rport: u16) -> Result<(Tunnel, u16)> {
        let mut tunnel = Tunnel::new("Tunnel", &self.settings);
        let lport = tunnel.connect(rhost, rport).await?;
        Ok((tunnel, lport))
    }

    /// Start `<server_dir>/<server>.py -p <rport>` on `rhost`.
    ///
    /// With `[remote].ready_pattern` set, waits (up to `tunnel_timeout`) for
    /// the server to print a matching line. Otherwise polls once and then
    /// sleeps for `settle_delay`. An unexpected, non-empty response is logged
    /// and returned but not treated as failure; a server that has already
    /// exited is.
    pub async fn serve(
        &self,
        server: &str,
        rhost: &str,
        rport: u16,
        profile: Option<&str>,
    ) -> Result<Server> {
        let profile = profile.unwrap_or(&self.settings.remote.profile);
        let command = serve_command(&self.settings.remote.server_dir, server, rport, profile);

        let mut launcher = self.shell_launcher(command.as_str());
        info!("executing {{ssh {} \"{}\"}}", rhost, command);
        launcher.config(
            LaunchOptions::new()
                .command(command.as_str())
                .rhost(rhost)
                .background(true),
        );
        launcher.launch()?;

        let response = match self.settings.remote.ready_pattern.clone() {
            Some(pattern) => {
                let timeout = self.settings.timing.tunnel_timeout;
                match launcher.wait_for(&pattern, timeout).await? {
                    Handshake::Matched(out) => Some(out),
                    Handshake::Closed(out) => {
                        launcher.kill().await?;
                        return Err(LaunchError::ProcessFailure(format!(
                            "server '{server}' on {rhost} exited before signalling readiness: {}",
                            out.trim()
                        )));
                    }
                    Handshake::Expired(out) => {
                        launcher.kill().await?;
                        return Err(LaunchError::ProcessFailure(format!(
                            "server '{server}' on {rhost} not ready within {timeout:?}: {}",
                            out.trim()
                        )));
                    }
                }
            }
            None => {
                let response = launcher.response().await?;
                info!(response = ?response, "server response");
                match response.as_deref() {
                    None | Some("") => {}
                    Some(other) => error!(response = %other, "invalid response from server"),
                }
                self.settle(self.settings.timing.settle_delay).await;
                response
            }
        };

        if let Some(status) = launcher.exit_status()? {
            launcher.kill().await?;
            return Err(LaunchError::ProcessFailure(format!(
                "server '{server}' on {rhost} exited ({status})"
            )));
        }

        Ok(Server {
            name: server.to_string(),
            rhost: rhost.to_string(),
            rport,
            response,
            launcher,
        })
    }

    async fn settle(&self, delay: Duration) {
        if !delay.is_zero() {
            sleep(delay).await;
        }
    }
}

/// A server started by [`Remote::serve`].
///
/// Dropping it leaves the remote server running; call [`Server::kill`] to
/// stop the local `ssh` process that carries it.
#[derive(Debug)]
pub struct Server {
    pub name: String,
    pub rhost: String,
    pub rport: u16,
    /// Output seen while starting, `None` if it stayed silent.
    pub response: Option<String>,
    launcher: ShellLauncher,
}

impl Server {
    pub fn pid(&self) -> u32 {
        self.launcher.pid()
    }

    pub fn launcher_mut(&mut self) -> &mut ShellLauncher {
        &mut self.launcher
    }

    pub async fn kill(&mut self) -> Result<()> {
        if self.launcher.pid() == 0 {
            warn!(server = %self.name, "server has no live process to kill");
        }
        self.launcher.kill().await
    }
}

pub fn kill_command(pid: u32) -> String {
    format!("kill -n TERM {pid}")
}

pub fn getpid_command(target: &str) -> String {
    format!("ps ax | grep '{target}'")
}

pub fn serve_command(server_dir: &str, server: &str, rport: u16, profile: &str) -> String {
    let dir = server_dir.trim_end_matches('/');
    format!("source {profile}; {dir}/{server}.py -p {rport}")
}

/// First non-empty token of the first line.
///
/// `ps` right-aligns pids, so the line may start with padding.
pub fn parse_pid(response: &str) -> Option<String> {
    let first_line = response.lines().next()?;
    first_line.split_whitespace().next().map(str::to_string)
}

/// Parse a picked port; anything but a non-zero integer is a tunnel failure.
pub fn parse_port(response: Option<&str>) -> Result<u16> {
    let failure = || LaunchError::TunnelFailure("failure to pick remote port".to_string());
    let text = response.ok_or_else(failure)?;
    match text.trim().parse::<u16>() {
        Ok(0) | Err(_) => Err(failure()),
        Ok(port) => Ok(port),
    }
}
