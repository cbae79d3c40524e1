// src/tunnel.rs

//! Local-to-remote port forwarding through a background shell launcher.
//!
//! `connect()` only returns once the forward is usable: the local end must
//! accept a TCP connection before `tunnel_timeout` elapses, and the
//! forwarding process must still be alive. Otherwise the process is reaped
//! and a `TunnelFailure` is returned.

use std::net::{Ipv4Addr, TcpListener};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::config::{LaunchOptions, Settings};
use crate::errors::{LaunchError, Result};
use crate::launcher::{Launcher, ShellLauncher};

const READY_PROBE_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug)]
pub struct Tunnel {
    rhost: String,
    rport: u16,
    lport: u16,
    timeout: Duration,
    /// `[shell]` options from construction; the forward flags are rebuilt
    /// on top of these for every connect.
    base_options: String,
    launcher: ShellLauncher,
}

impl Tunnel {
    pub fn new(name: impl Into<String>, settings: &Settings) -> Self {
        let launcher = ShellLauncher::from_settings(name, settings);
        Self {
            rhost: String::new(),
            rport: 0,
            lport: 0,
            timeout: settings.timing.tunnel_timeout,
            base_options: launcher.record().options.clone(),
            launcher,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Forward a freshly allocated local port to `rport` on `rhost`.
    ///
    /// Returns the local port. Readiness is checked by connecting to the
    /// local end, so the remote service sees one empty connection per
    /// successful `connect`.
    pub async fn connect(&mut self, rhost: &str, rport: u16) -> Result<u16> {
        if self.launcher.pid() > 0 {
            return Err(LaunchError::TunnelFailure(format!(
                "tunnel '{}' is already connected to {}:{}",
                self.launcher.name(),
                self.rhost,
                self.rport
            )));
        }

        let lport = pick_local_port()?;
        let options = format!("{} -N -L {lport}:localhost:{rport}", self.base_options);

        self.launcher.config(
            LaunchOptions::new()
                .options(options.trim())
                .command("")
                .rhost(rhost)
                .background(true),
        );
        info!(launcher = %self.launcher.name(), rhost, rport, lport, "opening tunnel");
        self.launcher.launch()?;

        self.rhost = rhost.to_string();
        self.rport = rport;
        self.lport = lport;

        if let Err(e) = self.wait_until_ready().await {
            self.lport = 0;
            return Err(e);
        }

        info!(rhost, rport, lport, pid = self.launcher.pid(), "tunnel established");
        Ok(lport)
    }

    async fn wait_until_ready(&mut self) -> Result<()> {
        let deadline = Instant::now() + self.timeout;
        loop {
            if let Some(status) = self.launcher.exit_status()? {
                let output = self.launcher.response().await?.unwrap_or_default();
                self.launcher.kill().await?;
                return Err(LaunchError::TunnelFailure(format!(
                    "forwarding process to {}:{} exited ({status}) before the tunnel was ready: {}",
                    self.rhost,
                    self.rport,
                    output.trim()
                )));
            }

            if probe_local_port(self.lport).await {
                return Ok(());
            }

            if Instant::now() >= deadline {
                warn!(
                    rhost = %self.rhost,
                    rport = self.rport,
                    lport = self.lport,
                    "tunnel not ready before deadline; killing forwarding process"
                );
                self.launcher.kill().await?;
                return Err(LaunchError::TunnelFailure(format!(
                    "tunnel to {}:{} not ready within {:?}",
                    self.rhost, self.rport, self.timeout
                )));
            }

            sleep(READY_PROBE_INTERVAL).await;
        }
    }

    /// Tear the forward down.
    pub async fn disconnect(&mut self) -> Result<()> {
        info!(rhost = %self.rhost, rport = self.rport, lport = self.lport, "closing tunnel");
        self.launcher.kill().await?;
        self.lport = 0;
        Ok(())
    }

    pub fn rhost(&self) -> &str {
        &self.rhost
    }

    pub fn rport(&self) -> u16 {
        self.rport
    }

    /// Local end of the forward, 0 while disconnected.
    pub fn lport(&self) -> u16 {
        self.lport
    }

    /// Pid of the forwarding process, 0 while disconnected.
    pub fn pid(&self) -> u32 {
        self.launcher.pid()
    }

    pub fn launcher(&self) -> &ShellLauncher {
        &self.launcher
    }
}

/// Ask the OS for a free ephemeral port on the loopback interface.
///
/// The listener is closed again before returning, so the port is only
/// likely, not guaranteed, to still be free when the forward binds it.
pub fn pick_local_port() -> Result<u16> {
    let listener = TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .map_err(|e| LaunchError::TunnelFailure(format!("failure to pick local port: {e}")))?;
    let port = listener.local_addr()?.port();
    debug!(port, "picked local port");
    Ok(port)
}

/// True once something accepts connections on `127.0.0.1:port`.
///
/// Through a live forward the connection reaches the remote service and is
/// closed straight away.
pub async fn probe_local_port(port: u16) -> bool {
    TcpStream::connect((Ipv4Addr::LOCALHOST, port)).await.is_ok()
}
