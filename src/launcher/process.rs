// src/launcher/process.rs

//! Supervised child process.
//!
//! [`Supervised`] owns the child, its process id and its output pipe
//! together, so a kill can never leave a stale pid next to a closed pipe.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;

use anyhow::Context;
use regex::Regex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::errors::{LaunchError, Result};
use crate::selector::{Handshake, Readiness, Selector};
use crate::types::Input;

#[derive(Debug)]
pub(crate) struct Supervised {
    name: String,
    child: Child,
    output: Option<ChildStdout>,
    /// 0 for foreground children.
    pid: u32,
}

/// Spawn `command` through the platform shell.
///
/// Background children get their stderr folded into stdout and their own
/// process group. Foreground children keep the parent's stderr. Neither is
/// killed when the handle is dropped: a dropped or relaunched launcher
/// leaves its previous child to finish on its own.
pub(crate) fn spawn(name: &str, command: &str, background: bool, input: &Input) -> Result<Supervised> {
    let script = if background {
        merge_stderr(command)
    } else {
        command.to_string()
    };

    let mut cmd = if cfg!(windows) {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(&script);
        c
    } else {
        let mut c = Command::new("sh");
        c.arg("-c").arg(&script);
        c
    };

    cmd.stdin(input.stdio()?)
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(false);

    #[cfg(unix)]
    if background {
        cmd.process_group(0);
    }

    let mut child = cmd.spawn().map_err(|e| {
        LaunchError::ProcessFailure(format!("spawning process for launcher '{name}': {e}"))
    })?;

    if let Input::Bytes(data) = input {
        if let Some(mut stdin) = child.stdin.take() {
            let data = Arc::clone(data);
            let name = name.to_string();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&data).await {
                    debug!(launcher = %name, error = %e, "child closed stdin early");
                }
                // Dropping `stdin` closes the pipe so the child sees EOF.
            });
        }
    }

    let pid = if background {
        child.id().unwrap_or(0)
    } else {
        0
    };
    let output = child.stdout.take();

    info!(launcher = %name, pid, background, cmd = %command, "spawned launcher process");

    Ok(Supervised {
        name: name.to_string(),
        child,
        output,
        pid,
    })
}

fn merge_stderr(command: &str) -> String {
    if cfg!(windows) {
        format!("{command} 2>&1")
    } else {
        format!("exec 2>&1; {command}")
    }
}

impl Supervised {
    pub(crate) fn pid(&self) -> u32 {
        self.pid
    }

    pub(crate) fn is_background(&self) -> bool {
        self.pid > 0
    }

    /// Read the output to EOF, then reap the child.
    pub(crate) async fn read_to_end(&mut self) -> Result<Vec<u8>> {
        let mut data = Vec::new();
        if let Some(mut out) = self.output.take() {
            out.read_to_end(&mut data)
                .await
                .with_context(|| format!("reading output of launcher '{}'", self.name))?;
        }

        let status = self
            .child
            .wait()
            .await
            .with_context(|| format!("waiting for process of launcher '{}'", self.name))?;

        info!(
            launcher = %self.name,
            exit_code = status.code().unwrap_or(-1),
            success = status.success(),
            bytes = data.len(),
            "launcher process exited"
        );
        Ok(data)
    }

    /// One bounded poll of the output pipe.
    pub(crate) async fn poll(&mut self, selector: &Selector) -> Result<Readiness> {
        let Some(out) = self.output.as_mut() else {
            return Ok(Readiness::Ready(Vec::new()));
        };
        let readiness = selector.watch(out).await?;
        debug!(
            launcher = %self.name,
            pid = self.pid,
            idle = readiness.is_idle(),
            "polled background output"
        );
        Ok(readiness)
    }

    pub(crate) async fn wait_for(&mut self, selector: &Selector, pattern: &Regex) -> Result<Handshake> {
        let Some(out) = self.output.as_mut() else {
            return Ok(Handshake::Closed(String::new()));
        };
        Ok(selector.watch_for(out, pattern).await?)
    }

    /// Exit status if the child has already terminated.
    pub(crate) fn try_exited(&mut self) -> Result<Option<ExitStatus>> {
        Ok(self.child.try_wait()?)
    }

    /// Send SIGTERM to the child's process group and reap it.
    pub(crate) async fn terminate(mut self) -> Result<()> {
        info!(launcher = %self.name, pid = self.pid, "terminating launcher process");
        self.output = None;
        // A reaped pid may already belong to someone else.
        if self.child.try_wait()?.is_none() {
            self.signal_term()?;
        }

        let status = self
            .child
            .wait()
            .await
            .with_context(|| format!("reaping process of launcher '{}'", self.name))?;
        debug!(launcher = %self.name, pid = self.pid, ?status, "launcher process reaped");
        Ok(())
    }

    #[cfg(unix)]
    fn signal_term(&mut self) -> Result<()> {
        use nix::errno::Errno;
        use nix::sys::signal::{killpg, Signal};
        use nix::unistd::Pid;

        let pid = i32::try_from(self.pid).map_err(|_| {
            LaunchError::ProcessFailure(format!("pid {} out of range", self.pid))
        })?;
        match killpg(Pid::from_raw(pid), Signal::SIGTERM) {
            Ok(()) => Ok(()),
            // Already gone; the wait below just collects the status.
            Err(Errno::ESRCH) => {
                debug!(launcher = %self.name, pid, "process group already exited");
                Ok(())
            }
            Err(e) => Err(LaunchError::ProcessFailure(format!(
                "failed to signal pid {pid}: {e}"
            ))),
        }
    }

    #[cfg(not(unix))]
    fn signal_term(&mut self) -> Result<()> {
        if let Err(e) = self.child.start_kill() {
            warn!(launcher = %self.name, error = %e, "failed to kill child process");
            return Err(LaunchError::ProcessFailure(format!(
                "failed to kill pid {}: {e}",
                self.pid
            )));
        }
        Ok(())
    }
}

impl Drop for Supervised {
    fn drop(&mut self) {
        if self.is_background() && matches!(self.child.try_wait(), Ok(None)) {
            warn!(
                launcher = %self.name,
                pid = self.pid,
                "dropping handle of a running background process; it keeps running"
            );
        }
    }
}
