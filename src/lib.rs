// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod launcher;
pub mod logging;
pub mod remote;
pub mod selector;
pub mod tunnel;
pub mod types;

use anyhow::{bail, Result};
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{load_or_default, LaunchOptions};
use crate::launcher::Launcher;
use crate::remote::Remote;
use crate::types::LauncherKind;

pub use crate::errors::LaunchError;
pub use crate::remote::Server;
pub use crate::tunnel::Tunnel;

/// High-level entry point used by `main.rs`.
///
/// Loads settings, then runs exactly one subcommand. Responses go to stdout.
pub async fn run(args: CliArgs) -> Result<()> {
    let settings = load_or_default(args.config.as_deref())?;
    let remote = Remote::new(settings);

    match args.command {
        Command::Copy { file, rhost, dest } => {
            let mut copier = remote.copy(&file, &rhost, &dest)?;
            print_response(copier.response().await?);
        }
        Command::Run {
            rhost,
            command,
            background,
        } => {
            print_response(remote.run(&command, &rhost, background).await?);
        }
        Command::Kill { rhost, pid } => {
            print_response(remote.kill(pid, &rhost).await?);
        }
        Command::Getpid { rhost, target } => match remote.getpid(&target, &rhost).await? {
            Some(pid) => println!("{pid}"),
            None => bail!("no process matching '{target}' on {rhost}"),
        },
        Command::Pickport { rhost } => {
            println!("{}", remote.pickport(&rhost).await?);
        }
        Command::Connect { rhost, rport } => {
            let (mut tunnel, lport) = remote.connect(&rhost, rport).await?;
            println!("{lport}");
            info!(lport, rhost = %rhost, rport, "tunnel up; press Ctrl-C to close");
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl+C; closing tunnel");
            }
            tunnel.disconnect().await?;
        }
        Command::Serve {
            server,
            rhost,
            rport,
            profile,
        } => {
            let started = remote
                .serve(&server, &rhost, rport, profile.as_deref())
                .await?;
            info!(server = %started.name, pid = started.pid(), "server started");
            print_response(started.response.clone());
        }
        Command::Launch { kind, set, kill } => {
            let options = LaunchOptions::from_pairs(set)?;
            let mut launcher: Box<dyn Launcher> = match kind {
                LauncherKind::Copy => Box::new(remote.copy_launcher("launch")),
                LauncherKind::Shell => Box::new(remote.shell_launcher("launch")),
            };
            launcher.config(options);
            let cmd = launcher.command()?;
            info!(launcher = %launcher.name(), cmd = %cmd, "launching");
            launcher.launch()?;
            print_response(launcher.response().await?);
            if kill {
                launcher.kill().await?;
            }
        }
    }

    Ok(())
}

fn print_response(response: Option<String>) {
    match response {
        Some(text) => print!("{text}"),
        None => warn!("no response within the poll window"),
    }
}
