// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::LaunchOptions;
use crate::types::LauncherKind;

/// Command-line arguments for `rlaunch`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "rlaunch",
    version,
    about = "Launch scp/ssh processes and collect their responses.",
    long_about = None
)]
pub struct CliArgs {
    /// Settings file (TOML). Falls back to `Rlaunch.toml` in the working
    /// directory, then to built-in defaults.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RLAUNCH_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Copy a local file to DEST on RHOST and wait for the copy to finish.
    Copy {
        file: String,
        rhost: String,
        dest: String,
    },

    /// Execute COMMAND on RHOST and print its response.
    Run {
        rhost: String,
        command: String,
        /// Only wait for the poll window instead of completion.
        #[arg(long)]
        background: bool,
    },

    /// Send SIGTERM to PID on RHOST.
    Kill { rhost: String, pid: u32 },

    /// Look up the pid of TARGET on RHOST.
    Getpid { rhost: String, target: String },

    /// Pick an open port on RHOST.
    Pickport { rhost: String },

    /// Forward a local port to RPORT on RHOST until Ctrl-C.
    Connect { rhost: String, rport: u16 },

    /// Start `<server>.py -p RPORT` on RHOST.
    Serve {
        server: String,
        rhost: String,
        rport: u16,
        /// Remote profile sourced before the server starts.
        #[arg(long)]
        profile: Option<String>,
    },

    /// Drive a single launcher from key=value options.
    Launch {
        #[arg(value_parser = parse_kind)]
        kind: LauncherKind,
        /// Launcher option, e.g. `--set rhost=host --set command=uptime`.
        #[arg(long = "set", value_name = "KEY=VALUE", value_parser = LaunchOptions::parse_pair)]
        set: Vec<(String, String)>,
        /// Kill the background process after reading its response.
        #[arg(long)]
        kill: bool,
    },
}

fn parse_kind(s: &str) -> Result<LauncherKind, String> {
    s.parse()
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
