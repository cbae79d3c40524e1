// src/errors.rs

//! Crate-wide error type and helpers.
//!
//! Background polls that time out are *not* errors: they surface as a
//! `None` response and the caller decides what to do with it.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("Bad endpoint: {0}")]
    BadEndpoint(String),

    #[error("Tunnel failure: {0}")]
    TunnelFailure(String),

    #[error("Process failure: {0}")]
    ProcessFailure(String),

    #[error("Launcher '{0}' has not been launched")]
    NotLaunched(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, LaunchError>;
