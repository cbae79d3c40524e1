// src/config/mod.rs

//! Configuration for rlaunch.
//!
//! Responsibilities:
//! - Per-launch records and partial updates (`options.rs`).
//! - The TOML-backed settings model (`model.rs`).
//! - Load a settings file from disk (`loader.rs`).
//! - Validate settings and copy endpoints (`validate.rs`).

pub mod loader;
pub mod model;
pub mod options;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{parse_duration, RawSettings, RemoteSettings, Settings, Timing};
pub use options::{CopyConfig, LaunchOptions, ShellConfig};
pub use validate::{validate_endpoint, validate_rhost, validate_settings};
