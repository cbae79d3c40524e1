// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::{RawSettings, Settings};
use crate::errors::Result;

/// Load a settings file from a given path and return the raw `RawSettings`.
///
/// This only performs TOML deserialization. Use [`load_and_validate`] to get
/// resolved `Settings`.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let raw: RawSettings = toml::from_str(&contents)?;

    Ok(raw)
}

/// Load a settings file from path, apply defaults and validate.
///
/// - Reads TOML.
/// - Merges `[copy]` / `[shell]` over the built-in `scp -q` / `ssh -q`.
/// - Parses `[timing]` durations and compiles `[remote].ready_pattern`.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<Settings> {
    let raw = load_from_path(&path)?;
    let settings = Settings::try_from(raw)?;
    Ok(settings)
}

/// Settings for an optional `--config` path: the file if given, otherwise
/// [`default_config_path`] if it exists, otherwise the built-in defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<Settings> {
    match path {
        Some(p) => load_and_validate(p),
        None => {
            let fallback = default_config_path();
            if fallback.is_file() {
                debug!(path = %fallback.display(), "using settings file from working directory");
                load_and_validate(fallback)
            } else {
                Ok(Settings::default())
            }
        }
    }
}

/// Conventional settings file name in the working directory.
pub fn default_config_path() -> PathBuf {
    PathBuf::from("Rlaunch.toml")
}
