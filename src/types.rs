// src/types.rs

use std::fs::File;
use std::process::Stdio;
use std::str::FromStr;
use std::sync::Arc;

/// What a launched process reads on its standard input.
///
/// - `Null`: nothing (`/dev/null`), the default.
/// - `File`: an open file handle; each launch reads through a fresh
///   duplicate of the descriptor, so the file position is shared.
/// - `Bytes`: an in-memory buffer written to a pipe after spawning
///   (used to feed interpreter scripts to a remote shell).
#[derive(Debug, Clone, Default)]
pub enum Input {
    #[default]
    Null,
    File(Arc<File>),
    Bytes(Arc<[u8]>),
}

impl Input {
    pub fn file(file: File) -> Self {
        Input::File(Arc::new(file))
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Input::Bytes(Arc::from(data.into()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Input::Null)
    }

    /// `Stdio` to hand to the child for this input.
    pub(crate) fn stdio(&self) -> std::io::Result<Stdio> {
        match self {
            Input::Null => Ok(Stdio::null()),
            Input::File(f) => Ok(Stdio::from(f.try_clone()?)),
            Input::Bytes(_) => Ok(Stdio::piped()),
        }
    }
}

/// Which launcher variant to build from loose key/value options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherKind {
    Copy,
    Shell,
}

impl FromStr for LauncherKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "copy" | "scp" => Ok(LauncherKind::Copy),
            "shell" | "ssh" => Ok(LauncherKind::Shell),
            other => Err(format!(
                "invalid launcher kind: {other} (expected \"copy\" or \"shell\")"
            )),
        }
    }
}
