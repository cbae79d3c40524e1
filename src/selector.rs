// src/selector.rs

//! Bounded-time readiness polling for a child's output stream.
//!
//! A [`Selector`] is built per collection attempt and watches exactly one
//! handle. Each watch has exactly one outcome:
//!
//! - [`Readiness::Ready`]: data (or end-of-stream) arrived before the
//!   deadline. Once the first bytes arrive the selector keeps draining until
//!   the stream closes or the same deadline expires, so a short burst of
//!   output is returned in one piece.
//! - [`Readiness::Idle`]: the deadline elapsed and nothing was readable.
//!
//! Reads go through `tokio::time::timeout_at`, which drops the pending read
//! on expiry; `AsyncReadExt::read` is cancel-safe so no bytes are lost
//! between watches.

use std::io;
use std::time::Duration;

use regex::Regex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::{timeout_at, Instant};
use tracing::trace;

/// Poll window used when a launcher is not given an explicit one.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(2);

const CHUNK: usize = 4096;

/// Outcome of [`Selector::watch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Readiness {
    /// Bytes read before the deadline. Empty means the stream was already
    /// closed.
    Ready(Vec<u8>),
    /// Nothing became readable within the window.
    Idle,
}

impl Readiness {
    pub fn is_idle(&self) -> bool {
        matches!(self, Readiness::Idle)
    }
}

/// Outcome of [`Selector::watch_for`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Handshake {
    /// The pattern matched; carries everything read so far.
    Matched(String),
    /// The stream closed before the pattern appeared.
    Closed(String),
    /// The deadline passed before the pattern appeared.
    Expired(String),
}

#[derive(Debug, Clone, Copy)]
pub struct Selector {
    timeout: Duration,
}

impl Default for Selector {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_TIMEOUT)
    }
}

impl Selector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait at most `timeout` for `handle` to become readable.
    pub async fn watch<R>(&self, handle: &mut R) -> io::Result<Readiness>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; CHUNK];

        let first = match timeout_at(deadline, handle.read(&mut buf)).await {
            Ok(res) => res?,
            Err(_) => {
                trace!(timeout = ?self.timeout, "watch elapsed with no data");
                return Ok(Readiness::Idle);
            }
        };

        let mut data = buf[..first].to_vec();
        if first == 0 {
            return Ok(Readiness::Ready(data));
        }

        loop {
            match timeout_at(deadline, handle.read(&mut buf)).await {
                Ok(Ok(0)) | Err(_) => break,
                Ok(Ok(n)) => data.extend_from_slice(&buf[..n]),
                Ok(Err(e)) => return Err(e),
            }
        }

        trace!(bytes = data.len(), "watch collected output");
        Ok(Readiness::Ready(data))
    }

    /// Read from `handle` until the accumulated output matches `pattern`,
    /// the stream closes, or `timeout` elapses.
    pub async fn watch_for<R>(&self, handle: &mut R, pattern: &Regex) -> io::Result<Handshake>
    where
        R: AsyncRead + Unpin + ?Sized,
    {
        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; CHUNK];
        let mut data = Vec::new();

        loop {
            match timeout_at(deadline, handle.read(&mut buf)).await {
                Err(_) => return Ok(Handshake::Expired(lossy(&data))),
                Ok(Ok(0)) => return Ok(Handshake::Closed(lossy(&data))),
                Ok(Ok(n)) => {
                    data.extend_from_slice(&buf[..n]);
                    let text = lossy(&data);
                    if text.lines().any(|line| pattern.is_match(line)) {
                        return Ok(Handshake::Matched(text));
                    }
                }
                Ok(Err(e)) => return Err(e),
            }
        }
    }
}

pub(crate) fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}
