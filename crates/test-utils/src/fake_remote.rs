use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use crate::builders::SettingsBuilder;

/// What the fake `ssh` does once invoked.
#[derive(Debug, Clone)]
pub enum RemoteBehaviour {
    /// Run the trailing argument (the "remote" command) with the local `sh`.
    Execute,
    /// Drain stdin and print exactly this text.
    Reply(String),
    /// Never produce output; sleep until killed.
    Hang,
    /// Print a message to stderr and exit with status 255, like `ssh` does
    /// when it cannot connect.
    Fail(String),
}

/// A stand-in for the `ssh` executable.
///
/// The script lives in a temp directory, logs every invocation's argument
/// list to `calls.log` and then behaves according to [`RemoteBehaviour`].
/// It is run as `sh <script>`, so no exec bit is needed.
pub struct FakeRemote {
    dir: TempDir,
    script: PathBuf,
    log: PathBuf,
}

impl FakeRemote {
    pub fn new(behaviour: RemoteBehaviour) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir for fake remote");
        let script = dir.path().join("fake-ssh");
        let log = dir.path().join("calls.log");

        let body = match behaviour {
            RemoteBehaviour::Execute => "exec /bin/sh -c \"$last\"".to_string(),
            RemoteBehaviour::Reply(text) => {
                format!("cat > /dev/null\nprintf '%s' '{}'", shell_quote(&text))
            }
            RemoteBehaviour::Hang => "exec sleep 60".to_string(),
            RemoteBehaviour::Fail(msg) => {
                format!("printf '%s\\n' '{}' >&2\nexit 255", shell_quote(&msg))
            }
        };

        let contents = format!(
            "#!/bin/sh\n\
             # usage: fake-ssh [options] host [command]\n\
             last=\"\"\n\
             for arg in \"$@\"; do last=\"$arg\"; done\n\
             printf '%s\\n' \"$*\" >> '{}'\n\
             {}\n",
            log.display(),
            body
        );
        fs::write(&script, contents).expect("write fake ssh script");

        Self { dir, script, log }
    }

    pub fn executing() -> Self {
        Self::new(RemoteBehaviour::Execute)
    }

    pub fn replying(text: &str) -> Self {
        Self::new(RemoteBehaviour::Reply(text.to_string()))
    }

    pub fn hanging() -> Self {
        Self::new(RemoteBehaviour::Hang)
    }

    pub fn failing(msg: &str) -> Self {
        Self::new(RemoteBehaviour::Fail(msg.to_string()))
    }

    /// Value for the shell launcher's `launcher` option.
    pub fn launcher(&self) -> String {
        format!("sh {}", self.script.display())
    }

    /// Settings whose `[shell]` launcher is this fake, with no extra options.
    pub fn settings(&self) -> SettingsBuilder {
        SettingsBuilder::new()
            .shell_launcher(&self.launcher())
            .shell_options("")
    }

    /// Argument lists of every invocation so far, one per line.
    pub fn calls(&self) -> Vec<String> {
        fs::read_to_string(&self.log)
            .map(|s| s.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Scratch directory owned by this fake; removed on drop.
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    /// Play the local end of the next `-L <lport>:host:port` forward.
    ///
    /// Waits for a new invocation carrying `-L`, then listens on
    /// `127.0.0.1:<lport>` and accepts connections until the returned guard
    /// is dropped. Pair it with [`FakeRemote::hanging`] so the "ssh" stays
    /// alive while the port is served.
    pub fn spawn_forward_listener(&self) -> ForwardListener {
        let log = self.log.clone();
        let seen = self.calls().len();
        ForwardListener {
            task: tokio::spawn(serve_forward(log, seen)),
        }
    }
}

/// Guard for [`FakeRemote::spawn_forward_listener`]; stops listening on drop.
pub struct ForwardListener {
    task: JoinHandle<anyhow::Result<()>>,
}

impl Drop for ForwardListener {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve_forward(log: PathBuf, seen: usize) -> anyhow::Result<()> {
    let port = wait_for_forward(&log, seen).await?;
    let listener = TcpListener::bind(("127.0.0.1", port))
        .await
        .with_context(|| format!("binding forwarded port {port}"))?;
    loop {
        let (stream, _) = listener.accept().await?;
        drop(stream);
    }
}

async fn wait_for_forward(log: &Path, seen: usize) -> anyhow::Result<u16> {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let calls = fs::read_to_string(log).unwrap_or_default();
        if let Some(line) = calls.lines().nth(seen) {
            return forwarded_port(line)
                .with_context(|| format!("no -L forward in fake ssh call: {line}"));
        }
        if Instant::now() >= deadline {
            bail!("fake ssh was not invoked with a forward");
        }
        sleep(Duration::from_millis(20)).await;
    }
}

fn forwarded_port(call: &str) -> Option<u16> {
    let mut args = call.split_whitespace();
    args.find(|a| *a == "-L")?;
    args.next()?.split(':').next()?.parse().ok()
}

fn shell_quote(text: &str) -> String {
    text.replace('\'', "'\\''")
}
