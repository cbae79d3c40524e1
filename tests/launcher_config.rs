// tests/launcher_config.rs
mod common;
use crate::common::{init_tracing, TestResult};

use rlaunch::config::LaunchOptions;
use rlaunch::errors::LaunchError;
use rlaunch::launcher::{CopyLauncher, Launcher, ShellLauncher};
use rlaunch::types::Input;

#[test]
fn copy_command_is_launcher_options_source_destination() -> TestResult {
    init_tracing();

    let mut copier = CopyLauncher::new("copier");
    copier.config(
        LaunchOptions::new()
            .source("/tmp/a.txt")
            .destination("host:~")
            .options("-q"),
    );

    assert_eq!(copier.command()?, "scp -q /tmp/a.txt host:~");
    Ok(())
}

#[test]
fn copy_command_keeps_empty_options_slot() -> TestResult {
    let mut copier = CopyLauncher::new("copier");
    copier.config(LaunchOptions::new().source("a.txt").destination("user@box:/srv/"));

    assert_eq!(copier.command()?, "scp  a.txt user@box:/srv/");
    Ok(())
}

#[test]
fn config_returns_merged_record_with_only_copy_keys() {
    let mut copier = CopyLauncher::new("copier");
    let record = copier.config(
        LaunchOptions::new()
            .source("~/foo.txt")
            .destination("remote.host.edu:~")
            .command("uptime")
            .rhost("ignored"),
    );

    assert_eq!(record.source.as_deref(), Some("~/foo.txt"));
    assert_eq!(record.destination.as_deref(), Some("remote.host.edu:~"));
    assert_eq!(record.launcher.as_deref(), Some("scp"));
    assert_eq!(record.options.as_deref(), Some(""));
    assert_eq!(record.background, Some(false));
    assert!(record.stdin.as_ref().is_some_and(Input::is_null), "stdin defaults to null");
    assert!(record.command.is_none(), "command is not a copy key");
    assert!(record.rhost.is_none(), "rhost is not a copy key");
}

#[test]
fn reconfiguring_overwrites_only_supplied_keys() {
    let mut copier = CopyLauncher::new("copier");
    copier.config(
        LaunchOptions::new()
            .source("~/foo.txt")
            .destination("remote.host.edu:~")
            .options("-v"),
    );
    let record = copier.config(
        LaunchOptions::new()
            .source("remote.host.edu:~/foo.txt")
            .destination("."),
    );

    assert_eq!(record.source.as_deref(), Some("remote.host.edu:~/foo.txt"));
    assert_eq!(record.destination.as_deref(), Some("."));
    assert_eq!(record.options.as_deref(), Some("-v"), "options persist");
}

#[test]
fn fgbg_alias_sets_background() {
    let mut shell = ShellLauncher::new("shell");

    let record = shell.config(LaunchOptions::new().fgbg("bg"));
    assert_eq!(record.background, Some(true));

    let record = shell.config(LaunchOptions::new().fgbg("background"));
    assert_eq!(record.background, Some(true));

    let record = shell.config(LaunchOptions::new().fgbg("foreground"));
    assert_eq!(record.background, Some(false));

    // An explicit flag wins over the alias.
    let record = shell.config(LaunchOptions::new().background(false).fgbg("bg"));
    assert_eq!(record.background, Some(false));
}

#[test]
fn stage_is_an_alias_for_config() {
    let mut shell = ShellLauncher::new("shell");
    let record = shell.stage(LaunchOptions::new().rhost("box").command("ls"));

    assert_eq!(record.rhost.as_deref(), Some("box"));
    assert_eq!(record.command.as_deref(), Some("ls"));
    assert_eq!(shell.record().rhost, "box");
}

#[test]
fn shell_command_quotes_the_remote_command() -> TestResult {
    let mut shell = ShellLauncher::new("shell");
    let record = shell.config(
        LaunchOptions::new()
            .options("-q")
            .rhost("host")
            .command("echo hi")
            .source("dropped.txt"),
    );

    assert!(record.source.is_none(), "source is not a shell key");
    assert_eq!(shell.command()?, "ssh -q host \"echo hi\"");
    Ok(())
}

#[test]
fn shell_command_without_remote_command_omits_quotes() -> TestResult {
    let mut shell = ShellLauncher::new("tunnel");
    shell.config(LaunchOptions::new().options("-N -L 9000:localhost:80").rhost("host"));

    assert_eq!(shell.command()?, "ssh -N -L 9000:localhost:80 host");
    Ok(())
}

#[test]
fn from_pairs_drops_unknown_keys_and_parses_booleans() -> TestResult {
    let opts = LaunchOptions::from_pairs([
        ("rhost", "box"),
        ("command", "uptime"),
        ("background", "yes"),
        ("nodes", "4"),
        ("nodelist", "a,b"),
    ])?;

    assert_eq!(opts.rhost.as_deref(), Some("box"));
    assert_eq!(opts.command.as_deref(), Some("uptime"));
    assert_eq!(opts.background, Some(true));
    assert!(opts.launcher.is_none());
    Ok(())
}

#[test]
fn from_pairs_rejects_malformed_boolean() {
    let err = LaunchOptions::from_pairs([("background", "maybe")]).unwrap_err();
    match err {
        LaunchError::ConfigError(msg) => assert!(msg.contains("background")),
        other => panic!("expected ConfigError, got {other:?}"),
    }
}

#[test]
fn parse_pair_splits_on_first_equals() {
    assert_eq!(
        LaunchOptions::parse_pair("command=a=b").unwrap(),
        ("command".to_string(), "a=b".to_string())
    );
    assert!(LaunchOptions::parse_pair("novalue").is_err());
    assert!(LaunchOptions::parse_pair("=x").is_err());
}

#[test]
fn malformed_endpoints_are_rejected_before_spawning() {
    let cases = [
        ("", "host:~"),
        ("/tmp/a.txt", ""),
        ("/tmp/a.txt", ":~"),
        ("/tmp/a.txt", "bad host:~"),
        ("/tmp/a.txt", "user@:~"),
    ];

    for (source, destination) in cases {
        let mut copier = CopyLauncher::new("copier");
        copier.config(LaunchOptions::new().source(source).destination(destination));
        match copier.command() {
            Err(LaunchError::BadEndpoint(_)) => {}
            other => panic!("expected BadEndpoint for ({source:?}, {destination:?}), got {other:?}"),
        }
        assert!(matches!(copier.launch(), Err(LaunchError::BadEndpoint(_))));
        assert_eq!(copier.pid(), 0);
    }
}

#[test]
fn well_formed_endpoints_are_accepted() -> TestResult {
    let cases = [
        ("~/foo.txt", "remote.host.edu:~"),
        ("remote.host.edu:~/foo.txt", "."),
        ("user@box:/var/log/x", "./logs/a:b"),
        ("[::1]:/tmp/x", "/tmp/y"),
        ("'a.txt b.txt'", "box:"),
    ];

    for (source, destination) in cases {
        let mut copier = CopyLauncher::new("copier");
        copier.config(LaunchOptions::new().source(source).destination(destination));
        copier.command()?;
    }
    Ok(())
}

#[test]
fn shell_launcher_requires_a_host() {
    let mut shell = ShellLauncher::new("shell");
    shell.config(LaunchOptions::new().command("ls"));
    assert!(matches!(shell.command(), Err(LaunchError::BadEndpoint(_))));

    shell.config(LaunchOptions::new().rhost("two words"));
    assert!(matches!(shell.command(), Err(LaunchError::BadEndpoint(_))));
}

#[test]
fn configured_stdin_replaces_the_null_default() {
    let mut shell = ShellLauncher::new("stdin");
    let record = shell.config(LaunchOptions::new().stdin(Input::bytes("print(1)\n")));

    let stdin = record.stdin.expect("stdin is a shell key");
    assert!(!stdin.is_null());
    assert!(matches!(stdin, Input::Bytes(ref b) if &b[..] == b"print(1)\n"));
}
