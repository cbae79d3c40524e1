// tests/tunnel.rs
mod common;
use crate::common::{init_tracing, FakeRemote, TestResult};

use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::{timeout, Instant};

use rlaunch::errors::LaunchError;
use rlaunch::remote::Remote;
use rlaunch::tunnel::{pick_local_port, probe_local_port, Tunnel};

#[test]
fn picked_local_ports_are_nonzero() -> TestResult {
    let port = pick_local_port()?;
    assert_ne!(port, 0);
    Ok(())
}

#[tokio::test]
async fn probe_sees_listener_only_while_it_is_open() -> TestResult {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    assert!(probe_local_port(port).await);

    drop(listener);
    assert!(!probe_local_port(port).await);
    Ok(())
}

#[tokio::test]
async fn failing_forward_is_reported_and_reaped() -> TestResult {
    init_tracing();

    let fake = FakeRemote::failing("ssh: connect to host box port 22: Connection refused");
    let settings = fake.settings().tunnel_timeout(Duration::from_secs(3)).build();
    let mut tunnel = Tunnel::new("Tunnel", &settings);

    let outcome = timeout(Duration::from_secs(10), tunnel.connect("box", 8080)).await?;
    match outcome {
        Err(LaunchError::TunnelFailure(msg)) => {
            assert!(msg.contains("box:8080"), "got {msg}");
        }
        other => panic!("expected TunnelFailure, got {other:?}"),
    }
    assert_eq!(tunnel.pid(), 0);
    assert_eq!(tunnel.lport(), 0);

    let calls = fake.calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with("-N -L "), "got {:?}", calls[0]);
    assert!(calls[0].ends_with(":localhost:8080 box"), "got {:?}", calls[0]);
    Ok(())
}

#[tokio::test]
async fn silent_forward_times_out_and_is_killed() -> TestResult {
    init_tracing();

    let fake = FakeRemote::hanging();
    let settings = fake.settings().build();
    let remote = Remote::new(settings);

    let started = Instant::now();
    let result = timeout(Duration::from_secs(10), async {
        let mut tunnel =
            Tunnel::new("Tunnel", remote.settings()).with_timeout(Duration::from_millis(300));
        let outcome = tunnel.connect("box", 9000).await;
        (tunnel.pid(), outcome)
    })
    .await?;

    let (pid, outcome) = result;
    assert!(matches!(outcome, Err(LaunchError::TunnelFailure(_))));
    assert_eq!(pid, 0, "forwarding process is killed on timeout");
    assert!(started.elapsed() >= Duration::from_millis(300));
    Ok(())
}

#[tokio::test]
async fn remote_connect_propagates_tunnel_failure() {
    init_tracing();

    let fake = FakeRemote::failing("Permission denied (publickey).");
    let remote = Remote::new(fake.settings().build());

    match remote.connect("box", 5432).await {
        Err(LaunchError::TunnelFailure(_)) => {}
        other => panic!("expected TunnelFailure, got {:?}", other.map(|(_, lport)| lport)),
    }
}

#[tokio::test]
async fn disconnect_without_connect_is_harmless() -> TestResult {
    let fake = FakeRemote::hanging();
    let settings = fake.settings().build();
    let mut tunnel = Tunnel::new("Tunnel", &settings);

    tunnel.disconnect().await?;
    assert_eq!(tunnel.pid(), 0);
    assert_eq!(tunnel.lport(), 0);
    assert_eq!(tunnel.rhost(), "");
    Ok(())
}

#[tokio::test]
async fn reconnect_after_failure_rebuilds_forward_options() -> TestResult {
    init_tracing();

    let fake = FakeRemote::failing("ssh: connect to host box port 22: Connection refused");
    let settings = fake.settings().build();
    let mut tunnel = Tunnel::new("Tunnel", &settings);

    assert!(tunnel.connect("box", 8080).await.is_err());
    assert!(tunnel.connect("box", 9090).await.is_err());

    let calls = fake.calls();
    assert_eq!(calls.len(), 2);
    for call in &calls {
        assert_eq!(call.matches("-N -L").count(), 1, "got {call:?}");
    }
    assert!(calls[1].ends_with(":localhost:9090 box"), "got {:?}", calls[1]);
    Ok(())
}

#[tokio::test]
async fn live_forward_connects_disconnects_and_reconnects() -> TestResult {
    init_tracing();

    let fake = FakeRemote::hanging();
    let settings = fake.settings().tunnel_timeout(Duration::from_secs(5)).build();
    let mut tunnel = Tunnel::new("Tunnel", &settings);

    let listener = fake.spawn_forward_listener();
    let lport = timeout(Duration::from_secs(10), tunnel.connect("box", 8080)).await??;
    assert_ne!(lport, 0);
    assert_eq!(tunnel.lport(), lport);
    assert_eq!(tunnel.rhost(), "box");
    assert_eq!(tunnel.rport(), 8080);
    assert!(tunnel.pid() > 0);
    assert!(probe_local_port(lport).await);

    // A live tunnel refuses a second forward.
    assert!(matches!(
        tunnel.connect("box", 8081).await,
        Err(LaunchError::TunnelFailure(_))
    ));

    timeout(Duration::from_secs(5), tunnel.disconnect()).await??;
    assert_eq!(tunnel.pid(), 0);
    assert_eq!(tunnel.lport(), 0);
    drop(listener);

    let _listener = fake.spawn_forward_listener();
    let second = timeout(Duration::from_secs(10), tunnel.connect("box", 9090)).await??;
    assert_eq!(tunnel.rport(), 9090);
    assert!(tunnel.pid() > 0);

    let calls = fake.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1], format!("-N -L {second}:localhost:9090 box"));

    tunnel.disconnect().await?;
    Ok(())
}
