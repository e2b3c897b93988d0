//! Mode, connections, ping, and traffic against a mock daemon.

use std::collections::BTreeMap;
use std::time::Duration;

use clashctl_config::ServerConfig;
use clashctl_core::ping::{PingOptions, PingState, ping_all};
use clashctl_core::types::{Connection, ConnectionMetadata, ConnectionsSnapshot, Traffic};
use clashctl_core::{CtlError, Mode, TrafficStream};
use clashctl_test_utils::MockDaemon;
use clashctl_test_utils::tracing_setup::init_test_tracing;
use pretty_assertions::assert_eq;

#[tokio::test]
async fn mode_round_trip() {
    let daemon = MockDaemon::builder().mode("global").start().await;
    let client = daemon.client();

    assert_eq!(client.mode().await.unwrap().mode, "global");
    client.set_mode(Mode::Direct).await.unwrap();
    assert_eq!(daemon.mode(), "direct");

    let patches = daemon.requests_to("PATCH", "/configs");
    assert_eq!(patches.len(), 1);
    assert_eq!(patches[0].body, r#"{"mode":"direct"}"#);
}

#[tokio::test]
async fn missing_group_is_not_found() {
    let daemon = MockDaemon::builder().start().await;
    let err = clashctl_core::ProxyCatalog::new(&daemon.client())
        .fetch_group("Nope")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "group `Nope` not found");
}

#[tokio::test]
async fn connections_snapshot_decodes() {
    let snapshot = ConnectionsSnapshot {
        download_total: 2048,
        upload_total: 1024,
        connections: vec![Connection {
            id: "c1".into(),
            metadata: ConnectionMetadata {
                network: "tcp".into(),
                kind: "HTTP".into(),
                host: "example.com".into(),
                ..Default::default()
            },
            start: "2026-01-01T00:00:00Z".into(),
            chains: vec!["HK 01".into(), "Auto".into()],
            rule: "Match".into(),
            ..Default::default()
        }],
    };
    let daemon = MockDaemon::builder().connections(snapshot).start().await;

    let got = daemon.client().connections().await.unwrap();
    assert_eq!(got.download_total, 2048);
    assert_eq!(got.connections.len(), 1);
    assert_eq!(got.connections[0].metadata.host, "example.com");
    assert_eq!(got.connections[0].chains, vec!["HK 01", "Auto"]);
}

#[tokio::test]
async fn ping_success_holds_for_min_display() {
    init_test_tracing();
    let daemon = MockDaemon::builder().start().await;
    let servers: BTreeMap<String, ServerConfig> =
        [("alive".to_string(), daemon.server_config())].into_iter().collect();
    let options = PingOptions {
        timeout: Duration::from_secs(3),
        min_display: Duration::from_millis(150),
    };

    let started = tokio::time::Instant::now();
    let mut settled_at = None;
    let states = ping_all(&servers, options, |_, _, state| {
        if state == PingState::Success {
            settled_at = Some(started.elapsed());
        }
    })
    .await;

    assert_eq!(states, vec![("alive".to_string(), PingState::Success)]);
    let settled_at = settled_at.unwrap();
    assert!(settled_at >= Duration::from_millis(150), "{settled_at:?}");
}

#[tokio::test]
async fn ping_marks_live_and_dead_servers() {
    let daemon = MockDaemon::builder().start().await;
    let servers: BTreeMap<String, ServerConfig> = [
        ("alive".to_string(), daemon.server_config()),
        ("dead".to_string(), ServerConfig::new("127.0.0.1", 1)),
    ]
    .into_iter()
    .collect();
    let options = PingOptions {
        timeout: Duration::from_secs(3),
        min_display: Duration::ZERO,
    };

    let states = ping_all(&servers, options, |_, _, _| {}).await;
    assert_eq!(
        states,
        vec![
            ("alive".to_string(), PingState::Success),
            ("dead".to_string(), PingState::Error),
        ]
    );
    assert_eq!(daemon.requests_to("GET", "/version").len(), 1);
}

#[test_log::test(tokio::test)]
async fn traffic_frames_are_delivered_and_bad_frames_skipped() {
    let daemon = MockDaemon::builder()
        .secret("tok")
        .traffic(Traffic { up: 10, down: 20 })
        .raw_traffic("not json")
        .traffic(Traffic { up: 30, down: 40 })
        .start()
        .await;

    let stream = TrafficStream::connect(&daemon.client()).await.unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel::<()>();
    let mut seen = Vec::new();
    let mut tx = Some(tx);
    stream
        .follow(
            async move {
                let _ = rx.await;
            },
            |frame| {
                seen.push(frame);
                if seen.len() == 2 {
                    if let Some(tx) = tx.take() {
                        let _ = tx.send(());
                    }
                }
            },
        )
        .await;

    assert_eq!(seen, vec![Traffic { up: 10, down: 20 }, Traffic { up: 30, down: 40 }]);
    assert_eq!(
        daemon.requests_to("GET", "/traffic")[0].authorization.as_deref(),
        Some("Bearer tok")
    );
}

#[tokio::test]
async fn traffic_waits_for_shutdown_after_close() {
    let daemon = MockDaemon::builder().start().await;
    let stream = TrafficStream::connect(&daemon.client()).await.unwrap();

    let result = tokio::time::timeout(
        Duration::from_secs(5),
        stream.follow(tokio::time::sleep(Duration::from_millis(200)), |_| {}),
    )
    .await;
    assert!(result.is_ok(), "follow returns once shutdown resolves");
}

#[tokio::test]
async fn traffic_rejected_handshake_is_transport_error() {
    let daemon = MockDaemon::builder().secret("right").start().await;
    let client = clashctl_core::DaemonClient::new(&daemon.server_config().with_secret("wrong"))
        .unwrap();
    let err = TrafficStream::connect(&client).await.unwrap_err();
    assert!(matches!(err, CtlError::Transport(_)));
}
