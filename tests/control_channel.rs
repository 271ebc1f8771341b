//! Integration tests for the UDP control channel and the engine lifecycle.

use chimera_cc::config::Config;
use chimera_cc::engine::CongestionEngine;
use chimera_cc::selection::AlgorithmId;
use std::sync::Once;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::{sleep, timeout};

/// Helper to initialize tracing for tests.
fn init_tracing() {
    static TRACING_INIT: Once = Once::new();
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("debug")
            .with_test_writer()
            .init();
    });
}

fn test_config() -> Config {
    let mut config = Config::default();
    // An ephemeral port keeps parallel tests from colliding.
    config.control.bind_addr = "127.0.0.1:0".parse().unwrap();
    config
}

async fn wait_for_selection(engine: &CongestionEngine, want: AlgorithmId) {
    timeout(Duration::from_secs(2), async {
        while engine.selection().load() != want {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("selection change was never observed");
}

async fn wait_for_raw(engine: &CongestionEngine, want: u32) {
    timeout(Duration::from_secs(2), async {
        while engine.selection().raw() != want {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("raw selection change was never observed");
}

#[tokio::test]
async fn test_control_messages_switch_the_selection() {
    init_tracing();
    let engine = CongestionEngine::start(test_config()).await.unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    sender.send_to(b"1", engine.control_addr()).await.unwrap();
    wait_for_selection(&engine, AlgorithmId::RateBased).await;

    sender.send_to(b"2", engine.control_addr()).await.unwrap();
    wait_for_selection(&engine, AlgorithmId::RttScaling).await;

    sender.send_to(b"0", engine.control_addr()).await.unwrap();
    wait_for_selection(&engine, AlgorithmId::LossBased).await;

    engine.shutdown().await;
}

#[tokio::test]
async fn test_repeated_submissions_are_idempotent() {
    let engine = CongestionEngine::start(test_config()).await.unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    sender.send_to(b"1", engine.control_addr()).await.unwrap();
    sender.send_to(b"1", engine.control_addr()).await.unwrap();
    wait_for_selection(&engine, AlgorithmId::RateBased).await;
    assert_eq!(engine.selection().raw(), 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_malformed_payload_keeps_previous_selection() {
    init_tracing();
    let engine = CongestionEngine::start(test_config()).await.unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    sender.send_to(b"1", engine.control_addr()).await.unwrap();
    wait_for_selection(&engine, AlgorithmId::RateBased).await;

    sender.send_to(b"abc", engine.control_addr()).await.unwrap();
    // Give the listener time to process (and discard) the payload.
    sleep(Duration::from_millis(100)).await;

    assert_eq!(engine.selection().load(), AlgorithmId::RateBased);
    assert_eq!(engine.selection().raw(), 1);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_unknown_identifier_is_accepted_and_aliases() {
    let engine = CongestionEngine::start(test_config()).await.unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    sender.send_to(b"7", engine.control_addr()).await.unwrap();
    wait_for_raw(&engine, 7).await;
    assert_eq!(engine.selection().load(), AlgorithmId::LossBased);

    engine.shutdown().await;
}

#[tokio::test]
async fn test_concurrent_readers_while_switching() {
    init_tracing();
    let engine = CongestionEngine::start(test_config()).await.unwrap();
    let sender = UdpSocket::bind("127.0.0.1:0").await.unwrap();

    // Many relaxed readers racing one writer: every load must come back as
    // a valid registered algorithm, never anything torn or out of range.
    let mut readers = Vec::new();
    for _ in 0..4 {
        let selection = engine.selection().clone();
        readers.push(tokio::spawn(async move {
            for _ in 0..500 {
                let id = selection.load();
                assert!(matches!(
                    id,
                    AlgorithmId::LossBased | AlgorithmId::RateBased | AlgorithmId::RttScaling
                ));
                tokio::task::yield_now().await;
            }
        }));
    }

    for round in 0..20u8 {
        let payload = if round % 2 == 0 { b"1" } else { b"2" };
        sender.send_to(payload, engine.control_addr()).await.unwrap();
        sleep(Duration::from_millis(1)).await;
    }

    for reader in futures::future::join_all(readers).await {
        reader.unwrap();
    }
    engine.shutdown().await;
}

#[tokio::test]
async fn test_channel_bind_failure_is_fatal_to_start() {
    // Occupy a port, then ask the engine to bind the same one.
    let occupied = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    let mut config = Config::default();
    config.control.bind_addr = occupied.local_addr().unwrap();

    assert!(CongestionEngine::start(config).await.is_err());
}

#[tokio::test]
async fn test_shutdown_releases_the_control_port() {
    let engine = CongestionEngine::start(test_config()).await.unwrap();
    let addr = engine.control_addr();

    engine.shutdown().await;

    // The listener task has fully terminated, so the port is free again.
    UdpSocket::bind(addr).await.unwrap();
}
