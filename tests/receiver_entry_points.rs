//! Config-driven entry points: `Receiver::run` and `Receiver::spawn`

use futures::StreamExt;
use gpsrx::{CloseReason, Fix, Receiver, ReceiverConfig, RenderEvent, codec};
use std::net::{Ipv4Addr, SocketAddr};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

fn loopback_config() -> ReceiverConfig {
    // reserve a free port, then hand it to the receiver
    let port = std::net::TcpListener::bind((Ipv4Addr::LOCALHOST, 0))
        .and_then(|l| l.local_addr())
        .unwrap()
        .port();
    ReceiverConfig {
        listen_address: Ipv4Addr::LOCALHOST.into(),
        listen_port: port,
        ..Default::default()
    }
}

/// Connect once the receiver task has bound its port.
async fn connect(addr: SocketAddr) -> TcpStream {
    for _ in 0..100 {
        if let Ok(stream) = TcpStream::connect(addr).await {
            return stream;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("receiver never started listening on {addr}");
}

fn frame_bytes(latitude: f32) -> [u8; 24] {
    let sent_at = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs_f64();
    codec::encode(&Fix { latitude, longitude: 8.5, altitude: 410.0, sent_at }).into_bytes()
}

#[tokio::test]
async fn run_processes_one_client_until_it_disconnects() {
    let config = loopback_config();
    let addr = config.listen_addr();

    let sender = tokio::spawn(async move {
        let mut stream = connect(addr).await;
        stream.write_all(&frame_bytes(47.1)).await.unwrap();
        stream.write_all(&frame_bytes(47.2)).await.unwrap();
        stream.shutdown().await.unwrap();
    });

    let mut latitudes = Vec::new();
    let mut sink = |event: &RenderEvent| latitudes.push(event.fix.latitude);
    let summary = Receiver::run(&config, &mut sink).await.unwrap();
    sender.await.unwrap();

    assert!(matches!(summary.close_reason, CloseReason::EndOfStream));
    assert_eq!(summary.metrics.frames_received, 2);
    assert!(summary.peer.is_some_and(|peer| peer.ip() == addr.ip()));
    assert_eq!(latitudes, vec![47.1, 47.2]);
}

#[tokio::test]
async fn run_rejects_invalid_config_before_binding() {
    let config = ReceiverConfig { window_size: 0, ..loopback_config() };
    let mut sink = |_: &RenderEvent| {};
    let err = Receiver::run(&config, &mut sink).await.unwrap_err();
    assert!(err.to_string().contains("window_size"));
}

#[tokio::test]
async fn spawned_receiver_stops_on_shutdown() {
    let config = loopback_config();
    let addr = config.listen_addr();

    let (client_tx, client_rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        let mut stream = connect(addr).await;
        stream.write_all(&frame_bytes(47.3)).await.unwrap();
        // keep the connection open so only shutdown can end the session
        client_tx.send(stream).unwrap();
    });

    let handle = Receiver::spawn(&config).await.unwrap();
    let mut updates = std::pin::pin!(handle.updates());
    let first = updates.next().await.expect("one fix before shutdown");
    assert_eq!(first.fix.latitude, 47.3);
    assert_eq!(handle.latest().map(|e| e.stats.ordinal), Some(1));

    let _client = client_rx.await.unwrap();
    handle.shutdown();
    assert!(handle.finished().await.is_none());
}
