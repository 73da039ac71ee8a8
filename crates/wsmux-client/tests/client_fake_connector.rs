//! Client lifecycle over an in-memory connector.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::{mpsc, oneshot, Notify};

use wsmux_client::transport::{Connection, Connector, Transport, TransportEvent};
use wsmux_client::{Client, ClientConfig, ConnectionState};
use wsmux_core::error::{Result, WsMuxError};
use wsmux_core::Payload;

const PREFIX: &str = "iris-websocket-message:";

#[derive(Default)]
struct Wire {
    sent: Mutex<Vec<String>>,
    close_calls: AtomicUsize,
}

struct FakeTransport {
    wire: Arc<Wire>,
    events: mpsc::Sender<TransportEvent>,
}

impl Transport for FakeTransport {
    fn send_text(&self, text: String) -> Result<()> {
        self.wire.sent.lock().unwrap().push(text);
        Ok(())
    }

    fn close(&self) -> Result<()> {
        self.wire.close_calls.fetch_add(1, Ordering::SeqCst);
        let _ = self.events.try_send(TransportEvent::Closed {
            code: 1000,
            reason: String::new(),
        });
        Ok(())
    }
}

/// Hands out one connection once `release` is notified, or fails.
struct FakeConnector {
    wire: Arc<Wire>,
    release: Arc<Notify>,
    fail: bool,
    peer: Mutex<Option<oneshot::Sender<mpsc::Sender<TransportEvent>>>>,
    seen: Mutex<Option<(String, Vec<String>)>>,
    made: AtomicUsize,
}

impl FakeConnector {
    fn new(fail: bool) -> (Arc<Self>, oneshot::Receiver<mpsc::Sender<TransportEvent>>) {
        let (tx, rx) = oneshot::channel();
        let c = Arc::new(Self {
            wire: Arc::new(Wire::default()),
            release: Arc::new(Notify::new()),
            fail,
            peer: Mutex::new(Some(tx)),
            seen: Mutex::new(None),
            made: AtomicUsize::new(0),
        });
        (c, rx)
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, endpoint: &str, protocols: &[String]) -> Result<Connection> {
        *self.seen.lock().unwrap() = Some((endpoint.to_string(), protocols.to_vec()));
        self.release.notified().await;
        if self.fail {
            return Err(WsMuxError::Transport("refused".into()));
        }
        self.made.fetch_add(1, Ordering::SeqCst);
        let (ev_tx, ev_rx) = mpsc::channel(16);
        if let Some(peer) = self.peer.lock().unwrap().take() {
            let _ = peer.send(ev_tx.clone());
        }
        Ok(Connection {
            transport: Arc::new(FakeTransport {
                wire: Arc::clone(&self.wire),
                events: ev_tx,
            }),
            events: ev_rx,
        })
    }
}

async fn wait_for(mut cond: impl FnMut() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached in time");
}

fn counter() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
    let n = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&n);
    (n, move || {
        c.fetch_add(1, Ordering::SeqCst);
    })
}

#[tokio::test]
async fn emit_before_open_is_not_connected() {
    let (connector, _peer) = FakeConnector::new(false);
    let client = Client::connect_with(ClientConfig::default(), connector.clone(), "h/x", &["chat"]).unwrap();

    assert_eq!(client.state(), ConnectionState::Connecting);
    let err = client.emit("chat", "hi").unwrap_err();
    assert_eq!(err.code().as_str(), "NOT_CONNECTED");
    assert!(connector.wire.sent.lock().unwrap().is_empty());

    wait_for(|| connector.seen.lock().unwrap().is_some()).await;
    let (endpoint, protocols) = connector.seen.lock().unwrap().clone().unwrap();
    assert_eq!(endpoint, "h/x");
    assert_eq!(protocols, vec!["chat".to_string()]);
}

#[tokio::test]
async fn open_emit_receive_disconnect() {
    let (connector, peer) = FakeConnector::new(false);
    let client = Client::connect_with(ClientConfig::default(), connector.clone(), "ws://h/x", &[]).unwrap();

    let (opened, opened_fn) = counter();
    let (closed, closed_fn) = counter();
    client.on_connect(opened_fn);
    client.on_disconnect(closed_fn);

    let chat = Arc::new(Mutex::new(Vec::new()));
    let c = Arc::clone(&chat);
    client.on("chat", move |p: &Payload| c.lock().unwrap().push(p.clone()));
    let native = Arc::new(Mutex::new(Vec::<String>::new()));
    let n = Arc::clone(&native);
    client.on_message(move |m| n.lock().unwrap().push(m.to_string()));

    connector.release.notify_one();
    let peer = peer.await.unwrap();
    wait_for(|| client.state() == ConnectionState::Open).await;
    assert_eq!(opened.load(Ordering::SeqCst), 1);

    client.emit("chat", "hi").unwrap();
    client.emit("count", 42).unwrap();
    client.emit_value("flag", Some(&json!(false))).unwrap();
    client.emit_message("raw").unwrap();
    assert_eq!(
        *connector.wire.sent.lock().unwrap(),
        vec![
            format!("{PREFIX}chat;0;hi"),
            format!("{PREFIX}count;1;42"),
            format!("{PREFIX}flag;2;false"),
            "raw".to_string(),
        ]
    );

    peer.send(TransportEvent::Text(format!("{PREFIX}chat;0;hello"))).await.unwrap();
    peer.send(TransportEvent::Text("plain".into())).await.unwrap();
    wait_for(|| !chat.lock().unwrap().is_empty() && !native.lock().unwrap().is_empty()).await;
    assert_eq!(*chat.lock().unwrap(), vec![Payload::Text("hello".into())]);
    assert_eq!(*native.lock().unwrap(), vec!["plain".to_string()]);

    // late connect listener runs right away
    let (late, late_fn) = counter();
    client.on_connect(late_fn);
    assert_eq!(late.load(Ordering::SeqCst), 1);

    client.disconnect().unwrap();
    wait_for(|| client.state() == ConnectionState::Closed).await;
    assert_eq!(closed.load(Ordering::SeqCst), 1);
    assert_eq!(connector.wire.close_calls.load(Ordering::SeqCst), 1);

    let err = client.disconnect().unwrap_err();
    assert_eq!(err.code().as_str(), "ALREADY_DISCONNECTED");
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn double_disconnect_while_open() {
    let (connector, _peer) = FakeConnector::new(false);
    let client = Client::connect_with(ClientConfig::default(), connector.clone(), "ws://h", &[]).unwrap();
    connector.release.notify_one();
    wait_for(|| client.state() == ConnectionState::Open).await;

    client.disconnect().unwrap();
    let err = client.disconnect().unwrap_err();
    assert_eq!(err.code().as_str(), "ALREADY_DISCONNECTED");
}

#[tokio::test]
async fn failed_dial_fires_disconnect_only() {
    let (connector, _peer) = FakeConnector::new(true);
    let client = Client::connect_with(ClientConfig::default(), connector.clone(), "ws://h", &[]).unwrap();
    let (opened, opened_fn) = counter();
    let (closed, closed_fn) = counter();
    client.on_connect(opened_fn);
    client.on_disconnect(closed_fn);

    connector.release.notify_one();
    wait_for(|| client.state() == ConnectionState::Closed).await;
    assert_eq!(opened.load(Ordering::SeqCst), 0);
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    let err = client.emit("chat", "late").unwrap_err();
    assert_eq!(err.code().as_str(), "NOT_CONNECTED");
}

#[tokio::test]
async fn disconnect_while_dialing_abandons_the_dial() {
    let (connector, _peer) = FakeConnector::new(false);
    let client = Client::connect_with(ClientConfig::default(), connector.clone(), "ws://h", &[]).unwrap();
    let (opened, opened_fn) = counter();
    let (closed, closed_fn) = counter();
    client.on_connect(opened_fn);
    client.on_disconnect(closed_fn);

    client.disconnect().unwrap();
    wait_for(|| client.state() == ConnectionState::Closed).await;
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    connector.release.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(opened.load(Ordering::SeqCst), 0);
    assert_eq!(client.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn peer_close_fires_disconnect() {
    let (connector, peer) = FakeConnector::new(false);
    let client = Client::connect_with(ClientConfig::default(), connector.clone(), "ws://h", &[]).unwrap();
    let (closed, closed_fn) = counter();
    client.on_disconnect(closed_fn);

    connector.release.notify_one();
    let peer = peer.await.unwrap();
    wait_for(|| client.state() == ConnectionState::Open).await;

    peer.send(TransportEvent::Closed { code: 1001, reason: "bye".into() })
        .await
        .unwrap();
    wait_for(|| client.state() == ConnectionState::Closed).await;
    assert_eq!(closed.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn invalid_config_is_rejected_up_front() {
    let (connector, _peer) = FakeConnector::new(false);
    let mut cfg = ClientConfig::default();
    cfg.version = 3;
    let err = Client::connect_with(cfg, connector, "ws://h", &[]).err().unwrap();
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn connect_outside_runtime_is_an_error() {
    let (connector, _peer) = FakeConnector::new(false);
    let err = Client::connect_with(ClientConfig::default(), connector, "ws://h", &[]).err().unwrap();
    assert_eq!(err.code().as_str(), "INTERNAL");
}

#[tokio::test]
async fn dropping_the_last_handle_closes_the_transport() {
    let (connector, _peer) = FakeConnector::new(false);
    let client = Client::connect_with(ClientConfig::default(), connector.clone(), "ws://h", &[]).unwrap();
    let (closed, closed_fn) = counter();
    client.on_disconnect(closed_fn);

    let extra = client.clone();
    connector.release.notify_one();
    wait_for(|| client.state() == ConnectionState::Open).await;

    drop(client);
    tokio::time::sleep(Duration::from_millis(20)).await;
    // another handle is still alive
    assert_eq!(connector.wire.close_calls.load(Ordering::SeqCst), 0);

    drop(extra);
    wait_for(|| connector.wire.close_calls.load(Ordering::SeqCst) == 1).await;
    // the listeners went away with the client
    assert_eq!(closed.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn dropping_the_client_while_dialing_abandons_the_dial() {
    let (connector, _peer) = FakeConnector::new(false);
    let client = Client::connect_with(ClientConfig::default(), connector.clone(), "ws://h", &[]).unwrap();
    wait_for(|| connector.seen.lock().unwrap().is_some()).await;

    drop(client);
    tokio::time::sleep(Duration::from_millis(20)).await;
    connector.release.notify_one();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(connector.made.load(Ordering::SeqCst), 0);
    assert_eq!(connector.wire.close_calls.load(Ordering::SeqCst), 0);
}
