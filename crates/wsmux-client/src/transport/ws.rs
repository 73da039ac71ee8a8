//! WebSocket transport (`tokio-tungstenite`).
//!
//! Responsibilities:
//! - Dial with a timeout, sending requested subprotocols
//! - One session task per connection: outbound queue, inbound reader, keepalive ping
//! - Liveness: any inbound frame (pongs included) refreshes a read deadline;
//!   every write is bounded by the write timeout
//! - Close: flush queued text, send a Close frame, read until the peer answers
//!   (bounded by a grace period)
//!
//! Binary frames are not part of the event grammar and are ignored.

use std::sync::Arc;

use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Notify;
use tokio::time::{timeout, Duration, Instant, Interval, MissedTickBehavior};
use tokio_tungstenite::tungstenite::{self, client::IntoClientRequest, Message};

use wsmux_core::error::{Result, WsMuxError};

use super::{normalize_endpoint, Connection, Connector, Transport, TransportEvent};
use crate::config::TransportSection;

const INBOUND_QUEUE: usize = 1024;
const CLOSE_GRACE: Duration = Duration::from_secs(5);

/// 1006: closed without a close frame.
const CLOSE_ABNORMAL: u16 = 1006;
/// 1005: close frame without a status code.
const CLOSE_NO_STATUS: u16 = 1005;

type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;
type WsSink = SplitSink<WsStream, Message>;

/// Default connector.
#[derive(Debug, Clone, Default)]
pub struct WsConnector {
    cfg: TransportSection,
}

impl WsConnector {
    pub fn new(cfg: TransportSection) -> Self {
        Self { cfg }
    }
}

#[async_trait]
impl Connector for WsConnector {
    async fn connect(&self, endpoint: &str, protocols: &[String]) -> Result<Connection> {
        let url = normalize_endpoint(endpoint);
        let request = build_request(&url, protocols)?;

        let dial = timeout(
            Duration::from_millis(self.cfg.connect_timeout_ms),
            tokio_tungstenite::connect_async(request),
        );
        let (stream, _response) = dial
            .await
            .map_err(|_| WsMuxError::Transport(format!("connect to {url} timed out")))?
            .map_err(|e| WsMuxError::Transport(format!("connect to {url} failed: {e}")))?;
        tracing::info!(%url, "websocket connected");

        let (out_tx, out_rx) = mpsc::channel(self.cfg.outbound_queue);
        let (ev_tx, ev_rx) = mpsc::channel(INBOUND_QUEUE);
        let close = Arc::new(Notify::new());

        tokio::spawn(run_session(
            stream,
            out_rx,
            Arc::clone(&close),
            ev_tx,
            SessionLimits::from_config(&self.cfg),
        ));

        Ok(Connection {
            transport: Arc::new(WsTransport { tx: out_tx, close }),
            events: ev_rx,
        })
    }
}

/// Outbound handle of one WebSocket session.
pub struct WsTransport {
    tx: mpsc::Sender<String>,
    close: Arc<Notify>,
}

impl Transport for WsTransport {
    fn send_text(&self, text: String) -> Result<()> {
        self.tx.try_send(text).map_err(|e| match e {
            TrySendError::Full(_) => WsMuxError::Backpressure,
            TrySendError::Closed(_) => WsMuxError::NotConnected,
        })
    }

    fn close(&self) -> Result<()> {
        if self.tx.is_closed() {
            return Err(WsMuxError::NotConnected);
        }
        self.close.notify_one();
        Ok(())
    }
}

fn build_request(url: &str, protocols: &[String]) -> Result<tungstenite::handshake::client::Request> {
    let mut request = url
        .into_client_request()
        .map_err(|e| WsMuxError::Transport(format!("invalid websocket url {url}: {e}")))?;

    if !protocols.is_empty() {
        let value = tungstenite::http::HeaderValue::from_str(&protocols.join(", "))
            .map_err(|e| WsMuxError::Transport(format!("invalid subprotocol list: {e}")))?;
        request
            .headers_mut()
            .insert(tungstenite::http::header::SEC_WEBSOCKET_PROTOCOL, value);
    }
    Ok(request)
}

/// Timers of one session; `None` disables the timer.
#[derive(Debug, Clone, Copy)]
struct SessionLimits {
    ping_every: Option<Duration>,
    read_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
}

impl SessionLimits {
    fn from_config(cfg: &TransportSection) -> Self {
        let ms = |v: u64| (v > 0).then(|| Duration::from_millis(v));
        Self {
            ping_every: ms(cfg.ping_interval_ms),
            read_timeout: ms(cfg.read_timeout_ms),
            write_timeout: ms(cfg.write_timeout_ms),
        }
    }
}

// --------------------
// Session loop
// --------------------
async fn run_session(
    stream: WsStream,
    mut out_rx: mpsc::Receiver<String>,
    close: Arc<Notify>,
    ev_tx: mpsc::Sender<TransportEvent>,
    limits: SessionLimits,
) {
    let (mut ws_tx, mut ws_rx) = stream.split();

    let mut ping_tick = limits.ping_every.map(|every| {
        let mut t = tokio::time::interval_at(Instant::now() + every, every);
        t.set_missed_tick_behavior(MissedTickBehavior::Delay);
        t
    });

    let mut last_seen = Instant::now();
    let mut close_deadline: Option<Instant> = None;
    let mut code = CLOSE_ABNORMAL;
    let mut reason = String::new();

    loop {
        let closing = close_deadline.is_some();
        let read_deadline = limits.read_timeout.map(|t| last_seen + t);
        tokio::select! {
            // outbound writer
            maybe_out = out_rx.recv(), if !closing => {
                match maybe_out {
                    Some(text) => {
                        if !write(&mut ws_tx, Message::Text(text.into()), limits.write_timeout).await {
                            break;
                        }
                    }
                    // every transport handle is gone
                    None => {
                        close_deadline = Some(Instant::now() + CLOSE_GRACE);
                        if !write(&mut ws_tx, Message::Close(None), limits.write_timeout).await {
                            break;
                        }
                    }
                }
            }

            // close requested
            _ = close.notified(), if !closing => {
                close_deadline = Some(Instant::now() + CLOSE_GRACE);
                out_rx.close();
                let mut flushed = true;
                while let Ok(text) = out_rx.try_recv() {
                    if !write(&mut ws_tx, Message::Text(text.into()), limits.write_timeout).await {
                        flushed = false;
                        break;
                    }
                }
                if !flushed || !write(&mut ws_tx, Message::Close(None), limits.write_timeout).await {
                    break;
                }
                tracing::debug!("close frame sent");
            }

            // inbound reader
            incoming = ws_rx.next() => {
                let Some(incoming) = incoming else { break; };
                last_seen = Instant::now();
                match incoming {
                    Ok(Message::Text(text)) => {
                        if ev_tx.send(TransportEvent::Text(text.as_str().to_owned())).await.is_err() {
                            tracing::debug!("event receiver gone, ending session");
                            break;
                        }
                    }
                    Ok(Message::Binary(data)) => {
                        tracing::debug!(len = data.len(), "binary frame ignored");
                    }
                    Ok(Message::Close(frame)) => {
                        (code, reason) = frame
                            .map(|cf| (u16::from(cf.code), cf.reason.as_str().to_owned()))
                            .unwrap_or((CLOSE_NO_STATUS, String::new()));
                        break;
                    }
                    // ping replies are queued by tungstenite itself; pongs only refresh `last_seen`
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "websocket read failed");
                        break;
                    }
                }
            }

            // keepalive
            _ = next_tick(&mut ping_tick), if !closing => {
                if !write(&mut ws_tx, Message::Ping(Vec::new().into()), limits.write_timeout).await {
                    break;
                }
            }

            // peer went silent
            _ = sleep_until(read_deadline), if !closing => {
                tracing::warn!(timeout = ?limits.read_timeout, "no traffic from peer, dropping connection");
                break;
            }

            // peer never answered our close frame
            _ = sleep_until(close_deadline), if closing => {
                tracing::debug!("close handshake timed out");
                break;
            }
        }
    }

    // a dead peer may never drain the socket
    if timeout(CLOSE_GRACE, ws_tx.close()).await.is_err() {
        tracing::debug!("websocket close flush timed out");
    }
    drop(out_rx);
    tracing::debug!(code, reason = %reason, "websocket session ended");
    if ev_tx.send(TransportEvent::Closed { code, reason }).await.is_err() {
        tracing::debug!("event receiver gone before close was reported");
    }
}

/// Send one frame, bounded by `limit`. `false` means the session is over.
async fn write(ws_tx: &mut WsSink, msg: Message, limit: Option<Duration>) -> bool {
    let res = match limit {
        Some(limit) => match timeout(limit, ws_tx.send(msg)).await {
            Ok(res) => res,
            Err(_) => {
                tracing::warn!(timeout = ?limit, "websocket write timed out");
                return false;
            }
        },
        None => ws_tx.send(msg).await,
    };
    match res {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "websocket send failed");
            false
        }
    }
}

async fn next_tick(tick: &mut Option<Interval>) {
    match tick {
        Some(t) => {
            t.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

async fn sleep_until(at: Option<Instant>) {
    match at {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}
