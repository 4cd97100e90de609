//! Socket.IO transport to the remote game server.
//!
//! One task per [`WsConnector::connect`] call. The task dials the server's
//! Socket.IO websocket endpoint, joins the default namespace, and pumps
//! events both ways while connected. After a failure it redials with
//! exponential backoff until its socket handle asks it to stop.
//!
//! LIFECYCLE
//! =========
//! A dial only counts as connected once the namespace connect (`40`) is
//! answered. Anything that ends the attempt before that is a connect error.
//! Acknowledged emits get a fresh ack id per session. When a session ends
//! with acks outstanding, each waiting request is answered with
//! [`CONNECTION_LOST_ERROR`] before `Disconnected` is reported.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use std::collections::HashMap;
use std::time::Duration;

use frames::Frame;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use serde_json::json;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use super::socketio::{self, EnginePacket, PONG, SocketPacket};
use super::{CONNECTION_LOST_ERROR, Connector, RemoteEvent, RemoteEventSink, RemoteSocket};
use crate::config::TransportConfig;

/// How long a fresh websocket may take to finish the Socket.IO handshake.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(20);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

// =============================================================================
// BACKOFF
// =============================================================================

/// Doubling reconnect delay, capped, with random jitter on top.
#[derive(Debug, Clone)]
pub struct Backoff {
    config: TransportConfig,
    next_ms: u64,
}

impl Backoff {
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self { config, next_ms: config.initial_backoff_ms }
    }

    /// Base delay of the next wait, before jitter.
    #[must_use]
    pub fn next_base_ms(&self) -> u64 {
        self.next_ms
    }

    pub fn reset(&mut self) {
        self.next_ms = self.config.initial_backoff_ms;
    }

    pub fn next_delay(&mut self) -> Duration {
        let base = self.next_ms;
        self.next_ms = base.saturating_mul(2).min(self.config.max_backoff_ms);
        let jitter = if self.config.jitter_ms == 0 { 0 } else { rand::rng().random_range(0..=self.config.jitter_ms) };
        Duration::from_millis(base.saturating_add(jitter))
    }
}

// =============================================================================
// CONNECTOR
// =============================================================================

/// Opens real Socket.IO transports. Must be used inside a tokio runtime.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector {
    config: TransportConfig,
}

impl WsConnector {
    #[must_use]
    pub fn new(config: TransportConfig) -> Self {
        Self { config }
    }
}

impl Connector for WsConnector {
    fn connect(&self, url: &str, sink: RemoteEventSink) -> Box<dyn RemoteSocket> {
        let (tx, rx) = mpsc::unbounded_channel();
        let (stop, stop_rx) = watch::channel(false);
        tokio::spawn(run_transport(socketio::socketio_url(url), self.config, sink, rx, stop_rx));
        Box::new(WsSocket { tx, stop })
    }
}

struct Outbound {
    frame: Frame,
    ack: bool,
}

/// Handle to a running transport task. Dropping it stops the task.
pub struct WsSocket {
    tx: mpsc::UnboundedSender<Outbound>,
    stop: watch::Sender<bool>,
}

impl RemoteSocket for WsSocket {
    fn send(&self, frame: Frame) -> bool {
        self.tx.send(Outbound { frame, ack: false }).is_ok()
    }

    fn send_with_ack(&self, frame: Frame) -> bool {
        self.tx.send(Outbound { frame, ack: true }).is_ok()
    }

    fn disconnect(&self) {
        self.stop.send_replace(true);
    }
}

impl Drop for WsSocket {
    fn drop(&mut self) {
        self.disconnect();
    }
}

// =============================================================================
// TRANSPORT TASK
// =============================================================================

enum SessionEnd {
    /// The socket handle asked the task to stop, or the host went away.
    Stopped,
    /// The attempt ended before the namespace connect was answered.
    Refused(String),
    /// An established session ended.
    Closed(String),
}

async fn run_transport(
    url: String,
    config: TransportConfig,
    sink: RemoteEventSink,
    mut outbound: mpsc::UnboundedReceiver<Outbound>,
    mut stop: watch::Receiver<bool>,
) {
    let generation = sink.generation();
    let mut backoff = Backoff::new(config);

    loop {
        if *stop.borrow() {
            break;
        }

        let attempt = tokio::select! {
            attempt = connect_async(url.as_str()) => attempt,
            _ = stop.changed() => break,
        };

        let end = match attempt {
            Ok((stream, _)) => {
                debug!(%url, generation, "remote transport: websocket open");
                let mut session = Session::new(stream, &sink);
                session.run(&mut outbound, &mut stop, &mut backoff).await
            }
            Err(e) => SessionEnd::Refused(e.to_string()),
        };

        let reported = match end {
            SessionEnd::Stopped => break,
            SessionEnd::Refused(reason) => {
                debug!(%url, generation, error = %reason, "remote transport: connect failed");
                sink.emit(RemoteEvent::ConnectError(reason))
            }
            SessionEnd::Closed(reason) => sink.emit(RemoteEvent::Disconnected(reason)),
        };
        if !reported {
            break;
        }

        let delay = backoff.next_delay();
        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            _ = stop.changed() => break,
        }
    }

    debug!(generation, "remote transport: stopped");
}

/// One websocket connection, from open packet to close.
struct Session<'a> {
    stream: WsStream,
    sink: &'a RemoteEventSink,
    connected: bool,
    next_ack: u64,
    acks: HashMap<u64, Frame>,
    deadline: Instant,
    ping_window: Duration,
}

impl<'a> Session<'a> {
    fn new(stream: WsStream, sink: &'a RemoteEventSink) -> Self {
        Self {
            stream,
            sink,
            connected: false,
            next_ack: 0,
            acks: HashMap::new(),
            deadline: Instant::now() + HANDSHAKE_TIMEOUT,
            ping_window: HANDSHAKE_TIMEOUT,
        }
    }

    async fn run(
        &mut self,
        outbound: &mut mpsc::UnboundedReceiver<Outbound>,
        stop: &mut watch::Receiver<bool>,
        backoff: &mut Backoff,
    ) -> SessionEnd {
        let end = loop {
            let step = tokio::select! {
                msg = self.stream.next() => match msg {
                    None => Err("stream ended".to_owned()),
                    Some(Err(e)) => Err(e.to_string()),
                    Some(Ok(Message::Text(text))) => self.on_text(text.as_str(), backoff).await,
                    Some(Ok(Message::Close(_))) => Err("closed by server".to_owned()),
                    Some(Ok(_)) => Ok(true),
                },
                Some(out) = outbound.recv(), if self.connected => self.emit(out).await,
                () = tokio::time::sleep_until(self.deadline) => Err("ping timeout".to_owned()),
                _ = stop.changed() => {
                    if let Err(e) = self.stream.close(None).await {
                        debug!(error = %e, "remote transport: close failed");
                    }
                    break SessionEnd::Stopped;
                }
            };
            match step {
                Ok(true) => {}
                Ok(false) => break SessionEnd::Stopped,
                Err(reason) if self.connected => break SessionEnd::Closed(reason),
                Err(reason) => break SessionEnd::Refused(reason),
            }
        };

        if matches!(end, SessionEnd::Closed(_)) && !self.fail_outstanding_acks() {
            return SessionEnd::Stopped;
        }
        end
    }

    /// Handle one inbound text message. `Ok(false)` means the host is gone.
    async fn on_text(&mut self, text: &str, backoff: &mut Backoff) -> Result<bool, String> {
        let packet = match socketio::decode_engine(text) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "remote transport: undecodable packet");
                return Ok(true);
            }
        };

        match packet {
            EnginePacket::Open(handshake) => {
                self.ping_window = Duration::from_millis(handshake.ping_interval + handshake.ping_timeout);
                self.deadline = Instant::now() + self.ping_window;
                self.write(socketio::encode(&SocketPacket::Connect)).await?;
                Ok(true)
            }
            EnginePacket::Ping => {
                self.deadline = Instant::now() + self.ping_window;
                self.write(PONG.to_owned()).await?;
                Ok(true)
            }
            EnginePacket::Close => Err("closed by server".to_owned()),
            EnginePacket::Message(body) => self.on_socket_packet(&body, backoff),
            EnginePacket::Pong | EnginePacket::Upgrade | EnginePacket::Noop => Ok(true),
        }
    }

    fn on_socket_packet(&mut self, body: &str, backoff: &mut Backoff) -> Result<bool, String> {
        let packet = match socketio::decode_socket(body) {
            Ok(packet) => packet,
            Err(e) => {
                warn!(error = %e, "remote transport: unsupported packet");
                return Ok(true);
            }
        };

        match packet {
            SocketPacket::Connect => {
                info!(generation = self.sink.generation(), "remote transport: connected");
                self.connected = true;
                backoff.reset();
                Ok(self.sink.emit(RemoteEvent::Connected))
            }
            SocketPacket::ConnectError(message) => Err(message),
            SocketPacket::Disconnect => Err("disconnected by server".to_owned()),
            SocketPacket::Event { name, args, ack } => {
                if ack.is_some() {
                    debug!(%name, "remote transport: server asked for an ack; not sent");
                }
                Ok(self.sink.emit(RemoteEvent::Frame(Frame::push(name, args))))
            }
            SocketPacket::Ack { id, args } => match self.acks.remove(&id) {
                Some(request) => Ok(self.sink.emit(RemoteEvent::Frame(request.reply(args)))),
                None => {
                    debug!(id, "remote transport: ack for unknown id");
                    Ok(true)
                }
            },
        }
    }

    async fn emit(&mut self, out: Outbound) -> Result<bool, String> {
        let ack = out.ack.then(|| {
            let id = self.next_ack;
            self.next_ack += 1;
            id
        });
        let text = socketio::encode(&SocketPacket::Event {
            name: out.frame.channel.clone(),
            args: out.frame.args.clone(),
            ack,
        });
        if let Some(id) = ack {
            self.acks.insert(id, out.frame);
        }
        self.write(text).await?;
        Ok(true)
    }

    async fn write(&mut self, text: String) -> Result<(), String> {
        self.stream.send(Message::Text(text.into())).await.map_err(|e| {
            warn!(error = %e, "remote transport: send failed");
            e.to_string()
        })
    }

    /// Answer every request still waiting on this session. Returns `false`
    /// if the host is gone.
    fn fail_outstanding_acks(&mut self) -> bool {
        let mut ids: Vec<u64> = self.acks.keys().copied().collect();
        ids.sort_unstable();
        for id in ids {
            if let Some(request) = self.acks.remove(&id) {
                let reply = request.reply(vec![json!({ "error": CONNECTION_LOST_ERROR })]);
                if !self.sink.emit(RemoteEvent::Frame(reply)) {
                    return false;
                }
            }
        }
        true
    }
}
