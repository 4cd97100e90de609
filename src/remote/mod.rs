//! Connection to the remote game server.
//!
//! DESIGN
//! ======
//! [`RemoteLink`] is plain state: it owns the current socket handle, the
//! pending acknowledgements, and the first-connect flag. Transport tasks
//! never touch it. They push `(generation, event)` pairs into a queue that
//! the host actor drains and feeds back through [`RemoteLink::on_event`],
//! which returns what should be relayed to the UI.
//!
//! Every new transport gets a fresh generation. Events stamped with an older
//! generation come from a replaced or abandoned transport and are dropped.
//!
//! STATUS SIGNALS
//! ==============
//! Until the first successful connect, connection outcomes go out on
//! `initial-server-status` (the blocking connect screen). A failure there
//! also disconnects the transport, so the user decides when to retry.
//! After that, outcomes go out on `server-status` and the transport keeps
//! reconnecting on its own. `reset` and `logout` return to the initial mode.


pub mod socketio;
pub mod transport;

use std::collections::HashMap;

use frames::{Frame, Status, channels};
use serde_json::{Value, json};
use tokio::sync::mpsc;

/// Transport instance counter.
pub type Generation = u64;

/// Message shown to the user when a connect attempt fails.
pub const CONNECT_ERROR_MESSAGE: &str = "Failed to connect to the server";

/// Server pushes relayed to every UI window unchanged.
pub const RELAYED_PUSHES: [&str; 3] = [channels::CURRENT_USERS, channels::SCENE_DATA, channels::CURRENT_MESSAGES];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Error(String),
}

/// What a transport reports back to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteEvent {
    Connected,
    ConnectError(String),
    Frame(Frame),
    /// An established connection dropped. The transport is reconnecting.
    Disconnected(String),
}

/// Handle a transport uses to report events for its own generation.
#[derive(Debug, Clone)]
pub struct RemoteEventSink {
    generation: Generation,
    tx: mpsc::UnboundedSender<(Generation, RemoteEvent)>,
}

impl RemoteEventSink {
    #[must_use]
    pub fn new(generation: Generation, tx: mpsc::UnboundedSender<(Generation, RemoteEvent)>) -> Self {
        Self { generation, tx }
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Returns `false` once the host has stopped listening.
    pub fn emit(&self, event: RemoteEvent) -> bool {
        self.tx.send((self.generation, event)).is_ok()
    }
}

/// Outbound half of one transport instance.
pub trait RemoteSocket: Send {
    /// Queue a frame for the server. Frames queued while the transport is
    /// reconnecting go out once it is connected again. Returns `false` if
    /// the transport has stopped.
    fn send(&self, frame: Frame) -> bool;

    /// Like [`send`](Self::send), but the server is asked to acknowledge.
    /// The acknowledgement comes back as a `Reply` frame to `frame`. If the
    /// connection drops first, that reply carries [`CONNECTION_LOST_ERROR`].
    fn send_with_ack(&self, frame: Frame) -> bool;

    /// Stop the transport, including any reconnect loop.
    fn disconnect(&self);
}

/// Opens transports. Swapped for an in-memory fake in tests.
pub trait Connector: Send {
    fn connect(&self, url: &str, sink: RemoteEventSink) -> Box<dyn RemoteSocket>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    #[error("not connected")]
    NotConnected,
    #[error("request already in flight")]
    InFlight,
}

/// Error handed to a request whose transport went away before the ack.
pub const CONNECTION_LOST_ERROR: &str = "connection lost";

/// Something [`RemoteLink::on_event`] wants delivered to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkOutput<O> {
    /// Connection status on `initial-server-status` or `server-status`.
    Status { channel: &'static str, payload: Value },
    /// The server acknowledged a request made on behalf of `origin`.
    Ack { origin: O, args: Vec<Value> },
    /// A server push for every window.
    Broadcast { channel: String, args: Vec<Value> },
}

#[derive(Debug)]
struct Pending<O> {
    request_id: String,
    origin: O,
}

/// Remote connection state. `O` identifies who is waiting on an ack.
pub struct RemoteLink<O> {
    connector: Box<dyn Connector>,
    socket: Option<Box<dyn RemoteSocket>>,
    generation: Generation,
    first_connect: bool,
    state: ConnectionState,
    pending: HashMap<String, Pending<O>>,
    events: mpsc::UnboundedSender<(Generation, RemoteEvent)>,
}

impl<O> RemoteLink<O> {
    #[must_use]
    pub fn new(connector: Box<dyn Connector>, events: mpsc::UnboundedSender<(Generation, RemoteEvent)>) -> Self {
        Self {
            connector,
            socket: None,
            generation: 0,
            first_connect: false,
            state: ConnectionState::Disconnected,
            pending: HashMap::new(),
            events,
        }
    }

    #[must_use]
    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    #[must_use]
    pub fn generation(&self) -> Generation {
        self.generation
    }

    #[must_use]
    pub fn has_connected(&self) -> bool {
        self.first_connect
    }

    #[must_use]
    pub fn is_pending(&self, channel: &str) -> bool {
        self.pending.contains_key(channel)
    }

    /// Open a transport to `url`, replacing and stopping any current one.
    /// Requests still waiting on the old transport are answered with
    /// [`CONNECTION_LOST_ERROR`].
    #[must_use]
    pub fn connect(&mut self, url: &str) -> Vec<LinkOutput<O>> {
        self.drop_socket();
        let abandoned = self.discard_pending("transport replaced");
        self.state = ConnectionState::Connecting;

        let sink = RemoteEventSink::new(self.generation, self.events.clone());
        tracing::info!(%url, generation = self.generation, "remote: connecting");
        self.socket = Some(self.connector.connect(url, sink));
        abandoned
    }

    /// Return to first-connect mode. The transport is left alone.
    pub fn reset(&mut self) {
        self.first_connect = false;
    }

    /// Fire-and-forget emit. Returns `false` if there is no transport.
    pub fn emit(&self, channel: &str, args: Vec<Value>) -> bool {
        let Some(socket) = &self.socket else {
            tracing::warn!(channel, "remote: emit without a connection");
            return false;
        };
        socket.send(Frame::request(channel, args))
    }

    /// Emit and remember `origin` until the server acknowledges.
    ///
    /// # Errors
    ///
    /// [`EmitError::NotConnected`] without a live transport,
    /// [`EmitError::InFlight`] while an earlier request on `channel` is
    /// still unanswered.
    pub fn emit_with_reply(&mut self, channel: &str, args: Vec<Value>, origin: O) -> Result<(), EmitError> {
        let Some(socket) = &self.socket else {
            return Err(EmitError::NotConnected);
        };
        if self.pending.contains_key(channel) {
            return Err(EmitError::InFlight);
        }

        let frame = Frame::request(channel, args);
        let request_id = frame.id.clone();
        if !socket.send_with_ack(frame) {
            return Err(EmitError::NotConnected);
        }
        self.pending.insert(channel.to_owned(), Pending { request_id, origin });
        Ok(())
    }

    /// Apply a transport event and return what the UI should hear about it.
    pub fn on_event(&mut self, generation: Generation, event: RemoteEvent) -> Vec<LinkOutput<O>> {
        if generation != self.generation || self.socket.is_none() {
            tracing::debug!(generation, current = self.generation, "remote: dropping stale event");
            return Vec::new();
        }

        match event {
            RemoteEvent::Connected => {
                self.state = ConnectionState::Connected;
                tracing::info!(generation, "remote: connected");
                let channel = self.status_channel();
                self.first_connect = true;
                vec![LinkOutput::Status { channel, payload: json!({ "status": "connected" }) }]
            }
            RemoteEvent::ConnectError(message) => {
                tracing::warn!(error = %message, generation, "remote: connect failed");
                self.state = ConnectionState::Error(message);
                let mut outputs = self.discard_pending("connect error");
                let channel = self.status_channel();
                if !self.first_connect {
                    self.drop_socket();
                }
                outputs.push(LinkOutput::Status {
                    channel,
                    payload: json!({ "status": "error", "error": CONNECT_ERROR_MESSAGE }),
                });
                outputs
            }
            RemoteEvent::Disconnected(reason) => {
                tracing::info!(%reason, generation, "remote: disconnected, reconnecting");
                self.state = ConnectionState::Connecting;
                Vec::new()
            }
            RemoteEvent::Frame(frame) => self.on_frame(frame).into_iter().collect(),
        }
    }

    fn on_frame(&mut self, frame: Frame) -> Option<LinkOutput<O>> {
        match frame.status {
            Status::Reply => {
                let name = frame.channel.strip_suffix(frames::REPLY_SUFFIX)?;
                let matches = self
                    .pending
                    .get(name)
                    .is_some_and(|p| frame.parent_id.as_deref() == Some(p.request_id.as_str()));
                if !matches {
                    tracing::debug!(channel = %frame.channel, "remote: reply with no pending request");
                    return None;
                }
                let pending = self.pending.remove(name)?;
                Some(LinkOutput::Ack { origin: pending.origin, args: frame.args })
            }
            Status::Push | Status::Request => {
                if !RELAYED_PUSHES.contains(&frame.channel.as_str()) {
                    tracing::debug!(channel = %frame.channel, "remote: ignoring unrelayed push");
                    return None;
                }
                Some(LinkOutput::Broadcast { channel: frame.channel, args: frame.args })
            }
        }
    }

    fn status_channel(&self) -> &'static str {
        if self.first_connect { channels::SERVER_STATUS } else { channels::INITIAL_SERVER_STATUS }
    }

    /// Stop the current transport and fence off its events.
    fn drop_socket(&mut self) {
        if let Some(socket) = self.socket.take() {
            socket.disconnect();
        }
        self.generation += 1;
    }

    /// Drop every pending ack, answering each waiter with an error.
    fn discard_pending(&mut self, reason: &str) -> Vec<LinkOutput<O>> {
        if self.pending.is_empty() {
            return Vec::new();
        }
        let names: Vec<&str> = self.pending.keys().map(String::as_str).collect();
        tracing::warn!(channels = ?names, reason, "remote: discarding pending acknowledgements");
        self.pending
            .drain()
            .map(|(_, pending)| LinkOutput::Ack {
                origin: pending.origin,
                args: vec![json!({ "error": CONNECTION_LOST_ERROR })],
            })
            .collect()
    }
}
