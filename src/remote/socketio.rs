//! Socket.IO v5 over Engine.IO v4, text packets only.
//!
//! WIRE FORMAT
//! ===========
//! Every websocket text message is one Engine.IO packet: a type digit and
//! an optional payload. `0` opens the session with a JSON handshake, `2`/`3`
//! are ping/pong, `4` carries one Socket.IO packet. A Socket.IO packet is a
//! type digit, an optional namespace (`/name,`), an optional ack id, and an
//! optional JSON payload:
//!
//! ```text
//! 40                          connect the default namespace
//! 42["login","gm","pw"]       event, no ack wanted
//! 4217["login","gm","pw"]     event, ack id 17
//! 4317[{"result":{}}]         ack 17 with its arguments
//! 44{"message":"nope"}        namespace refused
//! ```
//!
//! Only the default namespace is spoken. Binary packets are rejected.

#[cfg(test)]
#[path = "socketio_test.rs"]
mod socketio_test;

use serde::Deserialize;
use serde_json::Value;

/// Query that selects Engine.IO v4 over a plain websocket.
pub const HANDSHAKE_QUERY: &str = "EIO=4&transport=websocket";

/// Engine.IO pong, the answer to a server ping.
pub const PONG: &str = "3";

#[derive(Debug, thiserror::Error)]
pub enum PacketError {
    #[error("empty packet")]
    Empty,
    #[error("unknown packet type {0:?}")]
    UnknownType(char),
    #[error("binary packets are not supported")]
    Binary,
    #[error("packet for namespace {0}")]
    Namespace(String),
    #[error("malformed packet: {0}")]
    Malformed(&'static str),
    #[error("bad packet payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// Session parameters from the Engine.IO open packet.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Handshake {
    pub sid: String,
    pub ping_interval: u64,
    pub ping_timeout: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnginePacket {
    Open(Handshake),
    Close,
    Ping,
    Pong,
    Message(String),
    Upgrade,
    Noop,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SocketPacket {
    Connect,
    Disconnect,
    Event { name: String, args: Vec<Value>, ack: Option<u64> },
    Ack { id: u64, args: Vec<Value> },
    ConnectError(String),
}

/// Split one websocket text message into its Engine.IO packet.
///
/// # Errors
///
/// [`PacketError`] for an empty or unknown packet, or a bad handshake.
pub fn decode_engine(text: &str) -> Result<EnginePacket, PacketError> {
    let mut chars = text.chars();
    let kind = chars.next().ok_or(PacketError::Empty)?;
    let body = chars.as_str();
    Ok(match kind {
        '0' => EnginePacket::Open(serde_json::from_str(body)?),
        '1' => EnginePacket::Close,
        '2' => EnginePacket::Ping,
        '3' => EnginePacket::Pong,
        '4' => EnginePacket::Message(body.to_owned()),
        '5' => EnginePacket::Upgrade,
        '6' => EnginePacket::Noop,
        other => return Err(PacketError::UnknownType(other)),
    })
}

/// Parse the Socket.IO packet inside an Engine.IO message.
///
/// # Errors
///
/// [`PacketError`] for binary packets, other namespaces, and payloads that
/// do not fit the packet type.
pub fn decode_socket(body: &str) -> Result<SocketPacket, PacketError> {
    let mut chars = body.chars();
    let kind = chars.next().ok_or(PacketError::Empty)?;
    let mut rest = chars.as_str();

    if rest.starts_with('/') {
        let (namespace, tail) = rest.split_once(',').unwrap_or((rest, ""));
        if namespace != "/" {
            return Err(PacketError::Namespace(namespace.to_owned()));
        }
        rest = tail;
    }

    let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
    let (id, payload) = rest.split_at(digits);
    let id = if id.is_empty() { None } else { Some(id.parse::<u64>().map_err(|_| PacketError::Malformed("ack id"))?) };

    match kind {
        '0' => Ok(SocketPacket::Connect),
        '1' => Ok(SocketPacket::Disconnect),
        '2' => {
            let mut items = json_array(payload)?.into_iter();
            let Some(Value::String(name)) = items.next() else {
                return Err(PacketError::Malformed("event without a name"));
            };
            Ok(SocketPacket::Event { name, args: items.collect(), ack: id })
        }
        '3' => {
            let id = id.ok_or(PacketError::Malformed("ack without an id"))?;
            Ok(SocketPacket::Ack { id, args: json_array(payload)? })
        }
        '4' => {
            let message = match serde_json::from_str::<Value>(payload).unwrap_or(Value::Null) {
                Value::Object(map) => map.get("message").and_then(Value::as_str).unwrap_or("connect error").to_owned(),
                Value::String(message) => message,
                _ => "connect error".to_owned(),
            };
            Ok(SocketPacket::ConnectError(message))
        }
        '5' | '6' => Err(PacketError::Binary),
        other => Err(PacketError::UnknownType(other)),
    }
}

fn json_array(payload: &str) -> Result<Vec<Value>, PacketError> {
    match serde_json::from_str(payload)? {
        Value::Array(items) => Ok(items),
        _ => Err(PacketError::Malformed("payload is not an array")),
    }
}

/// Full websocket text for a Socket.IO packet, Engine.IO prefix included.
#[must_use]
pub fn encode(packet: &SocketPacket) -> String {
    match packet {
        SocketPacket::Connect => "40".to_owned(),
        SocketPacket::Disconnect => "41".to_owned(),
        SocketPacket::Event { name, args, ack } => {
            let mut items = Vec::with_capacity(args.len() + 1);
            items.push(Value::String(name.clone()));
            items.extend(args.iter().cloned());
            let ack = ack.map(|id| id.to_string()).unwrap_or_default();
            format!("42{ack}{}", Value::Array(items))
        }
        SocketPacket::Ack { id, args } => format!("43{id}{}", Value::Array(args.clone())),
        SocketPacket::ConnectError(message) => format!("44{}", serde_json::json!({ "message": message })),
    }
}

/// Turn a user-entered server address into its Socket.IO websocket endpoint.
///
/// `http`/`https` become `ws`/`wss` and a bare `host:port` gets `ws://`. The
/// default `/socket.io/` path is used unless the address names one.
#[must_use]
pub fn socketio_url(server_url: &str) -> String {
    let trimmed = server_url.trim().trim_end_matches('/');
    let base = if let Some(rest) = trimmed.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if let Some(rest) = trimmed.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
        trimmed.to_owned()
    } else {
        format!("ws://{trimmed}")
    };

    if base.ends_with("/socket.io") {
        format!("{base}/?{HANDSHAKE_QUERY}")
    } else {
        format!("{base}/socket.io/?{HANDSHAKE_QUERY}")
    }
}
