//! Relay frame model and protobuf codec.
//!
//! Every message that crosses either relay hop (UI window ⇄ host, host ⇄
//! remote game server) is a [`Frame`]: a channel name, an ordered list of
//! JSON arguments, and an optional `parent_id` that ties a reply back to the
//! request that caused it. Arguments stay flexible (`serde_json::Value`) while
//! the frame itself travels as protobuf for compact binary transport.
//!
//! Replies are addressed by convention: a request on channel `login` is
//! answered on `login-callback` (see [`reply_channel`]).

pub mod channels;

use std::time::{SystemTime, UNIX_EPOCH};

use prost::Message;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Suffix appended to a channel name to form its reply channel.
pub const REPLY_SUFFIX: &str = "-callback";

/// Error returned by [`decode_frame`].
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The raw bytes could not be decoded as a protobuf `WireFrame`.
    #[error("failed to decode protobuf frame: {0}")]
    Decode(#[from] prost::DecodeError),
    /// The `status` integer on the wire does not map to a known [`Status`] variant.
    #[error("invalid frame status: {0}")]
    InvalidStatus(i32),
}

/// Role of a frame within the relay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// A named call. May or may not expect a reply.
    Request,
    /// Answer to an earlier request; `parent_id` names that request.
    Reply,
    /// Unsolicited event (status signal or server broadcast).
    Push,
}

impl Status {
    /// Convert status into wire enum integer value.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        match self {
            Self::Request => WireFrameStatus::Request as i32,
            Self::Reply => WireFrameStatus::Reply as i32,
            Self::Push => WireFrameStatus::Push as i32,
        }
    }

    /// Parse a status from wire enum integer value.
    fn from_i32(value: i32) -> Result<Self, CodecError> {
        match WireFrameStatus::try_from(value) {
            Ok(WireFrameStatus::Request) => Ok(Self::Request),
            Ok(WireFrameStatus::Reply) => Ok(Self::Reply),
            Ok(WireFrameStatus::Push) => Ok(Self::Push),
            Err(_) => Err(CodecError::InvalidStatus(value)),
        }
    }
}

/// A single message on either relay hop.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// Unique identifier for this frame (UUID string).
    pub id: String,
    /// ID of the request frame this is replying to, if any.
    pub parent_id: Option<String>,
    /// Milliseconds since the Unix epoch when the frame was created.
    pub ts: i64,
    /// Channel name, e.g. `"login"` or `"scene-data"`.
    pub channel: String,
    /// Role of the frame.
    pub status: Status,
    /// Ordered call arguments.
    pub args: Vec<Value>,
}

/// Reply channel paired with `channel`: `<channel>-callback`.
#[must_use]
pub fn reply_channel(channel: &str) -> String {
    format!("{channel}{REPLY_SUFFIX}")
}

/// Current time as milliseconds since Unix epoch.
fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(0)
}

impl Frame {
    fn new(channel: impl Into<String>, status: Status, args: Vec<Value>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            parent_id: None,
            ts: now_ms(),
            channel: channel.into(),
            status,
            args,
        }
    }

    /// Create a request frame on `channel`.
    pub fn request(channel: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(channel, Status::Request, args)
    }

    /// Create an unsolicited push frame on `channel`.
    pub fn push(channel: impl Into<String>, args: Vec<Value>) -> Self {
        Self::new(channel, Status::Push, args)
    }

    /// Create the reply to this frame. The reply travels on
    /// `<channel>-callback` and carries this frame's id as `parent_id`.
    #[must_use]
    pub fn reply(&self, args: Vec<Value>) -> Self {
        let mut frame = Self::new(reply_channel(&self.channel), Status::Reply, args);
        frame.parent_id = Some(self.id.clone());
        frame
    }

    /// First argument, if any.
    #[must_use]
    pub fn first_arg(&self) -> Option<&Value> {
        self.args.first()
    }

    /// First argument as a string slice, if it is one.
    #[must_use]
    pub fn first_str(&self) -> Option<&str> {
        self.first_arg().and_then(Value::as_str)
    }
}

/// Encode a frame into protobuf bytes.
#[must_use]
pub fn encode_frame(frame: &Frame) -> Vec<u8> {
    let wire = frame_to_wire(frame);

    let mut out = Vec::with_capacity(wire.encoded_len());
    // Encoding into a growable Vec<u8> cannot hit `BufferTooSmall`.
    wire.encode(&mut out).unwrap_or_default();
    out
}

/// Decode protobuf bytes into a frame.
///
/// # Errors
///
/// Returns [`CodecError::Decode`] for malformed bytes and
/// [`CodecError::InvalidStatus`] for out-of-range status values.
pub fn decode_frame(bytes: &[u8]) -> Result<Frame, CodecError> {
    let wire = WireFrame::decode(bytes)?;
    wire_to_frame(wire)
}

fn frame_to_wire(frame: &Frame) -> WireFrame {
    WireFrame {
        id: frame.id.clone(),
        parent_id: frame.parent_id.clone(),
        ts: frame.ts,
        channel: frame.channel.clone(),
        status: frame.status.as_i32(),
        args: frame.args.iter().map(json_to_proto_value).collect(),
    }
}

fn wire_to_frame(wire: WireFrame) -> Result<Frame, CodecError> {
    Ok(Frame {
        id: wire.id,
        parent_id: wire.parent_id,
        ts: wire.ts,
        channel: wire.channel,
        status: Status::from_i32(wire.status)?,
        args: wire.args.iter().map(proto_to_json_value).collect(),
    })
}

fn json_to_proto_value(value: &Value) -> prost_types::Value {
    let kind = match value {
        Value::Null => {
            prost_types::value::Kind::NullValue(prost_types::NullValue::NullValue as i32)
        }
        Value::Bool(v) => prost_types::value::Kind::BoolValue(*v),
        Value::Number(v) => prost_types::value::Kind::NumberValue(v.as_f64().unwrap_or(0.0)),
        Value::String(v) => prost_types::value::Kind::StringValue(v.clone()),
        Value::Array(v) => prost_types::value::Kind::ListValue(prost_types::ListValue {
            values: v.iter().map(json_to_proto_value).collect(),
        }),
        Value::Object(v) => prost_types::value::Kind::StructValue(prost_types::Struct {
            fields: v
                .iter()
                .map(|(k, v)| (k.clone(), json_to_proto_value(v)))
                .collect(),
        }),
    };

    prost_types::Value { kind: Some(kind) }
}

/// Integral numbers inside the exactly-representable range come back as
/// JSON integers so ids and flags (`master: 1`) keep their integer type.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn number_to_json(v: f64) -> Value {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if v.is_finite() && v.fract() == 0.0 && v.abs() <= MAX_EXACT {
        return Value::Number(serde_json::Number::from(v as i64));
    }
    serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number)
}

fn proto_to_json_value(value: &prost_types::Value) -> Value {
    let Some(kind) = &value.kind else {
        return Value::Null;
    };

    match kind {
        prost_types::value::Kind::NullValue(_) => Value::Null,
        prost_types::value::Kind::NumberValue(v) => number_to_json(*v),
        prost_types::value::Kind::StringValue(v) => Value::String(v.clone()),
        prost_types::value::Kind::BoolValue(v) => Value::Bool(*v),
        prost_types::value::Kind::StructValue(v) => Value::Object(
            v.fields
                .iter()
                .map(|(k, v)| (k.clone(), proto_to_json_value(v)))
                .collect(),
        ),
        prost_types::value::Kind::ListValue(v) => {
            Value::Array(v.values.iter().map(proto_to_json_value).collect())
        }
    }
}

#[derive(Clone, PartialEq, Message)]
struct WireFrame {
    #[prost(string, tag = "1")]
    id: String,
    #[prost(string, optional, tag = "2")]
    parent_id: Option<String>,
    #[prost(int64, tag = "3")]
    ts: i64,
    #[prost(string, tag = "4")]
    channel: String,
    #[prost(enumeration = "WireFrameStatus", tag = "5")]
    status: i32,
    #[prost(message, repeated, tag = "6")]
    args: Vec<prost_types::Value>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, prost::Enumeration)]
#[repr(i32)]
enum WireFrameStatus {
    Request = 0,
    Reply = 1,
    Push = 2,
}

#[cfg(test)]
#[path = "lib_test.rs"]
mod tests;
