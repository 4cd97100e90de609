//! Classification of reply and status payloads.
//!
//! A remote rejection is data, never an exception: a reply whose first
//! argument carries a non-null `error` field is [`Reply::Rejected`].

#[cfg(test)]
#[path = "reply_test.rs"]
mod reply_test;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum Reply {
    /// The first reply argument, or `null` when the reply had none.
    Ok(Value),
    Rejected(String),
}

impl Reply {
    #[must_use]
    pub fn from_args(args: &[Value]) -> Self {
        let payload = args.first().cloned().unwrap_or(Value::Null);
        match payload.get("error") {
            None | Some(Value::Null) => Self::Ok(payload),
            Some(Value::String(message)) => Self::Rejected(message.clone()),
            Some(other) => Self::Rejected(other.to_string()),
        }
    }

    /// The `result` object of an accepted reply.
    #[must_use]
    pub fn result(&self) -> Option<&Value> {
        match self {
            Self::Ok(payload) => payload.get("result"),
            Self::Rejected(_) => None,
        }
    }

    #[must_use]
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected(_))
    }
}

/// Payload of `initial-server-status` and `server-status`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ServerStatus {
    pub const CONNECTED: &'static str = "connected";
    pub const ERROR: &'static str = "error";

    #[must_use]
    pub fn connected() -> Self {
        Self { status: Self::CONNECTED.to_owned(), error: None }
    }

    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self { status: Self::ERROR.to_owned(), error: Some(message.into()) }
    }

    /// Parse the first argument of a status signal.
    #[must_use]
    pub fn from_args(args: &[Value]) -> Option<Self> {
        args.first().and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.status == Self::CONNECTED
    }
}
