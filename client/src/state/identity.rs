//! Identity and roster records cached in the session store.

#[cfg(test)]
#[path = "identity_test.rs"]
mod identity_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::session::SessionStore;

/// The local login, as cached in `userData`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected: Option<bool>,
}

/// One token of the loaded scene, as cached in `currentTokens`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub id: String,
    pub name: String,
    /// Texture of the token's material, relative to the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// One roster entry from `current-users`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub connected: bool,
    /// `1` for the game master.
    #[serde(default)]
    pub master: i64,
}

impl User {
    #[must_use]
    pub fn is_master(&self) -> bool {
        self.master == 1
    }
}

/// Scene ids arrive as numbers from some servers and strings from others.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SceneId {
    Int(i64),
    Text(String),
}

impl SceneId {
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(n) => Value::from(*n),
            Self::Text(s) => Value::from(s.as_str()),
        }
    }

    /// Read an id out of a JSON value; other shapes yield `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Int),
            Value::String(s) => Some(Self::Text(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for SceneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for SceneId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for SceneId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// One scene as listed in `currentScenes`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scene {
    pub id: SceneId,
    #[serde(default)]
    pub name: String,
    /// Serialized graph, when the listing carries it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
}

/// Case-insensitive user id comparison.
#[must_use]
pub fn ids_match(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

/// Whether the local identity is the game master in the cached roster.
///
/// The roster lookup is the only source of truth; no flag is cached.
#[must_use]
pub fn is_master(session: &SessionStore) -> bool {
    let Some(local_id) = session.user_data().and_then(|u| u.id) else {
        return false;
    };
    session
        .current_users()
        .iter()
        .find(|user| ids_match(&user.id, &local_id))
        .is_some_and(User::is_master)
}
