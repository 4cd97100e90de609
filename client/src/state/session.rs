//! Non-durable per-window key/value store.
//!
//! DESIGN
//! ======
//! Entries are held as JSON text and written through on every mutation, so
//! a read always reflects the latest write from any window sharing the
//! store. Reading an absent entry yields `None` and never fails. Writing
//! `null` leaves a tombstone that reads back as absent.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::RefCell;
use std::collections::HashMap;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::state::identity::{Scene, SceneId, Token, User, UserData};

/// Entry names shared by every window.
pub mod keys {
    pub const USER_DATA: &str = "userData";
    pub const CURRENT_USERS: &str = "currentUsers";
    pub const CURRENT_SCENES: &str = "currentScenes";
    pub const CURRENT_SCENE_ID: &str = "currentSceneId";
    pub const CURRENT_TOKENS: &str = "currentTokens";
    pub const CURRENT_MESSAGES: &str = "currentMessages";
}

#[derive(Debug, Default)]
pub struct SessionStore {
    entries: RefCell<HashMap<String, String>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `key`. Absent entries and tombstones read as `None`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        let entries = self.entries.borrow();
        let raw = entries.get(key)?;
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(e) => {
                log::warn!("session entry {key} is not JSON: {e}");
                None
            }
        }
    }

    /// Typed read. A value of the wrong shape reads as absent.
    #[must_use]
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        match serde_json::from_value(value) {
            Ok(typed) => Some(typed),
            Err(e) => {
                log::debug!("session entry {key} has unexpected shape: {e}");
                None
            }
        }
    }

    /// Write `value`. `null` is stored as a tombstone.
    pub fn set(&self, key: &str, value: &Value) {
        self.entries.borrow_mut().insert(key.to_owned(), value.to_string());
    }

    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(value) => self.set(key, &value),
            Err(e) => log::warn!("session entry {key} not stored: {e}"),
        }
    }

    /// Shallow-merge `partial` over the current object (or `{}`), then write.
    /// A non-object `partial` replaces the entry.
    pub fn merge(&self, key: &str, partial: &Value) {
        let Value::Object(fields) = partial else {
            self.set(key, partial);
            return;
        };
        let mut base = match self.get(key) {
            Some(Value::Object(existing)) => existing,
            _ => Map::new(),
        };
        for (name, value) in fields {
            base.insert(name.clone(), value.clone());
        }
        self.set(key, &Value::Object(base));
    }

    pub fn remove(&self, key: &str) {
        self.entries.borrow_mut().remove(key);
    }

    // --- Typed entries ---

    #[must_use]
    pub fn user_data(&self) -> Option<UserData> {
        self.get_as(keys::USER_DATA)
    }

    #[must_use]
    pub fn current_users(&self) -> Vec<User> {
        self.get_as(keys::CURRENT_USERS).unwrap_or_default()
    }

    #[must_use]
    pub fn current_scenes(&self) -> Vec<Scene> {
        self.get_as(keys::CURRENT_SCENES).unwrap_or_default()
    }

    #[must_use]
    pub fn current_scene_id(&self) -> Option<SceneId> {
        self.get_as(keys::CURRENT_SCENE_ID)
    }

    #[must_use]
    pub fn current_tokens(&self) -> Vec<Token> {
        self.get_as(keys::CURRENT_TOKENS).unwrap_or_default()
    }
}
