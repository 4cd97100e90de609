//! Named-channel relay between a window and the host process.
//!
//! DESIGN
//! ======
//! The bridge knows nothing about payloads. Outbound calls become `Request`
//! frames; inbound frames are routed to the listener registered for their
//! channel. A reply is just an inbound frame on `<name>-callback`, so a
//! request/reply pair is a listener on the reply channel armed before the
//! request leaves.
//!
//! Each reply channel waits on one request at a time. The bridge remembers
//! the id of that request and drops replies whose `parent_id` names a
//! different one. A second request on a channel that is still waiting is
//! refused on the spot: its handler gets an `error` reply and the first
//! handler stays armed.
//!
//! When the transport goes away, listeners are never called. Callers treat
//! that silence differently from a reply carrying `error`.

#[cfg(test)]
#[path = "bridge_test.rs"]
mod bridge_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use frames::{CodecError, Frame, reply_channel};
use serde_json::{Value, json};

use crate::listeners::ListenerTable;

/// Outbound half of a host connection.
pub trait HostLink {
    /// Queue `frame` for the host. Returns `false` when the link is closed.
    fn send_frame(&self, frame: Frame) -> bool;
}

/// A link to no host at all. Every frame is refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct DetachedLink;

impl HostLink for DetachedLink {
    fn send_frame(&self, _frame: Frame) -> bool {
        false
    }
}

/// Error text handed to a request refused because its channel is busy.
pub const IN_FLIGHT_ERROR: &str = "request already in flight";

pub struct ChannelBridge {
    link: Rc<dyn HostLink>,
    listeners: ListenerTable<[Value]>,
    /// Reply channel -> id of the request it is waiting on.
    awaiting: RefCell<HashMap<String, String>>,
}

impl ChannelBridge {
    #[must_use]
    pub fn new(link: Rc<dyn HostLink>) -> Self {
        Self { link, listeners: ListenerTable::new(), awaiting: RefCell::new(HashMap::new()) }
    }

    /// Attach `handler` to `channel`, detaching any previous handler first.
    pub fn listen<F>(&self, channel: &str, handler: F)
    where
        F: FnMut(&[Value]) + 'static,
    {
        self.listeners.listen(channel, handler);
    }

    /// Detach the handler for `channel`.
    pub fn forget(&self, channel: &str) -> bool {
        self.awaiting.borrow_mut().remove(channel);
        self.listeners.remove(channel)
    }

    #[must_use]
    pub fn is_listening(&self, channel: &str) -> bool {
        self.listeners.contains(channel)
    }

    /// Fire-and-forget call toward the host.
    pub fn send(&self, channel: &str, args: Vec<Value>) {
        let frame = Frame::request(channel, args);
        if !self.link.send_frame(frame) {
            log::warn!("host link closed; dropped {channel}");
        }
    }

    /// Whether a `send_and_receive` on `channel` is still unanswered.
    #[must_use]
    pub fn is_awaiting(&self, channel: &str) -> bool {
        self.awaiting.borrow().contains_key(&reply_channel(channel))
    }

    /// Arm `handler` on `<channel>-callback`, then send the call.
    ///
    /// If `channel` is still waiting on an earlier reply, nothing is sent and
    /// `handler` is called at once with `{error: "request already in flight"}`.
    pub fn send_and_receive<F>(&self, channel: &str, mut handler: F, args: Vec<Value>)
    where
        F: FnMut(&[Value]) + 'static,
    {
        if self.is_awaiting(channel) {
            log::warn!("{channel} is still waiting for a reply; request refused");
            handler(&[json!({ "error": IN_FLIGHT_ERROR })]);
            return;
        }

        let reply = reply_channel(channel);
        self.listen(&reply, handler);
        let frame = Frame::request(channel, args);
        self.awaiting.borrow_mut().insert(reply.clone(), frame.id.clone());
        if !self.link.send_frame(frame) {
            log::warn!("host link closed; dropped {channel}");
            self.awaiting.borrow_mut().remove(&reply);
        }
    }

    /// Route an inbound frame to its channel listener. Returns whether a
    /// listener took it. A reply for a request other than the one its
    /// channel is waiting on is dropped.
    pub fn deliver(&self, frame: &Frame) -> bool {
        let expected = self.awaiting.borrow().get(&frame.channel).cloned();
        if let Some(expected) = expected {
            if frame.parent_id.as_deref() != Some(expected.as_str()) {
                log::warn!("dropping reply on {} that does not answer the pending request", frame.channel);
                return false;
            }
            self.awaiting.borrow_mut().remove(&frame.channel);
        }

        let taken = self.listeners.dispatch(&frame.channel, &frame.args);
        if !taken {
            log::debug!("no listener for {}", frame.channel);
        }
        taken
    }

    /// Decode and route one binary message from the host.
    ///
    /// # Errors
    ///
    /// Returns the codec error for malformed bytes; nothing is delivered.
    pub fn deliver_bytes(&self, bytes: &[u8]) -> Result<bool, CodecError> {
        let frame = frames::decode_frame(bytes)?;
        Ok(self.deliver(&frame))
    }
}
