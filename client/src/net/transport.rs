//! Queue-backed [`HostLink`] feeding the socket task.

#[cfg(test)]
#[path = "transport_test.rs"]
mod transport_test;

use frames::Frame;
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::net::bridge::HostLink;

/// Encodes frames onto an unbounded queue drained by the socket loop.
#[derive(Clone)]
pub struct ChannelTransport {
    tx: UnboundedSender<Vec<u8>>,
}

impl ChannelTransport {
    /// Create a transport and the receiver its socket loop should drain.
    #[must_use]
    pub fn channel() -> (Self, UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded();
        (Self { tx }, rx)
    }
}

impl HostLink for ChannelTransport {
    fn send_frame(&self, frame: Frame) -> bool {
        self.tx.unbounded_send(frames::encode_frame(&frame)).is_ok()
    }
}
