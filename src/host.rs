//! Host actor: the single owner of all mutable host state.
//!
//! DESIGN
//! ======
//! UI connection tasks and remote transport tasks only forward events. The
//! actor drains both queues in one `select!` loop, hands each event to the
//! [`HostRouter`], and delivers the resulting signals to window queues.
//! Because nothing else mutates the router, no locking is needed.
//!
//! LIFECYCLE
//! =========
//! 1. A UI connection calls [`HostHandle::attach`] and gets a window id plus
//!    an outbound queue. The last connection status is replayed to it.
//! 2. Its frames go through [`HostHandle::send_frame`].
//! 3. On close it calls [`HostHandle::detach`].
//!
//! The loop ends when every handle is gone, or with an error when the
//! credential file cannot be used.

#[cfg(test)]
#[path = "host_test.rs"]
mod host_test;

use std::collections::HashMap;

use frames::Frame;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::credentials::CredentialStore;
use crate::error::HostError;
use crate::remote::{Connector, Generation, RemoteEvent};
use crate::router::{HostRouter, Signal, WindowId};

#[derive(Debug)]
pub enum HostEvent {
    Attach { window: WindowId, tx: mpsc::UnboundedSender<Frame> },
    Detach { window: WindowId },
    Frame { window: WindowId, frame: Frame },
    Connect { url: String },
}

/// Cloneable front door to the host actor.
#[derive(Debug, Clone)]
pub struct HostHandle {
    tx: mpsc::UnboundedSender<HostEvent>,
}

impl HostHandle {
    /// Register a new UI window. Returns `None` if the host has stopped.
    #[must_use]
    pub fn attach(&self) -> Option<(WindowId, mpsc::UnboundedReceiver<Frame>)> {
        let window = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.tx.send(HostEvent::Attach { window, tx }).ok()?;
        Some((window, rx))
    }

    pub fn detach(&self, window: WindowId) {
        if self.tx.send(HostEvent::Detach { window }).is_err() {
            debug!(%window, "host: detach after shutdown");
        }
    }

    /// Returns `false` if the host has stopped.
    pub fn send_frame(&self, window: WindowId, frame: Frame) -> bool {
        self.tx.send(HostEvent::Frame { window, frame }).is_ok()
    }

    /// Connect to a game server without a UI request, e.g. from config.
    pub fn connect(&self, url: impl Into<String>) -> bool {
        self.tx.send(HostEvent::Connect { url: url.into() }).is_ok()
    }
}

pub struct Host {
    router: HostRouter,
    ui_rx: mpsc::UnboundedReceiver<HostEvent>,
    remote_rx: mpsc::UnboundedReceiver<(Generation, RemoteEvent)>,
    windows: HashMap<WindowId, mpsc::UnboundedSender<Frame>>,
}

impl Host {
    #[must_use]
    pub fn new(connector: Box<dyn Connector>, credentials: CredentialStore) -> (Self, HostHandle) {
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (remote_tx, remote_rx) = mpsc::unbounded_channel();
        let host = Self {
            router: HostRouter::new(connector, credentials, remote_tx),
            ui_rx,
            remote_rx,
            windows: HashMap::new(),
        };
        (host, HostHandle { tx: ui_tx })
    }

    /// Run until every [`HostHandle`] is dropped.
    ///
    /// # Errors
    ///
    /// Returns the first credential file failure.
    pub async fn run(mut self) -> Result<(), HostError> {
        loop {
            tokio::select! {
                event = self.ui_rx.recv() => {
                    let Some(event) = event else { break };
                    self.on_ui_event(event)?;
                }
                Some((generation, event)) = self.remote_rx.recv() => {
                    let signals = self.router.on_remote_event(generation, event);
                    self.deliver(signals);
                }
            }
        }
        info!("host: all handles dropped, stopping");
        Ok(())
    }

    fn on_ui_event(&mut self, event: HostEvent) -> Result<(), HostError> {
        match event {
            HostEvent::Attach { window, tx } => {
                info!(%window, windows = self.windows.len() + 1, "host: window attached");
                if let Some(status) = self.router.last_status() {
                    if tx.send(status.clone()).is_err() {
                        return Ok(());
                    }
                }
                self.windows.insert(window, tx);
            }
            HostEvent::Detach { window } => {
                self.windows.remove(&window);
                info!(%window, windows = self.windows.len(), "host: window detached");
            }
            HostEvent::Frame { window, frame } => {
                let signals = self.router.on_ui_frame(window, frame)?;
                self.deliver(signals);
            }
            HostEvent::Connect { url } => {
                let signals = self.router.connect(&url);
                self.deliver(signals);
            }
        }
        Ok(())
    }

    fn deliver(&mut self, signals: Vec<Signal>) {
        for signal in signals {
            match signal {
                Signal::To { window, frame } => {
                    let Some(tx) = self.windows.get(&window) else {
                        debug!(%window, channel = %frame.channel, "host: reply for detached window");
                        continue;
                    };
                    if tx.send(frame).is_err() {
                        warn!(%window, "host: window queue closed");
                        self.windows.remove(&window);
                    }
                }
                Signal::All(frame) => {
                    self.windows.retain(|window, tx| {
                        let open = tx.send(frame.clone()).is_ok();
                        if !open {
                            warn!(%window, "host: window queue closed");
                        }
                        open
                    });
                }
            }
        }
    }
}
