//! Channel routing between UI windows and the remote server.
//!
//! DESIGN
//! ======
//! Handlers here are synchronous and never touch a socket. Each returns the
//! [`Signal`]s to deliver, and the host actor owns the delivery. A channel
//! is routed one of three ways:
//!
//! - emit-with-reply: forwarded to the remote; the acknowledgement comes back
//!   to the requesting window on `<channel>-callback`.
//! - emit: forwarded to the remote, nothing comes back.
//! - local: answered by the host itself.

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;

use frames::{Frame, channels};
use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::credentials::CredentialStore;
use crate::error::HostError;
use crate::remote::{Connector, Generation, LinkOutput, RemoteEvent, RemoteLink};

/// One attached UI window connection.
pub type WindowId = Uuid;

/// A frame on its way to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum Signal {
    To { window: WindowId, frame: Frame },
    All(Frame),
}

/// Who asked for an acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub window: WindowId,
    pub request: Frame,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    EmitWithReply,
    Emit,
    Local,
}

/// Routing for a UI channel, `None` if the host does not know it.
#[must_use]
pub fn route(channel: &str) -> Option<Route> {
    match channel {
        channels::LOGIN
        | channels::PASSWORD_RESET
        | channels::USER_SAVE
        | channels::SCENE_SAVE
        | channels::SCENE_CREATE
        | channels::SET_MY_SCENE
        | channels::GET_MAPS => Some(Route::EmitWithReply),
        channels::SET_CURRENT_SCENE | channels::SCENE_UPDATE | channels::GET_SCENE | channels::MESSAGE => {
            Some(Route::Emit)
        }
        channels::CONNECT_TO_SERVER
        | channels::RESET
        | channels::LOGOUT
        | channels::SAVE_USER_DATA
        | channels::INITIAL_DATA => Some(Route::Local),
        _ => None,
    }
}

pub struct HostRouter {
    link: RemoteLink<Origin>,
    credentials: CredentialStore,
    last_status: Option<Frame>,
}

impl HostRouter {
    #[must_use]
    pub fn new(
        connector: Box<dyn Connector>,
        credentials: CredentialStore,
        events: mpsc::UnboundedSender<(Generation, RemoteEvent)>,
    ) -> Self {
        Self { link: RemoteLink::new(connector, events), credentials, last_status: None }
    }

    #[must_use]
    pub fn link(&self) -> &RemoteLink<Origin> {
        &self.link
    }

    /// Most recent connection status, for windows that attach late.
    #[must_use]
    pub fn last_status(&self) -> Option<&Frame> {
        self.last_status.as_ref()
    }

    /// Connect to `url`. Returns error replies for requests the old
    /// transport never answered.
    #[must_use]
    pub fn connect(&mut self, url: &str) -> Vec<Signal> {
        let outputs = self.link.connect(url);
        self.signals(outputs)
    }

    /// Handle one frame from a UI window.
    ///
    /// # Errors
    ///
    /// Credential file failures on `save-user-data` and `initial-data`.
    pub fn on_ui_frame(&mut self, window: WindowId, frame: Frame) -> Result<Vec<Signal>, HostError> {
        let Some(route) = route(&frame.channel) else {
            tracing::warn!(%window, channel = %frame.channel, "router: unknown channel");
            return Ok(Vec::new());
        };
        tracing::debug!(%window, channel = %frame.channel, ?route, "router: ui frame");

        match route {
            Route::EmitWithReply => Ok(self.emit_with_reply(window, frame).into_iter().collect()),
            Route::Emit => {
                self.link.emit(&frame.channel, frame.args);
                Ok(Vec::new())
            }
            Route::Local => self.local(window, frame),
        }
    }

    /// Handle one event from the remote transport.
    pub fn on_remote_event(&mut self, generation: Generation, event: RemoteEvent) -> Vec<Signal> {
        let outputs = self.link.on_event(generation, event);
        self.signals(outputs)
    }

    fn signals(&mut self, outputs: Vec<LinkOutput<Origin>>) -> Vec<Signal> {
        outputs
            .into_iter()
            .map(|output| match output {
                LinkOutput::Status { channel, payload } => {
                    let frame = Frame::push(channel, vec![payload]);
                    self.last_status = Some(frame.clone());
                    Signal::All(frame)
                }
                LinkOutput::Ack { origin, args } => Signal::To { window: origin.window, frame: origin.request.reply(args) },
                LinkOutput::Broadcast { channel, args } => Signal::All(Frame::push(channel, args)),
            })
            .collect()
    }

    fn emit_with_reply(&mut self, window: WindowId, frame: Frame) -> Option<Signal> {
        let origin = Origin { window, request: frame.clone() };
        match self.link.emit_with_reply(&frame.channel, frame.args.clone(), origin) {
            Ok(()) => None,
            Err(e) => {
                tracing::warn!(%window, channel = %frame.channel, error = %e, "router: request refused");
                Some(Signal::To { window, frame: frame.reply(vec![json!({ "error": e.to_string() })]) })
            }
        }
    }

    fn local(&mut self, window: WindowId, frame: Frame) -> Result<Vec<Signal>, HostError> {
        match frame.channel.as_str() {
            channels::CONNECT_TO_SERVER => match frame.first_str() {
                Some(url) => return Ok(self.connect(url)),
                None => tracing::warn!(%window, "router: connect-to-server without a url"),
            },
            channels::RESET => self.link.reset(),
            channels::LOGOUT => {
                self.link.reset();
                self.link.emit(channels::LOGOUT, frame.args);
            }
            channels::SAVE_USER_DATA => {
                let partial = frame.first_arg().cloned().unwrap_or_else(|| Value::Object(Map::new()));
                self.credentials.save(&partial)?;
            }
            channels::INITIAL_DATA => {
                let data = self.credentials.load()?;
                return Ok(vec![Signal::To { window, frame: frame.reply(vec![data]) }]);
            }
            _ => {}
        }
        Ok(Vec::new())
    }
}
