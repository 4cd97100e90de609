//! Window contexts and the opener resolver.
//!
//! DESIGN
//! ======
//! Every top-level window owns one [`WindowState`]. Code never reaches for a
//! window's bridge, session, or event surface directly; it goes through a
//! [`TargetResolver`]. The main window resolves to itself. A popup resolves
//! to the window that opened it while that window is alive, and to itself
//! otherwise. Code written against the resolver runs unchanged in either.

#[cfg(test)]
#[path = "window_test.rs"]
mod window_test;

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use serde_json::Value;

use crate::listeners::ListenerTable;
use crate::net::bridge::{ChannelBridge, DetachedLink};
use crate::state::session::SessionStore;
use crate::surface::SceneSurface;

pub type SharedSurface = Rc<RefCell<dyn SceneSurface>>;

/// State owned by one top-level window.
pub struct WindowState {
    label: String,
    bridge: Rc<ChannelBridge>,
    session: Rc<SessionStore>,
    events: ListenerTable<Value>,
    scene: RefCell<Option<SharedSurface>>,
    closed: Cell<bool>,
}

impl WindowState {
    #[must_use]
    pub fn new(label: impl Into<String>, bridge: Rc<ChannelBridge>) -> Rc<Self> {
        Rc::new(Self {
            label: label.into(),
            bridge,
            session: Rc::new(SessionStore::new()),
            events: ListenerTable::new(),
            scene: RefCell::new(None),
            closed: Cell::new(false),
        })
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[must_use]
    pub fn bridge(&self) -> &Rc<ChannelBridge> {
        &self.bridge
    }

    #[must_use]
    pub fn session(&self) -> &Rc<SessionStore> {
        &self.session
    }

    /// Structured notifications raised on this window.
    #[must_use]
    pub fn events(&self) -> &ListenerTable<Value> {
        &self.events
    }

    /// Give this window a render context. Any previous one is released.
    pub fn attach_scene(&self, surface: SharedSurface) {
        *self.scene.borrow_mut() = Some(surface);
    }

    #[must_use]
    pub fn scene(&self) -> Option<SharedSurface> {
        self.scene.borrow().clone()
    }

    pub fn close(&self) {
        self.closed.set(true);
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

/// Resolves which window's bridge, session, and events to use.
pub trait TargetResolver {
    fn target(&self) -> Rc<WindowState>;

    fn bridge(&self) -> Rc<ChannelBridge> {
        Rc::clone(self.target().bridge())
    }

    fn session(&self) -> Rc<SessionStore> {
        Rc::clone(self.target().session())
    }

    fn listen<F>(&self, channel: &str, handler: F)
    where
        F: FnMut(&[Value]) + 'static,
    {
        self.target().bridge().listen(channel, handler);
    }

    fn send(&self, channel: &str, args: Vec<Value>) {
        self.target().bridge().send(channel, args);
    }

    fn send_and_receive<F>(&self, channel: &str, handler: F, args: Vec<Value>)
    where
        F: FnMut(&[Value]) + 'static,
    {
        self.target().bridge().send_and_receive(channel, handler, args);
    }

    /// Attach `handler` for `event_type` on the target window's event
    /// surface, replacing any previous one.
    fn listen_on_opener<F>(&self, event_type: &str, handler: F)
    where
        F: FnMut(&Value) + 'static,
    {
        self.target().events().listen(event_type, handler);
    }

    /// Raise `event_type` on the target window. Returns whether a handler
    /// took it.
    fn dispatch_to_opener(&self, event_type: &str, data: &Value) -> bool {
        let target = self.target();
        let taken = target.events().dispatch(event_type, data);
        if !taken {
            log::warn!("no {event_type} handler on window {}", target.label());
        }
        taken
    }
}

/// A top-level window with no opener.
#[derive(Clone)]
pub struct MainWindow {
    state: Rc<WindowState>,
}

impl MainWindow {
    #[must_use]
    pub fn new(bridge: Rc<ChannelBridge>) -> Self {
        Self { state: WindowState::new("main", bridge) }
    }

    #[must_use]
    pub fn state(&self) -> &Rc<WindowState> {
        &self.state
    }
}

impl TargetResolver for MainWindow {
    fn target(&self) -> Rc<WindowState> {
        Rc::clone(&self.state)
    }
}

/// A window spawned by another one.
#[derive(Clone)]
pub struct PopupWindow {
    own: Rc<WindowState>,
    opener: Weak<WindowState>,
}

impl PopupWindow {
    /// `own` is used only when the opener is gone or closed.
    #[must_use]
    pub fn new(own: Rc<WindowState>, opener: &Rc<WindowState>) -> Self {
        Self { own, opener: Rc::downgrade(opener) }
    }

    /// A popup with no host link of its own. Until `opener` closes, every
    /// call goes through it; afterwards calls are refused locally.
    #[must_use]
    pub fn for_opener(label: &str, opener: &Rc<WindowState>) -> Self {
        let own = WindowState::new(label, Rc::new(ChannelBridge::new(Rc::new(DetachedLink))));
        Self::new(own, opener)
    }

    #[must_use]
    pub fn state(&self) -> &Rc<WindowState> {
        &self.own
    }

    #[must_use]
    pub fn opener(&self) -> Option<Rc<WindowState>> {
        self.opener.upgrade().filter(|w| !w.is_closed())
    }
}

impl TargetResolver for PopupWindow {
    fn target(&self) -> Rc<WindowState> {
        self.opener().unwrap_or_else(|| Rc::clone(&self.own))
    }
}
