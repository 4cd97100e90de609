//! Named handler table with replace-then-attach registration.
//!
//! DESIGN
//! ======
//! A table holds at most one handler per name. Registering a name that is
//! already taken detaches the old handler before the new one is stored, so
//! an event can never reach a superseded handler. The same table backs both
//! the bridge's channel listeners and a window's event surface.
//!
//! Dispatch clones the handler out of the map before calling it. A handler
//! may therefore register, replace, or remove entries (its own included)
//! while it runs.

#[cfg(test)]
#[path = "listeners_test.rs"]
mod listeners_test;

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

type Handler<A> = Rc<RefCell<dyn FnMut(&A)>>;

struct Entry<A: ?Sized> {
    once: bool,
    handler: Handler<A>,
}

/// At most one active handler per name.
pub struct ListenerTable<A: ?Sized> {
    entries: RefCell<HashMap<String, Entry<A>>>,
}

impl<A: ?Sized> Default for ListenerTable<A> {
    fn default() -> Self {
        Self { entries: RefCell::new(HashMap::new()) }
    }
}

impl<A: ?Sized> ListenerTable<A> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a persistent handler for `name`, replacing any existing one.
    pub fn listen<F>(&self, name: &str, handler: F)
    where
        F: FnMut(&A) + 'static,
    {
        self.attach(name, false, Rc::new(RefCell::new(handler)));
    }

    /// Attach a handler that detaches itself after its first delivery.
    pub fn listen_once<F>(&self, name: &str, handler: F)
    where
        F: FnMut(&A) + 'static,
    {
        self.attach(name, true, Rc::new(RefCell::new(handler)));
    }

    /// Detach the handler for `name`. Returns whether one was attached.
    pub fn remove(&self, name: &str) -> bool {
        self.entries.borrow_mut().remove(name).is_some()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Deliver `arg` to the handler for `name`. Returns `false` when no
    /// handler is attached or the handler is already running.
    pub fn dispatch(&self, name: &str, arg: &A) -> bool {
        let handler = {
            let mut entries = self.entries.borrow_mut();
            let Some(entry) = entries.get(name) else {
                return false;
            };
            let handler = Rc::clone(&entry.handler);
            if entry.once {
                entries.remove(name);
            }
            handler
        };

        let Ok(mut call) = handler.try_borrow_mut() else {
            log::warn!("listener for {name} re-entered; event dropped");
            return false;
        };
        (*call)(arg);
        true
    }

    fn attach(&self, name: &str, once: bool, handler: Handler<A>) {
        let mut entries = self.entries.borrow_mut();
        if entries.remove(name).is_some() {
            log::debug!("replacing listener for {name}");
        }
        entries.insert(name.to_owned(), Entry { once, handler });
    }
}
