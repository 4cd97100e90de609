//! One editor popup per opener.

#[cfg(test)]
#[path = "popup_test.rs"]
mod popup_test;

use crate::state::identity::SceneId;

/// A handle to a spawned window.
pub trait PopupHandle {
    fn is_closed(&self) -> bool;
    fn close(&self);
}

/// Holds the opener's current editor popup, if any.
pub struct PopupSlot<H: PopupHandle> {
    current: Option<H>,
}

impl<H: PopupHandle> Default for PopupSlot<H> {
    fn default() -> Self {
        Self { current: None }
    }
}

impl<H: PopupHandle> PopupSlot<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Close the previous editor if it is still open, then open a new one
    /// with `spawn`. A `None` from `spawn` (blocked popup) leaves the slot
    /// empty.
    pub fn open<F>(&mut self, spawn: F) -> Option<&H>
    where
        F: FnOnce() -> Option<H>,
    {
        if let Some(previous) = self.current.take() {
            if !previous.is_closed() {
                previous.close();
            }
        }
        self.current = spawn();
        if self.current.is_none() {
            log::warn!("editor popup did not open");
        }
        self.current.as_ref()
    }

    /// The open editor, if it has not been closed.
    #[must_use]
    pub fn current(&self) -> Option<&H> {
        self.current.as_ref().filter(|h| !h.is_closed())
    }
}

/// Hash route of the scene editor for an existing scene, or `new`.
#[must_use]
pub fn scene_edit_route(scene_id: Option<&SceneId>) -> String {
    match scene_id {
        Some(id) => format!("#/scene-edit?id={id}"),
        None => "#/scene-edit?id=new".to_owned(),
    }
}

/// Parse the `id` query of a scene editor route. `new` and a missing id
/// both mean a new scene.
#[must_use]
pub fn parse_scene_edit_route(route: &str) -> Option<SceneId> {
    let query = route.split_once('?')?.1;
    let id = query.split('&').find_map(|pair| pair.strip_prefix("id="))?;
    if id.is_empty() || id == "new" {
        return None;
    }
    Some(match id.parse::<i64>() {
        Ok(n) => SceneId::Int(n),
        Err(_) => SceneId::Text(id.to_owned()),
    })
}
