//! Main-window game session: server pushes, the scene engine, and
//! persistence.
//!
//! SYSTEM CONTEXT
//! ==============
//! The session listens on the window's bridge for roster, scene-list, and
//! scene pushes and keeps the session store current. It owns the route from
//! scene-engine commits to `scene-update`: every `Persist` action becomes
//! one full-graph send tagged with the current scene id, in commit order.
//!
//! Handlers hold only a weak reference to the window, so dropping the
//! window releases everything registered here.

#[cfg(test)]
#[path = "game_test.rs"]
mod game_test;

use std::rc::{Rc, Weak};

use frames::channels;
use scene::engine::Action;
use scene::graph::SceneManage;
use serde_json::Value;

use crate::net::reply::Reply;
use crate::net::requests;
use crate::state::identity::{self, SceneId};
use crate::state::session::{SessionStore, keys};
use crate::window::{MainWindow, SharedSurface, TargetResolver, WindowState};

pub struct GameSession {
    window: MainWindow,
}

impl GameSession {
    /// Attach `surface` as the window's render context and register the
    /// session's push and event handlers.
    #[must_use]
    pub fn attach(window: MainWindow, surface: SharedSurface) -> Self {
        let state = window.state();
        state.attach_scene(surface);
        let weak = Rc::downgrade(state);
        let bridge = state.bridge();

        let w = weak.clone();
        bridge.listen(channels::SCENE_DATA, move |args| {
            if let Some(state) = w.upgrade() {
                on_scene_data(&state, args);
            }
        });

        let w = weak.clone();
        bridge.listen(channels::CURRENT_USERS, move |args| {
            if let Some(state) = w.upgrade() {
                store_users(state.session(), args);
            }
        });

        let w = weak.clone();
        bridge.listen(channels::CURRENT_MESSAGES, move |args| {
            if let Some(state) = w.upgrade() {
                let messages = args.first().cloned().unwrap_or(Value::Null);
                state.session().set(keys::CURRENT_MESSAGES, &messages);
            }
        });

        bridge.listen(&frames::reply_channel(channels::SET_MY_SCENE), scene_list_handler(weak.clone()));

        let w = weak;
        state.events().listen(channels::SCENE_MANAGE, move |data| {
            if let Some(state) = w.upgrade() {
                on_scene_manage(&state, data);
            }
        });

        Self { window }
    }

    #[must_use]
    pub fn window(&self) -> &MainWindow {
        &self.window
    }

    /// Log in and cache identity, roster, scene list, and current scene.
    /// `on_done` receives the classified reply.
    pub fn login<F>(&self, user: &str, password: &str, on_done: F)
    where
        F: FnOnce(&Reply) + 'static,
    {
        let weak = Rc::downgrade(self.window.state());
        let user_id = user.to_owned();
        let mut on_done = Some(on_done);
        requests::login(&self.window.bridge(), user, password, move |reply| {
            if let (Some(state), Some(result)) = (weak.upgrade(), reply.result()) {
                let session = state.session();
                session.merge(keys::USER_DATA, &serde_json::json!({ "id": user_id }));
                store_users(session, std::slice::from_ref(result));
                store_scene_list(session, result);
            }
            if let Some(done) = on_done.take() {
                done(&reply);
            }
        });
    }

    /// Switch this user to `scene_id`. The server answers with the scene
    /// list and pushes the new scene's graph.
    pub fn select_scene(&self, scene_id: &SceneId) {
        let Some(user_id) = self.window.session().user_data().and_then(|u| u.id) else {
            log::warn!("cannot select scene {scene_id} before login");
            return;
        };
        let weak = Rc::downgrade(self.window.state());
        requests::set_my_scene(&self.window.bridge(), scene_id, &user_id, scene_list_reply(weak));
    }

    /// Forward scene-engine actions: presentation goes to the surface, and
    /// persistence goes to the server.
    pub fn handle(&self, actions: Vec<Action>) {
        present_and_commit(self.window.state(), actions);
    }

    #[must_use]
    pub fn is_master(&self) -> bool {
        identity::is_master(&self.window.session())
    }
}

/// Bridge handler that stores a `set-my-scene` reply's scene list.
pub(crate) fn scene_list_handler(window: Weak<WindowState>) -> impl FnMut(&[Value]) + 'static {
    let mut on_reply = scene_list_reply(window);
    move |args| on_reply(Reply::from_args(args))
}

pub(crate) fn scene_list_reply(window: Weak<WindowState>) -> impl FnMut(Reply) + 'static {
    move |reply| {
        let Some(state) = window.upgrade() else {
            return;
        };
        match reply {
            Reply::Ok(payload) => {
                let body = payload.get("result").unwrap_or(&payload);
                store_scene_list(state.session(), body);
            }
            Reply::Rejected(e) => log::warn!("scene selection rejected: {e}"),
        }
    }
}

/// Write `scenes` and `sceneId` from a reply body, when present.
pub(crate) fn store_scene_list(session: &SessionStore, body: &Value) {
    if let Some(scenes) = body.get("scenes") {
        session.set(keys::CURRENT_SCENES, scenes);
    }
    if let Some(id) = body.get("sceneId") {
        session.set(keys::CURRENT_SCENE_ID, id);
    }
}

fn store_users(session: &SessionStore, args: &[Value]) {
    let Some(payload) = args.first() else {
        return;
    };
    let users = payload.get("users").unwrap_or(payload);
    if users.is_array() {
        session.set(keys::CURRENT_USERS, users);
    } else {
        log::warn!("ignoring malformed roster payload");
    }
}

/// Accepts `(sceneId, graph)` arguments or a single `{id|sceneId, data}`.
fn parse_scene_data(args: &[Value]) -> Option<(Option<SceneId>, String)> {
    match args {
        [Value::Object(body), ..] => {
            let id = body.get("sceneId").or_else(|| body.get("id")).and_then(SceneId::from_value);
            let data = body.get("data")?.as_str()?.to_owned();
            Some((id, data))
        }
        [id, Value::String(data), ..] => Some((SceneId::from_value(id), data.clone())),
        _ => None,
    }
}

fn on_scene_data(state: &WindowState, args: &[Value]) {
    let Some((scene_id, graph)) = parse_scene_data(args) else {
        log::warn!("ignoring malformed scene-data payload");
        return;
    };
    let Some(surface) = state.scene() else {
        return;
    };

    let mut surface = surface.borrow_mut();
    match surface.load(&graph) {
        Ok(actions) => {
            // Only a scene that actually loaded becomes the commit target.
            if let Some(id) = &scene_id {
                state.session().set(keys::CURRENT_SCENE_ID, &id.to_value());
            }
            state.session().set_as(keys::CURRENT_TOKENS, &surface.tokens());
            surface.present(actions);
        }
        Err(e) => match scene_id {
            Some(id) => log::warn!("scene {id} failed to load: {e}"),
            None => log::warn!("scene failed to load: {e}"),
        },
    }
}

fn on_scene_manage(state: &WindowState, data: &Value) {
    let manage: SceneManage = match serde_json::from_value(data.clone()) {
        Ok(manage) => manage,
        Err(e) => {
            log::warn!("ignoring malformed scene-manage: {e}");
            return;
        }
    };
    let Some(surface) = state.scene() else {
        return;
    };
    let result = surface.borrow_mut().apply_config(&manage);
    match result {
        Ok(actions) => present_and_commit(state, actions),
        Err(e) => log::warn!("scene-manage not applied: {e}"),
    }
}

fn present_and_commit(state: &WindowState, actions: Vec<Action>) {
    let rest = match state.scene() {
        Some(surface) => surface.borrow_mut().present(actions),
        None => actions,
    };
    commit(state, rest);
}

fn commit(state: &WindowState, actions: Vec<Action>) {
    for action in actions {
        match action {
            Action::Persist(graph) => match state.session().current_scene_id() {
                Some(scene_id) => requests::scene_update(state.bridge(), &scene_id, graph),
                None => log::warn!("no current scene; change not persisted"),
            },
            Action::PersistFailed(e) => log::error!("scene not persisted: {e}"),
            Action::SetCursor(_) | Action::RenderNeeded => {}
        }
    }
}
