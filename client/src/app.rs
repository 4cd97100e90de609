//! Browser entry points.
//!
//! `TabletopApp` wires a canvas-backed scene engine, the host socket, and
//! the game session together and exposes DOM event entry points to the
//! page script. The page keeps it on `window.tabletop`.
//!
//! An editor popup does not start its own instance. Its script calls
//! `window.opener.tabletop.sceneEditor(location.hash)` and drives the
//! returned [`SceneEditorApp`], which lives in the opener and resolves
//! bridge, session, and events there.

use std::cell::RefCell;
use std::rc::Rc;

use scene::camera::Point;
use scene::engine::Engine;
use scene::graph::{SceneConfig, SceneManage};
use scene::input::{Button, Key, Modifiers, WheelDelta};
use serde_json::Value;
use wasm_bindgen::prelude::*;
use web_sys::HtmlCanvasElement;

use crate::game::GameSession;
use crate::net::bridge::ChannelBridge;
use crate::net::reply::{Reply, ServerStatus};
use crate::net::requests;
use crate::net::socket::{host_ws_url, spawn_host_socket};
use crate::net::transport::ChannelTransport;
use crate::popup::{PopupHandle, PopupSlot, scene_edit_route};
use crate::scene_edit::SceneEditor;
use crate::state::identity::SceneId;
use crate::window::{MainWindow, PopupWindow, TargetResolver};

const EDITOR_FEATURES: &str = "width=480,height=640";

impl PopupHandle for web_sys::Window {
    fn is_closed(&self) -> bool {
        self.closed().unwrap_or(true)
    }

    fn close(&self) {
        if let Err(e) = web_sys::Window::close(self) {
            log::warn!("editor popup close failed: {e:?}");
        }
    }
}

#[wasm_bindgen]
pub struct TabletopApp {
    engine: Rc<RefCell<Engine>>,
    game: GameSession,
    editor: PopupSlot<web_sys::Window>,
}

#[wasm_bindgen]
impl TabletopApp {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        console_error_panic_hook::set_once();
        if console_log::init_with_level(log::Level::Info).is_err() {
            log::debug!("console logger already installed");
        }

        let (transport, rx) = ChannelTransport::channel();
        let bridge = Rc::new(ChannelBridge::new(Rc::new(transport)));
        spawn_host_socket(host_ws_url(), Rc::downgrade(&bridge), rx);

        let engine = Rc::new(RefCell::new(Engine::new(canvas)));
        let game = GameSession::attach(MainWindow::new(bridge), engine.clone());
        Self { engine, game, editor: PopupSlot::new() }
    }

    // --- Session ---

    pub fn connect(&self, url: &str) {
        requests::connect_to_server(&self.game.window().bridge(), url);
    }

    /// Return to server selection.
    pub fn reset(&self) {
        requests::reset(&self.game.window().bridge());
    }

    /// `handler` gets `{status, error?}` for each outcome until the first
    /// successful connect. The connect screen blocks on it.
    #[wasm_bindgen(js_name = onInitialStatus)]
    pub fn on_initial_status(&self, handler: js_sys::Function) {
        requests::on_initial_status(&self.game.window().bridge(), move |status| call_with_status(&handler, &status));
    }

    /// `handler` gets `{status, error?}` for drops and reconnects after the
    /// first successful connect.
    #[wasm_bindgen(js_name = onServerStatus)]
    pub fn on_server_status(&self, handler: js_sys::Function) {
        requests::on_server_status(&self.game.window().bridge(), move |status| call_with_status(&handler, &status));
    }

    /// `on_done` is called with the rejection message, or `null` on success.
    pub fn login(&self, user: &str, password: &str, on_done: js_sys::Function) {
        self.game.login(user, password, move |reply| call_with_reply(&on_done, reply, "login"));
    }

    #[wasm_bindgen(js_name = selectScene)]
    pub fn select_scene(&self, scene_id: &str) {
        self.game.select_scene(&parse_scene_id(scene_id));
    }

    #[wasm_bindgen(js_name = isMaster)]
    #[must_use]
    pub fn is_master(&self) -> bool {
        self.game.is_master()
    }

    /// Raise a window event, as a popup editor does on its opener.
    #[wasm_bindgen(js_name = dispatchEvent)]
    pub fn dispatch_event(&self, event_type: &str, json: &str) -> bool {
        match serde_json::from_str::<Value>(json) {
            Ok(data) => self.game.window().dispatch_to_opener(event_type, &data),
            Err(e) => {
                log::warn!("ignoring {event_type} with malformed payload: {e}");
                false
            }
        }
    }

    /// Open the scene editor for `scene_id` (empty for a new scene),
    /// closing any editor already open.
    #[wasm_bindgen(js_name = openSceneEditor)]
    pub fn open_scene_editor(&mut self, scene_id: &str) {
        let id = (!scene_id.is_empty()).then(|| parse_scene_id(scene_id));
        let route = scene_edit_route(id.as_ref());
        self.editor.open(|| {
            let window = web_sys::window()?;
            window.open_with_url_and_target_and_features(&route, "scene-edit", EDITOR_FEATURES).ok().flatten()
        });
    }

    /// Editor for a popup opened on `route`, bound to this window.
    #[wasm_bindgen(js_name = sceneEditor)]
    #[must_use]
    pub fn scene_editor(&self, route: &str) -> SceneEditorApp {
        let popup = PopupWindow::for_opener("scene-edit", self.game.window().state());
        SceneEditorApp { editor: SceneEditor::from_route(popup, route) }
    }

    // --- Input ---

    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&self, x: f64, y: f64, button: i16, shift: bool) {
        let actions = self.engine.borrow_mut().on_pointer_down(Point::new(x, y), Button::from_dom(button), modifiers(shift));
        self.game.handle(actions);
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&self, x: f64, y: f64, shift: bool) {
        let actions = self.engine.borrow_mut().on_pointer_move(Point::new(x, y), modifiers(shift));
        self.game.handle(actions);
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&self, x: f64, y: f64, button: i16, shift: bool) {
        let actions = self.engine.borrow_mut().on_pointer_up(Point::new(x, y), Button::from_dom(button), modifiers(shift));
        self.game.handle(actions);
    }

    #[wasm_bindgen(js_name = keyUp)]
    pub fn key_up(&self, key: &str, shift: bool) {
        let actions = self.engine.borrow_mut().on_key_up(Key(key.to_owned()), modifiers(shift));
        self.game.handle(actions);
    }

    pub fn wheel(&self, x: f64, y: f64, dx: f64, dy: f64) {
        let actions = self.engine.borrow_mut().on_wheel(Point::new(x, y), WheelDelta { dx, dy }, Modifiers::default());
        self.game.handle(actions);
    }

    pub fn resize(&self, width_css: f64, height_css: f64, dpr: f64) {
        let mut engine = self.engine.borrow_mut();
        engine.set_viewport(width_css, height_css, dpr);
        if let Err(e) = engine.render() {
            log::warn!("render after resize failed: {e:?}");
        }
    }
}

/// The scene editor as seen by a popup script.
#[wasm_bindgen]
pub struct SceneEditorApp {
    editor: SceneEditor<PopupWindow>,
}

#[wasm_bindgen]
impl SceneEditorApp {
    /// `null` for a new scene.
    #[wasm_bindgen(js_name = sceneId)]
    #[must_use]
    pub fn scene_id(&self) -> Option<String> {
        self.editor.scene_id().map(ToString::to_string)
    }

    /// Prefill for an existing scene, as JSON, or `null`.
    #[wasm_bindgen(js_name = initialSettings)]
    #[must_use]
    pub fn initial_settings(&self) -> Option<String> {
        let settings = self.editor.initial_settings()?;
        match serde_json::to_string(&settings) {
            Ok(json) => Some(json),
            Err(e) => {
                log::warn!("scene settings not encoded: {e}");
                None
            }
        }
    }

    /// Create a scene from `config_json`. `on_done` gets the rejection
    /// message, or `null` on success.
    ///
    /// # Errors
    ///
    /// A malformed config is thrown back to the script; nothing is sent.
    #[wasm_bindgen(js_name = submitNew)]
    pub fn submit_new(&self, name: &str, config_json: &str, on_done: js_sys::Function) -> Result<(), JsValue> {
        let config: SceneConfig =
            serde_json::from_str(config_json).map_err(|e| JsValue::from_str(&format!("bad scene config: {e}")))?;
        self.editor
            .submit_new(name, &config, move |reply| call_with_reply(&on_done, reply, "scene-create"))
            .map_err(|e| JsValue::from_str(&e.to_string()))
    }

    /// Propose `{mapX, mapZ, gridLines}` to the opener's loaded scene.
    #[wasm_bindgen(js_name = submitExisting)]
    pub fn submit_existing(&self, manage_json: &str) -> bool {
        match serde_json::from_str::<SceneManage>(manage_json) {
            Ok(manage) => self.editor.submit_existing(&manage),
            Err(e) => {
                log::warn!("ignoring malformed scene settings: {e}");
                false
            }
        }
    }
}

fn call_with_reply(callback: &js_sys::Function, reply: &Reply, what: &str) {
    let arg = match reply {
        Reply::Rejected(e) => JsValue::from_str(e),
        Reply::Ok(_) => JsValue::NULL,
    };
    if let Err(e) = callback.call1(&JsValue::NULL, &arg) {
        log::warn!("{what} callback failed: {e:?}");
    }
}

fn call_with_status(callback: &js_sys::Function, status: &ServerStatus) {
    let arg = match serde_json::to_string(status).map(|json| js_sys::JSON::parse(&json)) {
        Ok(Ok(value)) => value,
        _ => JsValue::from_str(&status.status),
    };
    if let Err(e) = callback.call1(&JsValue::NULL, &arg) {
        log::warn!("status callback failed: {e:?}");
    }
}

fn modifiers(shift: bool) -> Modifiers {
    Modifiers { shift, ..Modifiers::default() }
}

fn parse_scene_id(raw: &str) -> SceneId {
    match raw.parse::<i64>() {
        Ok(n) => SceneId::Int(n),
        Err(_) => SceneId::Text(raw.to_owned()),
    }
}
