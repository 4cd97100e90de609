use super::*;

use std::cell::RefCell;

use frames::Frame;
use scene::consts::{GRID_MESH, MAP_MESH};
use scene::engine::EngineCore;
use scene::graph::{Material, SceneGraph};
use scene::input::{Button, Key, Modifiers};
use serde_json::json;

use crate::test_support::{RecordingLink, recording_bridge, scene_json};
use crate::window::PopupWindow;

struct Harness {
    link: Rc<RecordingLink>,
    core: Rc<RefCell<EngineCore>>,
    game: GameSession,
}

fn harness() -> Harness {
    let (link, bridge) = recording_bridge();
    let core = Rc::new(RefCell::new(EngineCore::new()));
    core.borrow_mut().set_viewport(800.0, 600.0, 1.0);
    let game = GameSession::attach(MainWindow::new(bridge), core.clone());
    Harness { link, core, game }
}

impl Harness {
    fn push(&self, channel: &str, args: Vec<Value>) {
        self.game.window().state().bridge().deliver(&Frame::push(channel, args));
    }

    fn session(&self) -> Rc<SessionStore> {
        self.game.window().session()
    }

    fn load_scene(&self, id: i64) {
        self.push(channels::SCENE_DATA, vec![json!(id), json!(scene_json())]);
    }

    /// Click the first token: selects it and commits once.
    fn click_first_token(&self) -> Vec<Action> {
        let mut core = self.core.borrow_mut();
        let id = core.model.token_ids()[0];
        let world = core.model.token(&id).expect("token").position;
        let at = core.model.graph().expect("graph").camera.ground_to_screen(world, core.viewport);
        core.on_pointer_down(at, Button::Primary, Modifiers::default());
        core.on_pointer_up(at, Button::Primary, Modifiers::default())
    }
}

fn graph_of(frame: &Frame) -> SceneGraph {
    let text = frame.args[1].as_str().expect("graph text");
    serde_json::from_str(text).expect("graph json")
}

// =============================================================
// Pushes
// =============================================================

#[test]
fn scene_data_args_load_scene_and_set_current_id() {
    let h = harness();
    h.load_scene(4);

    assert!(h.core.borrow().model.is_loaded());
    assert_eq!(h.session().current_scene_id(), Some(SceneId::Int(4)));
}

#[test]
fn loaded_scene_tokens_are_cached() {
    let h = harness();
    h.load_scene(4);

    let tokens = h.session().current_tokens();
    let images: Vec<_> = tokens.iter().map(|t| t.image.as_deref()).collect();
    assert_eq!(images, [Some("images/token1.png"), Some("images/token2.png")]);
    let ids = h.core.borrow().model.token_ids();
    assert_eq!(tokens[0].id, ids[0].to_string());
}

#[test]
fn scene_data_object_form_is_accepted() {
    let h = harness();
    h.push(channels::SCENE_DATA, vec![json!({"id": "cave", "data": scene_json()})]);

    assert!(h.core.borrow().model.is_loaded());
    assert_eq!(h.session().current_scene_id(), Some(SceneId::from("cave")));
}

#[test]
fn malformed_scene_data_is_ignored() {
    let h = harness();
    h.push(channels::SCENE_DATA, vec![json!(4)]);
    h.push(channels::SCENE_DATA, vec![json!(4), json!("not a graph")]);

    assert!(!h.core.borrow().model.is_loaded());
}

#[test]
fn current_users_push_updates_roster_and_master() {
    let h = harness();
    h.session().set(keys::USER_DATA, &json!({"id": "GM"}));
    h.push(channels::CURRENT_USERS, vec![json!({"users": [{"id": "gm", "connected": true, "master": 1}]})]);

    assert_eq!(h.session().current_users().len(), 1);
    assert!(h.game.is_master());
}

#[test]
fn set_my_scene_reply_stores_scene_list() {
    let h = harness();
    h.push(
        "set-my-scene-callback",
        vec![json!({"scenes": [{"id": 1, "name": "Cave"}, {"id": 2, "name": "Keep"}], "sceneId": 2})],
    );

    assert_eq!(h.session().current_scenes().len(), 2);
    assert_eq!(h.session().current_scene_id(), Some(SceneId::Int(2)));
}

#[test]
fn current_messages_push_is_stored() {
    let h = harness();
    h.push(channels::CURRENT_MESSAGES, vec![json!([{"from": "gm", "text": "hi"}])]);
    assert_eq!(h.session().get(keys::CURRENT_MESSAGES), Some(json!([{"from": "gm", "text": "hi"}])));
}

// =============================================================
// Persistence
// =============================================================

#[test]
fn commit_sends_scene_update_tagged_with_current_scene() {
    let h = harness();
    h.load_scene(9);

    let actions = h.click_first_token();
    h.game.handle(actions);

    let frame = h.link.last_on(channels::SCENE_UPDATE);
    assert_eq!(frame.args[0], json!(9));
    assert_eq!(graph_of(&frame).tokens().count(), 2);
}

#[test]
fn each_commit_is_sent_in_order() {
    let h = harness();
    h.load_scene(9);
    let actions = h.click_first_token();
    h.game.handle(actions);

    for key in ["ArrowUp", "ArrowRight"] {
        let actions = h.core.borrow_mut().on_key_up(Key(key.into()), Modifiers::default());
        h.game.handle(actions);
    }

    let updates = h.link.channels().iter().filter(|c| *c == channels::SCENE_UPDATE).count();
    assert_eq!(updates, 3);
}

#[test]
fn failed_scene_load_keeps_commits_on_the_loaded_scene() {
    let h = harness();
    h.load_scene(4);
    h.push(channels::SCENE_DATA, vec![json!(9), json!("{not a graph")]);

    assert_eq!(h.session().current_scene_id(), Some(SceneId::Int(4)));
    let actions = h.click_first_token();
    h.game.handle(actions);

    let frame = h.link.last_on(channels::SCENE_UPDATE);
    assert_eq!(frame.args[0], json!(4));
}

#[test]
fn commit_without_current_scene_is_not_sent() {
    let h = harness();
    h.core.borrow_mut().load_scene(&scene_json()).expect("loads");

    let actions = h.click_first_token();
    h.game.handle(actions);

    assert!(!h.link.channels().contains(&channels::SCENE_UPDATE.to_owned()));
}

// =============================================================
// scene-manage from a popup
// =============================================================

#[test]
fn popup_scene_manage_moves_map_hides_grid_and_persists() {
    let h = harness();
    h.load_scene(3);
    let (_popup_link, popup_bridge) = recording_bridge();
    let popup = PopupWindow::new(WindowState::new("scene-edit", popup_bridge), h.game.window().state());

    assert!(popup.dispatch_to_opener(channels::SCENE_MANAGE, &json!({"mapX": 1, "mapZ": 2, "gridLines": false})));

    let frame = h.link.last_on(channels::SCENE_UPDATE);
    assert_eq!(frame.args[0], json!(3));
    let graph = graph_of(&frame);
    let map = graph.mesh_named(MAP_MESH).expect("map plane");
    assert_eq!((map.position.x, map.position.y, map.position.z), (1.0, 0.0, 2.0));
    let grid_material = &graph.mesh_named(GRID_MESH).expect("grid plane").material;
    match graph.material(grid_material) {
        Some(Material::Grid { opacity, .. }) => assert!(opacity.abs() < f64::EPSILON),
        other => panic!("unexpected grid material {other:?}"),
    }
}

#[test]
fn malformed_scene_manage_changes_nothing() {
    let h = harness();
    h.load_scene(3);
    let before = h.link.sent.borrow().len();

    h.game.window().dispatch_to_opener(channels::SCENE_MANAGE, &json!({"mapX": "left"}));

    assert_eq!(h.link.sent.borrow().len(), before);
}

// =============================================================
// Login and scene selection
// =============================================================

#[test]
fn login_caches_identity_and_collections() {
    let h = harness();
    let outcome = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&outcome);
    h.game.login("gm", "pw", move |reply| *sink.borrow_mut() = Some(reply.clone()));

    let request = h.link.last_on(channels::LOGIN);
    h.game.window().state().bridge().deliver(&request.reply(vec![json!({"result": {
        "users": [{"id": "gm", "master": 1}],
        "scenes": [{"id": 1, "name": "Cave"}],
        "sceneId": 1
    }})]));

    assert!(matches!(*outcome.borrow(), Some(Reply::Ok(_))));
    assert_eq!(h.session().user_data().and_then(|u| u.id), Some("gm".to_owned()));
    assert_eq!(h.session().current_scene_id(), Some(SceneId::Int(1)));
    assert!(h.game.is_master());
}

#[test]
fn rejected_login_caches_nothing() {
    let h = harness();
    h.game.login("gm", "bad", |_| {});
    let request = h.link.last_on(channels::LOGIN);
    h.game.window().state().bridge().deliver(&request.reply(vec![json!({"error": "bad password"})]));

    assert!(h.session().user_data().is_none());
}

#[test]
fn select_scene_sends_scene_and_user() {
    let h = harness();
    h.session().set(keys::USER_DATA, &json!({"id": "gm"}));
    h.game.select_scene(&SceneId::Int(2));

    let frame = h.link.last_on(channels::SET_MY_SCENE);
    assert_eq!(frame.args, vec![json!(2), json!("gm")]);
}

#[test]
fn select_scene_before_login_sends_nothing() {
    let h = harness();
    h.game.select_scene(&SceneId::Int(2));
    assert!(h.link.sent.borrow().is_empty());
}
