use super::*;

use std::cell::{Cell, RefCell};

use frames::Status;
use serde_json::json;

use crate::test_support::RecordingLink;

fn bridge() -> (Rc<RecordingLink>, ChannelBridge) {
    let link = Rc::new(RecordingLink::default());
    let bridge = ChannelBridge::new(link.clone());
    (link, bridge)
}

fn capture() -> (Rc<RefCell<Vec<Vec<Value>>>>, impl FnMut(&[Value]) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    (seen, move |args: &[Value]| sink.borrow_mut().push(args.to_vec()))
}

// =============================================================
// send
// =============================================================

#[test]
fn send_emits_request_frame_with_args_in_order() {
    let (link, bridge) = bridge();
    bridge.send("scene-update", vec![json!(7), json!("{}")]);

    let sent = link.sent.borrow();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].channel, "scene-update");
    assert_eq!(sent[0].status, Status::Request);
    assert_eq!(sent[0].args, vec![json!(7), json!("{}")]);
}

#[test]
fn send_on_closed_link_does_not_panic() {
    let (link, bridge) = bridge();
    link.closed.set(true);
    bridge.send("logout", Vec::new());
    assert!(link.sent.borrow().is_empty());
}

// =============================================================
// send_and_receive
// =============================================================

#[test]
fn reply_listener_is_armed_before_request_leaves() {
    let link = Rc::new(ArmCheckLink::default());
    let bridge = Rc::new(ChannelBridge::new(link.clone()));
    *link.bridge.borrow_mut() = Some(Rc::downgrade(&bridge));

    bridge.send_and_receive("login", |_| {}, vec![json!("gm"), json!("pw")]);

    assert_eq!(link.armed_at_send.get(), Some(true));
}

#[derive(Default)]
struct ArmCheckLink {
    bridge: RefCell<Option<std::rc::Weak<ChannelBridge>>>,
    armed_at_send: Cell<Option<bool>>,
}

impl HostLink for ArmCheckLink {
    fn send_frame(&self, frame: Frame) -> bool {
        let armed = self
            .bridge
            .borrow()
            .as_ref()
            .and_then(std::rc::Weak::upgrade)
            .map(|b| b.is_listening(&reply_channel(&frame.channel)));
        self.armed_at_send.set(armed);
        true
    }
}

#[test]
fn reply_reaches_callback_handler() {
    let (link, bridge) = bridge();
    let (seen, handler) = capture();

    bridge.send_and_receive("login", handler, vec![json!("gm"), json!("pw")]);
    let request = link.sent.borrow()[0].clone();
    bridge.deliver(&request.reply(vec![json!({"result": {"sceneId": 3}})]));

    assert_eq!(seen.borrow().as_slice(), &[vec![json!({"result": {"sceneId": 3}})]]);
}

#[test]
fn second_request_on_waiting_channel_is_refused_locally() {
    let (link, bridge) = bridge();
    let (first, h1) = capture();
    let (second, h2) = capture();

    bridge.send_and_receive("scene-create", h1, vec![json!("a")]);
    bridge.send_and_receive("scene-create", h2, vec![json!("b")]);

    assert_eq!(link.sent.borrow().len(), 1);
    assert_eq!(second.borrow().as_slice(), &[vec![json!({"error": IN_FLIGHT_ERROR})]]);

    let request = link.sent.borrow()[0].clone();
    bridge.deliver(&request.reply(vec![json!({"result": "a"})]));
    assert_eq!(first.borrow().as_slice(), &[vec![json!({"result": "a"})]]);
    assert_eq!(second.borrow().len(), 1);
}

#[test]
fn reply_for_another_request_is_dropped() {
    let (link, bridge) = bridge();
    let (seen, handler) = capture();

    bridge.send_and_receive("login", handler, vec![]);
    let stranger = Frame::request("login", vec![]).reply(vec![json!({"result": {}})]);
    assert!(!bridge.deliver(&stranger));
    assert!(seen.borrow().is_empty());
    assert!(bridge.is_awaiting("login"));

    let request = link.sent.borrow()[0].clone();
    assert!(bridge.deliver(&request.reply(vec![json!({})])));
    assert!(!bridge.is_awaiting("login"));
}

#[test]
fn answered_channel_accepts_a_new_request() {
    let (link, bridge) = bridge();
    let (seen, handler) = capture();
    let (again, handler2) = capture();

    bridge.send_and_receive("get-maps", handler, vec![]);
    let request = link.sent.borrow()[0].clone();
    bridge.deliver(&request.reply(vec![json!([])]));
    bridge.send_and_receive("get-maps", handler2, vec![]);

    assert_eq!(seen.borrow().len(), 1);
    assert!(again.borrow().is_empty());
    assert_eq!(link.sent.borrow().len(), 2);
}

#[test]
fn closed_link_does_not_leave_channel_waiting() {
    let (link, bridge) = bridge();
    link.closed.set(true);
    let (_, handler) = capture();
    bridge.send_and_receive("login", handler, vec![]);
    assert!(!bridge.is_awaiting("login"));
}

// =============================================================
// deliver
// =============================================================

#[test]
fn pushes_route_by_channel_name() {
    let (_link, bridge) = bridge();
    let (users, on_users) = capture();
    let (scenes, on_scene) = capture();
    bridge.listen("current-users", on_users);
    bridge.listen("scene-data", on_scene);

    assert!(bridge.deliver(&Frame::push("current-users", vec![json!({"users": []})])));
    assert!(!bridge.deliver(&Frame::push("current-messages", vec![json!([])])));

    assert_eq!(users.borrow().len(), 1);
    assert!(scenes.borrow().is_empty());
}

#[test]
fn forget_stops_delivery() {
    let (_link, bridge) = bridge();
    let (seen, handler) = capture();
    bridge.listen("server-status", handler);

    assert!(bridge.forget("server-status"));
    assert!(!bridge.deliver(&Frame::push("server-status", vec![json!({"status": "connected"})])));
    assert!(seen.borrow().is_empty());
}

#[test]
fn deliver_bytes_decodes_then_routes() {
    let (_link, bridge) = bridge();
    let (seen, handler) = capture();
    bridge.listen("scene-data", handler);

    let bytes = frames::encode_frame(&Frame::push("scene-data", vec![json!(4), json!("{}")]));
    assert!(matches!(bridge.deliver_bytes(&bytes), Ok(true)));
    assert_eq!(seen.borrow()[0], vec![json!(4), json!("{}")]);
}

#[test]
fn deliver_bytes_rejects_garbage() {
    let (_link, bridge) = bridge();
    assert!(bridge.deliver_bytes(&[0xff, 0xff, 0xff]).is_err());
}
