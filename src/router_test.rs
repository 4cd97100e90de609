use super::*;

use tokio::sync::mpsc::UnboundedReceiver;

use crate::remote::CONNECT_ERROR_MESSAGE;
use crate::test_support::FakeConnector;

type Events = UnboundedReceiver<(Generation, RemoteEvent)>;

struct Fixture {
    router: HostRouter,
    fake: FakeConnector,
    events: Events,
    window: WindowId,
    path: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let fake = FakeConnector::default();
        let (tx, events) = mpsc::unbounded_channel();
        let path = std::env::temp_dir().join(format!("tabletop-router-{}.json", Uuid::new_v4()));
        let router = HostRouter::new(Box::new(fake.clone()), CredentialStore::new(&path), tx);
        Self { router, fake, events, window: Uuid::new_v4(), path }
    }

    fn ui(&mut self, channel: &str, args: Vec<Value>) -> Vec<Signal> {
        self.router.on_ui_frame(self.window, Frame::request(channel, args)).expect("routed")
    }

    fn remote(&mut self, event: RemoteEvent) -> Vec<Signal> {
        self.fake.emit(event);
        let (generation, event) = self.events.try_recv().expect("event queued");
        self.router.on_remote_event(generation, event)
    }

    fn connected(&mut self) {
        self.ui(channels::CONNECT_TO_SERVER, vec![json!("http://game:3000")]);
        self.remote(RemoteEvent::Connected);
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        if self.path.exists() {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

fn broadcast(signals: &[Signal]) -> (&str, &[Value]) {
    match signals {
        [Signal::All(frame)] => (frame.channel.as_str(), frame.args.as_slice()),
        other => panic!("expected one broadcast, got {other:?}"),
    }
}

fn direct(signals: &[Signal]) -> (WindowId, &Frame) {
    match signals {
        [Signal::To { window, frame }] => (*window, frame),
        other => panic!("expected one direct frame, got {other:?}"),
    }
}

// =============================================================
// Route table
// =============================================================

#[test]
fn route_table_covers_every_ui_channel() {
    assert_eq!(route(channels::LOGIN), Some(Route::EmitWithReply));
    assert_eq!(route(channels::GET_MAPS), Some(Route::EmitWithReply));
    assert_eq!(route(channels::SCENE_UPDATE), Some(Route::Emit));
    assert_eq!(route(channels::MESSAGE), Some(Route::Emit));
    assert_eq!(route(channels::LOGOUT), Some(Route::Local));
    assert_eq!(route(channels::INITIAL_DATA), Some(Route::Local));
    assert_eq!(route("scene-data"), None);
}

#[test]
fn unknown_channel_is_ignored() {
    let mut fx = Fixture::new();
    assert!(fx.ui("teleport", vec![]).is_empty());
    assert_eq!(fx.fake.connects(), 0);
}

// =============================================================
// Connection status
// =============================================================

#[test]
fn connect_failures_then_success_then_failure() {
    let mut fx = Fixture::new();

    fx.ui(channels::CONNECT_TO_SERVER, vec![json!("http://game:3000")]);
    let out = fx.remote(RemoteEvent::ConnectError("refused".into()));
    assert_eq!(broadcast(&out), (channels::INITIAL_SERVER_STATUS, &[json!({ "status": "error", "error": CONNECT_ERROR_MESSAGE })][..]));

    fx.ui(channels::CONNECT_TO_SERVER, vec![json!("http://game:3000")]);
    let out = fx.remote(RemoteEvent::ConnectError("refused".into()));
    assert_eq!(broadcast(&out).0, channels::INITIAL_SERVER_STATUS);

    fx.ui(channels::CONNECT_TO_SERVER, vec![json!("http://game:3000")]);
    let out = fx.remote(RemoteEvent::Connected);
    assert_eq!(broadcast(&out), (channels::INITIAL_SERVER_STATUS, &[json!({ "status": "connected" })][..]));

    let out = fx.remote(RemoteEvent::ConnectError("dropped".into()));
    assert_eq!(broadcast(&out).0, channels::SERVER_STATUS);
    assert_eq!(fx.fake.connects(), 3);
}

#[test]
fn last_status_is_remembered() {
    let mut fx = Fixture::new();
    assert!(fx.router.last_status().is_none());
    fx.connected();
    let status = fx.router.last_status().expect("status");
    assert_eq!(status.channel, channels::INITIAL_SERVER_STATUS);
}

#[test]
fn logout_returns_to_initial_status_and_tells_the_server() {
    let mut fx = Fixture::new();
    fx.connected();

    assert!(fx.ui(channels::LOGOUT, vec![]).is_empty());
    assert_eq!(fx.fake.last_sent().channel, channels::LOGOUT);

    let out = fx.remote(RemoteEvent::Connected);
    assert_eq!(broadcast(&out).0, channels::INITIAL_SERVER_STATUS);
}

#[test]
fn reset_stays_local() {
    let mut fx = Fixture::new();
    fx.connected();
    fx.ui(channels::RESET, vec![]);
    assert!(fx.fake.sent_channels().is_empty());
    assert!(!fx.router.link().has_connected());
}

// =============================================================
// Remote calls
// =============================================================

#[test]
fn acked_request_replies_to_origin_window() {
    let mut fx = Fixture::new();
    fx.connected();

    let request = Frame::request(channels::LOGIN, vec![json!("gm"), json!("pw")]);
    assert!(fx.router.on_ui_frame(fx.window, request.clone()).expect("routed").is_empty());

    let sent = fx.fake.last_sent();
    assert_eq!(sent.channel, channels::LOGIN);
    let out = fx.remote(RemoteEvent::Frame(sent.reply(vec![json!({ "id": "gm" })])));

    let (window, reply) = direct(&out);
    assert_eq!(window, fx.window);
    assert_eq!(reply.channel, "login-callback");
    assert_eq!(reply.parent_id.as_deref(), Some(request.id.as_str()));
    assert_eq!(reply.args, vec![json!({ "id": "gm" })]);
}

#[test]
fn busy_channel_gets_immediate_error_reply() {
    let mut fx = Fixture::new();
    fx.connected();
    fx.ui(channels::GET_MAPS, vec![]);

    let out = fx.ui(channels::GET_MAPS, vec![]);

    let (_, reply) = direct(&out);
    assert_eq!(reply.channel, "get-maps-callback");
    assert_eq!(reply.args, vec![json!({ "error": "request already in flight" })]);
    assert_eq!(fx.fake.sent_channels(), vec![channels::GET_MAPS]);
}

#[test]
fn reconnect_answers_waiting_window_with_error() {
    let mut fx = Fixture::new();
    fx.connected();
    let request = Frame::request(channels::LOGIN, vec![json!("gm"), json!("pw")]);
    assert!(fx.router.on_ui_frame(fx.window, request.clone()).expect("routed").is_empty());

    let out = fx.ui(channels::CONNECT_TO_SERVER, vec![json!("http://other:3000")]);

    let (window, reply) = direct(&out);
    assert_eq!(window, fx.window);
    assert_eq!(reply.channel, "login-callback");
    assert_eq!(reply.parent_id.as_deref(), Some(request.id.as_str()));
    assert_eq!(reply.args, vec![json!({ "error": "connection lost" })]);
}

#[test]
fn acked_request_before_connect_is_rejected() {
    let mut fx = Fixture::new();
    let out = fx.ui(channels::LOGIN, vec![json!("gm"), json!("pw")]);
    assert_eq!(direct(&out).1.args, vec![json!({ "error": "not connected" })]);
}

#[test]
fn fire_and_forget_before_connect_is_dropped() {
    let mut fx = Fixture::new();
    assert!(fx.ui(channels::SCENE_UPDATE, vec![json!(1), json!("{}")]).is_empty());
    assert!(fx.fake.sent_channels().is_empty());
}

#[test]
fn fire_and_forget_is_forwarded_verbatim() {
    let mut fx = Fixture::new();
    fx.connected();
    fx.ui(channels::SCENE_UPDATE, vec![json!(4), json!("{\"meshes\":[]}")]);

    let sent = fx.fake.last_sent();
    assert_eq!(sent.channel, channels::SCENE_UPDATE);
    assert_eq!(sent.args, vec![json!(4), json!("{\"meshes\":[]}")]);
}

#[test]
fn server_pushes_go_to_every_window() {
    let mut fx = Fixture::new();
    fx.connected();
    let out = fx.remote(RemoteEvent::Frame(Frame::push(channels::SCENE_DATA, vec![json!(2), json!("{}")])));
    assert_eq!(broadcast(&out), (channels::SCENE_DATA, &[json!(2), json!("{}")][..]));
}

// =============================================================
// Credential file
// =============================================================

#[test]
fn initial_data_replies_with_saved_credentials() {
    let mut fx = Fixture::new();

    let out = fx.ui(channels::INITIAL_DATA, vec![]);
    assert_eq!(direct(&out).1.args, vec![json!({})]);

    assert!(fx.ui(channels::SAVE_USER_DATA, vec![json!({ "url": "http://game:3000" })]).is_empty());
    fx.ui(channels::SAVE_USER_DATA, vec![json!({ "id": "gm" })]);

    let out = fx.ui(channels::INITIAL_DATA, vec![]);
    let (_, reply) = direct(&out);
    assert_eq!(reply.channel, "initial-data-callback");
    assert_eq!(reply.args, vec![json!({ "url": "http://game:3000", "id": "gm" })]);
}
