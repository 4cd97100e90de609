use super::*;

use std::time::Duration;

use frames::{Frame, channels};
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::credentials::CredentialStore;
use crate::host::Host;
use crate::test_support::FakeConnector;

#[tokio::test]
async fn healthz_says_ok() {
    assert_eq!(healthz().await, "ok");
}

#[tokio::test]
async fn window_round_trip_over_websocket() {
    let path = std::env::temp_dir().join(format!("tabletop-routes-{}.json", uuid::Uuid::new_v4()));
    let (host, handle) = Host::new(Box::new(FakeConnector::default()), CredentialStore::new(&path));
    tokio::spawn(host.run());

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    tokio::spawn(async move { axum::serve(listener, app(handle, None)).await });

    let (mut ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}/ws")).await.expect("connect");

    let save = Frame::request(channels::SAVE_USER_DATA, vec![json!({ "url": "http://game:3000" })]);
    ws.send(WsMessage::Binary(frames::encode_frame(&save).into())).await.expect("send save");
    let request = Frame::request(channels::INITIAL_DATA, vec![]);
    ws.send(WsMessage::Binary(frames::encode_frame(&request).into())).await.expect("send request");

    let reply = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            match ws.next().await {
                Some(Ok(WsMessage::Binary(bytes))) => return frames::decode_frame(&bytes).expect("decode"),
                Some(Ok(_)) => {}
                other => panic!("socket ended: {other:?}"),
            }
        }
    })
    .await
    .expect("reply before timeout");

    assert_eq!(reply.channel, "initial-data-callback");
    assert_eq!(reply.parent_id.as_deref(), Some(request.id.as_str()));
    assert_eq!(reply.args, vec![json!({ "url": "http://game:3000" })]);

    let _ = std::fs::remove_file(&path);
}
