use super::*;

use std::time::Duration;

use frames::channels;
use serde_json::json;

use crate::remote::RemoteEvent;
use crate::test_support::FakeConnector;

fn temp_credentials() -> CredentialStore {
    CredentialStore::new(std::env::temp_dir().join(format!("tabletop-host-{}.json", Uuid::new_v4())))
}

fn start() -> (HostHandle, FakeConnector, tokio::task::JoinHandle<Result<(), HostError>>) {
    let fake = FakeConnector::default();
    let (host, handle) = Host::new(Box::new(fake.clone()), temp_credentials());
    (handle, fake, tokio::spawn(host.run()))
}

async fn recv(rx: &mut mpsc::UnboundedReceiver<Frame>) -> Frame {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("frame before timeout")
        .expect("window queue open")
}

/// Wait until the actor has opened `count` transports.
async fn wait_for_connects(fake: &FakeConnector, count: usize) {
    for _ in 0..100 {
        if fake.connects() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("connector never called");
}

#[tokio::test]
async fn status_reaches_every_window() {
    let (handle, fake, _task) = start();
    let (_, mut first) = handle.attach().expect("attach");
    let (_, mut second) = handle.attach().expect("attach");

    assert!(handle.connect("http://game:3000"));
    wait_for_connects(&fake, 1).await;
    fake.emit(RemoteEvent::Connected);

    assert_eq!(recv(&mut first).await.channel, channels::INITIAL_SERVER_STATUS);
    assert_eq!(recv(&mut second).await.channel, channels::INITIAL_SERVER_STATUS);
}

#[tokio::test]
async fn late_window_gets_last_status() {
    let (handle, fake, _task) = start();
    let (_, mut early) = handle.attach().expect("attach");
    handle.connect("http://game:3000");
    wait_for_connects(&fake, 1).await;
    fake.emit(RemoteEvent::Connected);
    recv(&mut early).await;

    let (_, mut late) = handle.attach().expect("attach");
    let status = recv(&mut late).await;
    assert_eq!(status.channel, channels::INITIAL_SERVER_STATUS);
    assert_eq!(status.args, vec![json!({ "status": "connected" })]);
}

#[tokio::test]
async fn replies_only_reach_the_requesting_window() {
    let (handle, _fake, _task) = start();
    let (asker, mut asker_rx) = handle.attach().expect("attach");
    let (_, mut other_rx) = handle.attach().expect("attach");

    handle.send_frame(asker, Frame::request(channels::INITIAL_DATA, vec![]));

    let reply = recv(&mut asker_rx).await;
    assert_eq!(reply.channel, "initial-data-callback");
    assert_eq!(reply.args, vec![json!({})]);
    assert!(other_rx.try_recv().is_err());
}

#[tokio::test]
async fn detached_window_stops_receiving() {
    let (handle, fake, _task) = start();
    let (window, mut rx) = handle.attach().expect("attach");
    handle.detach(window);

    handle.connect("http://game:3000");
    wait_for_connects(&fake, 1).await;
    fake.emit(RemoteEvent::Connected);

    let closed = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await.expect("queue resolves");
    assert!(closed.is_none());
}

#[tokio::test]
async fn run_ends_when_handles_drop() {
    let (handle, _fake, task) = start();
    drop(handle);
    let result = tokio::time::timeout(Duration::from_secs(5), task).await.expect("stops").expect("joins");
    assert!(result.is_ok());
}
