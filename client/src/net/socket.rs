//! Browser websocket loop to the host process.
//!
//! Frames queued by [`ChannelTransport`](crate::net::transport::ChannelTransport)
//! are written as binary messages; inbound binary messages are delivered to
//! the bridge. The loop reconnects with exponential backoff and stops once
//! the owning window's bridge is gone.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Duration;

use futures::channel::mpsc::UnboundedReceiver;

use crate::net::bridge::ChannelBridge;

const INITIAL_BACKOFF_MS: u32 = 1000;
const MAX_BACKOFF_MS: u32 = 10_000;

/// Websocket URL of the host endpoint serving this page.
#[must_use]
pub fn host_ws_url() -> String {
    let location = web_sys::window().map(|w| w.location());
    let href = location.as_ref().and_then(|l| l.href().ok()).unwrap_or_default();
    let proto = if href.starts_with("https") { "wss" } else { "ws" };
    let host = location
        .and_then(|l| l.host().ok())
        .unwrap_or_else(|| "127.0.0.1:3001".to_owned());
    format!("{proto}://{host}/ws")
}

/// Spawn the socket loop as a local task.
pub fn spawn_host_socket(url: String, bridge: Weak<ChannelBridge>, rx: UnboundedReceiver<Vec<u8>>) {
    wasm_bindgen_futures::spawn_local(socket_loop(url, bridge, rx));
}

async fn socket_loop(url: String, bridge: Weak<ChannelBridge>, rx: UnboundedReceiver<Vec<u8>>) {
    let rx = Rc::new(RefCell::new(rx));
    let mut backoff_ms = INITIAL_BACKOFF_MS;

    while bridge.strong_count() > 0 {
        match connect_and_run(&url, &bridge, &rx).await {
            Ok(()) => {
                log::info!("host socket closed");
                backoff_ms = INITIAL_BACKOFF_MS;
            }
            Err(e) => log::warn!("host socket error: {e}"),
        }

        gloo_timers::future::sleep(Duration::from_millis(u64::from(backoff_ms))).await;
        backoff_ms = (backoff_ms * 2).min(MAX_BACKOFF_MS);
    }
}

async fn connect_and_run(
    url: &str,
    bridge: &Weak<ChannelBridge>,
    rx: &Rc<RefCell<UnboundedReceiver<Vec<u8>>>>,
) -> Result<(), String> {
    use futures::StreamExt;
    use gloo_net::websocket::Message;
    use gloo_net::websocket::futures::WebSocket;

    let ws = WebSocket::open(url).map_err(|e| e.to_string())?;
    let (mut ws_write, mut ws_read) = ws.split();

    let mut rx_borrow = rx.borrow_mut();
    let send_task = async {
        use futures::SinkExt;
        while let Some(msg) = rx_borrow.next().await {
            if ws_write.send(Message::Bytes(msg)).await.is_err() {
                break;
            }
        }
    };

    let recv_task = async {
        while let Some(msg) = ws_read.next().await {
            match msg {
                Ok(Message::Bytes(bytes)) => {
                    let Some(bridge) = bridge.upgrade() else {
                        break;
                    };
                    if let Err(e) = bridge.deliver_bytes(&bytes) {
                        log::warn!("dropping malformed frame from host: {e}");
                    }
                }
                Ok(Message::Text(_)) => {}
                Err(e) => {
                    log::warn!("host socket recv error: {e}");
                    break;
                }
            }
        }
    };

    futures::future::select(Box::pin(send_task), Box::pin(recv_task)).await;
    Ok(())
}
