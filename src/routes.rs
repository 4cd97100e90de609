//! Local UI endpoint.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each UI window opens one websocket at `/ws` and exchanges binary protobuf
//! frames with the host actor. `/healthz` answers `ok`. When a static
//! directory is configured, the UI bundle is served for every other path.

#[cfg(test)]
#[path = "routes_test.rs"]
mod routes_test;

use std::path::PathBuf;

use axum::Router;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use axum::routing::get;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::host::HostHandle;

pub fn app(host: HostHandle, static_dir: Option<PathBuf>) -> Router {
    let router = Router::new()
        .route("/ws", get(handle_ws))
        .route("/healthz", get(healthz))
        .with_state(host);

    let router = match static_dir {
        Some(dir) => router.fallback_service(ServeDir::new(dir).append_index_html_on_directories(true)),
        None => router,
    };
    router.layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

async fn handle_ws(State(host): State<HostHandle>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| run_ws(socket, host))
}

async fn run_ws(mut socket: WebSocket, host: HostHandle) {
    let Some((window, mut outbound)) = host.attach() else {
        warn!("ui: host stopped, refusing window");
        return;
    };
    info!(%window, "ui: window connected");

    loop {
        tokio::select! {
            msg = socket.recv() => {
                let Some(Ok(msg)) = msg else { break };
                match msg {
                    Message::Binary(bytes) => match frames::decode_frame(&bytes) {
                        Ok(frame) => {
                            if !host.send_frame(window, frame) {
                                break;
                            }
                        }
                        Err(e) => warn!(%window, error = %e, "ui: invalid inbound frame"),
                    },
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                let bytes = frames::encode_frame(&frame);
                if socket.send(Message::Binary(bytes.into())).await.is_err() {
                    break;
                }
            }
        }
    }

    host.detach(window);
    info!(%window, "ui: window disconnected");
}
