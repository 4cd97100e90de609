//! Tabletop host process.
//!
//! SYSTEM CONTEXT
//! ==============
//! UI windows connect to this process over a local websocket. The host keeps
//! one connection to the remote game server and relays between the two:
//! requests flow out, acknowledgements come back to the window that asked,
//! and server pushes fan out to every window. It also owns the small
//! credential file the connect screen pre-fills from.
//!
//! | Module | Role |
//! |---|---|
//! | [`config`] | CLI/env configuration |
//! | [`credentials`] | `userData.json` read and merge |
//! | [`remote`] | Remote connection state and Socket.IO transport |
//! | [`router`] | Per-channel routing |
//! | [`host`] | Actor owning all host state |
//! | [`routes`] | axum UI endpoint |

pub mod config;
pub mod credentials;
pub mod error;
pub mod host;
pub mod remote;
pub mod router;
pub mod routes;

#[cfg(test)]
mod test_support;

use std::future::IntoFuture;
use std::net::SocketAddr;

use tokio::net::TcpListener;

use crate::config::{HostConfig, TransportConfig};
use crate::credentials::CredentialStore;
use crate::error::HostError;
use crate::host::Host;
use crate::remote::transport::WsConnector;

/// Run the host until the UI endpoint or the actor stops.
///
/// # Errors
///
/// Bind and serve failures of the UI endpoint, and credential file failures
/// surfaced by the actor.
pub async fn run(config: HostConfig) -> Result<(), HostError> {
    let credentials = CredentialStore::new(config.credentials_path());
    let connector = WsConnector::new(TransportConfig::from_env());
    let (host, handle) = Host::new(Box::new(connector), credentials);

    if let Some(url) = &config.server_url {
        handle.connect(url.as_str());
    }

    let addr = SocketAddr::new(config.bind, config.port);
    let listener = TcpListener::bind(addr).await.map_err(HostError::Bind)?;
    tracing::info!(%addr, data_dir = %config.data_dir.display(), "tabletop host listening");

    let app = routes::app(handle, config.static_dir.clone());
    tokio::select! {
        served = axum::serve(listener, app).into_future() => served.map_err(HostError::Serve),
        finished = host.run() => finished,
    }
}
