//! Host configuration.
//!
//! DESIGN
//! ======
//! `HostConfig` comes from CLI flags with environment fallbacks (a `.env`
//! file is loaded first). Transport tuning is read straight from the
//! environment with defaults, since it is rarely changed.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::net::IpAddr;
use std::path::PathBuf;

use clap::Parser;

/// Name of the credential file inside the data directory.
pub const CREDENTIALS_FILE: &str = "userData.json";

const DEFAULT_BACKOFF_INITIAL_MS: u64 = 1000;
const DEFAULT_BACKOFF_MAX_MS: u64 = 10_000;
const DEFAULT_BACKOFF_JITTER_MS: u64 = 250;

#[derive(Parser, Debug, Clone)]
#[command(name = "tabletop", about = "Virtual tabletop host process")]
pub struct HostConfig {
    /// Port of the local UI endpoint.
    #[arg(long, env = "TABLETOP_PORT", default_value_t = 3001)]
    pub port: u16,

    /// Address of the local UI endpoint.
    #[arg(long, env = "TABLETOP_BIND", default_value = "127.0.0.1")]
    pub bind: IpAddr,

    /// Directory holding the credential file.
    #[arg(long, env = "TABLETOP_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// UI bundle to serve at `/`.
    #[arg(long, env = "TABLETOP_STATIC_DIR")]
    pub static_dir: Option<PathBuf>,

    /// Game server to connect to on start.
    #[arg(long, env = "TABLETOP_SERVER_URL")]
    pub server_url: Option<String>,
}

impl HostConfig {
    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        self.data_dir.join(CREDENTIALS_FILE)
    }
}

/// Reconnect tuning for the remote websocket transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// First reconnect delay in milliseconds.
    pub initial_backoff_ms: u64,
    /// Upper bound for the doubling reconnect delay.
    pub max_backoff_ms: u64,
    /// Random extra delay added to each wait, at most this many milliseconds.
    pub jitter_ms: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            initial_backoff_ms: DEFAULT_BACKOFF_INITIAL_MS,
            max_backoff_ms: DEFAULT_BACKOFF_MAX_MS,
            jitter_ms: DEFAULT_BACKOFF_JITTER_MS,
        }
    }
}

impl TransportConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            initial_backoff_ms: env_parse("TABLETOP_BACKOFF_INITIAL_MS", DEFAULT_BACKOFF_INITIAL_MS),
            max_backoff_ms: env_parse("TABLETOP_BACKOFF_MAX_MS", DEFAULT_BACKOFF_MAX_MS),
            jitter_ms: env_parse("TABLETOP_BACKOFF_JITTER_MS", DEFAULT_BACKOFF_JITTER_MS),
        }
    }
}

pub(crate) fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}
