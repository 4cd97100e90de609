//! Host error types.
//!
//! Only local environment failures are errors here. Remote rejections and
//! connection failures travel to the UI as `{error}` payloads instead.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("credential file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("credential file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to bind UI endpoint: {0}")]
    Bind(#[source] std::io::Error),
    #[error("UI endpoint failed: {0}")]
    Serve(#[source] std::io::Error),
}
