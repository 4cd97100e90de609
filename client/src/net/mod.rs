//! Host-process connection for one window.
//!
//! SYSTEM CONTEXT
//! ==============
//! `bridge` owns channel listeners and request/reply pairing, `transport`
//! moves encoded frames toward the host, `socket` runs the browser
//! websocket loop, `reply` classifies reply payloads, and `requests` names
//! every call the UI makes.

pub mod bridge;
pub mod reply;
pub mod requests;
pub mod transport;

#[cfg(feature = "hydrate")]
pub mod socket;
