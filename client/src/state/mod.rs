//! Per-window state.
//!
//! SYSTEM CONTEXT
//! ==============
//! `session` is the non-durable key/value store each top-level window owns.
//! `identity` defines the records kept in it and derives the game-master
//! role from the cached roster.

pub mod identity;
pub mod session;
