//! Tabletop scene model and interaction engine.
//!
//! This crate owns the authoritative in-memory scene graph for one tabletop
//! scene (map plane, grid plane, token planes, camera, highlight layer), its
//! JSON serialization, and the pointer/keyboard state machine that moves
//! tokens across the grid. It never touches the network: every side effect
//! the host must carry out (cursor change, redraw, persist the graph) comes
//! back as an [`engine::Action`].
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | Top-level engine and testable [`engine::EngineCore`] |
//! | [`model`] | Scene construction, load, serialize, and config edits |
//! | [`graph`] | Serializable graph types (meshes, materials, layers) |
//! | [`grid`] | Grid geometry derivation and snapping |
//! | [`camera`] | Arc-rotate camera and screen/ground conversions |
//! | [`input`] | Input event types and the drag state machine |
//! | [`hit`] | Token picking on the ground plane |
//! | [`render`] | Top-down Canvas2D rendering |
//! | [`consts`] | Shared numeric constants and mesh names |
//! | [`error`] | Scene error type |

pub mod camera;
pub mod consts;
pub mod engine;
pub mod error;
pub mod graph;
pub mod grid;
pub mod hit;
pub mod input;
pub mod model;
pub mod render;

pub use error::SceneError;
