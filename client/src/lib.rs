//! UI-process side of the tabletop.
//!
//! SYSTEM CONTEXT
//! ==============
//! Each top-level browser window holds one [`window::WindowState`]: a
//! channel bridge to the host process, a session store, and an event table
//! for cross-window notifications. A popup editor resolves all three to its
//! opener through [`window::TargetResolver`], so it never owns bridge or
//! session state of its own.
//!
//! | Module | Role |
//! |---|---|
//! | `listeners` | Replace-then-attach handler table keyed by name |
//! | `net` | Channel bridge, host transport, typed requests |
//! | `state` | Per-window session store and identity lookups |
//! | `surface` | Seam between the session and the scene engine |
//! | `window` | Window contexts and the opener resolver |
//! | `popup` | One-editor-per-opener slot and routes |
//! | `game` | Main-window wiring of pushes, scene engine, persistence |
//! | `scene_edit` | Scene editor flow (create or reconfigure) |

pub mod game;
pub mod listeners;
pub mod net;
pub mod popup;
pub mod scene_edit;
pub mod state;
pub mod surface;
pub mod window;

#[cfg(feature = "hydrate")]
pub mod app;

#[cfg(test)]
mod test_support;
