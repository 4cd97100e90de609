//! Shared numeric constants and well-known names for the scene crate.

use std::f64::consts::FRAC_PI_2;

// ── Math ────────────────────────────────────────────────────────

/// Tolerance for geometry comparisons (cell sizes, snapped positions).
pub const EPSILON: f64 = 1e-9;

// ── Layering ────────────────────────────────────────────────────

/// World-space height of one y-index step above the ground.
pub const Y_STEP: f64 = 0.001;

/// Render order multiplier: `alpha_index = y_index * RENDER_ORDER_STEP`.
pub const RENDER_ORDER_STEP: i32 = 100;

pub const MAP_Y_INDEX: u8 = 0;
pub const GRID_Y_INDEX: u8 = 1;
/// Baseline for every idle token.
pub const TOKEN_Y_INDEX: u8 = 2;
/// A selected token is lifted above its idle peers.
pub const SELECTED_Y_INDEX: u8 = 3;

// ── Grid ────────────────────────────────────────────────────────

pub const GRID_OPACITY_VISIBLE: f64 = 0.99;
pub const GRID_OPACITY_HIDDEN: f64 = 0.0;

// ── Camera ──────────────────────────────────────────────────────

pub const CAMERA_ALPHA: f64 = -FRAC_PI_2;
pub const CAMERA_BETA: f64 = 0.0;
pub const CAMERA_RADIUS: f64 = 30.0;
pub const CAMERA_RADIUS_MIN: f64 = 5.0;
pub const CAMERA_RADIUS_MAX: f64 = 50.0;
pub const CAMERA_WHEEL_PRECISION: f64 = 5.0;
pub const CAMERA_PANNING_SENSIBILITY: f64 = 200.0;
/// Vertical field of view in radians.
pub const CAMERA_FOV: f64 = 0.8;
/// Wheel pixels per radius unit at precision 1.
pub const WHEEL_PIXELS_PER_UNIT: f64 = 40.0;

// ── Highlight ───────────────────────────────────────────────────

pub const HIGHLIGHT_TEXTURE_RATIO: f64 = 5.0;

// ── Names ───────────────────────────────────────────────────────

pub const CAMERA_NAME: &str = "camera";
pub const MAP_MESH: &str = "map-ground";
pub const GRID_MESH: &str = "grid-ground";
pub const TOKEN_MESH: &str = "token-ground";
pub const MAP_MATERIAL: &str = "map-material";
pub const GRID_MATERIAL: &str = "grid-material";
pub const TOKEN_MATERIAL: &str = "token-material";
pub const HIGHLIGHT_LAYER: &str = "highlight-layer";

/// Token image used when a config names none.
pub const DEFAULT_TOKEN_URL: &str = "images/token1.png";
