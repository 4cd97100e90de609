//! Rendering: draws a top-down view of the scene to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives read-only views of the scene model and UI state and produces
//! pixels. It does not mutate any application state.
//!
//! The camera looks straight down, so each ground plane is drawn as an
//! axis-aligned rectangle: world `x` runs right and world `z` runs up the
//! screen. Textures are not fetched here; planes get flat placeholder fills.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use crate::camera::{Viewport, Vec3};
use crate::graph::{Material, Mesh, SceneGraph};
use crate::grid::GridGeometry;
use crate::input::UiState;
use crate::model::SceneModel;

const MAP_FILL: &str = "#d8c9a3";
const GRID_STROKE: &str = "rgba(20, 20, 20, 1)";
const TOKEN_FILL: &str = "#8b2e2e";
const TOKEN_STROKE: &str = "#1b1b1b";
const HIGHLIGHT_STROKE: &str = "#1E90FF";
const HOVER_STROKE: &str = "rgba(30, 144, 255, 0.45)";

/// Token disc radius as a fraction of the token plane size.
const TOKEN_RADIUS_RATIO: f64 = 0.42;
/// Highlight dash segment length in screen pixels.
const HIGHLIGHT_DASH_PX: f64 = 4.0;
/// Grid line width in screen pixels.
const GRID_LINE_PX: f64 = 1.0;
/// Highlight outline width in screen pixels.
const HIGHLIGHT_LINE_PX: f64 = 2.0;

/// Draw the full scene: map, grid lines, tokens, and highlights.
///
/// `viewport` is in CSS pixels. `dpr` is the device pixel ratio.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    model: &SceneModel,
    ui: &UiState,
    viewport: Viewport,
    dpr: f64,
) -> Result<(), JsValue> {
    // Layer 1: clear.
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, viewport.width, viewport.height);

    let Some(graph) = model.graph() else {
        return Ok(());
    };
    let s = graph.camera.world_per_pixel(viewport);
    if s <= 0.0 {
        return Ok(());
    }

    // World (x, z) → screen: scale by 1/s, flip z, center on the camera target.
    let target = graph.camera.target;
    ctx.set_transform(
        dpr / s,
        0.0,
        0.0,
        -dpr / s,
        dpr * (viewport.width / 2.0 - target.x / s),
        dpr * (viewport.height / 2.0 + target.z / s),
    )?;

    // Layer 2: planes in render order (bottom first).
    let grid = model.grid();
    for mesh in graph.draw_order() {
        draw_mesh(ctx, graph, mesh, grid, s)?;
    }

    // Layer 3: hover and highlight outlines.
    if let Some(hovered) = ui.hovered_id.and_then(|id| graph.mesh(&id)) {
        if !ui.selected_ids.contains(&hovered.id) {
            draw_outline(ctx, hovered, HOVER_STROKE, s)?;
        }
    }
    if let Some(layer) = graph.highlight_layer() {
        for mesh in layer.meshes.iter().filter_map(|id| graph.mesh(id)) {
            draw_outline(ctx, mesh, HIGHLIGHT_STROKE, s)?;
        }
    }

    Ok(())
}

// =============================================================
// Plane dispatch
// =============================================================

fn draw_mesh(
    ctx: &CanvasRenderingContext2d,
    graph: &SceneGraph,
    mesh: &Mesh,
    grid: Option<GridGeometry>,
    s: f64,
) -> Result<(), JsValue> {
    if mesh.is_token() {
        return draw_token(ctx, mesh, s);
    }
    match graph.material(&mesh.material) {
        Some(Material::Grid { opacity, .. }) => {
            if let Some(grid) = grid {
                draw_grid(ctx, mesh, &grid, *opacity, s);
            }
            Ok(())
        }
        _ => {
            draw_map(ctx, mesh);
            Ok(())
        }
    }
}

fn draw_map(ctx: &CanvasRenderingContext2d, mesh: &Mesh) {
    let (x, z, w, h) = footprint(mesh);
    ctx.set_fill_style_str(MAP_FILL);
    ctx.fill_rect(x, z, w, h);
}

fn draw_grid(ctx: &CanvasRenderingContext2d, mesh: &Mesh, grid: &GridGeometry, opacity: f64, s: f64) {
    if opacity <= 0.0 {
        return;
    }
    let (x0, z0, w, h) = footprint(mesh);
    let center = mesh.position;

    ctx.save();
    ctx.set_global_alpha(opacity);
    ctx.set_stroke_style_str(GRID_STROKE);
    ctx.set_line_width(GRID_LINE_PX * s);
    ctx.begin_path();
    for x in grid.lines_x(center.x) {
        ctx.move_to(x, z0);
        ctx.line_to(x, z0 + h);
    }
    for z in grid.lines_z(center.z) {
        ctx.move_to(x0, z);
        ctx.line_to(x0 + w, z);
    }
    ctx.stroke();
    ctx.restore();
}

fn draw_token(ctx: &CanvasRenderingContext2d, mesh: &Mesh, s: f64) -> Result<(), JsValue> {
    let Vec3 { x, z, .. } = mesh.position;
    let r = mesh.width.min(mesh.height) * TOKEN_RADIUS_RATIO;

    ctx.save();
    ctx.begin_path();
    ctx.arc(x, z, r, 0.0, 2.0 * PI)?;
    ctx.set_fill_style_str(TOKEN_FILL);
    ctx.fill();
    ctx.set_stroke_style_str(TOKEN_STROKE);
    ctx.set_line_width(s);
    ctx.stroke();
    ctx.restore();
    Ok(())
}

// =============================================================
// Outlines
// =============================================================

fn draw_outline(ctx: &CanvasRenderingContext2d, mesh: &Mesh, color: &str, s: f64) -> Result<(), JsValue> {
    let (x, z, w, h) = footprint(mesh);
    let dash_world = HIGHLIGHT_DASH_PX * s;

    ctx.save();
    ctx.set_stroke_style_str(color);
    ctx.set_line_width(HIGHLIGHT_LINE_PX * s);
    let dash_array = js_sys::Array::new();
    dash_array.push(&dash_world.into());
    dash_array.push(&dash_world.into());
    ctx.set_line_dash(&dash_array)?;
    ctx.stroke_rect(x, z, w, h);
    ctx.set_line_dash(&js_sys::Array::new())?;
    ctx.restore();
    Ok(())
}

// =============================================================
// Helpers
// =============================================================

/// Lower-left corner and size of a plane in world `(x, z)`.
fn footprint(mesh: &Mesh) -> (f64, f64, f64, f64) {
    (
        mesh.position.x - mesh.width / 2.0,
        mesh.position.z - mesh.height / 2.0,
        mesh.width,
        mesh.height,
    )
}
