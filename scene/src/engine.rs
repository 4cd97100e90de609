use std::collections::HashSet;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::{Point, Vec3, Viewport};
use crate::consts::{SELECTED_Y_INDEX, TOKEN_Y_INDEX};
use crate::error::SceneError;
use crate::graph::{MeshId, SceneManage};
use crate::hit;
use crate::input::{Button, Cursor, InputState, Key, Modifiers, UiState, WheelDelta};
use crate::model::SceneModel;
use crate::render;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    SetCursor(Cursor),
    RenderNeeded,
    /// A commit happened; send this serialized graph as the scene's new state.
    Persist(String),
    /// A commit happened but the graph could not be serialized.
    PersistFailed(String),
}

/// Core engine state: all logic that does not depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug)]
pub struct EngineCore {
    pub model: SceneModel,
    pub ui: UiState,
    pub input: InputState,
    pub viewport: Viewport,
    pub dpr: f64,
    cursor: Cursor,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            model: SceneModel::new(),
            ui: UiState::default(),
            input: InputState::default(),
            viewport: Viewport::default(),
            dpr: 1.0,
            cursor: Cursor::Default,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Data inputs ---

    /// Tear down the current graph and load `data`. Selection and any gesture
    /// in progress are dropped along with the old graph.
    ///
    /// # Errors
    ///
    /// Propagates [`SceneModel::load_scene`] errors; the current scene is kept.
    pub fn load_scene(&mut self, data: &str) -> Result<Vec<Action>, SceneError> {
        self.model.load_scene(data)?;
        self.ui = UiState::default();
        self.input = InputState::Idle;
        self.cursor = Cursor::Default;
        Ok(vec![Action::SetCursor(Cursor::Default), Action::RenderNeeded])
    }

    /// Apply an editor change (`scene-manage`) and persist.
    ///
    /// # Errors
    ///
    /// Propagates [`SceneModel::apply`] errors; nothing is persisted then.
    pub fn apply_config(&mut self, manage: &SceneManage) -> Result<Vec<Action>, SceneError> {
        self.model.apply(manage)?;
        Ok(vec![Action::RenderNeeded, self.persist()])
    }

    /// Update viewport dimensions (CSS pixels) and device pixel ratio.
    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.viewport = Viewport::new(width_css, height_css);
        self.dpr = dpr;
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        let ground = self.ground_at(screen_pt);
        let picked = ground.and_then(|g| self.token_at(g));

        match (button, picked, ground) {
            (Button::Primary, Some(id), Some(anchor)) => {
                let mut next = if modifiers.shift { self.ui.selected_ids.clone() } else { HashSet::new() };
                next.insert(id);
                self.set_selection(next);
                self.input = InputState::Dragging { anchor };
                self.cursor = Cursor::Grabbing;
                vec![Action::SetCursor(Cursor::Grabbing), Action::RenderNeeded]
            }
            (Button::Middle, _, _) => Vec::new(),
            (Button::Secondary, _, Some(_)) => {
                self.set_selection(HashSet::new());
                self.input = InputState::Panning { last: screen_pt };
                vec![Action::RenderNeeded]
            }
            _ => {
                self.set_selection(HashSet::new());
                self.input = InputState::Idle;
                vec![Action::RenderNeeded]
            }
        }
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, _modifiers: Modifiers) -> Vec<Action> {
        let mut moved = false;
        if let InputState::Panning { last } = self.input {
            let viewport = self.viewport;
            if let Some(camera) = self.model.camera_mut() {
                camera.pan_by_pixels(screen_pt.x - last.x, screen_pt.y - last.y, viewport);
                moved = true;
            }
            self.input = InputState::Panning { last: screen_pt };
        }

        let ground = self.ground_at(screen_pt);
        self.ui.hovered_id = ground.and_then(|g| self.token_at(g));

        if let InputState::Dragging { anchor } = self.input {
            if let Some(current) = ground {
                let delta = current.planar_delta(anchor);
                for id in &self.ui.selected_ids {
                    self.model.translate_token(id, delta);
                }
                self.input = InputState::Dragging { anchor: current };
                moved = true;
            }
        }

        self.cursor = self.hover_cursor();
        let mut actions = vec![Action::SetCursor(self.cursor)];
        if moved {
            actions.push(Action::RenderNeeded);
        }
        actions
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if self.input.is_panning() {
            // Camera moves are not commits.
            self.input = InputState::Idle;
            self.cursor = self.hover_cursor();
            return vec![Action::SetCursor(self.cursor)];
        }
        if !self.input.is_dragging() {
            return Vec::new();
        }
        self.input = InputState::Idle;

        for id in &self.ui.selected_ids {
            self.model.snap_token(id);
        }
        self.model.set_highlight(&self.ui.selected_ids);

        let ground = self.ground_at(screen_pt);
        self.ui.hovered_id = ground.and_then(|g| self.token_at(g));
        self.cursor = self.hover_cursor();

        vec![Action::SetCursor(self.cursor), Action::RenderNeeded, self.persist()]
    }

    pub fn on_key_up(&mut self, key: Key, _modifiers: Modifiers) -> Vec<Action> {
        let Some(direction) = key.direction() else {
            return Vec::new();
        };
        if self.ui.selected_ids.is_empty() {
            return Vec::new();
        }
        let Some(grid) = self.model.grid() else {
            return Vec::new();
        };

        let delta = direction.offset(grid.ratio);
        for id in &self.ui.selected_ids {
            self.model.translate_token(id, delta);
        }
        vec![Action::RenderNeeded, self.persist()]
    }

    pub fn on_wheel(&mut self, _screen_pt: Point, delta: WheelDelta, _modifiers: Modifiers) -> Vec<Action> {
        let Some(camera) = self.model.camera_mut() else {
            return Vec::new();
        };
        camera.zoom_by_wheel(delta.dy);
        vec![Action::RenderNeeded]
    }

    // --- Queries ---

    #[must_use]
    pub fn selection(&self) -> &HashSet<MeshId> {
        &self.ui.selected_ids
    }

    #[must_use]
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Ground point under a screen point, using the loaded camera.
    #[must_use]
    pub fn ground_at(&self, screen_pt: Point) -> Option<Vec3> {
        self.model.graph().and_then(|g| g.camera.screen_to_ground(screen_pt, self.viewport))
    }

    // --- Internals ---

    fn token_at(&self, ground: Vec3) -> Option<MeshId> {
        self.model.graph().and_then(|g| hit::pick_token(g, ground))
    }

    fn hover_cursor(&self) -> Cursor {
        if self.input.is_dragging() || self.input.is_panning() {
            Cursor::Grabbing
        } else if self.ui.hovered_id.is_some() {
            Cursor::Grab
        } else {
            Cursor::Default
        }
    }

    /// Swap the selection: dropped tokens go back to the idle layer, new ones
    /// are lifted, and the highlight follows.
    fn set_selection(&mut self, next: HashSet<MeshId>) {
        for id in self.ui.selected_ids.difference(&next) {
            self.model.set_token_layer(id, TOKEN_Y_INDEX);
        }
        for id in next.difference(&self.ui.selected_ids) {
            self.model.set_token_layer(id, SELECTED_Y_INDEX);
        }
        self.model.set_highlight(&next);
        self.ui.selected_ids = next;
    }

    fn persist(&self) -> Action {
        match self.model.serialize() {
            Ok(graph) => Action::Persist(graph),
            Err(e) => Action::PersistFailed(e.to_string()),
        }
    }
}

/// The full scene engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        Self { canvas, core: EngineCore::new() }
    }

    // --- Delegated data inputs ---

    /// # Errors
    ///
    /// See [`EngineCore::load_scene`].
    pub fn load_scene(&mut self, data: &str) -> Result<Vec<Action>, SceneError> {
        self.core.load_scene(data)
    }

    /// # Errors
    ///
    /// See [`EngineCore::apply_config`].
    pub fn apply_config(&mut self, manage: &SceneManage) -> Result<Vec<Action>, SceneError> {
        self.core.apply_config(manage)
    }

    pub fn set_viewport(&mut self, width_css: f64, height_css: f64, dpr: f64) {
        self.core.set_viewport(width_css, height_css, dpr);
    }

    // --- Input events ---

    pub fn on_pointer_down(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_down(screen_pt, button, modifiers)
    }

    pub fn on_pointer_move(&mut self, screen_pt: Point, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_move(screen_pt, modifiers)
    }

    pub fn on_pointer_up(&mut self, screen_pt: Point, button: Button, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_pointer_up(screen_pt, button, modifiers)
    }

    pub fn on_wheel(&mut self, screen_pt: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_wheel(screen_pt, delta, modifiers)
    }

    pub fn on_key_up(&mut self, key: Key, modifiers: Modifiers) -> Vec<Action> {
        self.core.on_key_up(key, modifiers)
    }

    // --- Host effects ---

    /// Carry out the cursor and redraw actions. Returns the rest
    /// (persistence) for the caller.
    ///
    /// # Errors
    ///
    /// Returns `Err` if styling the element or drawing fails.
    pub fn handle(&self, actions: Vec<Action>) -> Result<Vec<Action>, JsValue> {
        let mut rest = Vec::new();
        let mut render = false;
        for action in actions {
            match action {
                Action::SetCursor(cursor) => self.set_cursor(cursor)?,
                Action::RenderNeeded => render = true,
                other => rest.push(other),
            }
        }
        if render {
            self.render()?;
        }
        Ok(rest)
    }

    /// # Errors
    ///
    /// Returns `Err` if the style property cannot be set.
    pub fn set_cursor(&self, cursor: Cursor) -> Result<(), JsValue> {
        self.canvas.style().set_property("cursor", cursor.as_css())
    }

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Returns `Err` if the 2D context is unavailable or a draw call fails.
    pub fn render(&self) -> Result<(), JsValue> {
        let Some(ctx) = self.canvas.get_context("2d")? else {
            return Ok(());
        };
        let ctx = ctx.dyn_into::<CanvasRenderingContext2d>()?;
        render::draw(&ctx, &self.core.model, &self.core.ui, self.core.viewport, self.core.dpr)
    }

    // --- Delegated queries ---

    #[must_use]
    pub fn selection(&self) -> &HashSet<MeshId> {
        self.core.selection()
    }
}
