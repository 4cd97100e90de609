//! Seam between a window's session wiring and its scene engine.
//!
//! The game session drives any [`SceneSurface`]: the headless
//! [`EngineCore`] in tests and the canvas-backed [`Engine`] in the browser.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use scene::SceneError;
use scene::engine::{Action, EngineCore};
use scene::graph::{Material, SceneManage, SceneSettings};
use scene::model::SceneModel;

use crate::state::identity::Token;

#[cfg(feature = "hydrate")]
use scene::engine::Engine;

pub trait SceneSurface {
    /// Replace the loaded graph with `graph`.
    ///
    /// # Errors
    ///
    /// Returns the load error; the current graph stays loaded.
    fn load(&mut self, graph: &str) -> Result<Vec<Action>, SceneError>;

    /// Apply a `scene-manage` proposal.
    ///
    /// # Errors
    ///
    /// Returns the apply error when no graph is loaded or it lacks a plane.
    fn apply_config(&mut self, manage: &SceneManage) -> Result<Vec<Action>, SceneError>;

    /// Settings of the loaded graph, for prefilling the editor.
    fn settings(&self) -> Option<SceneSettings>;

    /// Tokens of the loaded graph, in graph order.
    fn tokens(&self) -> Vec<Token>;

    /// Carry out presentation actions (cursor, redraw). Returns the actions
    /// the session must handle itself, in order.
    fn present(&mut self, actions: Vec<Action>) -> Vec<Action>;
}

fn tokens_of(model: &SceneModel) -> Vec<Token> {
    let Some(graph) = model.graph() else {
        return Vec::new();
    };
    graph
        .tokens()
        .map(|mesh| Token {
            id: mesh.id.to_string(),
            name: mesh.name.clone(),
            image: match graph.material(&mesh.material) {
                Some(Material::Standard { emissive_texture, .. }) => emissive_texture.clone(),
                _ => None,
            },
        })
        .collect()
}

fn is_persistence(action: &Action) -> bool {
    matches!(action, Action::Persist(_) | Action::PersistFailed(_))
}

impl SceneSurface for EngineCore {
    fn load(&mut self, graph: &str) -> Result<Vec<Action>, SceneError> {
        self.load_scene(graph)
    }

    fn apply_config(&mut self, manage: &SceneManage) -> Result<Vec<Action>, SceneError> {
        EngineCore::apply_config(self, manage)
    }

    fn settings(&self) -> Option<SceneSettings> {
        self.model.config().ok()
    }

    fn tokens(&self) -> Vec<Token> {
        tokens_of(&self.model)
    }

    fn present(&mut self, actions: Vec<Action>) -> Vec<Action> {
        actions.into_iter().filter(is_persistence).collect()
    }
}

#[cfg(feature = "hydrate")]
impl SceneSurface for Engine {
    fn load(&mut self, graph: &str) -> Result<Vec<Action>, SceneError> {
        self.load_scene(graph)
    }

    fn apply_config(&mut self, manage: &SceneManage) -> Result<Vec<Action>, SceneError> {
        Engine::apply_config(self, manage)
    }

    fn settings(&self) -> Option<SceneSettings> {
        self.core.model.config().ok()
    }

    fn tokens(&self) -> Vec<Token> {
        tokens_of(&self.core.model)
    }

    fn present(&mut self, actions: Vec<Action>) -> Vec<Action> {
        let (persist, visual): (Vec<_>, Vec<_>) = actions.into_iter().partition(is_persistence);
        if let Err(e) = self.handle(visual) {
            log::warn!("scene presentation failed: {e:?}");
        }
        persist
    }
}
