//! Scene editor flow.
//!
//! The editor may run in the main window or in a popup; it reaches the
//! owning window through its [`TargetResolver`]. It never touches the
//! loaded graph. A new scene is built here and created on the server; an
//! existing scene is reconfigured by proposing `scene-manage` to the owner.

#[cfg(test)]
#[path = "scene_edit_test.rs"]
mod scene_edit_test;

use std::rc::Rc;

use frames::channels;
use scene::SceneError;
use scene::graph::{SceneConfig, SceneManage, SceneSettings};
use scene::model::build_scene;

use crate::game::{scene_list_reply, store_scene_list};
use crate::net::reply::Reply;
use crate::net::requests;
use crate::popup::parse_scene_edit_route;
use crate::state::identity::SceneId;
use crate::window::TargetResolver;

pub struct SceneEditor<R: TargetResolver> {
    window: R,
    scene_id: Option<SceneId>,
}

impl<R: TargetResolver> SceneEditor<R> {
    /// Editor for `scene_id`, or for a new scene when `None`.
    #[must_use]
    pub fn new(window: R, scene_id: Option<SceneId>) -> Self {
        Self { window, scene_id }
    }

    /// Editor for the scene named by a `#/scene-edit?id=...` route.
    #[must_use]
    pub fn from_route(window: R, route: &str) -> Self {
        Self::new(window, parse_scene_edit_route(route))
    }

    #[must_use]
    pub fn scene_id(&self) -> Option<&SceneId> {
        self.scene_id.as_ref()
    }

    /// Settings to prefill the form: read back from the owner's loaded
    /// graph when editing an existing scene.
    #[must_use]
    pub fn initial_settings(&self) -> Option<SceneSettings> {
        self.scene_id.as_ref()?;
        let surface = self.window.target().scene()?;
        surface.borrow().settings()
    }

    /// Build a new scene and create it on the server. On success the scene
    /// list is cached and the user is switched to the new scene.
    ///
    /// # Errors
    ///
    /// [`SceneError::InvalidDimensions`] for a malformed config. Nothing is
    /// sent in that case.
    pub fn submit_new<F>(&self, name: &str, config: &SceneConfig, on_done: F) -> Result<(), SceneError>
    where
        F: FnOnce(&Reply) + 'static,
    {
        let graph = build_scene(config)?;
        let target = Rc::downgrade(&self.window.target());
        let mut on_done = Some(on_done);

        requests::scene_create(&self.window.bridge(), name, &graph, move |reply| {
            if let (Some(owner), Some(result)) = (target.upgrade(), reply.result()) {
                store_scene_list(owner.session(), result);
                let scene_id = result.get("sceneId").and_then(SceneId::from_value);
                let user_id = owner.session().user_data().and_then(|u| u.id);
                match (scene_id, user_id) {
                    (Some(scene_id), Some(user_id)) => requests::set_my_scene(
                        owner.bridge(),
                        &scene_id,
                        &user_id,
                        scene_list_reply(Rc::downgrade(&owner)),
                    ),
                    _ => log::warn!("scene created without scene or user id; not selected"),
                }
            }
            if let Reply::Rejected(e) = &reply {
                log::warn!("scene-create rejected: {e}");
            }
            if let Some(done) = on_done.take() {
                done(&reply);
            }
        });
        Ok(())
    }

    /// Propose a live change to the owner's loaded scene. Returns whether
    /// the owner took it.
    pub fn submit_existing(&self, manage: &SceneManage) -> bool {
        match serde_json::to_value(manage) {
            Ok(data) => self.window.dispatch_to_opener(channels::SCENE_MANAGE, &data),
            Err(e) => {
                log::warn!("scene-manage not sent: {e}");
                false
            }
        }
    }
}
