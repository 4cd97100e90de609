#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::Vec3;
use crate::graph::{MeshId, SceneGraph};

/// Token under a ground-plane point, if any.
///
/// When footprints overlap, the token drawn on top wins: highest
/// `alpha_index` first (so a selected token beats idle ones), then the later
/// one in graph order.
#[must_use]
pub fn pick_token(graph: &SceneGraph, ground: Vec3) -> Option<MeshId> {
    graph
        .tokens()
        .filter(|t| t.contains(ground))
        .max_by_key(|t| t.alpha_index)
        .map(|t| t.id)
}
