//! Serializable scene graph.
//!
//! These are the types that travel (as a JSON string) inside `scene-data`
//! pushes and `scene-update` requests. Everything outside this crate treats
//! that string as an opaque blob.

#[cfg(test)]
#[path = "graph_test.rs"]
mod graph_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{ArcCamera, Vec3};
use crate::consts::{DEFAULT_TOKEN_URL, RENDER_ORDER_STEP, TOKEN_MESH, Y_STEP};

/// Stable identifier for a mesh.
pub type MeshId = Uuid;

/// Full renderable state for one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneGraph {
    /// RGBA, each channel in `0.0..=1.0`.
    pub clear_color: [f64; 4],
    pub camera: ArcCamera,
    pub materials: Vec<Material>,
    pub meshes: Vec<Mesh>,
    pub effect_layers: Vec<HighlightLayer>,
}

impl SceneGraph {
    /// First mesh with the given name.
    #[must_use]
    pub fn mesh_named(&self, name: &str) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.name == name)
    }

    pub fn mesh_named_mut(&mut self, name: &str) -> Option<&mut Mesh> {
        self.meshes.iter_mut().find(|m| m.name == name)
    }

    #[must_use]
    pub fn mesh(&self, id: &MeshId) -> Option<&Mesh> {
        self.meshes.iter().find(|m| m.id == *id)
    }

    pub fn mesh_mut(&mut self, id: &MeshId) -> Option<&mut Mesh> {
        self.meshes.iter_mut().find(|m| m.id == *id)
    }

    #[must_use]
    pub fn material(&self, name: &str) -> Option<&Material> {
        self.materials.iter().find(|m| m.name() == name)
    }

    pub fn material_mut(&mut self, name: &str) -> Option<&mut Material> {
        self.materials.iter_mut().find(|m| m.name() == name)
    }

    /// All token planes, in graph order.
    pub fn tokens(&self) -> impl Iterator<Item = &Mesh> {
        self.meshes.iter().filter(|m| m.is_token())
    }

    pub fn tokens_mut(&mut self) -> impl Iterator<Item = &mut Mesh> {
        self.meshes.iter_mut().filter(|m| m.is_token())
    }

    /// The highlight layer, if the graph has one.
    pub fn highlight_layer_mut(&mut self) -> Option<&mut HighlightLayer> {
        self.effect_layers.first_mut()
    }

    #[must_use]
    pub fn highlight_layer(&self) -> Option<&HighlightLayer> {
        self.effect_layers.first()
    }

    /// Meshes in draw order: lowest `alpha_index` first, graph order among equals.
    #[must_use]
    pub fn draw_order(&self) -> Vec<&Mesh> {
        let mut meshes: Vec<&Mesh> = self.meshes.iter().collect();
        meshes.sort_by_key(|m| m.alpha_index);
        meshes
    }
}

/// A flat ground plane centered on `position`, `width` along x and `height` along z.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mesh {
    pub id: MeshId,
    pub name: String,
    pub width: f64,
    pub height: f64,
    pub position: Vec3,
    /// Render order; `y_index * 100`.
    pub alpha_index: i32,
    /// Name of the material in [`SceneGraph::materials`].
    pub material: String,
}

impl Mesh {
    #[must_use]
    pub fn new(name: &str, width: f64, height: f64, material: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.to_owned(),
            width,
            height,
            position: Vec3::default(),
            alpha_index: 0,
            material: material.to_owned(),
        }
    }

    #[must_use]
    pub fn is_token(&self) -> bool {
        self.name == TOKEN_MESH
    }

    /// Place the mesh on layer `y_index`: height and render order follow.
    pub fn set_y_index(&mut self, y_index: u8) {
        self.position.y = f64::from(y_index) * Y_STEP;
        self.alpha_index = i32::from(y_index) * RENDER_ORDER_STEP;
    }

    /// Whether a ground point lies inside this plane's footprint.
    #[must_use]
    pub fn contains(&self, p: Vec3) -> bool {
        let hw = self.width / 2.0;
        let hh = self.height / 2.0;
        p.x >= self.position.x - hw
            && p.x <= self.position.x + hw
            && p.z >= self.position.z - hh
            && p.z <= self.position.z + hh
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Material {
    /// Textured material used by the map and token planes.
    #[serde(rename_all = "camelCase")]
    Standard {
        name: String,
        emissive_texture: Option<String>,
        opacity_texture: Option<String>,
    },
    /// Procedural grid lines.
    #[serde(rename_all = "camelCase")]
    Grid {
        name: String,
        grid_ratio: f64,
        grid_offset: Vec3,
        major_unit_frequency: f64,
        opacity: f64,
    },
}

impl Material {
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Standard { name, .. } | Self::Grid { name, .. } => name,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HighlightLayer {
    pub name: String,
    pub is_stroke: bool,
    pub main_texture_ratio: f64,
    /// Highlighted meshes.
    #[serde(default)]
    pub meshes: Vec<MeshId>,
}

impl HighlightLayer {
    pub fn remove_all(&mut self) {
        self.meshes.clear();
    }

    pub fn add(&mut self, id: MeshId) {
        if !self.meshes.contains(&id) {
            self.meshes.push(id);
        }
    }
}

/// Inputs for building a fresh scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneConfig {
    pub map_url: String,
    /// Map image width in pixels.
    pub map_width: f64,
    /// Map image height in pixels.
    pub map_height: f64,
    pub grid_columns: u32,
    pub grid_rows: u32,
    pub map_x: f64,
    pub map_z: f64,
    pub grid_lines: bool,
    /// One token plane per entry.
    #[serde(default = "default_token_urls")]
    pub token_urls: Vec<String>,
}

fn default_token_urls() -> Vec<String> {
    vec![DEFAULT_TOKEN_URL.to_owned()]
}

/// Live edit proposed by the scene editor (`scene-manage`). Extra fields on
/// the payload (such as a full [`SceneConfig`]) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneManage {
    pub map_x: f64,
    pub map_z: f64,
    pub grid_lines: bool,
}

/// Settings read back from a loaded graph, used to prefill the scene editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SceneSettings {
    pub map_url: Option<String>,
    pub grid_columns: u32,
    pub grid_rows: u32,
    pub map_x: f64,
    pub map_z: f64,
    pub grid_lines: bool,
}
