//! Scene construction, loading, serialization, and config edits.
//!
//! DESIGN
//! ======
//! A [`SceneModel`] holds at most one loaded graph. Loading parses and
//! validates the new graph first, then drops the old one and installs the
//! new one in a single step, so a bad payload leaves the current scene
//! untouched and there is never a moment with two graphs live.
//!
//! Grid geometry is re-derived on every load from the grid plane's size and
//! its grid material, so interaction code never needs the original config.
//!
//! Selection is interaction state, not scene state: a selected token is lifted
//! one layer while selected, but [`SceneModel::serialize`] always writes
//! tokens at the idle baseline and loading normalizes them back to it.

#[cfg(test)]
#[path = "model_test.rs"]
mod model_test;

use crate::camera::{ArcCamera, Vec3};
use crate::consts::{
    GRID_MATERIAL, GRID_MESH, GRID_OPACITY_HIDDEN, GRID_OPACITY_VISIBLE, GRID_Y_INDEX, HIGHLIGHT_LAYER,
    HIGHLIGHT_TEXTURE_RATIO, MAP_MATERIAL, MAP_MESH, MAP_Y_INDEX, TOKEN_MATERIAL, TOKEN_MESH, TOKEN_Y_INDEX,
};
use crate::error::SceneError;
use crate::graph::{HighlightLayer, Material, Mesh, MeshId, SceneConfig, SceneGraph, SceneManage, SceneSettings};
use crate::grid::GridGeometry;

/// Build a fresh graph from a config.
///
/// # Errors
///
/// [`SceneError::InvalidDimensions`] when the map and grid sizes disagree.
/// Nothing is constructed in that case.
pub fn build_graph(config: &SceneConfig) -> Result<SceneGraph, SceneError> {
    let grid = GridGeometry::from_dimensions(config.map_width, config.map_height, config.grid_columns, config.grid_rows)?;

    let mut materials = vec![
        Material::Standard {
            name: MAP_MATERIAL.to_owned(),
            emissive_texture: Some(config.map_url.clone()),
            opacity_texture: None,
        },
        Material::Grid {
            name: GRID_MATERIAL.to_owned(),
            grid_ratio: grid.ratio,
            grid_offset: Vec3::new(grid.offset_x(), 0.0, grid.offset_z()),
            major_unit_frequency: 0.0,
            opacity: grid_opacity(config.grid_lines),
        },
    ];

    let mut map = Mesh::new(MAP_MESH, grid.width, grid.height, MAP_MATERIAL);
    map.set_y_index(MAP_Y_INDEX);
    map.position.x = config.map_x;
    map.position.z = config.map_z;

    let mut grid_plane = Mesh::new(GRID_MESH, grid.width, grid.height, GRID_MATERIAL);
    grid_plane.set_y_index(GRID_Y_INDEX);

    let mut meshes = vec![map, grid_plane];

    // Tokens start in a row of adjacent cells beside the center.
    let mut next = grid.snap(Vec3::default());
    for (i, url) in config.token_urls.iter().enumerate() {
        let material = if i == 0 { TOKEN_MATERIAL.to_owned() } else { format!("{TOKEN_MATERIAL}-{i}") };
        materials.push(Material::Standard {
            name: material.clone(),
            emissive_texture: Some(url.clone()),
            opacity_texture: Some(url.clone()),
        });

        let mut token = Mesh::new(TOKEN_MESH, grid.ratio, grid.ratio, &material);
        token.position = next;
        token.set_y_index(TOKEN_Y_INDEX);
        meshes.push(token);
        next.x += grid.ratio;
    }

    Ok(SceneGraph {
        clear_color: [0.0, 0.0, 0.0, 0.0],
        camera: ArcCamera::default(),
        materials,
        meshes,
        effect_layers: vec![HighlightLayer {
            name: HIGHLIGHT_LAYER.to_owned(),
            is_stroke: true,
            main_texture_ratio: HIGHLIGHT_TEXTURE_RATIO,
            meshes: Vec::new(),
        }],
    })
}

/// Build a fresh graph and return its serialized form.
///
/// # Errors
///
/// See [`build_graph`]; serialization failures surface as [`SceneError::Serialize`].
pub fn build_scene(config: &SceneConfig) -> Result<String, SceneError> {
    let graph = build_graph(config)?;
    serde_json::to_string(&graph).map_err(SceneError::Serialize)
}

fn grid_opacity(visible: bool) -> f64 {
    if visible { GRID_OPACITY_VISIBLE } else { GRID_OPACITY_HIDDEN }
}

#[derive(Debug, Clone)]
struct LoadedScene {
    graph: SceneGraph,
    grid: GridGeometry,
}

/// The one live scene graph for a render context.
#[derive(Debug, Default)]
pub struct SceneModel {
    loaded: Option<LoadedScene>,
}

impl SceneModel {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current graph with `data`.
    ///
    /// The highlight layer is cleared and every token returns to the idle
    /// layer. On error the previous graph stays loaded.
    ///
    /// # Errors
    ///
    /// [`SceneError::Deserialize`] for malformed JSON, [`SceneError::MissingMesh`]
    /// or [`SceneError::MissingMaterial`] when the map or grid plane is absent,
    /// and [`SceneError::InvalidDimensions`] for a degenerate grid.
    pub fn load_scene(&mut self, data: &str) -> Result<(), SceneError> {
        let mut graph: SceneGraph = serde_json::from_str(data).map_err(SceneError::Deserialize)?;
        if graph.mesh_named(MAP_MESH).is_none() {
            return Err(SceneError::MissingMesh(MAP_MESH));
        }
        let grid = derive_grid(&graph)?;

        if let Some(layer) = graph.highlight_layer_mut() {
            layer.remove_all();
        }
        for token in graph.tokens_mut() {
            token.set_y_index(TOKEN_Y_INDEX);
        }

        self.unload();
        self.loaded = Some(LoadedScene { graph, grid });
        Ok(())
    }

    /// Drop the loaded graph, if any.
    pub fn unload(&mut self) {
        self.loaded = None;
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    #[must_use]
    pub fn graph(&self) -> Option<&SceneGraph> {
        self.loaded.as_ref().map(|l| &l.graph)
    }

    #[must_use]
    pub fn grid(&self) -> Option<GridGeometry> {
        self.loaded.as_ref().map(|l| l.grid)
    }

    pub fn camera_mut(&mut self) -> Option<&mut ArcCamera> {
        self.loaded.as_mut().map(|l| &mut l.graph.camera)
    }

    /// Full graph dump with every token at the idle layer.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotLoaded`] when nothing is loaded.
    pub fn serialize(&self) -> Result<String, SceneError> {
        let loaded = self.loaded.as_ref().ok_or(SceneError::NotLoaded)?;
        let mut graph = loaded.graph.clone();
        for token in graph.tokens_mut() {
            token.set_y_index(TOKEN_Y_INDEX);
        }
        serde_json::to_string(&graph).map_err(SceneError::Serialize)
    }

    /// Apply an editor change: move the map plane and show or hide grid lines.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotLoaded`], or a missing map mesh or grid material.
    pub fn apply(&mut self, manage: &SceneManage) -> Result<(), SceneError> {
        let graph = &mut self.loaded.as_mut().ok_or(SceneError::NotLoaded)?.graph;

        let map = graph.mesh_named_mut(MAP_MESH).ok_or(SceneError::MissingMesh(MAP_MESH))?;
        map.position = Vec3::new(manage.map_x, 0.0, manage.map_z);

        let grid_material = graph
            .mesh_named(GRID_MESH)
            .map(|m| m.material.clone())
            .ok_or(SceneError::MissingMesh(GRID_MESH))?;
        match graph.material_mut(&grid_material) {
            Some(Material::Grid { opacity, .. }) => {
                *opacity = grid_opacity(manage.grid_lines);
                Ok(())
            }
            _ => Err(SceneError::MissingMaterial(grid_material)),
        }
    }

    /// Read the editable settings back out of the loaded graph.
    ///
    /// # Errors
    ///
    /// [`SceneError::NotLoaded`], or a missing map mesh or grid material.
    pub fn config(&self) -> Result<SceneSettings, SceneError> {
        let loaded = self.loaded.as_ref().ok_or(SceneError::NotLoaded)?;
        let graph = &loaded.graph;
        let map = graph.mesh_named(MAP_MESH).ok_or(SceneError::MissingMesh(MAP_MESH))?;
        let map_url = match graph.material(&map.material) {
            Some(Material::Standard { emissive_texture, .. }) => emissive_texture.clone(),
            _ => None,
        };
        let grid_plane = graph.mesh_named(GRID_MESH).ok_or(SceneError::MissingMesh(GRID_MESH))?;
        let grid_lines = match graph.material(&grid_plane.material) {
            Some(Material::Grid { opacity, .. }) => *opacity > 0.0,
            _ => return Err(SceneError::MissingMaterial(grid_plane.material.clone())),
        };

        Ok(SceneSettings {
            map_url,
            grid_columns: loaded.grid.columns,
            grid_rows: loaded.grid.rows,
            map_x: map.position.x,
            map_z: map.position.z,
            grid_lines,
        })
    }

    /// Ids of every token plane, in graph order.
    #[must_use]
    pub fn token_ids(&self) -> Vec<MeshId> {
        self.graph().map(|g| g.tokens().map(|t| t.id).collect()).unwrap_or_default()
    }

    #[must_use]
    pub fn token(&self, id: &MeshId) -> Option<&Mesh> {
        self.graph().and_then(|g| g.mesh(id)).filter(|m| m.is_token())
    }

    fn token_mut(&mut self, id: &MeshId) -> Option<&mut Mesh> {
        self.loaded.as_mut().and_then(|l| l.graph.mesh_mut(id)).filter(|m| m.is_token())
    }

    /// Move a token by a planar delta. Returns `false` for unknown ids.
    pub fn translate_token(&mut self, id: &MeshId, delta: Vec3) -> bool {
        let Some(token) = self.token_mut(id) else {
            return false;
        };
        token.position.add_assign(Vec3 { y: 0.0, ..delta });
        true
    }

    /// Snap a token to its nearest cell center.
    pub fn snap_token(&mut self, id: &MeshId) -> bool {
        let Some(grid) = self.grid() else {
            return false;
        };
        let Some(token) = self.token_mut(id) else {
            return false;
        };
        token.position = grid.snap(token.position);
        true
    }

    /// Put a token on a layer (idle or selected).
    pub fn set_token_layer(&mut self, id: &MeshId, y_index: u8) -> bool {
        let Some(token) = self.token_mut(id) else {
            return false;
        };
        token.set_y_index(y_index);
        true
    }

    /// Replace the highlighted set.
    pub fn set_highlight<'a>(&mut self, ids: impl IntoIterator<Item = &'a MeshId>) {
        let Some(layer) = self.loaded.as_mut().and_then(|l| l.graph.highlight_layer_mut()) else {
            return;
        };
        layer.remove_all();
        for id in ids {
            layer.add(*id);
        }
    }

    pub fn clear_highlight(&mut self) {
        if let Some(layer) = self.loaded.as_mut().and_then(|l| l.graph.highlight_layer_mut()) {
            layer.remove_all();
        }
    }

    #[must_use]
    pub fn highlighted(&self) -> Vec<MeshId> {
        self.graph()
            .and_then(SceneGraph::highlight_layer)
            .map(|l| l.meshes.clone())
            .unwrap_or_default()
    }
}

fn derive_grid(graph: &SceneGraph) -> Result<GridGeometry, SceneError> {
    let plane = graph.mesh_named(GRID_MESH).ok_or(SceneError::MissingMesh(GRID_MESH))?;
    match graph.material(&plane.material) {
        Some(Material::Grid { grid_ratio, .. }) => GridGeometry::from_plane(plane.width, plane.height, *grid_ratio),
        _ => Err(SceneError::MissingMaterial(plane.material.clone())),
    }
}
