/// Errors raised while building, loading, or editing a scene graph.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    /// Map and grid dimensions do not describe square, whole cells.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),
    /// A required mesh is absent from a loaded graph.
    #[error("scene graph has no `{0}` mesh")]
    MissingMesh(&'static str),
    /// A mesh references a material that is absent or of the wrong kind.
    #[error("scene graph has no usable material `{0}`")]
    MissingMaterial(String),
    /// No graph is loaded yet.
    #[error("no scene loaded")]
    NotLoaded,
    /// The serialized graph could not be parsed.
    #[error("failed to parse scene graph: {0}")]
    Deserialize(#[source] serde_json::Error),
    /// The graph could not be written out.
    #[error("failed to serialize scene graph: {0}")]
    Serialize(#[source] serde_json::Error),
}
