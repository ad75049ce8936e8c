use std::sync::Arc;

use crate::resources::geometry::Geometry;
use crate::resources::material::PbrMaterial;

/// One drawable part of a mesh: shared geometry plus its own material.
#[derive(Debug, Clone)]
pub struct Primitive {
    pub geometry: Arc<Geometry>,
    pub material: PbrMaterial,
}

impl Primitive {
    #[must_use]
    pub fn new(geometry: Arc<Geometry>, material: PbrMaterial) -> Self {
        Self { geometry, material }
    }
}

#[derive(Debug, Clone)]
pub struct Mesh {
    pub name: Option<String>,
    pub primitives: Vec<Primitive>,
    pub visible: bool,
}

impl Mesh {
    #[must_use]
    pub fn new(primitives: Vec<Primitive>) -> Self {
        Self {
            name: None,
            primitives,
            visible: true,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}
