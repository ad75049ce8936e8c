use glam::Vec3;

use crate::resources::mesh::Mesh;
use crate::scene::NodeHandle;
use crate::scene::transform::Transform;

/// Punctual light types carried over from an imported asset.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Directional,
    Point { range: Option<f32> },
    Spot { range: Option<f32>, inner_cone: f32, outer_cone: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Light {
    pub kind: LightKind,
    pub color: Vec3,
    pub intensity: f32,
}

/// What a node is, decided once at load time.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Mesh(Mesh),
    Group,
    Light(Light),
    /// Cameras, empties with no children and anything else that is not drawn.
    Other,
}

/// A scene graph node: hierarchy links, local transform and kind.
#[derive(Debug, Clone)]
pub struct Node {
    pub name: Option<String>,
    pub kind: NodeKind,
    pub transform: Transform,
    pub visible: bool,

    pub(crate) parent: Option<NodeHandle>,
    pub(crate) children: Vec<NodeHandle>,
}

impl Node {
    #[must_use]
    pub fn new(kind: NodeKind) -> Self {
        Self {
            name: None,
            kind,
            transform: Transform::new(),
            visible: true,
            parent: None,
            children: Vec::new(),
        }
    }

    #[must_use]
    pub fn group() -> Self {
        Self::new(NodeKind::Group)
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<NodeHandle> {
        self.parent
    }

    #[inline]
    #[must_use]
    pub fn children(&self) -> &[NodeHandle] {
        &self.children
    }

    #[inline]
    #[must_use]
    pub fn mesh(&self) -> Option<&Mesh> {
        match &self.kind {
            NodeKind::Mesh(mesh) => Some(mesh),
            _ => None,
        }
    }
}
