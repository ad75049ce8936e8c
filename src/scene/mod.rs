//! Scene graph module.
//!
//! - Node: hierarchy node with a closed kind (mesh, group, light, other)
//! - Transform: local TRS with cached matrices
//! - SceneGraph: slotmap-backed arena, material normalization, world matrix pass
//! - Camera: perspective camera owned by the viewport
//! - Environment: equirectangular environment texture and its binding

pub mod camera;
pub mod environment;
pub mod graph;
pub mod node;
pub mod transform;

pub use camera::Camera;
pub use environment::{Environment, EnvironmentMapping, EnvironmentTexture};
pub use graph::SceneGraph;
pub use node::{Light, LightKind, Node, NodeKind};
pub use transform::Transform;

use slotmap::new_key_type;

new_key_type! {
    pub struct NodeHandle;
}
