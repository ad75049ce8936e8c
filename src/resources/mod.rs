//! CPU-side renderable resources: geometry, materials, meshes.

pub mod geometry;
pub mod material;
pub mod mesh;

pub use geometry::Geometry;
pub use material::{MaterialOverride, PbrMaterial, color_from_srgb_hex};
pub use mesh::{Mesh, Primitive};
