//! glTF 2.0 import into a [`SceneGraph`].
//!
//! Supports `.gltf` (external or data-URI buffers) and `.glb`. Only the
//! default scene is imported. Triangle-list primitives become mesh primitives;
//! other topologies are skipped. Textures are not read.

use std::path::Path;
use std::sync::Arc;

use glam::Vec4;
use rustc_hash::FxHashMap;

use crate::errors::LoadError;
use crate::resources::geometry::Geometry;
use crate::resources::material::PbrMaterial;
use crate::resources::mesh::{Mesh, Primitive};
use crate::scene::{Light, LightKind, Node, NodeHandle, NodeKind, SceneGraph, Transform};

/// Parses `bytes` and builds a scene graph.
///
/// `base_dir` resolves external buffer files; `None` allows only embedded data.
/// CPU bound; run it on a blocking thread.
pub fn import_scene(uri: &str, bytes: &[u8], base_dir: Option<&Path>) -> Result<SceneGraph, LoadError> {
    let decode = |e: gltf::Error| LoadError::Decode {
        uri: uri.to_string(),
        reason: e.to_string(),
    };

    let gltf::Gltf { document, blob } = gltf::Gltf::from_slice(bytes).map_err(decode)?;

    let unsupported: Vec<&str> = document
        .extensions_required()
        .filter(|ext| *ext != "KHR_lights_punctual")
        .collect();
    if !unsupported.is_empty() {
        log::warn!("'{uri}' requires unsupported glTF extensions {unsupported:?}; display may be incorrect");
    }

    let buffers = gltf::import_buffers(&document, base_dir, blob).map_err(decode)?;

    let mut builder = SceneBuilder {
        buffers: &buffers,
        geometries: FxHashMap::default(),
        graph: SceneGraph::new(),
    };

    let scene = document.default_scene().or_else(|| document.scenes().next());
    match scene {
        Some(scene) => {
            for root in scene.nodes() {
                builder.add_subtree(root, None);
            }
        }
        None => log::warn!("'{uri}' contains no scene"),
    }

    log::debug!(
        "Imported '{uri}': {} nodes, {} meshes",
        builder.graph.node_count(),
        builder.graph.mesh_count()
    );
    Ok(builder.graph)
}

struct SceneBuilder<'a> {
    buffers: &'a [gltf::buffer::Data],
    /// Geometry shared between nodes that instance the same mesh.
    geometries: FxHashMap<(usize, usize), Arc<Geometry>>,
    graph: SceneGraph,
}

impl SceneBuilder<'_> {
    fn add_subtree(&mut self, root: gltf::Node<'_>, parent: Option<NodeHandle>) {
        let mut stack = vec![(root, parent)];
        while let Some((gltf_node, parent)) = stack.pop() {
            let node = self.build_node(&gltf_node);
            let handle = match parent {
                Some(parent) => self.graph.add_child(parent, node),
                None => self.graph.add_node(node),
            };
            let children: Vec<_> = gltf_node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, Some(handle))));
        }
    }

    fn build_node(&mut self, gltf_node: &gltf::Node<'_>) -> Node {
        let (t, r, s) = gltf_node.transform().decomposed();

        let kind = if let Some(mesh) = gltf_node.mesh() {
            NodeKind::Mesh(self.build_mesh(&mesh))
        } else if let Some(light) = gltf_node.light() {
            NodeKind::Light(convert_light(&light))
        } else if gltf_node.camera().is_some() {
            NodeKind::Other
        } else if gltf_node.children().len() > 0 {
            NodeKind::Group
        } else {
            NodeKind::Other
        };

        let name = gltf_node
            .name()
            .map_or_else(|| format!("Node_{}", gltf_node.index()), str::to_string);

        Node::new(kind)
            .with_name(name)
            .with_transform(Transform::from_trs(t, r, s))
    }

    fn build_mesh(&mut self, mesh: &gltf::Mesh<'_>) -> Mesh {
        let mut primitives = Vec::new();

        for prim in mesh.primitives() {
            if prim.mode() != gltf::mesh::Mode::Triangles {
                log::debug!(
                    "Skipping primitive {} of mesh {}: mode {:?}",
                    prim.index(),
                    mesh.index(),
                    prim.mode()
                );
                continue;
            }

            let key = (mesh.index(), prim.index());
            let geometry = match self.geometries.get(&key) {
                Some(geometry) => Arc::clone(geometry),
                None => {
                    let Some(geometry) = self.read_geometry(&prim) else {
                        log::debug!("Skipping primitive {} of mesh {}: no positions", prim.index(), mesh.index());
                        continue;
                    };
                    let geometry = Arc::new(geometry);
                    self.geometries.insert(key, Arc::clone(&geometry));
                    geometry
                }
            };

            primitives.push(Primitive::new(geometry, convert_material(&prim.material())));
        }

        let mesh_out = Mesh::new(primitives);
        match mesh.name() {
            Some(name) => mesh_out.with_name(name),
            None => mesh_out,
        }
    }

    fn read_geometry(&self, prim: &gltf::Primitive<'_>) -> Option<Geometry> {
        let buffers = self.buffers;
        let reader = prim.reader(|buffer| buffers.get(buffer.index()).map(|data| &data.0[..]));

        let positions: Vec<[f32; 3]> = reader.read_positions()?.collect();
        if positions.is_empty() {
            return None;
        }
        let normals = reader.read_normals().map(Iterator::collect);
        let indices = reader.read_indices().map(|i| i.into_u32().collect());

        Some(Geometry::new(positions, normals, indices))
    }
}

fn convert_material(material: &gltf::Material<'_>) -> PbrMaterial {
    let pbr = material.pbr_metallic_roughness();
    let mut out = PbrMaterial::new(Vec4::from_array(pbr.base_color_factor()));
    out.name = material.name().map(str::to_string);
    out.metalness = pbr.metallic_factor();
    out.roughness = pbr.roughness_factor();
    out
}

fn convert_light(light: &gltf::khr_lights_punctual::Light<'_>) -> Light {
    use gltf::khr_lights_punctual::Kind;

    let kind = match light.kind() {
        Kind::Directional => LightKind::Directional,
        Kind::Point => LightKind::Point {
            range: light.range(),
        },
        Kind::Spot {
            inner_cone_angle,
            outer_cone_angle,
        } => LightKind::Spot {
            range: light.range(),
            inner_cone: inner_cone_angle,
            outer_cone: outer_cone_angle,
        },
    };

    Light {
        kind,
        color: light.color().into(),
        intensity: light.intensity(),
    }
}
