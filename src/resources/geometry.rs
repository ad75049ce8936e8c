use std::sync::atomic::{AtomicU64, Ordering};

use glam::Vec3;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

/// CPU-side triangle geometry.
///
/// Vertex data is kept planar (one `Vec` per attribute). The `id` is unique
/// for the process lifetime and serves as the GPU cache key.
#[derive(Debug, Clone)]
pub struct Geometry {
    id: u64,
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Option<Vec<u32>>,
}

impl Geometry {
    /// Creates a geometry; missing or mismatched normals are recomputed.
    #[must_use]
    pub fn new(positions: Vec<[f32; 3]>, normals: Option<Vec<[f32; 3]>>, indices: Option<Vec<u32>>) -> Self {
        let mut geometry = Self {
            id: NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed),
            positions,
            normals: Vec::new(),
            indices,
        };

        match normals {
            Some(n) if n.len() == geometry.positions.len() => geometry.normals = n,
            _ => geometry.compute_vertex_normals(),
        }

        geometry
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of vertices the draw call consumes (indices when indexed).
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.indices.as_ref().map_or(self.positions.len(), Vec::len)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.draw_count() == 0
    }

    /// Area-weighted smooth normals.
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Vec3::ZERO; self.positions.len()];

        let triangle_count = self.draw_count() / 3;
        for tri in 0..triangle_count {
            let [a, b, c] = self.triangle(tri);
            let (Some(pa), Some(pb), Some(pc)) = (
                self.positions.get(a),
                self.positions.get(b),
                self.positions.get(c),
            ) else {
                continue;
            };
            let (pa, pb, pc) = (Vec3::from(*pa), Vec3::from(*pb), Vec3::from(*pc));
            let face = (pb - pa).cross(pc - pa);
            normals[a] += face;
            normals[b] += face;
            normals[c] += face;
        }

        self.normals = normals
            .into_iter()
            .map(|n| n.try_normalize().unwrap_or(Vec3::Y).to_array())
            .collect();
    }

    fn triangle(&self, tri: usize) -> [usize; 3] {
        let base = tri * 3;
        match &self.indices {
            Some(indices) => [
                indices[base] as usize,
                indices[base + 1] as usize,
                indices[base + 2] as usize,
            ],
            None => [base, base + 1, base + 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn computes_normals_when_missing() {
        let g = Geometry::new(
            vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            None,
            None,
        );
        assert_eq!(g.normals.len(), 3);
        for n in &g.normals {
            assert!((n[2] - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn ids_are_unique() {
        let a = Geometry::new(Vec::new(), None, None);
        let b = Geometry::new(Vec::new(), None, None);
        assert_ne!(a.id(), b.id());
        assert!(a.is_empty());
    }
}
