use glam::{Affine3A, Mat4, Vec3};

/// Perspective camera owned by the viewport.
///
/// Only the aspect ratio changes at runtime; field of view and clip planes are
/// fixed at construction.
#[derive(Debug, Clone)]
pub struct Camera {
    /// Vertical field of view in radians.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    // cached matrices, read by the renderer
    pub(crate) world_matrix: Affine3A,
    pub(crate) view_matrix: Mat4,
    pub(crate) projection_matrix: Mat4,
    pub(crate) view_projection_matrix: Mat4,
}

impl Camera {
    /// `fov` is given in degrees.
    #[must_use]
    pub fn new_perspective(fov: f32, aspect: f32, near: f32, far: f32) -> Self {
        let mut cam = Self {
            fov: fov.to_radians(),
            aspect,
            near,
            far,

            world_matrix: Affine3A::IDENTITY,
            view_matrix: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            view_projection_matrix: Mat4::IDENTITY,
        };

        cam.update_projection_matrix();
        cam
    }

    #[must_use]
    pub fn with_position(mut self, position: Vec3) -> Self {
        self.set_position(position);
        self
    }

    /// Moves the camera without changing its orientation (looking down -Z).
    pub fn set_position(&mut self, position: Vec3) {
        self.update_view_projection(&Affine3A::from_translation(position));
    }

    #[inline]
    #[must_use]
    pub fn position(&self) -> Vec3 {
        Vec3::from(self.world_matrix.translation)
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        self.update_projection_matrix();
    }

    pub fn update_projection_matrix(&mut self) {
        // wgpu clip space depth is [0, 1], which is what perspective_rh produces
        self.projection_matrix = Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far);
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    pub fn update_view_projection(&mut self, world_transform: &Affine3A) {
        self.world_matrix = *world_transform;
        self.view_matrix = Mat4::from(*world_transform).inverse();
        self.view_projection_matrix = self.projection_matrix * self.view_matrix;
    }

    #[inline]
    #[must_use]
    pub fn projection_matrix(&self) -> Mat4 {
        self.projection_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_matrix(&self) -> Mat4 {
        self.view_matrix
    }

    #[inline]
    #[must_use]
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection_matrix
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new_perspective(75.0, 1.0, 0.1, 1000.0).with_position(Vec3::new(0.0, 2.0, 5.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aspect_change_rebuilds_projection() {
        let mut cam = Camera::default();
        let before = cam.projection_matrix();
        cam.set_aspect(2.0);
        assert_ne!(before, cam.projection_matrix());
        assert!((cam.projection_matrix().x_axis.x * 2.0 - before.x_axis.x).abs() < 1e-5);
    }

    #[test]
    fn view_matrix_moves_world_opposite_to_camera() {
        let cam = Camera::default();
        let p = cam.view_matrix().transform_point3(Vec3::new(0.0, 2.0, 5.0));
        assert!(p.length() < 1e-5);
    }
}
