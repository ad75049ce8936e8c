//! The seam between the viewport and the GPU.

use crate::errors::LoadError;
use crate::scene::{Camera, Environment, EnvironmentTexture, SceneGraph};

/// Everything a backend needs to draw one frame.
pub struct FrameView<'a> {
    /// Mutable so the backend can clear material `needs_update` flags after upload.
    pub scene: &'a mut SceneGraph,
    pub camera: &'a Camera,
    pub environment: &'a Environment,
}

/// A drawable surface plus the GPU resources behind it.
///
/// The viewport guarantees that `resize` receives non-zero dimensions and that
/// nothing is called after `release`.
pub trait RenderBackend {
    /// Resizes the drawable surface to exactly `width` x `height` pixels.
    fn resize(&mut self, width: u32, height: u32);

    /// Uploads `texture` as the scene environment, or unbinds it with `None`.
    ///
    /// A refused texture leaves the current environment bound.
    fn set_environment(&mut self, texture: Option<&EnvironmentTexture>) -> Result<(), LoadError>;

    fn draw(&mut self, frame: FrameView<'_>);

    /// Destroys every GPU resource owned by the backend.
    fn release(&mut self);
}
