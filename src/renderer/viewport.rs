use std::sync::Arc;

use crate::errors::{ConfigurationError, LoadError};
use crate::renderer::backend::{FrameView, RenderBackend};
use crate::scene::{Camera, Environment, EnvironmentTexture, SceneGraph};

/// Surface pixel size and the camera aspect derived from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    pub aspect: f32,
}

impl ViewportConfig {
    pub fn new(width: u32, height: u32) -> Result<Self, ConfigurationError> {
        if width == 0 || height == 0 {
            return Err(ConfigurationError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            aspect: width as f32 / height as f32,
        })
    }
}

/// Owns the camera, the environment slot and the render backend.
///
/// After [`release`](Self::release) every operation is a silent no-op.
pub struct Viewport<B: RenderBackend> {
    camera: Camera,
    config: Option<ViewportConfig>,
    environment: Environment,
    backend: Option<B>,
}

impl<B: RenderBackend> Viewport<B> {
    #[must_use]
    pub fn new(backend: B, camera: Camera) -> Self {
        Self {
            camera,
            config: None,
            environment: Environment::new(),
            backend: Some(backend),
        }
    }

    /// Applies a new surface size and camera aspect.
    ///
    /// Zero dimensions are rejected and the previous configuration is kept.
    /// Re-applying the current size does nothing.
    pub fn configure(&mut self, width: u32, height: u32) -> Result<(), ConfigurationError> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(());
        };
        let config = ViewportConfig::new(width, height)?;
        if self
            .config
            .is_some_and(|c| c.width == width && c.height == height)
        {
            return Ok(());
        }

        self.camera.set_aspect(config.aspect);
        backend.resize(width, height);
        self.config = Some(config);
        log::debug!("Viewport configured to {width}x{height}");
        Ok(())
    }

    /// Binds `texture` as scene-wide environment lighting, replacing any
    /// previous binding.
    ///
    /// If the backend refuses the texture the previous binding stays.
    pub fn bind_environment(
        &mut self,
        texture: Arc<EnvironmentTexture>,
    ) -> Result<(), LoadError> {
        let Some(backend) = self.backend.as_mut() else {
            return Ok(());
        };
        backend.set_environment(Some(&texture))?;
        self.environment.bind(texture);
        Ok(())
    }

    /// Renders `scene` once through the viewport camera.
    pub fn draw_frame(&mut self, scene: &mut SceneGraph) {
        let Some(backend) = self.backend.as_mut() else {
            return;
        };
        backend.draw(FrameView {
            scene,
            camera: &self.camera,
            environment: &self.environment,
        });
    }

    /// Releases the backend. Only the first call has an effect.
    ///
    /// Returns whether this call performed the release.
    pub fn release(&mut self) -> bool {
        let Some(mut backend) = self.backend.take() else {
            return false;
        };
        backend.release();
        self.environment.clear();
        log::info!("Viewport resources released");
        true
    }

    #[inline]
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.backend.is_none()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> Option<ViewportConfig> {
        self.config
    }

    #[inline]
    #[must_use]
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    #[inline]
    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    #[inline]
    #[must_use]
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }
}
