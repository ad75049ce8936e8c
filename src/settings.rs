//! Viewer configuration.
//!
//! Every field has a default matching the stock showcase, so a settings file
//! only needs the values it changes:
//!
//! ```json
//! { "title": "Toucan", "controls": { "smoothing": 0.1 } }
//! ```

use std::path::{Path, PathBuf};

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::assets::{AssetSource, AssetSources};
use crate::controls::{InputPolicy, OrientationController};
use crate::errors::{ConfigurationError, Result};
use crate::renderer::RenderSettings;
use crate::resources::MaterialOverride;
use crate::scene::{Camera, EnvironmentMapping};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    pub position: [f32; 3],
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 75.0,
            near: 0.1,
            far: 1000.0,
            position: [0.0, 2.0, 5.0],
        }
    }
}

impl CameraSettings {
    /// Builds the camera with a provisional aspect of 1; the viewport fixes it
    /// on the first configure.
    #[must_use]
    pub fn build(&self) -> Camera {
        Camera::new_perspective(self.fov, 1.0, self.near, self.far)
            .with_position(Vec3::from_array(self.position))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControlSettings {
    pub smoothing: f32,
    pub input_policy: InputPolicy,
}

impl Default for ControlSettings {
    fn default() -> Self {
        Self {
            smoothing: crate::controls::orientation::DEFAULT_SMOOTHING,
            input_policy: InputPolicy::Pointer,
        }
    }
}

impl ControlSettings {
    pub fn build(&self) -> std::result::Result<OrientationController, ConfigurationError> {
        Ok(OrientationController::new()
            .with_smoothing(self.smoothing)?
            .with_policy(self.input_policy))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetSettings {
    pub scene: PathBuf,
    pub environment: PathBuf,
    pub environment_mapping: EnvironmentMapping,
}

impl Default for AssetSettings {
    fn default() -> Self {
        Self {
            scene: PathBuf::from("assets/model/toucan.gltf"),
            environment: PathBuf::from("assets/model/environment.hdr"),
            environment_mapping: EnvironmentMapping::EquirectangularRefraction,
        }
    }
}

impl AssetSettings {
    #[must_use]
    pub fn sources(&self) -> AssetSources {
        AssetSources {
            scene: AssetSource::Path(self.scene.clone()),
            environment: AssetSource::Path(self.environment.clone()),
        }
    }
}

/// Top-level viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
    pub title: String,
    pub window_size: [u32; 2],
    pub camera: CameraSettings,
    pub controls: ControlSettings,
    /// Uniform scale applied to the loaded model root.
    pub model_scale: f32,
    pub material: MaterialOverride,
    pub render: RenderSettings,
    pub assets: AssetSettings,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            title: "Neosi".to_string(),
            window_size: [1280, 720],
            camera: CameraSettings::default(),
            controls: ControlSettings::default(),
            model_scale: 1.25,
            material: MaterialOverride::default(),
            render: RenderSettings::default(),
            assets: AssetSettings::default(),
        }
    }
}

impl ViewerSettings {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks the values serde cannot constrain.
    pub fn validate(&self) -> std::result::Result<(), ConfigurationError> {
        let smoothing = self.controls.smoothing;
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(ConfigurationError::InvalidSmoothing(smoothing));
        }
        let CameraSettings { fov, near, far, .. } = self.camera;
        if !(fov > 0.0 && fov < 180.0) {
            return Err(ConfigurationError::InvalidFieldOfView(fov));
        }
        if !(near > 0.0 && far > near) {
            return Err(ConfigurationError::InvalidClipPlanes { near, far });
        }
        if !(self.model_scale.is_finite() && self.model_scale > 0.0) {
            return Err(ConfigurationError::InvalidModelScale(self.model_scale));
        }
        let [width, height] = self.window_size;
        if width == 0 || height == 0 {
            return Err(ConfigurationError::InvalidDimensions { width, height });
        }
        Ok(())
    }
}
