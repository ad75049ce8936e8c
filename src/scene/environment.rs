//! Environment lighting: the decoded equirectangular texture and the
//! viewport-side binding that holds it.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// How the equirectangular map is sampled by metallic surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnvironmentMapping {
    EquirectangularReflection,
    #[default]
    EquirectangularRefraction,
}

impl EnvironmentMapping {
    /// Shader-side flag.
    #[inline]
    #[must_use]
    pub fn as_u32(self) -> u32 {
        match self {
            Self::EquirectangularReflection => 0,
            Self::EquirectangularRefraction => 1,
        }
    }
}

/// Decoded HDR environment map, RGBA16F texels in row-major order.
///
/// Immutable once built; share it through `Arc`.
#[derive(Debug, Clone, PartialEq)]
pub struct EnvironmentTexture {
    pub label: String,
    width: u32,
    height: u32,
    data: Vec<u8>,
    mapping: EnvironmentMapping,
}

/// Bytes per RGBA16F texel.
pub const TEXEL_SIZE: usize = 8;

impl EnvironmentTexture {
    /// Returns `None` when `data` does not hold exactly `width * height` texels.
    #[must_use]
    pub fn new(label: impl Into<String>, width: u32, height: u32, data: Vec<u8>) -> Option<Self> {
        if width == 0 || height == 0 || data.len() != width as usize * height as usize * TEXEL_SIZE {
            return None;
        }
        Some(Self {
            label: label.into(),
            width,
            height,
            data,
            mapping: EnvironmentMapping::default(),
        })
    }

    #[must_use]
    pub fn with_mapping(mut self, mapping: EnvironmentMapping) -> Self {
        self.mapping = mapping;
        self
    }

    #[inline]
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    #[must_use]
    pub fn mapping(&self) -> EnvironmentMapping {
        self.mapping
    }
}

/// Scene-wide environment slot of a viewport.
#[derive(Debug, Clone)]
pub struct Environment {
    texture: Option<Arc<EnvironmentTexture>>,
    pub intensity: f32,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    #[must_use]
    pub fn new() -> Self {
        Self {
            texture: None,
            intensity: 1.0,
        }
    }

    /// Replaces the current binding; the previous texture is dropped.
    pub fn bind(&mut self, texture: Arc<EnvironmentTexture>) {
        self.texture = Some(texture);
    }

    pub fn clear(&mut self) {
        self.texture = None;
    }

    #[inline]
    #[must_use]
    pub fn texture(&self) -> Option<&Arc<EnvironmentTexture>> {
        self.texture.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn has_env_map(&self) -> bool {
        self.texture.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_mismatched_texel_data() {
        assert!(EnvironmentTexture::new("bad", 2, 2, vec![0; 8]).is_none());
        assert!(EnvironmentTexture::new("ok", 2, 2, vec![0; 32]).is_some());
    }

    #[test]
    fn rebinding_drops_previous_texture() {
        let first = Arc::new(EnvironmentTexture::new("a", 1, 1, vec![0; 8]).unwrap());
        let second = Arc::new(EnvironmentTexture::new("b", 1, 1, vec![0; 8]).unwrap());
        let mut env = Environment::new();
        env.bind(first.clone());
        env.bind(second);
        assert_eq!(Arc::strong_count(&first), 1);
        assert_eq!(env.texture().map(|t| t.label.as_str()), Some("b"));
    }
}
