//! Physically-based surface material and the load-time override pass.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

/// Metallic-roughness material attached to a mesh primitive.
#[derive(Debug, Clone, PartialEq)]
pub struct PbrMaterial {
    pub name: Option<String>,
    /// Linear RGBA base color.
    pub color: Vec4,
    pub metalness: f32,
    pub roughness: f32,
    /// Set when the GPU copy is stale. Cleared by the render backend after upload.
    pub needs_update: bool,
}

impl PbrMaterial {
    #[must_use]
    pub fn new(color: Vec4) -> Self {
        Self {
            name: None,
            color,
            metalness: 0.0,
            roughness: 1.0,
            needs_update: true,
        }
    }
}

impl Default for PbrMaterial {
    fn default() -> Self {
        Self::new(Vec4::ONE)
    }
}

/// Fixed surface parameters written over every mesh material of a loaded asset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialOverride {
    /// sRGB hex color, e.g. `0xc0c0c0`.
    pub color_hex: u32,
    pub metalness: f32,
    pub roughness: f32,
}

impl Default for MaterialOverride {
    fn default() -> Self {
        Self {
            color_hex: 0x00c0_c0c0,
            metalness: 1.0,
            roughness: 0.1,
        }
    }
}

impl MaterialOverride {
    /// Linear RGBA base color for the override.
    #[must_use]
    pub fn linear_color(&self) -> Vec4 {
        color_from_srgb_hex(self.color_hex).extend(1.0)
    }

    /// Rewrites `material` with the override and flags it for recompilation.
    ///
    /// Idempotent: a second application leaves every field unchanged.
    pub fn apply(&self, material: &mut PbrMaterial) {
        material.color = self.linear_color();
        material.metalness = self.metalness;
        material.roughness = self.roughness;
        material.needs_update = true;
    }
}

/// Converts a 24-bit sRGB hex color to linear RGB. Bits above 24 are ignored.
#[must_use]
pub fn color_from_srgb_hex(hex: u32) -> Vec3 {
    let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
    Vec3::new(channel(16), channel(8), channel(0))
}

/// sRGB electro-optical transfer function.
#[must_use]
pub fn srgb_to_linear(c: f32) -> f32 {
    if c < 0.04045 {
        c * 0.077_399_38
    } else {
        (c * 0.947_867_3 + 0.052_132_7).powf(2.4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_conversion_ignores_alpha_byte() {
        assert_eq!(color_from_srgb_hex(0xffc0_c0c0), color_from_srgb_hex(0x00c0_c0c0));
    }

    #[test]
    fn srgb_endpoints() {
        assert!(srgb_to_linear(0.0).abs() < 1e-7);
        assert!((srgb_to_linear(1.0) - 1.0).abs() < 1e-5);
        let silver = color_from_srgb_hex(0xc0c0c0);
        assert!((silver.x - 0.527).abs() < 1e-2);
    }
}
