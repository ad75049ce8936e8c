//! Renderer Settings
//!
//! Configuration consumed once when the GPU backend is created.
//!
//! ```rust,ignore
//! use vitrine::renderer::{RenderSettings, GpuPowerPreference};
//!
//! let settings = RenderSettings {
//!     power_preference: GpuPowerPreference::LowPower,
//!     vsync: true,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};

/// Depth buffer format used by the forward pass.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Format of decoded environment maps on the GPU.
pub const ENVIRONMENT_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;

/// GPU adapter selection strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GpuPowerPreference {
    /// Prefer a discrete GPU.
    #[default]
    HighPerformance,
    /// Prefer an integrated GPU.
    LowPower,
}

impl From<GpuPowerPreference> for wgpu::PowerPreference {
    fn from(value: GpuPowerPreference) -> Self {
        match value {
            GpuPowerPreference::HighPerformance => Self::HighPerformance,
            GpuPowerPreference::LowPower => Self::LowPower,
        }
    }
}

/// Global configuration for backend initialization.
///
/// | Field              | Description                              | Default            |
/// |--------------------|------------------------------------------|--------------------|
/// | `power_preference` | GPU adapter selection strategy           | `HighPerformance`  |
/// | `vsync`            | Vertical sync enabled                    | `true`             |
/// | `exposure`         | Scale applied before ACES tone mapping   | `1.0`              |
/// | `clear_color`      | Linear RGBA clear color                  | Transparent black  |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub power_preference: GpuPowerPreference,

    /// When `true`, the frame rate is capped to the display refresh rate.
    pub vsync: bool,

    pub exposure: f32,

    /// The surface is cleared to this color every frame. A zero alpha lets the
    /// host window show through where the compositor supports it.
    pub clear_color: [f64; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            power_preference: GpuPowerPreference::HighPerformance,
            vsync: true,
            exposure: 1.0,
            clear_color: [0.0, 0.0, 0.0, 0.0],
        }
    }
}

impl RenderSettings {
    #[inline]
    #[must_use]
    pub fn wgpu_clear_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.clear_color;
        wgpu::Color { r, g, b, a }
    }

    #[inline]
    #[must_use]
    pub fn present_mode(&self) -> wgpu::PresentMode {
        if self.vsync {
            wgpu::PresentMode::AutoVsync
        } else {
            wgpu::PresentMode::AutoNoVsync
        }
    }
}
