//! Rendering Module
//!
//! - [`Viewport`]: camera, surface size and environment slot in front of a backend
//! - [`RenderBackend`]: the GPU seam (`resize`, `set_environment`, `draw`, `release`)
//! - [`WgpuBackend`]: wgpu implementation with environment-lit PBR shading
//! - [`WgpuContext`]: device, queue, surface and depth buffer
//! - [`RenderSettings`]: backend initialization options

pub mod backend;
pub mod context;
pub mod settings;
pub mod viewport;
pub mod wgpu_backend;

pub use backend::{FrameView, RenderBackend};
pub use context::WgpuContext;
pub use settings::{GpuPowerPreference, RenderSettings};
pub use viewport::{Viewport, ViewportConfig};
pub use wgpu_backend::WgpuBackend;
