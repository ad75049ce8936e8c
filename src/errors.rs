//! Error Types
//!
//! This module defines the error types used throughout the viewer.
//!
//! # Overview
//!
//! - [`LoadError`]: an asset or environment map could not be read or decoded.
//!   Terminal for that resource; the loop keeps running without it.
//! - [`ConfigurationError`]: a viewport or controller parameter was rejected.
//!   The previous valid configuration stays in effect.
//! - [`Error`]: the crate-wide error, wrapping the two above plus GPU,
//!   windowing and settings failures.
//!
//! All fallible public APIs return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`.

use thiserror::Error;

/// Failure to produce a scene graph or environment texture from an asset source.
///
/// Reported once to the log and never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The asset bytes could not be read.
    #[error("Failed to read asset '{uri}': {reason}")]
    Io { uri: String, reason: String },

    /// The bytes were read but could not be decoded.
    #[error("Failed to decode asset '{uri}': {reason}")]
    Decode { uri: String, reason: String },

    /// The asset format is not supported by this build.
    #[error("Unsupported asset '{uri}': {reason}")]
    Unsupported { uri: String, reason: String },

    /// The background task driving the load did not complete.
    #[error("Load task for '{uri}' aborted: {reason}")]
    Aborted { uri: String, reason: String },
}

impl LoadError {
    /// The locator of the asset that failed.
    #[must_use]
    pub fn uri(&self) -> &str {
        match self {
            Self::Io { uri, .. }
            | Self::Decode { uri, .. }
            | Self::Unsupported { uri, .. }
            | Self::Aborted { uri, .. } => uri,
        }
    }
}

/// A rejected configuration value.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum ConfigurationError {
    /// Viewport dimensions must both be non-zero.
    #[error("Invalid viewport dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Smoothing factors live in (0, 1].
    #[error("Invalid smoothing factor {0}, expected a value in (0, 1]")]
    InvalidSmoothing(f32),

    /// Camera clip planes must satisfy 0 < near < far.
    #[error("Invalid camera clip planes near={near} far={far}")]
    InvalidClipPlanes { near: f32, far: f32 },

    /// Vertical field of view, in degrees, lives in (0, 180).
    #[error("Invalid field of view {0}, expected degrees in (0, 180)")]
    InvalidFieldOfView(f32),

    /// Model scale must be finite and positive.
    #[error("Invalid model scale {0}, expected a positive value")]
    InvalidModelScale(f32),
}

/// The main error type for the viewer.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Domain Errors
    // ========================================================================
    /// An asset failed to load.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A configuration value was rejected.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// An operation reached a render loop or viewport that is not running.
    #[error("Resource already released: {0}")]
    ResourceAlreadyReleased(&'static str),

    // ========================================================================
    // GPU & Windowing Errors
    // ========================================================================
    /// Failed to request a compatible GPU adapter.
    #[error("Failed to request WGPU adapter: {0}")]
    AdapterRequestFailed(String),

    /// Failed to create the GPU device.
    #[error("Failed to create WGPU device: {0}")]
    DeviceCreateFailed(#[from] wgpu::RequestDeviceError),

    /// Failed to create a presentation surface for the host window.
    #[error("Failed to create surface: {0}")]
    SurfaceCreateFailed(#[from] wgpu::CreateSurfaceError),

    /// The adapter cannot present to the surface.
    #[error("Surface not supported by adapter")]
    SurfaceUnsupported,

    /// The host window could not be created (winit).
    #[cfg(feature = "winit")]
    #[error("Failed to create window: {0}")]
    WindowCreateFailed(#[from] winit::error::OsError),

    /// Event loop error (winit).
    #[cfg(feature = "winit")]
    #[error("Event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    // ========================================================================
    // Settings & I/O Errors
    // ========================================================================
    /// Settings JSON could not be parsed.
    #[error("Settings parse error: {0}")]
    Settings(#[from] serde_json::Error),

    /// File I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
