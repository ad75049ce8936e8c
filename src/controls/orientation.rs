//! Pointer-driven target orientation and the per-frame easing step.
//!
//! A normalized pointer position `(x, y)` in `[-1, 1]²` maps to a target of
//! `yaw = x·π/4` and `pitch = -y·π/8`. The render loop eases the applied
//! orientation toward that target once per frame with [`step`].

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

/// Default fraction of the remaining distance covered per frame.
pub const DEFAULT_SMOOTHING: f32 = 0.05;

/// Radians of yaw per pixel of accumulated scroll travel.
pub const SCROLL_ROTATION_FACTOR: f32 = 0.005;

/// Largest yaw reachable from pointer input.
pub const MAX_YAW: f32 = FRAC_PI_4;
/// Largest pitch reachable from pointer input.
pub const MAX_PITCH: f32 = PI / 8.0;

/// Two-axis model rotation in radians.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Orientation {
    /// Rotation about X.
    pub pitch: f32,
    /// Rotation about Y.
    pub yaw: f32,
}

impl Orientation {
    pub const ZERO: Self = Self { pitch: 0.0, yaw: 0.0 };

    #[inline]
    #[must_use]
    pub const fn new(pitch: f32, yaw: f32) -> Self {
        Self { pitch, yaw }
    }

    /// Largest per-axis distance to `other`.
    #[inline]
    #[must_use]
    pub fn max_abs_diff(self, other: Self) -> f32 {
        (self.pitch - other.pitch)
            .abs()
            .max((self.yaw - other.yaw).abs())
    }
}

/// Which input drives the target orientation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputPolicy {
    /// Pointer and single-contact touch position.
    #[default]
    Pointer,
    /// Accumulated vertical scroll travel rotates the yaw only.
    Scroll,
}

/// Maps a pixel position to `[-1, 1]²`, screen-up positive.
///
/// Positions outside the window are clamped. Returns `None` for a window with
/// a zero dimension.
#[must_use]
pub fn normalize_pointer(px: f32, py: f32, width: f32, height: f32) -> Option<Vec2> {
    if !(width > 0.0 && height > 0.0) {
        return None;
    }
    let x = 2.0 * (px / width) - 1.0;
    let y = -(2.0 * (py / height) - 1.0);
    Some(Vec2::new(x, y).clamp(Vec2::NEG_ONE, Vec2::ONE))
}

/// One exponential easing step, applied per axis:
/// `current + (target - current) * smoothing`.
#[inline]
#[must_use]
pub fn step(current: Orientation, target: Orientation, smoothing: f32) -> Orientation {
    Orientation {
        pitch: current.pitch + (target.pitch - current.pitch) * smoothing,
        yaw: current.yaw + (target.yaw - current.yaw) * smoothing,
    }
}

/// Holds the target orientation written by input handlers.
///
/// The applied orientation lives in the render loop, which reads
/// [`target`](Self::target) once per tick.
#[derive(Debug, Clone)]
pub struct OrientationController {
    target: Orientation,
    smoothing: f32,
    policy: InputPolicy,
    scroll_offset: f32,
}

impl Default for OrientationController {
    fn default() -> Self {
        Self::new()
    }
}

impl OrientationController {
    #[must_use]
    pub fn new() -> Self {
        Self {
            target: Orientation::ZERO,
            smoothing: DEFAULT_SMOOTHING,
            policy: InputPolicy::Pointer,
            scroll_offset: 0.0,
        }
    }

    /// Sets the easing factor; it must lie in `(0, 1]`.
    pub fn with_smoothing(mut self, smoothing: f32) -> Result<Self, ConfigurationError> {
        if !(smoothing > 0.0 && smoothing <= 1.0) {
            return Err(ConfigurationError::InvalidSmoothing(smoothing));
        }
        self.smoothing = smoothing;
        Ok(self)
    }

    #[must_use]
    pub fn with_policy(mut self, policy: InputPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> Orientation {
        self.target
    }

    #[inline]
    #[must_use]
    pub fn smoothing(&self) -> f32 {
        self.smoothing
    }

    #[inline]
    #[must_use]
    pub fn policy(&self) -> InputPolicy {
        self.policy
    }

    /// Recomputes the target from a normalized pointer position.
    ///
    /// Ignored under [`InputPolicy::Scroll`].
    pub fn on_pointer_move(&mut self, x: f32, y: f32) {
        if self.policy != InputPolicy::Pointer {
            return;
        }
        let x = x.clamp(-1.0, 1.0);
        let y = y.clamp(-1.0, 1.0);
        self.target = Orientation {
            yaw: (x / 4.0) * PI,
            pitch: (-y / 4.0) * FRAC_PI_2,
        };
    }

    /// Single-contact touch move. `contacts` are normalized positions of every
    /// active contact; anything other than exactly one leaves the target as is.
    ///
    /// Returns whether the event was accepted.
    pub fn on_touch_move(&mut self, contacts: &[Vec2]) -> bool {
        match contacts {
            [only] if self.policy == InputPolicy::Pointer => {
                self.on_pointer_move(only.x, only.y);
                true
            }
            _ => false,
        }
    }

    /// Adds `delta` pixels of downward scroll travel.
    ///
    /// Ignored under [`InputPolicy::Pointer`].
    pub fn on_scroll(&mut self, delta: f32) {
        if self.policy != InputPolicy::Scroll {
            return;
        }
        self.scroll_offset = (self.scroll_offset + delta).max(0.0);
        self.target = Orientation {
            pitch: 0.0,
            yaw: (self.scroll_offset * SCROLL_ROTATION_FACTOR).min(MAX_YAW),
        };
    }

    /// Eases `current` one frame toward the target.
    #[inline]
    #[must_use]
    pub fn step(&self, current: Orientation) -> Orientation {
        step(current, self.target, self.smoothing)
    }
}
