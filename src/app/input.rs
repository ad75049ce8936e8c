//! Platform-independent input events consumed by the render loop.

use smallvec::SmallVec;

use crate::app::host::EventSource;

/// One active touch point, in window pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchContact {
    pub id: u64,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// New surface size in physical pixels.
    Resized { width: u32, height: u32 },
    /// Pointer position in pixels plus the window size used to normalize it.
    PointerMoved {
        x: f32,
        y: f32,
        width: f32,
        height: f32,
    },
    /// Every active contact at the time of the move.
    TouchMoved {
        contacts: SmallVec<[TouchContact; 2]>,
        width: f32,
        height: f32,
    },
    /// Downward scroll travel in pixels (negative scrolls up).
    Scrolled { delta: f32 },
}

impl InputEvent {
    /// The listener an event is delivered through.
    #[must_use]
    pub fn source(&self) -> EventSource {
        match self {
            Self::Resized { .. } => EventSource::Resize,
            Self::PointerMoved { .. } => EventSource::PointerMove,
            Self::TouchMoved { .. } => EventSource::TouchMove,
            Self::Scrolled { .. } => EventSource::Wheel,
        }
    }
}
