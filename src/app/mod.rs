//! Application layer: host abstraction, lifecycle, input and the render loop.

pub mod host;
pub mod input;
pub mod lifecycle;
pub mod render_loop;

#[cfg(feature = "winit")]
pub mod winit;

pub use host::{EventSource, FrameRequest, Host, Subscription};
pub use input::{InputEvent, TouchContact};
pub use lifecycle::LifecycleManager;
pub use render_loop::{LoopState, RenderLoop};
