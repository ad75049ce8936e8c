//! The shell a viewer is mounted into.
//!
//! Decouples the render loop from a specific windowing backend. The winit
//! implementation lives in [`crate::app::winit`].

/// Event listeners a viewer registers on its host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventSource {
    Resize,
    PointerMove,
    TouchMove,
    Wheel,
    /// The display-synchronized frame callback.
    FrameScheduler,
}

/// A registered listener, returned by [`Host::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    pub source: EventSource,
    pub id: u64,
}

/// A scheduled frame callback, cancellable until it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRequest(pub u64);

pub trait Host {
    /// Current drawable size in physical pixels.
    fn size(&self) -> (u32, u32);

    fn subscribe(&mut self, source: EventSource) -> Subscription;

    fn unsubscribe(&mut self, subscription: Subscription);

    /// Schedules one frame callback at the next display refresh.
    fn request_frame(&mut self) -> FrameRequest;

    fn cancel_frame(&mut self, request: FrameRequest);

    /// Shows the drawable surface inside the host.
    fn mount_surface(&mut self);

    /// Removes the drawable surface from the host.
    fn unmount_surface(&mut self);
}
