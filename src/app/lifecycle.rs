use smallvec::SmallVec;

use crate::app::host::{EventSource, FrameRequest, Host, Subscription};

/// Tracks what a viewer registered on its host so teardown can undo it.
///
/// Teardown order: pending frame cancelled, every listener removed, then the
/// surface unmounted. It runs at most once.
#[derive(Debug, Default)]
pub struct LifecycleManager {
    subscriptions: SmallVec<[Subscription; 5]>,
    pending_frame: Option<FrameRequest>,
    mounted: bool,
    torn_down: bool,
}

impl LifecycleManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mounts the surface and registers `sources`. Does not schedule a frame.
    pub fn attach<H: Host>(&mut self, host: &mut H, sources: &[EventSource]) {
        if self.torn_down || self.mounted {
            return;
        }
        host.mount_surface();
        self.mounted = true;
        for &source in sources {
            let subscription = host.subscribe(source);
            log::trace!("Subscribed {source:?} as #{}", subscription.id);
            self.subscriptions.push(subscription);
        }
    }

    /// Requests the next frame unless one is already pending.
    pub fn reschedule<H: Host>(&mut self, host: &mut H) {
        if self.torn_down || self.pending_frame.is_some() {
            return;
        }
        self.pending_frame = Some(host.request_frame());
    }

    /// Consumes the pending frame request, if any.
    pub fn take_frame(&mut self) -> Option<FrameRequest> {
        self.pending_frame.take()
    }

    /// Whether events from `source` should still be delivered.
    #[must_use]
    pub fn is_listening(&self, source: EventSource) -> bool {
        !self.torn_down && self.subscriptions.iter().any(|s| s.source == source)
    }

    #[inline]
    #[must_use]
    pub fn pending_frame(&self) -> Option<FrameRequest> {
        self.pending_frame
    }

    #[inline]
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    #[inline]
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Cancels the pending frame, removes every listener and unmounts the
    /// surface. Returns `true` only on the first call.
    pub fn teardown<H: Host>(&mut self, host: &mut H) -> bool {
        if self.torn_down {
            return false;
        }
        self.torn_down = true;

        if let Some(request) = self.pending_frame.take() {
            host.cancel_frame(request);
        }
        for subscription in self.subscriptions.drain(..) {
            host.unsubscribe(subscription);
        }
        if self.mounted {
            host.unmount_surface();
            self.mounted = false;
        }
        true
    }
}
