//! Winit input event adapter
//!
//! Translates winit window events into the viewer's platform-independent
//! [`InputEvent`]s.

use smallvec::SmallVec;
use winit::dpi::PhysicalSize;
use winit::event::{MouseScrollDelta, Touch, TouchPhase, WindowEvent};

use crate::app::input::{InputEvent, TouchContact};

/// Pixels of scroll travel per wheel line.
const LINE_HEIGHT_PX: f32 = 40.0;

/// Active touch contacts, in the order they went down.
#[derive(Debug, Default)]
pub struct TouchTracker {
    contacts: SmallVec<[TouchContact; 2]>,
}

impl TouchTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn active(&self) -> &[TouchContact] {
        &self.contacts
    }

    /// Updates the contact set; returns `true` when the touch moved.
    fn track(&mut self, touch: &Touch) -> bool {
        let contact = TouchContact {
            id: touch.id,
            x: touch.location.x as f32,
            y: touch.location.y as f32,
        };
        let existing = self.contacts.iter().position(|c| c.id == touch.id);

        match touch.phase {
            TouchPhase::Started | TouchPhase::Moved => {
                match existing {
                    Some(i) => self.contacts[i] = contact,
                    None => self.contacts.push(contact),
                }
                touch.phase == TouchPhase::Moved
            }
            TouchPhase::Ended | TouchPhase::Cancelled => {
                if let Some(i) = existing {
                    self.contacts.remove(i);
                }
                false
            }
        }
    }
}

/// Converts a wheel delta to downward scroll travel in pixels.
#[must_use]
pub fn scroll_travel(delta: MouseScrollDelta) -> f32 {
    // winit reports positive y when scrolling up
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * LINE_HEIGHT_PX,
        MouseScrollDelta::PixelDelta(pos) => -(pos.y as f32),
    }
}

/// Translates one window event. `size` is the current inner size, used to
/// normalize pointer and touch positions.
pub fn translate_window_event(
    tracker: &mut TouchTracker,
    event: &WindowEvent,
    size: PhysicalSize<u32>,
) -> Option<InputEvent> {
    let width = size.width as f32;
    let height = size.height as f32;

    match event {
        WindowEvent::Resized(new_size) => Some(InputEvent::Resized {
            width: new_size.width,
            height: new_size.height,
        }),

        WindowEvent::CursorMoved { position, .. } => Some(InputEvent::PointerMoved {
            x: position.x as f32,
            y: position.y as f32,
            width,
            height,
        }),

        WindowEvent::Touch(touch) => tracker.track(touch).then(|| InputEvent::TouchMoved {
            contacts: tracker.contacts.clone(),
            width,
            height,
        }),

        WindowEvent::MouseWheel { delta, .. } => Some(InputEvent::Scrolled {
            delta: scroll_travel(*delta),
        }),

        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;
    use winit::event::DeviceId;

    fn touch(id: u64, phase: TouchPhase, x: f64, y: f64) -> WindowEvent {
        WindowEvent::Touch(Touch {
            // SAFETY: only compared, never passed back to the platform
            device_id: unsafe { DeviceId::dummy() },
            phase,
            location: PhysicalPosition::new(x, y),
            force: None,
            id,
        })
    }

    const SIZE: PhysicalSize<u32> = PhysicalSize::new(800, 600);

    #[test]
    fn wheel_lines_become_downward_pixels() {
        assert_eq!(scroll_travel(MouseScrollDelta::LineDelta(0.0, -2.0)), 80.0);
        assert_eq!(
            scroll_travel(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, 15.0))),
            -15.0
        );
    }

    #[test]
    fn resize_is_forwarded() {
        let mut tracker = TouchTracker::new();
        let event = WindowEvent::Resized(PhysicalSize::new(1024, 768));
        assert_eq!(
            translate_window_event(&mut tracker, &event, SIZE),
            Some(InputEvent::Resized {
                width: 1024,
                height: 768
            })
        );
    }

    #[test]
    fn touch_moves_carry_every_active_contact() {
        let mut tracker = TouchTracker::new();

        assert!(translate_window_event(&mut tracker, &touch(1, TouchPhase::Started, 10.0, 10.0), SIZE).is_none());
        let single = translate_window_event(&mut tracker, &touch(1, TouchPhase::Moved, 20.0, 10.0), SIZE);
        assert!(matches!(single, Some(InputEvent::TouchMoved { ref contacts, .. }) if contacts.len() == 1));

        translate_window_event(&mut tracker, &touch(2, TouchPhase::Started, 50.0, 50.0), SIZE);
        let double = translate_window_event(&mut tracker, &touch(1, TouchPhase::Moved, 30.0, 10.0), SIZE);
        assert!(matches!(double, Some(InputEvent::TouchMoved { ref contacts, .. }) if contacts.len() == 2));

        translate_window_event(&mut tracker, &touch(2, TouchPhase::Ended, 50.0, 50.0), SIZE);
        assert_eq!(tracker.active().len(), 1);
        assert_eq!(tracker.active()[0].x, 30.0);
    }
}
