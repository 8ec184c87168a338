use tracing::trace;
use trellis::utils::{Logical, Point};

use crate::state::Smallvil;

/// Input of the scripted session
#[derive(Debug, Clone, Copy)]
pub enum InputEvent {
    PointerMotionAbsolute { location: Point<i32, Logical> },
    PointerButtonPressed,
    PointerButtonReleased,
}

impl Smallvil {
    pub fn process_input_event(&mut self, event: InputEvent) {
        trace!(?event, "input");
        match event {
            InputEvent::PointerMotionAbsolute { location } => {
                self.pointer_location = location;
                if let Some(grab) = self.grab.take() {
                    // While the grab is active, no client has pointer focus
                    grab.motion(self, location);
                    self.grab = Some(grab);
                    return;
                }
                let under = self.surface_under(location);
                let _ = self.compositor.set_pointer_focus(under);
            }
            InputEvent::PointerButtonPressed => {
                // Click to focus
                let under = self.surface_under(self.pointer_location);
                if let Some(surface) = under {
                    let _ = self.compositor.raise(surface);
                }
                let _ = self.compositor.set_keyboard_focus(under);
            }
            InputEvent::PointerButtonReleased => {
                if let Some(grab) = self.grab.take() {
                    grab.button_released(self);
                }
            }
        }
    }
}
