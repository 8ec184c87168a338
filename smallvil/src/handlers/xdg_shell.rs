use tracing::{info, warn};
use trellis::{state::ShellEvent, utils::Point};

use crate::{grabs::MoveSurfaceGrab, Smallvil};

pub fn handle_event(state: &mut Smallvil, event: ShellEvent) {
    match event {
        ShellEvent::NewToplevel { surface } => {
            state.windows.push(surface);
        }
        ShellEvent::NewPopup { surface, parent } => {
            info!(%surface, %parent, "new popup");
        }
        ShellEvent::Mapped { surface } => {
            let is_toplevel = state.compositor.with_state(|s| s.toplevel(surface).is_some());
            if !is_toplevel {
                return;
            }
            // Cascade new windows
            let index = state.windows.iter().position(|w| *w == surface).unwrap_or(0) as i32;
            let location = Point::from((32 + 48 * index, 32 + 48 * index));
            if let Err(err) = state.compositor.set_position(surface, location) {
                warn!(%surface, "cannot place window: {}", err);
            }
        }
        ShellEvent::Unmapped { surface } => {
            info!(%surface, "unmapped");
        }
        ShellEvent::KeyboardFocusRequested { surface } => {
            let _ = state.compositor.set_keyboard_focus(Some(surface));
        }
        ShellEvent::MoveRequested { surface, .. } => {
            let initial_window_location = state
                .compositor
                .with_state(|s| s.surface(surface).map(|s| s.position()));
            if let Some(initial_window_location) = initial_window_location {
                state.grab = Some(MoveSurfaceGrab {
                    window: surface,
                    start_location: state.pointer_location,
                    initial_window_location,
                });
            }
        }
        ShellEvent::InteractiveCancelled { surface } => {
            if state.grab.as_ref().map(|g| g.window == surface).unwrap_or(false) {
                state.grab = None;
            }
        }
        ShellEvent::PopupGrabRequested { surface, serial } => {
            info!(%surface, %serial, "popup grab");
        }
        ShellEvent::PopupDismissed { surface } => {
            info!(%surface, "popup dismissed");
        }
        ShellEvent::TitleChanged { surface, title } => {
            info!(%surface, %title, "title changed");
        }
        ShellEvent::RoleStateChanged { surface, old, new } => {
            info!(%surface, ?old, ?new, "window states changed");
        }
        _ => {}
    }
}
