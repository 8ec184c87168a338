mod compositor;
mod xdg_shell;

use tracing::{debug, info};
use trellis::state::ShellEvent;

use crate::Smallvil;

pub fn handle_event(state: &mut Smallvil, event: ShellEvent) {
    debug!(?event, "shell event");
    match event {
        ShellEvent::Damaged { .. }
        | ShellEvent::OutputsDamaged { .. }
        | ShellEvent::OrderChanged
        | ShellEvent::SurfaceDestroyed { .. } => compositor::handle_event(state, event),

        ShellEvent::NewToplevel { .. }
        | ShellEvent::NewPopup { .. }
        | ShellEvent::Mapped { .. }
        | ShellEvent::Unmapped { .. }
        | ShellEvent::KeyboardFocusRequested { .. }
        | ShellEvent::MoveRequested { .. }
        | ShellEvent::InteractiveCancelled { .. }
        | ShellEvent::PopupGrabRequested { .. }
        | ShellEvent::PopupDismissed { .. }
        | ShellEvent::TitleChanged { .. }
        | ShellEvent::RoleStateChanged { .. } => xdg_shell::handle_event(state, event),

        ShellEvent::SessionLocked { client } => info!(%client, "session locked"),
        ShellEvent::SessionUnlocked => info!("session unlocked"),
        ShellEvent::ClientDisconnected { client } => info!(%client, "client disconnected"),
        _ => {}
    }
}
