use tracing::{info, trace};
use trellis::state::ShellEvent;

use crate::Smallvil;

pub fn handle_event(state: &mut Smallvil, event: ShellEvent) {
    match event {
        ShellEvent::Damaged { surface, damage } => {
            trace!(%surface, rects = damage.len(), "surface damaged");
        }
        ShellEvent::OutputsDamaged { surface, outputs } => {
            // There is no renderer, just tell what a real one would have redrawn.
            if outputs.contains(&state.output) {
                info!(%surface, "would redraw headless-1");
            }
        }
        ShellEvent::OrderChanged => {
            let stack = state
                .compositor
                .with_state(|s| s.stack().iter().map(|id| id.to_string()).collect::<Vec<_>>());
            info!(?stack, "stacking order changed");
        }
        ShellEvent::SurfaceDestroyed { surface } => {
            state.windows.retain(|w| *w != surface);
            if state.grab.as_ref().map(|g| g.window == surface).unwrap_or(false) {
                state.grab = None;
            }
        }
        _ => {}
    }
}
