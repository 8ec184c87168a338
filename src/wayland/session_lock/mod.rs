//! Utilities for handling the `ext-session-lock` protocol
//!
//! A screen locker locks the session, then covers every output with a lock surface. Each
//! lock surface is configured with the size of its output and has to acknowledge that
//! configure before attaching a buffer.
//!
//! Only one client can hold the lock. Others trying to lock get a `finished` event. If the
//! locking client dies, the session stays locked until another locker takes over and
//! unlocks it:
//!
//! ```
//! use trellis::{config::ShellConfig, state::Compositor, utils::Rectangle};
//! use trellis::wayland::protocol::{ClientEvent, Request, SessionLockRequest};
//!
//! let compositor = Compositor::new(ShellConfig::default());
//! let output = compositor.add_output("eDP-1", Rectangle::from((0, 0, 1920, 1080)));
//! let locker = compositor.new_client(1);
//! let surface = compositor.create_surface(locker).unwrap();
//!
//! compositor.dispatch(locker, Request::SessionLock(SessionLockRequest::Lock)).unwrap();
//! compositor
//!     .dispatch(locker, Request::SessionLock(SessionLockRequest::GetLockSurface { surface, output }))
//!     .unwrap();
//! assert!(compositor.with_state(|state| state.is_locked()));
//!
//! let events = compositor.drain_client_events(locker);
//! assert!(matches!(events[1], ClientEvent::LockSurfaceConfigure { .. }));
//! ```
//!
//! Surfaces of other clients stay in the stack: hiding them while locked is up to the
//! renderer.

use tracing::{debug, trace_span};

use crate::state::State;
use crate::utils::ClientId;
use crate::wayland::protocol::{ProtocolError, SessionLockRequest};
use crate::wayland::shell::{self, Role, RoleKind};

pub mod lock;
pub mod surface;

pub use self::lock::SessionLockState;
pub use self::surface::{LockSurfaceRole, LockSurfaceState};

pub(crate) use self::lock::forget_client;
pub(crate) use self::surface::{commit_hook, forget_lock_surface, output_changed};

pub(crate) fn lock_request(
    state: &mut State,
    client: ClientId,
    request: SessionLockRequest,
) -> Result<(), ProtocolError> {
    let _span = trace_span!("session_lock", %client).entered();

    if let SessionLockRequest::Lock = request {
        lock::lock(state, client);
        return Ok(());
    }
    if state.session_lock.owner != Some(client) {
        return Err(ProtocolError::InvalidObject("ext_session_lock_v1".into()));
    }

    match request {
        SessionLockRequest::Lock => {}
        SessionLockRequest::GetLockSurface { surface: id, output } => {
            let surface = state.client_surface(client, id)?;
            if surface.has_buffer_or_pending() {
                return Err(ProtocolError::LockAlreadyConstructed(id));
            }
            shell::check_role_assignable(surface, RoleKind::SessionLock)?;
            if state.outputs.get(output).is_none() {
                return Err(ProtocolError::InvalidObject(output.to_string()));
            }
            let duplicate = state.session_lock.surfaces.iter().any(|s| {
                matches!(
                    state.surfaces.get(s).and_then(|d| d.role()),
                    Some(Role::SessionLock(lock)) if lock.output == output
                )
            });
            if duplicate {
                return Err(ProtocolError::LockDuplicateOutput(output));
            }

            debug!(surface = %id, %output, "new lock surface");
            shell::assign_role(state, id, Role::SessionLock(LockSurfaceRole::new(output)));
            state.session_lock.surfaces.push(id);
            surface::send_configure(state, id);
        }
        SessionLockRequest::AckConfigure { surface, serial } => {
            state.client_surface(client, surface)?;
            surface::ack_configure(state, surface, serial)?;
        }
        SessionLockRequest::DestroyLockSurface(id) => {
            let surface = state.client_surface(client, id)?;
            if let Some(Role::SessionLock(_)) = surface.role() {
                shell::destroy_role(state, id);
            }
        }
        SessionLockRequest::Unlock => lock::unlock(state),
    }
    Ok(())
}
