//! ext-session-lock surface.

use tracing::{debug, trace};

use crate::state::{ShellEvent, State};
use crate::utils::{Logical, OutputId, Serial, Size, SurfaceId};
use crate::wayland::compositor;
use crate::wayland::protocol::{ClientEvent, ProtocolError};
use crate::wayland::shell::configure::ConfigureTracker;
use crate::wayland::shell::{self, Role};

/// State of a lock surface as negotiated through configures
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LockSurfaceState {
    /// Size of the output the surface covers
    pub size: Size<i32, Logical>,
}

/// Role of a surface covering an output while the session is locked
#[derive(Debug)]
pub struct LockSurfaceRole {
    pub(crate) output: OutputId,
    pub(crate) configure: ConfigureTracker<LockSurfaceState>,
}

impl LockSurfaceRole {
    pub(crate) fn new(output: OutputId) -> LockSurfaceRole {
        LockSurfaceRole {
            output,
            configure: ConfigureTracker::default(),
        }
    }

    /// The output covered by this surface
    pub fn output(&self) -> OutputId {
        self.output
    }

    /// The state of the last acknowledged configure
    pub fn current(&self) -> LockSurfaceState {
        self.configure.current
    }

    /// Whether the client acknowledged a configure yet
    pub fn is_configured(&self) -> bool {
        self.configure.configured
    }
}

fn lock_surface_mut(state: &mut State, id: SurfaceId) -> Option<&mut LockSurfaceRole> {
    match state.surfaces.get_mut(&id)?.role.as_mut()? {
        Role::SessionLock(lock) => Some(lock),
        _ => None,
    }
}

/// Size the lock surface to its output and configure it if that changed anything
///
/// The first configure is always sent.
pub(crate) fn send_configure(state: &mut State, id: SurfaceId) -> Option<Serial> {
    let surface = state.surfaces.get_mut(&id)?;
    let client = surface.client;
    let Some(Role::SessionLock(lock)) = surface.role.as_mut() else {
        return None;
    };
    let size = state.outputs.get(lock.output)?.size();
    lock.configure.with_pending_state(|s| s.size = size);
    let configure = lock.configure.send_pending(&state.serials)?;

    trace!(surface = %id, serial = ?configure.serial, ?size, "lock surface configure");
    state.send_event(
        client,
        ClientEvent::LockSurfaceConfigure {
            surface: id,
            serial: configure.serial,
            size,
        },
    );
    Some(configure.serial)
}

pub(crate) fn ack_configure(state: &mut State, id: SurfaceId, serial: Serial) -> Result<(), ProtocolError> {
    let Some(lock) = lock_surface_mut(state, id) else {
        return Err(ProtocolError::InvalidObject(format!("ext_session_lock_surface_v1 for {}", id)));
    };
    lock.configure
        .ack(serial)
        .map_err(|_| ProtocolError::LockInvalidSerial { surface: id, serial })?;
    Ok(())
}

pub(crate) fn commit_hook(state: &mut State, id: SurfaceId) {
    let Some(surface) = state.surfaces.get(&id) else {
        return;
    };
    let has_buffer = surface.current().buffer_info().is_some();
    let Some(Role::SessionLock(lock)) = surface.role() else {
        return;
    };
    let output = state.outputs.get(lock.output).map(|o| o.location());

    if !has_buffer {
        shell::unmap(state, id);
        return;
    }
    if let Some(location) = output {
        compositor::set_position(state, id, location);
    }
    let Some(surface) = state.surfaces.get_mut(&id) else {
        return;
    };
    if !surface.mapped {
        surface.mapped = true;
        debug!(surface = %id, "lock surface mapped");
        if state.stack.raise(id) {
            state.emit(ShellEvent::OrderChanged);
        }
        state.emit(ShellEvent::Mapped { surface: id });
    }
}

pub(crate) fn forget_lock_surface(state: &mut State, id: SurfaceId) {
    state.session_lock.surfaces.retain(|s| *s != id);
}

/// Follow a change of output geometry
pub(crate) fn output_changed(state: &mut State, output: OutputId) {
    let surfaces: Vec<SurfaceId> = state
        .session_lock
        .surfaces
        .iter()
        .copied()
        .filter(|s| {
            matches!(
                state.surfaces.get(s).and_then(|d| d.role()),
                Some(Role::SessionLock(lock)) if lock.output == output
            )
        })
        .collect();
    let location = state.outputs.get(output).map(|o| o.location());
    for id in surfaces {
        send_configure(state, id);
        if let Some(location) = location {
            compositor::set_position(state, id, location);
        }
    }
}
