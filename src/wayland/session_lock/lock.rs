//! ext-session-lock lock.

use tracing::{debug, info, warn};

use crate::state::{ShellEvent, State};
use crate::utils::{ClientId, SurfaceId};
use crate::wayland::protocol::ClientEvent;

/// State of the session lock
#[derive(Debug, Default)]
pub struct SessionLockState {
    pub(crate) locked: bool,
    pub(crate) owner: Option<ClientId>,
    pub(crate) surfaces: Vec<SurfaceId>,
}

impl SessionLockState {
    /// Whether the session is locked
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// The client holding the lock
    ///
    /// `None` while locked means the locking client died, and the session stays locked.
    pub fn owner(&self) -> Option<ClientId> {
        self.owner
    }

    /// Surfaces covering the outputs while locked
    pub fn lock_surfaces(&self) -> &[SurfaceId] {
        &self.surfaces
    }
}

pub(crate) fn lock(state: &mut State, client: ClientId) {
    let held = state
        .session_lock
        .owner
        .and_then(|owner| state.clients.get(&owner))
        .map(|c| c.alive)
        .unwrap_or(false);
    if held {
        debug!(%client, "session already locked, lock refused");
        state.send_event(client, ClientEvent::LockFinished);
        return;
    }

    let session = &mut state.session_lock;
    session.locked = true;
    session.owner = Some(client);
    info!(%client, "session locked");
    state.send_event(client, ClientEvent::Locked);
    state.emit(ShellEvent::SessionLocked { client });
}

pub(crate) fn unlock(state: &mut State) {
    let session = &mut state.session_lock;
    session.locked = false;
    session.owner = None;
    let surfaces = std::mem::take(&mut session.surfaces);
    for id in surfaces {
        crate::wayland::shell::destroy_role(state, id);
    }
    info!("session unlocked");
    state.emit(ShellEvent::SessionUnlocked);
}

/// The locking client went away
pub(crate) fn forget_client(state: &mut State, client: ClientId) {
    if state.session_lock.owner == Some(client) {
        warn!(%client, "locking client died, the session stays locked");
        state.session_lock.owner = None;
    }
}
