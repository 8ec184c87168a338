//! Surface roles
//!
//! A surface without a role is never displayed. The protocol extensions give it one of
//! the following roles, which define how it is used:
//!
//! - [`Role::Toplevel`] and [`Role::Popup`], from `xdg_shell` (see the [`xdg`] module)
//! - [`Role::Cursor`], from `wl_pointer.set_cursor`
//! - [`Role::DragIcon`], from `wl_data_device.start_drag`
//! - [`Role::SessionLock`], from `ext_session_lock_v1`
//!
//! A surface can only ever get one kind of role. The role object may be destroyed and
//! re-created, but never turned into another kind. The xdg roles are further only
//! assignable while no buffer is attached to the surface.
//!
//! Commits are forwarded to the role as a `match` over [`Role`], every variant owning
//! its own state and its own reaction to new surface state.

use tracing::{debug, trace};

use crate::state::{ShellEvent, State};
use crate::utils::SurfaceId;
use crate::wayland::compositor::{PendingChanges, SurfaceData};
use crate::wayland::protocol::ProtocolError;
use crate::wayland::seat::{self, CursorRole, DragIconRole};
use crate::wayland::session_lock::{self, LockSurfaceRole};

pub mod configure;
pub mod xdg;

use self::xdg::{PopupRole, ToplevelRole};

/// The kinds of role a surface can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    /// `xdg_toplevel`
    Toplevel,
    /// `xdg_popup`
    Popup,
    /// Cursor image
    Cursor,
    /// Drag and drop icon
    DragIcon,
    /// Session lock surface
    SessionLock,
}

/// The role of a surface
#[derive(Debug)]
pub enum Role {
    /// An application window
    Toplevel(ToplevelRole),
    /// A menu or tooltip, placed relative to its parent
    Popup(PopupRole),
    /// The pointer image
    Cursor(CursorRole),
    /// The icon of a drag and drop operation
    DragIcon(DragIconRole),
    /// A surface covering an output while the session is locked
    SessionLock(LockSurfaceRole),
}

impl Role {
    /// Kind of this role
    pub fn kind(&self) -> RoleKind {
        match self {
            Role::Toplevel(_) => RoleKind::Toplevel,
            Role::Popup(_) => RoleKind::Popup,
            Role::Cursor(_) => RoleKind::Cursor,
            Role::DragIcon(_) => RoleKind::DragIcon,
            Role::SessionLock(_) => RoleKind::SessionLock,
        }
    }

    /// Whether this is an `xdg_shell` role
    pub fn is_xdg(&self) -> bool {
        matches!(self, Role::Toplevel(_) | Role::Popup(_))
    }

    /// Access the toplevel role, if this is one
    pub fn as_toplevel(&self) -> Option<&ToplevelRole> {
        match self {
            Role::Toplevel(toplevel) => Some(toplevel),
            _ => None,
        }
    }

    pub(crate) fn as_toplevel_mut(&mut self) -> Option<&mut ToplevelRole> {
        match self {
            Role::Toplevel(toplevel) => Some(toplevel),
            _ => None,
        }
    }

    /// Access the popup role, if this is one
    pub fn as_popup(&self) -> Option<&PopupRole> {
        match self {
            Role::Popup(popup) => Some(popup),
            _ => None,
        }
    }

    pub(crate) fn as_popup_mut(&mut self) -> Option<&mut PopupRole> {
        match self {
            Role::Popup(popup) => Some(popup),
            _ => None,
        }
    }
}

/// Check that `surface` may be given a role of the given kind
///
/// The xdg roles additionally require the surface to have no buffer.
pub(crate) fn check_role_assignable(surface: &SurfaceData, kind: RoleKind) -> Result<(), ProtocolError> {
    let requires_no_buffer = matches!(kind, RoleKind::Toplevel | RoleKind::Popup);
    if requires_no_buffer && surface.has_buffer_or_pending() {
        return Err(ProtocolError::AlreadyConstructed(surface.id));
    }
    if surface.role.is_some() || surface.role_kind.map(|k| k != kind).unwrap_or(false) {
        return Err(ProtocolError::RoleAlreadyAssigned {
            surface: surface.id,
            requested: kind,
        });
    }
    Ok(())
}

/// Give a role to a surface, the caller having checked it is assignable
pub(crate) fn assign_role(state: &mut State, id: SurfaceId, role: Role) {
    if let Some(surface) = state.surfaces.get_mut(&id) {
        trace!(surface = %id, role = ?role.kind(), "role assigned");
        surface.role_kind = Some(role.kind());
        surface.role = Some(role);
    }
}

/// Validate the role invariants that have to hold before a commit
pub(crate) fn pre_commit(state: &State, id: SurfaceId) -> Result<(), ProtocolError> {
    let Some(surface) = state.surfaces.get(&id) else {
        return Ok(());
    };
    let attaching = matches!(
        surface.pending().buffer,
        Some(crate::wayland::compositor::BufferAssignment::NewBuffer(_))
    );
    match &surface.role {
        Some(Role::Toplevel(toplevel)) if attaching && !toplevel.configure.configured => {
            Err(ProtocolError::UnconfiguredBuffer(id))
        }
        // a dismissed popup may race with popup_done, its content is ignored anyway
        Some(Role::Popup(popup)) if attaching && !popup.configure.configured && !popup.dismissed => {
            Err(ProtocolError::UnconfiguredBuffer(id))
        }
        Some(Role::SessionLock(lock)) if attaching && !lock.is_configured() => {
            Err(ProtocolError::LockCommitBeforeFirstAck(id))
        }
        // an xdg_surface cannot show anything before it has a role
        None if attaching && surface.xdg_surface => Err(ProtocolError::UnconfiguredBuffer(id)),
        _ => Ok(()),
    }
}

/// Let the role of a surface react to a commit
pub(crate) fn role_commit(state: &mut State, id: SurfaceId, dirty: PendingChanges) {
    let Some(kind) = state.surfaces.get(&id).and_then(|s| s.role.as_ref()).map(Role::kind) else {
        return;
    };
    match kind {
        RoleKind::Toplevel => xdg::ToplevelRole::commit_hook(state, id, dirty),
        RoleKind::Popup => xdg::PopupRole::commit_hook(state, id, dirty),
        RoleKind::Cursor => seat::cursor_commit_hook(state, id),
        RoleKind::DragIcon => seat::drag_icon_commit_hook(state, id),
        RoleKind::SessionLock => session_lock::commit_hook(state, id),
    }
}

/// Unmap a surface: remove it from the stack and drop what refers to it
pub(crate) fn unmap(state: &mut State, id: SurfaceId) {
    let Some(surface) = state.surfaces.get_mut(&id) else {
        return;
    };
    if !surface.mapped {
        return;
    }
    surface.mapped = false;
    debug!(surface = %id, "unmapped");
    if state.stack.remove(id) {
        state.emit(ShellEvent::OrderChanged);
    }
    state.emit(ShellEvent::Unmapped { surface: id });
    seat::clear_focus(state, id);
    seat::cancel_interactive(state, id);
}

/// Destroy the role object of a surface
///
/// Its configure queue goes away with it. Returns the kind of the destroyed role.
pub(crate) fn destroy_role(state: &mut State, id: SurfaceId) -> Option<RoleKind> {
    let role = state.surfaces.get_mut(&id)?.role.take()?;
    let kind = role.kind();

    if role.is_xdg() {
        xdg::dismiss_child_popups(state, id);
    }
    unmap(state, id);
    seat::cancel_interactive(state, id);

    match role {
        Role::Toplevel(_) => xdg::forget_toplevel(state, id),
        Role::Popup(_) => {}
        Role::Cursor(_) => seat::forget_cursor(state, id),
        Role::DragIcon(_) => seat::forget_drag_icon(state, id),
        Role::SessionLock(_) => session_lock::forget_lock_surface(state, id),
    }
    debug!(surface = %id, role = ?kind, "role destroyed");
    state.emit(ShellEvent::RoleDestroyed { surface: id, role: kind });
    Some(kind)
}
