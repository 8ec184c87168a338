use tracing::trace;

use crate::state::State;
use crate::utils::{ClientId, SurfaceId};
use crate::wayland::protocol::ProtocolError;
use crate::wayland::shell::RoleKind;

/// `xdg_wm_base.get_xdg_surface`
pub(super) fn get_xdg_surface(state: &mut State, client: ClientId, id: SurfaceId) -> Result<(), ProtocolError> {
    let surface = state.client_surface_mut(client, id)?;
    if surface.xdg_surface {
        return Err(ProtocolError::AlreadyConstructed(id));
    }
    // the actual xdg role is not known yet, any of them is reported as xdg_wm_base.role
    let foreign_role = surface
        .role_kind
        .map(|k| !matches!(k, RoleKind::Toplevel | RoleKind::Popup))
        .unwrap_or(false);
    if foreign_role {
        return Err(ProtocolError::RoleAlreadyAssigned {
            surface: id,
            requested: RoleKind::Toplevel,
        });
    }
    if surface.has_buffer_or_pending() {
        return Err(ProtocolError::AlreadyConstructed(id));
    }
    surface.xdg_surface = true;
    trace!(surface = %id, "new xdg_surface");
    Ok(())
}
