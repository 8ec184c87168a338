use tracing::debug;

use super::{CursorRole, DragIconRole, DragState};
use crate::state::{ShellEvent, State};
use crate::utils::ClientId;
use crate::wayland::protocol::{DataDeviceRequest, PointerRequest, ProtocolError};
use crate::wayland::shell::{self, Role, RoleKind};

pub(crate) fn pointer_request(
    state: &mut State,
    client: ClientId,
    request: PointerRequest,
) -> Result<(), ProtocolError> {
    match request {
        PointerRequest::SetCursor { surface, hotspot, .. } => {
            if let Some(id) = surface {
                let data = state.client_surface(client, id)?;
                if data.role_kind != Some(RoleKind::Cursor) || data.role.is_none() {
                    shell::check_role_assignable(data, RoleKind::Cursor)?;
                }
            }

            // only the client owning the pointer focus may change the cursor
            let focused_client = state
                .seat
                .pointer_focus
                .and_then(|f| state.surfaces.get(&f))
                .map(|s| s.client);
            if focused_client != Some(client) {
                debug!(%client, "ignoring set_cursor without pointer focus");
                return Ok(());
            }

            match surface {
                Some(id) => {
                    match state.surfaces.get_mut(&id).and_then(|s| s.role.as_mut()) {
                        Some(Role::Cursor(cursor)) => cursor.hotspot = hotspot,
                        _ => shell::assign_role(state, id, Role::Cursor(CursorRole { hotspot })),
                    }
                    state.seat.cursor = Some(id);
                }
                None => state.seat.cursor = None,
            }
            state.emit(ShellEvent::CursorChanged { surface, hotspot });
        }
    }
    Ok(())
}

pub(crate) fn data_device_request(
    state: &mut State,
    client: ClientId,
    request: DataDeviceRequest,
) -> Result<(), ProtocolError> {
    match request {
        DataDeviceRequest::StartDrag { origin, icon, .. } => {
            state.client_surface(client, origin)?;
            if let Some(icon) = icon {
                let data = state.client_surface(client, icon)?;
                shell::check_role_assignable(data, RoleKind::DragIcon)?;
            }

            if !state.has_pointer_focus(origin) {
                debug!(surface = %origin, "ignoring start_drag without pointer focus");
                return Ok(());
            }

            if let Some(icon) = icon {
                shell::assign_role(state, icon, Role::DragIcon(DragIconRole::default()));
            }
            state.seat.drag = Some(DragState { origin, icon });
            state.emit(ShellEvent::DragStarted { origin, icon });
        }
    }
    Ok(())
}
