use tracing::trace;

use crate::state::{ShellEvent, State};
use crate::utils::{ClientId, SurfaceId};
use crate::wayland::protocol::{PopupRequest, ProtocolError};
use crate::wayland::shell::xdg::{self, XDG_POPUP_REPOSITION_SINCE};
use crate::wayland::shell::{self, RoleKind};

pub(crate) fn popup_request(
    state: &mut State,
    client: ClientId,
    id: SurfaceId,
    request: PopupRequest,
) -> Result<(), ProtocolError> {
    let surface = state.client_surface(client, id)?;
    let popup = surface
        .role()
        .and_then(|r| r.as_popup())
        .ok_or_else(|| ProtocolError::InvalidObject(format!("xdg_popup for {}", id)))?;
    let mapped = surface.mapped;
    let parent = surface.parent;
    let version = popup.version;
    trace!(surface = %id, ?request, "xdg_popup request");

    match request {
        PopupRequest::Grab { serial } => {
            if mapped {
                return Err(ProtocolError::InvalidGrab(id));
            }
            let parent_is_popup = parent
                .and_then(|p| state.surfaces.get(&p))
                .map(|p| p.role_kind == Some(RoleKind::Popup))
                .unwrap_or(false);
            if let Some(parent) = parent.filter(|_| parent_is_popup) {
                if !xdg::is_topmost_popup(state, parent) {
                    return Err(ProtocolError::NotTheTopmostPopup(id));
                }
            }
            if let Some(popup) = state.popup_mut(id) {
                popup.grab = Some(serial);
            }
            state.emit(ShellEvent::PopupGrabRequested { surface: id, serial });
        }
        PopupRequest::Reposition { positioner, token } => {
            if version < XDG_POPUP_REPOSITION_SINCE {
                return Err(ProtocolError::InvalidMethod {
                    interface: "xdg_popup",
                    request: "reposition",
                });
            }
            let positioner_state = state.client_positioner(client, positioner)?;
            if !positioner_state.is_complete() {
                return Err(ProtocolError::InvalidPositioner(positioner));
            }
            xdg::popup::reposition(state, id, positioner_state, token);
        }
        PopupRequest::Destroy => {
            // popups opened on top of this one are dismissed along with it
            shell::destroy_role(state, id);
        }
    }
    Ok(())
}
