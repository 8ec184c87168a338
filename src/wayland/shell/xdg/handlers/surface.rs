use tracing::{debug, trace};

use crate::state::{ShellEvent, State};
use crate::utils::{ClientId, PositionerId, SurfaceId};
use crate::wayland::compositor::{is_ancestor_or_self, PendingChanges, SurfaceData};
use crate::wayland::protocol::{ProtocolError, XdgSurfaceRequest};
use crate::wayland::shell::xdg::{self, PopupRole, ToplevelRole};
use crate::wayland::shell::{self, Role, RoleKind};

mod popup;
pub(crate) use popup::popup_request;

mod toplevel;
pub(crate) use toplevel::toplevel_request;

/// Look up a surface that has an `xdg_surface` object
fn xdg_surface_data(state: &State, client: ClientId, id: SurfaceId) -> Result<&SurfaceData, ProtocolError> {
    let surface = state.client_surface(client, id)?;
    if !surface.xdg_surface {
        return Err(ProtocolError::InvalidObject(format!("xdg_surface for {}", id)));
    }
    Ok(surface)
}

pub(crate) fn xdg_surface_request(
    state: &mut State,
    client: ClientId,
    id: SurfaceId,
    request: XdgSurfaceRequest,
) -> Result<(), ProtocolError> {
    trace!(surface = %id, ?request, "xdg_surface request");
    match request {
        XdgSurfaceRequest::Create => super::wm_base::get_xdg_surface(state, client, id)?,
        XdgSurfaceRequest::GetToplevel => {
            let surface = xdg_surface_data(state, client, id)?;
            shell::check_role_assignable(surface, RoleKind::Toplevel)?;
            let version = state.xdg_version(client);
            shell::assign_role(state, id, Role::Toplevel(ToplevelRole::new(version)));
            debug!(surface = %id, "new toplevel");
            state.emit(ShellEvent::NewToplevel { surface: id });
        }
        XdgSurfaceRequest::GetPopup { parent, positioner } => {
            xdg_surface_data(state, client, id)?;
            get_popup(state, client, id, parent, positioner)?;
        }
        XdgSurfaceRequest::SetWindowGeometry(geometry) => {
            let surface = xdg_surface_data(state, client, id)?;
            if surface.role.is_none() {
                return Err(ProtocolError::NotConstructed(id));
            }
            if geometry.size.w <= 0 || geometry.size.h <= 0 {
                return Err(ProtocolError::InvalidWindowGeometry(id));
            }
            let surface = state.client_surface_mut(client, id)?;
            surface.cached.pending_mut().window_geometry = Some(geometry);
            surface.dirty |= PendingChanges::WINDOW_GEOMETRY;
        }
        XdgSurfaceRequest::AckConfigure(serial) => {
            let kind = xdg_surface_data(state, client, id)?.role.as_ref().map(Role::kind);
            match kind {
                Some(RoleKind::Toplevel) => xdg::toplevel::ack_configure(state, id, serial)?,
                Some(RoleKind::Popup) => xdg::popup::ack_configure(state, id, serial)?,
                _ => return Err(ProtocolError::NotConstructed(id)),
            }
        }
        XdgSurfaceRequest::Destroy => {
            let surface = xdg_surface_data(state, client, id)?;
            if surface.role.as_ref().map(Role::is_xdg).unwrap_or(false) {
                return Err(ProtocolError::DefunctRoleObject(id));
            }
            if let Some(surface) = state.surfaces.get_mut(&id) {
                surface.xdg_surface = false;
            }
        }
    }
    Ok(())
}

/// `xdg_surface.get_popup`
fn get_popup(
    state: &mut State,
    client: ClientId,
    id: SurfaceId,
    parent: Option<SurfaceId>,
    positioner: PositionerId,
) -> Result<(), ProtocolError> {
    let surface = state.client_surface(client, id)?;
    shell::check_role_assignable(surface, RoleKind::Popup)?;

    let Some(parent) = parent else {
        return Err(ProtocolError::InvalidPopupParent("popups without a parent are not supported"));
    };
    let parent_surface = state
        .surfaces
        .get(&parent)
        .ok_or_else(|| ProtocolError::InvalidObject(parent.to_string()))?;
    if is_ancestor_or_self(&state.surfaces, id, parent) {
        return Err(ProtocolError::InvalidPopupParent(
            "the parent is the popup itself or one of its descendants",
        ));
    }
    if !parent_surface.role.as_ref().map(Role::is_xdg).unwrap_or(false) {
        return Err(ProtocolError::InvalidPopupParent("the parent has no xdg role"));
    }

    let positioner_state = state.client_positioner(client, positioner)?;
    if !positioner_state.is_complete() {
        return Err(ProtocolError::InvalidPositioner(positioner));
    }

    let version = state.xdg_version(client);
    shell::assign_role(state, id, Role::Popup(PopupRole::new(positioner_state, version)));
    if let Some(surface) = state.surfaces.get_mut(&id) {
        surface.parent = Some(parent);
    }
    if let Some(parent_surface) = state.surfaces.get_mut(&parent) {
        parent_surface.children.push(id);
    }
    debug!(surface = %id, %parent, "new popup");
    state.emit(ShellEvent::NewPopup { surface: id, parent });
    state.emit(ShellEvent::ParentChanged {
        surface: id,
        parent: Some(parent),
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::ShellConfig;
    use crate::state::Compositor;
    use crate::utils::{ClientId, PositionerId, Rectangle, Serial, SurfaceId};
    use crate::wayland::compositor::BufferInfo;
    use crate::wayland::protocol::{
        ClientEvent, PositionerRequest, ProtocolError, Request, SurfaceRequest, XdgSurfaceRequest,
    };
    use crate::wayland::shell::RoleKind;

    fn xdg_surface(compositor: &Compositor, client: ClientId) -> SurfaceId {
        let surface = compositor.create_surface(client).unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::Create))
            .unwrap();
        surface
    }

    fn positioner(compositor: &Compositor, client: ClientId) -> PositionerId {
        let id = compositor.create_positioner(client).unwrap();
        compositor
            .dispatch(client, Request::Positioner(id, PositionerRequest::SetSize((10, 10).into())))
            .unwrap();
        compositor
            .dispatch(
                client,
                Request::Positioner(id, PositionerRequest::SetAnchorRect(Rectangle::from((0, 0, 1, 1)))),
            )
            .unwrap();
        id
    }

    #[test]
    fn get_toplevel_after_attach_is_already_constructed() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = compositor.create_surface(client).unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::Create))
            .unwrap();
        let attach = SurfaceRequest::Attach(Some(BufferInfo { size: (10, 10).into() }));
        compositor.dispatch(client, Request::Surface(surface, attach)).unwrap();

        let result = compositor.dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel));
        assert_eq!(result, Err(ProtocolError::AlreadyConstructed(surface)));
        assert!(matches!(
            compositor.drain_client_events(client).as_slice(),
            [ClientEvent::Error {
                interface: "xdg_surface",
                code: 2,
                ..
            }]
        ));
    }

    #[test]
    fn popup_without_parent() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = xdg_surface(&compositor, client);
        let positioner = positioner(&compositor, client);
        let result = compositor.dispatch(
            client,
            Request::XdgSurface(surface, XdgSurfaceRequest::GetPopup { parent: None, positioner }),
        );
        assert!(matches!(result, Err(ProtocolError::InvalidPopupParent(_))));
    }

    #[test]
    fn popup_of_itself() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = xdg_surface(&compositor, client);
        let positioner = positioner(&compositor, client);
        let result = compositor.dispatch(
            client,
            Request::XdgSurface(
                surface,
                XdgSurfaceRequest::GetPopup {
                    parent: Some(surface),
                    positioner,
                },
            ),
        );
        assert!(matches!(result, Err(ProtocolError::InvalidPopupParent(_))));
    }

    #[test]
    fn incomplete_positioner() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let parent = xdg_surface(&compositor, client);
        compositor
            .dispatch(client, Request::XdgSurface(parent, XdgSurfaceRequest::GetToplevel))
            .unwrap();
        let surface = xdg_surface(&compositor, client);
        let positioner = compositor.create_positioner(client).unwrap();
        let result = compositor.dispatch(
            client,
            Request::XdgSurface(
                surface,
                XdgSurfaceRequest::GetPopup {
                    parent: Some(parent),
                    positioner,
                },
            ),
        );
        assert_eq!(result, Err(ProtocolError::InvalidPositioner(positioner)));
    }

    #[test]
    fn window_geometry_needs_a_role() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = xdg_surface(&compositor, client);
        let result = compositor.dispatch(
            client,
            Request::XdgSurface(surface, XdgSurfaceRequest::SetWindowGeometry(Rectangle::from((0, 0, 10, 10)))),
        );
        assert_eq!(result, Err(ProtocolError::NotConstructed(surface)));
    }

    #[test]
    fn empty_window_geometry() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = xdg_surface(&compositor, client);
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel))
            .unwrap();
        let result = compositor.dispatch(
            client,
            Request::XdgSurface(surface, XdgSurfaceRequest::SetWindowGeometry(Rectangle::from((0, 0, 0, 10)))),
        );
        assert_eq!(result, Err(ProtocolError::InvalidWindowGeometry(surface)));
    }

    #[test]
    fn ack_without_role_is_not_constructed() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = xdg_surface(&compositor, client);
        let result = compositor.dispatch(
            client,
            Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(Serial::from(1))),
        );
        assert_eq!(result, Err(ProtocolError::NotConstructed(surface)));
    }

    #[test]
    fn unknown_serial_is_invalid() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = xdg_surface(&compositor, client);
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel))
            .unwrap();
        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Commit))
            .unwrap();
        let result = compositor.dispatch(
            client,
            Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(Serial::from(4242))),
        );
        assert_eq!(result, Err(ProtocolError::InvalidSerial(Serial::from(4242))));
    }

    #[test]
    fn xdg_surface_outlives_its_role() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = xdg_surface(&compositor, client);
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel))
            .unwrap();
        let result = compositor.dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::Destroy));
        assert_eq!(result, Err(ProtocolError::DefunctRoleObject(surface)));
        compositor.with_state(|state| assert!(state.surface(surface).is_none()));
    }

    #[test]
    fn role_kind_survives_role_destruction() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = xdg_surface(&compositor, client);
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel))
            .unwrap();
        compositor
            .dispatch(
                client,
                Request::Toplevel(surface, crate::wayland::protocol::ToplevelRequest::Destroy),
            )
            .unwrap();
        compositor.with_state(|state| {
            let data = state.surface(surface).unwrap();
            assert!(data.role().is_none());
            assert_eq!(data.role_kind(), Some(RoleKind::Toplevel));
        });

        // the same kind of role object can be created again
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel))
            .unwrap();
    }
}
