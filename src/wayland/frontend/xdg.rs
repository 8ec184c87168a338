use tracing::{debug, trace};
use wayland_protocols::xdg::decoration::zv1::server::{
    zxdg_decoration_manager_v1::{self, ZxdgDecorationManagerV1},
    zxdg_toplevel_decoration_v1::{self, ZxdgToplevelDecorationV1},
};
use wayland_protocols::xdg::shell::server::{
    xdg_popup::{self, XdgPopup},
    xdg_positioner::{self, XdgPositioner},
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};
use wayland_server::backend::ClientId as WireClientId;
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource, WEnum};

use super::{client_id, reject, FrontendHandler, FrontendState, PositionerRef, SurfaceRef};
use crate::utils::{ClientId, OutputId, Rectangle, Serial};
use crate::wayland::protocol::{
    DecorationRequest, PopupRequest, PositionerRequest, ProtocolError, Request, ToplevelRequest,
    XdgSurfaceRequest,
};
use crate::wayland::shell::xdg::{Anchor, ConstraintAdjustment, DecorationMode, Gravity, ResizeEdge};

impl<D: FrontendHandler> GlobalDispatch<XdgWmBase, (), D> for FrontendState {
    fn bind(
        state: &mut D,
        _handle: &DisplayHandle,
        client: &Client,
        resource: New<XdgWmBase>,
        _global_data: &(),
        data_init: &mut DataInit<'_, D>,
    ) {
        let Some(owner) = client_id(client) else {
            return reject(data_init, resource);
        };
        let wm_base = data_init.init(resource, ());
        let frontend = state.frontend_state();
        frontend.compositor.set_xdg_version(owner, wm_base.version());
        frontend.add_client_object(owner, wm_base.id());
    }
}

impl<D: FrontendHandler> Dispatch<XdgWmBase, (), D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &XdgWmBase,
        request: xdg_wm_base::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        let Some(owner) = client_id(client) else {
            return;
        };
        match request {
            xdg_wm_base::Request::CreatePositioner { id } => {
                match state.frontend_state().compositor.create_positioner(owner) {
                    Ok(positioner) => {
                        data_init.init(
                            id,
                            PositionerRef {
                                client: owner,
                                positioner,
                            },
                        );
                    }
                    Err(_) => reject(data_init, id),
                }
            }
            xdg_wm_base::Request::GetXdgSurface { id, surface } => {
                let Some(&surface_ref) = surface.data::<SurfaceRef>() else {
                    return reject(data_init, id);
                };
                let xdg_surface = data_init.init(id, surface_ref);
                let frontend = state.frontend_state();
                frontend.objects(surface_ref.surface).xdg_surface = Some(xdg_surface);
                let request = Request::XdgSurface(surface_ref.surface, XdgSurfaceRequest::Create);
                frontend.forward(client, resource, owner, request);
            }
            xdg_wm_base::Request::Pong { serial } => {
                trace!(client = %owner, serial, "pong");
            }
            xdg_wm_base::Request::Destroy => {}
            _ => unreachable!(),
        }
    }

    fn destroyed(state: &mut D, _client: WireClientId, resource: &XdgWmBase, _data: &()) {
        state.frontend_state().forget_client_object(&resource.id());
    }
}

impl<D: FrontendHandler> Dispatch<XdgPositioner, PositionerRef, D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &XdgPositioner,
        request: xdg_positioner::Request,
        data: &PositionerRef,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        let PositionerRef { client: owner, positioner } = *data;
        let request = match request {
            xdg_positioner::Request::SetSize { width, height } => PositionerRequest::SetSize((width, height).into()),
            xdg_positioner::Request::SetAnchorRect { x, y, width, height } => {
                PositionerRequest::SetAnchorRect(Rectangle::from((x, y, width, height)))
            }
            xdg_positioner::Request::SetAnchor { anchor } => match anchor {
                WEnum::Value(anchor) => match anchor_from_wire(anchor) {
                    Some(anchor) => PositionerRequest::SetAnchor(anchor),
                    None => return invalid_input(state, client, resource, owner, "unknown anchor"),
                },
                WEnum::Unknown(_) => return invalid_input(state, client, resource, owner, "unknown anchor"),
            },
            xdg_positioner::Request::SetGravity { gravity } => match gravity {
                WEnum::Value(gravity) => match gravity_from_wire(gravity) {
                    Some(gravity) => PositionerRequest::SetGravity(gravity),
                    None => return invalid_input(state, client, resource, owner, "unknown gravity"),
                },
                WEnum::Unknown(_) => return invalid_input(state, client, resource, owner, "unknown gravity"),
            },
            xdg_positioner::Request::SetConstraintAdjustment { constraint_adjustment } => {
                let bits: u32 = constraint_adjustment.into();
                PositionerRequest::SetConstraintAdjustment(ConstraintAdjustment::from_bits_truncate(bits))
            }
            xdg_positioner::Request::SetOffset { x, y } => PositionerRequest::SetOffset((x, y).into()),
            xdg_positioner::Request::SetReactive => PositionerRequest::SetReactive,
            xdg_positioner::Request::SetParentSize {
                parent_width,
                parent_height,
            } => PositionerRequest::SetParentSize((parent_width, parent_height).into()),
            xdg_positioner::Request::SetParentConfigure { serial } => {
                PositionerRequest::SetParentConfigure(Serial::from(serial))
            }
            xdg_positioner::Request::Destroy => PositionerRequest::Destroy,
            _ => unreachable!(),
        };
        state
            .frontend_state()
            .forward(client, resource, owner, Request::Positioner(positioner, request));
    }
}

fn invalid_input<D: FrontendHandler>(
    state: &mut D,
    client: &Client,
    resource: &XdgPositioner,
    owner: ClientId,
    reason: &'static str,
) {
    state
        .frontend_state()
        .post_error(client, resource, owner, &ProtocolError::InvalidInput(reason));
}

fn anchor_from_wire(anchor: xdg_positioner::Anchor) -> Option<Anchor> {
    Some(match anchor {
        xdg_positioner::Anchor::None => Anchor::None,
        xdg_positioner::Anchor::Top => Anchor::Top,
        xdg_positioner::Anchor::Bottom => Anchor::Bottom,
        xdg_positioner::Anchor::Left => Anchor::Left,
        xdg_positioner::Anchor::Right => Anchor::Right,
        xdg_positioner::Anchor::TopLeft => Anchor::TopLeft,
        xdg_positioner::Anchor::BottomLeft => Anchor::BottomLeft,
        xdg_positioner::Anchor::TopRight => Anchor::TopRight,
        xdg_positioner::Anchor::BottomRight => Anchor::BottomRight,
        _ => return None,
    })
}

fn gravity_from_wire(gravity: xdg_positioner::Gravity) -> Option<Gravity> {
    Some(match gravity {
        xdg_positioner::Gravity::None => Gravity::None,
        xdg_positioner::Gravity::Top => Gravity::Top,
        xdg_positioner::Gravity::Bottom => Gravity::Bottom,
        xdg_positioner::Gravity::Left => Gravity::Left,
        xdg_positioner::Gravity::Right => Gravity::Right,
        xdg_positioner::Gravity::TopLeft => Gravity::TopLeft,
        xdg_positioner::Gravity::BottomLeft => Gravity::BottomLeft,
        xdg_positioner::Gravity::TopRight => Gravity::TopRight,
        xdg_positioner::Gravity::BottomRight => Gravity::BottomRight,
        _ => return None,
    })
}

impl<D: FrontendHandler> Dispatch<XdgSurface, SurfaceRef, D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &XdgSurface,
        request: xdg_surface::Request,
        data: &SurfaceRef,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        let SurfaceRef { client: owner, surface } = *data;
        let frontend = state.frontend_state();
        let request = match request {
            xdg_surface::Request::GetToplevel { id } => {
                let toplevel = data_init.init(id, *data);
                frontend.objects(surface).toplevel = Some(toplevel);
                XdgSurfaceRequest::GetToplevel
            }
            xdg_surface::Request::GetPopup { id, parent, positioner } => {
                let Some(&PositionerRef { positioner, .. }) = positioner.data::<PositionerRef>() else {
                    return reject(data_init, id);
                };
                let parent = parent.and_then(|parent| parent.data::<SurfaceRef>().map(SurfaceRef::surface));
                let popup = data_init.init(id, *data);
                frontend.objects(surface).popup = Some(popup);
                XdgSurfaceRequest::GetPopup { parent, positioner }
            }
            xdg_surface::Request::SetWindowGeometry { x, y, width, height } => {
                XdgSurfaceRequest::SetWindowGeometry(Rectangle::from((x, y, width, height)))
            }
            xdg_surface::Request::AckConfigure { serial } => XdgSurfaceRequest::AckConfigure(Serial::from(serial)),
            xdg_surface::Request::Destroy => XdgSurfaceRequest::Destroy,
            _ => unreachable!(),
        };
        frontend.forward(client, resource, owner, Request::XdgSurface(surface, request));
    }

    fn destroyed(state: &mut D, _client: WireClientId, resource: &XdgSurface, data: &SurfaceRef) {
        state
            .frontend_state()
            .forget_surface_object(data.surface, &resource.id());
    }
}

impl<D: FrontendHandler> Dispatch<XdgToplevel, SurfaceRef, D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &XdgToplevel,
        request: xdg_toplevel::Request,
        data: &SurfaceRef,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        let SurfaceRef { client: owner, surface } = *data;
        let request = match request {
            xdg_toplevel::Request::SetParent { parent } => {
                ToplevelRequest::SetParent(parent.and_then(|parent| parent.data::<SurfaceRef>().map(SurfaceRef::surface)))
            }
            xdg_toplevel::Request::SetTitle { title } => ToplevelRequest::SetTitle(title),
            xdg_toplevel::Request::SetAppId { app_id } => ToplevelRequest::SetAppId(app_id),
            xdg_toplevel::Request::ShowWindowMenu { serial, x, y, .. } => ToplevelRequest::ShowWindowMenu {
                serial: Serial::from(serial),
                location: (x, y).into(),
            },
            xdg_toplevel::Request::Move { serial, .. } => ToplevelRequest::Move {
                serial: Serial::from(serial),
            },
            xdg_toplevel::Request::Resize { serial, edges, .. } => {
                let edges = match edges {
                    WEnum::Value(edges) => resize_edge_from_wire(edges),
                    WEnum::Unknown(value) => Err(ProtocolError::InvalidResizeEdge(value)),
                };
                match edges {
                    Ok(edges) => ToplevelRequest::Resize {
                        serial: Serial::from(serial),
                        edges,
                    },
                    Err(err) => {
                        state.frontend_state().post_error(client, resource, owner, &err);
                        return;
                    }
                }
            }
            xdg_toplevel::Request::SetMaxSize { width, height } => ToplevelRequest::SetMaxSize((width, height).into()),
            xdg_toplevel::Request::SetMinSize { width, height } => ToplevelRequest::SetMinSize((width, height).into()),
            xdg_toplevel::Request::SetMaximized => ToplevelRequest::SetMaximized,
            xdg_toplevel::Request::UnsetMaximized => ToplevelRequest::UnsetMaximized,
            xdg_toplevel::Request::SetFullscreen { output } => {
                ToplevelRequest::SetFullscreen(output.and_then(|output| output.data::<OutputId>().copied()))
            }
            xdg_toplevel::Request::UnsetFullscreen => ToplevelRequest::UnsetFullscreen,
            xdg_toplevel::Request::SetMinimized => ToplevelRequest::SetMinimized,
            xdg_toplevel::Request::Destroy => ToplevelRequest::Destroy,
            _ => unreachable!(),
        };
        state
            .frontend_state()
            .forward(client, resource, owner, Request::Toplevel(surface, request));
    }

    fn destroyed(state: &mut D, _client: WireClientId, resource: &XdgToplevel, data: &SurfaceRef) {
        state
            .frontend_state()
            .forget_surface_object(data.surface, &resource.id());
    }
}

fn resize_edge_from_wire(edges: xdg_toplevel::ResizeEdge) -> Result<ResizeEdge, ProtocolError> {
    Ok(match edges {
        xdg_toplevel::ResizeEdge::None => ResizeEdge::None,
        xdg_toplevel::ResizeEdge::Top => ResizeEdge::Top,
        xdg_toplevel::ResizeEdge::Bottom => ResizeEdge::Bottom,
        xdg_toplevel::ResizeEdge::Left => ResizeEdge::Left,
        xdg_toplevel::ResizeEdge::TopLeft => ResizeEdge::TopLeft,
        xdg_toplevel::ResizeEdge::BottomLeft => ResizeEdge::BottomLeft,
        xdg_toplevel::ResizeEdge::Right => ResizeEdge::Right,
        xdg_toplevel::ResizeEdge::TopRight => ResizeEdge::TopRight,
        xdg_toplevel::ResizeEdge::BottomRight => ResizeEdge::BottomRight,
        other => return Err(ProtocolError::InvalidResizeEdge(other as u32)),
    })
}

impl<D: FrontendHandler> Dispatch<XdgPopup, SurfaceRef, D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &XdgPopup,
        request: xdg_popup::Request,
        data: &SurfaceRef,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        let SurfaceRef { client: owner, surface } = *data;
        let request = match request {
            xdg_popup::Request::Grab { serial, .. } => PopupRequest::Grab {
                serial: Serial::from(serial),
            },
            xdg_popup::Request::Reposition { positioner, token } => match positioner.data::<PositionerRef>() {
                Some(positioner) => PopupRequest::Reposition {
                    positioner: positioner.positioner,
                    token,
                },
                None => return,
            },
            xdg_popup::Request::Destroy => PopupRequest::Destroy,
            _ => unreachable!(),
        };
        state
            .frontend_state()
            .forward(client, resource, owner, Request::Popup(surface, request));
    }

    fn destroyed(state: &mut D, _client: WireClientId, resource: &XdgPopup, data: &SurfaceRef) {
        state
            .frontend_state()
            .forget_surface_object(data.surface, &resource.id());
    }
}

impl<D: FrontendHandler> GlobalDispatch<ZxdgDecorationManagerV1, (), D> for FrontendState {
    fn bind(
        _state: &mut D,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<ZxdgDecorationManagerV1>,
        _global_data: &(),
        data_init: &mut DataInit<'_, D>,
    ) {
        data_init.init(resource, ());
    }
}

impl<D: FrontendHandler> Dispatch<ZxdgDecorationManagerV1, (), D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &ZxdgDecorationManagerV1,
        request: zxdg_decoration_manager_v1::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        match request {
            zxdg_decoration_manager_v1::Request::GetToplevelDecoration { id, toplevel } => {
                let Some(&surface_ref) = toplevel.data::<SurfaceRef>() else {
                    return reject(data_init, id);
                };
                let decoration = data_init.init(id, surface_ref);
                let frontend = state.frontend_state();
                frontend.objects(surface_ref.surface).decoration = Some(decoration);
                let request = Request::Decoration(surface_ref.surface, DecorationRequest::Create);
                frontend.forward(client, resource, surface_ref.client, request);
            }
            zxdg_decoration_manager_v1::Request::Destroy => {}
            _ => unreachable!(),
        }
    }
}

impl<D: FrontendHandler> Dispatch<ZxdgToplevelDecorationV1, SurfaceRef, D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &ZxdgToplevelDecorationV1,
        request: zxdg_toplevel_decoration_v1::Request,
        data: &SurfaceRef,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        let SurfaceRef { client: owner, surface } = *data;
        let request = match request {
            zxdg_toplevel_decoration_v1::Request::SetMode { mode } => match mode {
                WEnum::Value(zxdg_toplevel_decoration_v1::Mode::ClientSide) => {
                    DecorationRequest::SetMode(DecorationMode::ClientSide)
                }
                WEnum::Value(zxdg_toplevel_decoration_v1::Mode::ServerSide) => {
                    DecorationRequest::SetMode(DecorationMode::ServerSide)
                }
                mode => {
                    debug!(%surface, ?mode, "ignoring unknown decoration mode");
                    return;
                }
            },
            zxdg_toplevel_decoration_v1::Request::UnsetMode => DecorationRequest::UnsetMode,
            zxdg_toplevel_decoration_v1::Request::Destroy => DecorationRequest::Destroy,
            _ => unreachable!(),
        };
        state
            .frontend_state()
            .forward(client, resource, owner, Request::Decoration(surface, request));
    }

    fn destroyed(state: &mut D, _client: WireClientId, resource: &ZxdgToplevelDecorationV1, data: &SurfaceRef) {
        state
            .frontend_state()
            .forget_surface_object(data.surface, &resource.id());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_edges_keep_their_wire_values() {
        for edge in [
            xdg_toplevel::ResizeEdge::None,
            xdg_toplevel::ResizeEdge::Top,
            xdg_toplevel::ResizeEdge::BottomLeft,
            xdg_toplevel::ResizeEdge::BottomRight,
        ] {
            assert_eq!(resize_edge_from_wire(edge).map(|e| e as u32), Ok(edge as u32));
        }
    }

    #[test]
    fn anchors_and_gravities_map_one_to_one() {
        assert_eq!(anchor_from_wire(xdg_positioner::Anchor::TopRight), Some(Anchor::TopRight));
        assert_eq!(anchor_from_wire(xdg_positioner::Anchor::None), Some(Anchor::None));
        assert_eq!(gravity_from_wire(xdg_positioner::Gravity::BottomLeft), Some(Gravity::BottomLeft));
    }
}
