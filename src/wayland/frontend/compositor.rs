use std::sync::Mutex;

use tracing::trace;
use wayland_server::backend::ClientId as WireClientId;
use wayland_server::protocol::{
    wl_callback::WlCallback,
    wl_compositor::{self, WlCompositor},
    wl_region::{self, WlRegion},
    wl_surface::{self, WlSurface},
};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use super::{client_id, reject, FrontendHandler, FrontendState, RegionData, SurfaceRef};
use crate::utils::{Buffer, Rectangle};
use crate::wayland::compositor::{BufferInfo, RectangleKind, RegionAttributes};
use crate::wayland::protocol::{Request, SurfaceRequest};

/// From this version on, `wl_surface.attach` must not carry an offset
const WL_SURFACE_OFFSET_SINCE: u32 = 5;

impl<D: FrontendHandler> GlobalDispatch<WlCompositor, (), D> for FrontendState {
    fn bind(
        _state: &mut D,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlCompositor>,
        _global_data: &(),
        data_init: &mut DataInit<'_, D>,
    ) {
        data_init.init(resource, ());
    }
}

impl<D: FrontendHandler> Dispatch<WlCompositor, (), D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        _resource: &WlCompositor,
        request: wl_compositor::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        match request {
            wl_compositor::Request::CreateSurface { id } => {
                let Some(owner) = client_id(client) else {
                    return reject(data_init, id);
                };
                let frontend = state.frontend_state();
                match frontend.compositor.create_surface(owner) {
                    Ok(surface) => {
                        let wl_surface = data_init.init(id, SurfaceRef { client: owner, surface });
                        trace!(%surface, wl_surface = ?wl_surface.id(), "surface created");
                        frontend.objects(surface).wl_surface = Some(wl_surface);
                    }
                    Err(_) => reject(data_init, id),
                }
            }
            wl_compositor::Request::CreateRegion { id } => {
                data_init.init(id, Mutex::new(RegionAttributes::default()));
            }
            _ => unreachable!(),
        }
    }
}

impl<D: FrontendHandler> Dispatch<WlSurface, SurfaceRef, D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &WlSurface,
        request: wl_surface::Request,
        data: &SurfaceRef,
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        let SurfaceRef { client: owner, surface } = *data;
        let request = match request {
            wl_surface::Request::Attach { buffer, x, y } => {
                if (x, y) != (0, 0) && resource.version() >= WL_SURFACE_OFFSET_SINCE {
                    resource.post_error(
                        wl_surface::Error::InvalidOffset,
                        "attach offsets are replaced by wl_surface.offset",
                    );
                    return;
                }
                let info = buffer.map(|buffer| BufferInfo {
                    size: state.buffer_size(&buffer),
                });
                let frontend = state.frontend_state();
                let attach = Request::Surface(surface, SurfaceRequest::Attach(info));
                if !frontend.forward(client, resource, owner, attach) || (x, y) == (0, 0) {
                    return;
                }
                SurfaceRequest::Offset((x, y).into())
            }
            wl_surface::Request::Offset { x, y } => SurfaceRequest::Offset((x, y).into()),
            wl_surface::Request::Damage { x, y, width, height } => {
                // surface-local damage, tracked in buffer coordinates
                let scale = state
                    .frontend_state()
                    .compositor
                    .with_state(|s| s.surface(surface).map(|s| s.pending().buffer_scale))
                    .unwrap_or(1);
                SurfaceRequest::DamageBuffer(Rectangle::<i32, Buffer>::from((
                    x.saturating_mul(scale),
                    y.saturating_mul(scale),
                    width.saturating_mul(scale),
                    height.saturating_mul(scale),
                )))
            }
            wl_surface::Request::DamageBuffer { x, y, width, height } => {
                SurfaceRequest::DamageBuffer(Rectangle::from((x, y, width, height)))
            }
            wl_surface::Request::Frame { callback } => {
                let callback = data_init.init(callback, ());
                state.frontend_state().objects(surface).pending_frames.push(callback);
                return;
            }
            wl_surface::Request::SetOpaqueRegion { region } => {
                SurfaceRequest::SetOpaqueRegion(region.as_ref().map(region_attributes))
            }
            wl_surface::Request::SetInputRegion { region } => {
                SurfaceRequest::SetInputRegion(region.as_ref().map(region_attributes))
            }
            wl_surface::Request::SetBufferScale { scale } => SurfaceRequest::SetBufferScale(scale),
            wl_surface::Request::SetBufferTransform { .. } => {
                trace!(%surface, "buffer transforms are not tracked");
                return;
            }
            wl_surface::Request::Commit => {
                let frontend = state.frontend_state();
                if frontend.forward(client, resource, owner, Request::Surface(surface, SurfaceRequest::Commit)) {
                    let objects = frontend.objects(surface);
                    let pending = std::mem::take(&mut objects.pending_frames);
                    objects.frames.extend(pending);
                }
                return;
            }
            wl_surface::Request::Destroy => SurfaceRequest::Destroy,
            _ => unreachable!(),
        };
        state
            .frontend_state()
            .forward(client, resource, owner, Request::Surface(surface, request));
    }

    fn destroyed(state: &mut D, _client: WireClientId, _resource: &WlSurface, data: &SurfaceRef) {
        state.frontend_state().surfaces.remove(&data.surface);
    }
}

fn region_attributes(region: &WlRegion) -> RegionAttributes {
    region
        .data::<RegionData>()
        .map(|data| data.lock().unwrap().clone())
        .unwrap_or_default()
}

impl<D: FrontendHandler> Dispatch<WlRegion, RegionData, D> for FrontendState {
    fn request(
        _state: &mut D,
        _client: &Client,
        _resource: &WlRegion,
        request: wl_region::Request,
        data: &RegionData,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        let mut attributes = data.lock().unwrap();
        match request {
            wl_region::Request::Add { x, y, width, height } => attributes
                .rects
                .push((RectangleKind::Add, Rectangle::from((x, y, width, height)))),
            wl_region::Request::Subtract { x, y, width, height } => attributes
                .rects
                .push((RectangleKind::Subtract, Rectangle::from((x, y, width, height)))),
            wl_region::Request::Destroy => {}
            _ => unreachable!(),
        }
    }
}

impl<D: FrontendHandler> Dispatch<WlCallback, (), D> for FrontendState {
    fn request(
        _state: &mut D,
        _client: &Client,
        _resource: &WlCallback,
        _request: <WlCallback as Resource>::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
    }
}
