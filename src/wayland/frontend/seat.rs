use tracing::trace;
use wayland_server::backend::ClientId as WireClientId;
use wayland_server::protocol::{
    wl_data_device::{self, WlDataDevice},
    wl_data_device_manager::{self, WlDataDeviceManager},
    wl_data_source::WlDataSource,
    wl_keyboard::WlKeyboard,
    wl_pointer::{self, WlPointer},
    wl_seat::{self, WlSeat},
    wl_surface::WlSurface,
    wl_touch::WlTouch,
};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use super::{client_id, FrontendHandler, FrontendState, SurfaceRef};
use crate::utils::{Serial, SurfaceId};
use crate::wayland::protocol::{DataDeviceRequest, PointerRequest, Request};

const SEAT_NAME: &str = "seat0";

fn surface_of(surface: &WlSurface) -> Option<SurfaceId> {
    surface.data::<SurfaceRef>().map(SurfaceRef::surface)
}

impl<D: FrontendHandler> GlobalDispatch<WlSeat, (), D> for FrontendState {
    fn bind(
        _state: &mut D,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlSeat>,
        _global_data: &(),
        data_init: &mut DataInit<'_, D>,
    ) {
        let seat = data_init.init(resource, ());
        seat.capabilities(wl_seat::Capability::Pointer | wl_seat::Capability::Keyboard);
        if seat.version() >= 2 {
            seat.name(SEAT_NAME.into());
        }
    }
}

impl<D: FrontendHandler> Dispatch<WlSeat, (), D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        _resource: &WlSeat,
        request: wl_seat::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        match request {
            wl_seat::Request::GetPointer { id } => {
                let pointer = data_init.init(id, ());
                if let Some(owner) = client_id(client) {
                    state.frontend_state().add_client_object(owner, pointer.id());
                }
            }
            wl_seat::Request::GetKeyboard { id } => {
                data_init.init(id, ());
            }
            wl_seat::Request::GetTouch { id } => {
                data_init.init(id, ());
            }
            wl_seat::Request::Release => {}
            _ => unreachable!(),
        }
    }
}

impl<D: FrontendHandler> Dispatch<WlPointer, (), D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &WlPointer,
        request: wl_pointer::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        let Some(owner) = client_id(client) else {
            return;
        };
        match request {
            wl_pointer::Request::SetCursor {
                serial,
                surface,
                hotspot_x,
                hotspot_y,
            } => {
                let request = Request::Pointer(PointerRequest::SetCursor {
                    serial: Serial::from(serial),
                    surface: surface.as_ref().and_then(surface_of),
                    hotspot: (hotspot_x, hotspot_y).into(),
                });
                state.frontend_state().forward(client, resource, owner, request);
            }
            wl_pointer::Request::Release => {}
            _ => unreachable!(),
        }
    }

    fn destroyed(state: &mut D, _client: WireClientId, resource: &WlPointer, _data: &()) {
        state.frontend_state().forget_client_object(&resource.id());
    }
}

impl<D: FrontendHandler> Dispatch<WlKeyboard, (), D> for FrontendState {
    fn request(
        _state: &mut D,
        _client: &Client,
        _resource: &WlKeyboard,
        _request: <WlKeyboard as Resource>::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
    }
}

impl<D: FrontendHandler> Dispatch<WlTouch, (), D> for FrontendState {
    fn request(
        _state: &mut D,
        _client: &Client,
        _resource: &WlTouch,
        _request: <WlTouch as Resource>::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
    }
}

impl<D: FrontendHandler> GlobalDispatch<WlDataDeviceManager, (), D> for FrontendState {
    fn bind(
        _state: &mut D,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlDataDeviceManager>,
        _global_data: &(),
        data_init: &mut DataInit<'_, D>,
    ) {
        data_init.init(resource, ());
    }
}

impl<D: FrontendHandler> Dispatch<WlDataDeviceManager, (), D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        _resource: &WlDataDeviceManager,
        request: wl_data_device_manager::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        match request {
            wl_data_device_manager::Request::CreateDataSource { id } => {
                data_init.init(id, ());
            }
            wl_data_device_manager::Request::GetDataDevice { id, .. } => {
                let device = data_init.init(id, ());
                if let Some(owner) = client_id(client) {
                    state.frontend_state().add_client_object(owner, device.id());
                }
            }
            _ => unreachable!(),
        }
    }
}

// Selections and offers are not handled, sources only exist to start drags
impl<D: FrontendHandler> Dispatch<WlDataSource, (), D> for FrontendState {
    fn request(
        _state: &mut D,
        _client: &Client,
        _resource: &WlDataSource,
        request: <WlDataSource as Resource>::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        trace!(?request, "ignoring wl_data_source request");
    }
}

impl<D: FrontendHandler> Dispatch<WlDataDevice, (), D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &WlDataDevice,
        request: wl_data_device::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        let Some(owner) = client_id(client) else {
            return;
        };
        match request {
            wl_data_device::Request::StartDrag {
                origin, icon, serial, ..
            } => {
                let Some(origin) = surface_of(&origin) else {
                    return;
                };
                let request = Request::DataDevice(DataDeviceRequest::StartDrag {
                    origin,
                    icon: icon.as_ref().and_then(surface_of),
                    serial: Serial::from(serial),
                });
                state.frontend_state().forward(client, resource, owner, request);
            }
            wl_data_device::Request::SetSelection { .. } | wl_data_device::Request::Release => {}
            _ => unreachable!(),
        }
    }

    fn destroyed(state: &mut D, _client: WireClientId, resource: &WlDataDevice, _data: &()) {
        state.frontend_state().forget_client_object(&resource.id());
    }
}
