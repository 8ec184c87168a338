use tracing::debug;
use wayland_protocols::ext::session_lock::v1::server::{
    ext_session_lock_manager_v1::{self, ExtSessionLockManagerV1},
    ext_session_lock_surface_v1::{self, ExtSessionLockSurfaceV1},
    ext_session_lock_v1::{self, ExtSessionLockV1},
};
use wayland_server::backend::ClientId as WireClientId;
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use super::{client_id, reject, FrontendHandler, FrontendState, SurfaceRef};
use crate::utils::{OutputId, Serial};
use crate::wayland::protocol::{Request, SessionLockRequest};

impl<D: FrontendHandler> GlobalDispatch<ExtSessionLockManagerV1, (), D> for FrontendState {
    fn bind(
        _state: &mut D,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<ExtSessionLockManagerV1>,
        _global_data: &(),
        data_init: &mut DataInit<'_, D>,
    ) {
        data_init.init(resource, ());
    }
}

impl<D: FrontendHandler> Dispatch<ExtSessionLockManagerV1, (), D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        _resource: &ExtSessionLockManagerV1,
        request: ext_session_lock_manager_v1::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        match request {
            ext_session_lock_manager_v1::Request::Lock { id } => {
                let Some(owner) = client_id(client) else {
                    return reject(data_init, id);
                };
                let lock = data_init.init(id, ());
                let frontend = state.frontend_state();
                frontend.add_client_object(owner, lock.id());
                frontend.locks.insert(owner, lock.clone());
                frontend.forward(client, &lock, owner, Request::SessionLock(SessionLockRequest::Lock));
            }
            ext_session_lock_manager_v1::Request::Destroy => {}
            _ => unreachable!(),
        }
    }
}

impl<D: FrontendHandler> Dispatch<ExtSessionLockV1, (), D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &ExtSessionLockV1,
        request: ext_session_lock_v1::Request,
        _data: &(),
        _dhandle: &DisplayHandle,
        data_init: &mut DataInit<'_, D>,
    ) {
        let Some(owner) = client_id(client) else {
            return;
        };
        let request = match request {
            ext_session_lock_v1::Request::GetLockSurface { id, surface, output } => {
                let (Some(&surface_ref), Some(&output)) = (surface.data::<SurfaceRef>(), output.data::<OutputId>())
                else {
                    return reject(data_init, id);
                };
                let lock_surface = data_init.init(id, surface_ref);
                state.frontend_state().objects(surface_ref.surface).lock_surface = Some(lock_surface);
                SessionLockRequest::GetLockSurface {
                    surface: surface_ref.surface,
                    output,
                }
            }
            ext_session_lock_v1::Request::UnlockAndDestroy => SessionLockRequest::Unlock,
            ext_session_lock_v1::Request::Destroy => {
                debug!(client = %owner, "session lock object destroyed");
                return;
            }
            _ => unreachable!(),
        };
        state
            .frontend_state()
            .forward(client, resource, owner, Request::SessionLock(request));
    }

    fn destroyed(state: &mut D, _client: WireClientId, resource: &ExtSessionLockV1, _data: &()) {
        state.frontend_state().forget_client_object(&resource.id());
    }
}

impl<D: FrontendHandler> Dispatch<ExtSessionLockSurfaceV1, SurfaceRef, D> for FrontendState {
    fn request(
        state: &mut D,
        client: &Client,
        resource: &ExtSessionLockSurfaceV1,
        request: ext_session_lock_surface_v1::Request,
        data: &SurfaceRef,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
        let SurfaceRef { client: owner, surface } = *data;
        let request = match request {
            ext_session_lock_surface_v1::Request::AckConfigure { serial } => SessionLockRequest::AckConfigure {
                surface,
                serial: Serial::from(serial),
            },
            ext_session_lock_surface_v1::Request::Destroy => SessionLockRequest::DestroyLockSurface(surface),
            _ => unreachable!(),
        };
        state
            .frontend_state()
            .forward(client, resource, owner, Request::SessionLock(request));
    }

    fn destroyed(state: &mut D, _client: WireClientId, resource: &ExtSessionLockSurfaceV1, data: &SurfaceRef) {
        state
            .frontend_state()
            .forget_surface_object(data.surface, &resource.id());
    }
}
