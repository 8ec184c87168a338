use tracing::debug;
use wayland_server::protocol::wl_output::{self, WlOutput};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use super::{FrontendHandler, FrontendState};
use crate::utils::OutputId;

// outputs are headless, advertise a fixed 60Hz mode
const REFRESH_MHZ: i32 = 60_000;

impl<D: FrontendHandler> GlobalDispatch<WlOutput, OutputId, D> for FrontendState {
    fn bind(
        state: &mut D,
        _handle: &DisplayHandle,
        _client: &Client,
        resource: New<WlOutput>,
        global_data: &OutputId,
        data_init: &mut DataInit<'_, D>,
    ) {
        let output = data_init.init(resource, *global_data);
        let info = state.frontend_state().compositor.with_state(|s| {
            s.outputs()
                .find(|o| o.id() == *global_data)
                .map(|o| (o.name().to_owned(), o.geometry()))
        });
        let Some((name, geometry)) = info else {
            debug!(output = %global_data, "bound an output that is already gone");
            return;
        };

        output.geometry(
            geometry.loc.x,
            geometry.loc.y,
            0,
            0,
            wl_output::Subpixel::Unknown,
            "trellis".into(),
            name.clone(),
            wl_output::Transform::Normal,
        );
        output.mode(
            wl_output::Mode::Current | wl_output::Mode::Preferred,
            geometry.size.w,
            geometry.size.h,
            REFRESH_MHZ,
        );
        if output.version() >= 2 {
            output.scale(1);
        }
        if output.version() >= 4 {
            output.name(name);
        }
        if output.version() >= 2 {
            output.done();
        }
    }
}

impl<D: FrontendHandler> Dispatch<WlOutput, OutputId, D> for FrontendState {
    fn request(
        _state: &mut D,
        _client: &Client,
        _resource: &WlOutput,
        _request: wl_output::Request,
        _data: &OutputId,
        _dhandle: &DisplayHandle,
        _data_init: &mut DataInit<'_, D>,
    ) {
    }
}
