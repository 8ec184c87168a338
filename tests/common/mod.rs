#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use trellis::config::ShellConfig;
use trellis::state::{Compositor, ShellEvent};
use trellis::utils::{ClientId, PositionerId, Rectangle, Serial, SurfaceId};
use trellis::wayland::compositor::BufferInfo;
use trellis::wayland::protocol::{
    ClientEvent, PositionerRequest, Request, SurfaceRequest, XdgSurfaceRequest,
};
use trellis::wayland::shell::xdg::{Anchor, ConstraintAdjustment, Gravity};

static LOGGING: Once = Once::new();

pub fn init_logging() {
    LOGGING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub fn compositor(config: ShellConfig) -> Compositor {
    init_logging();
    Compositor::new(config)
}

/// Record every notification of a compositor
pub fn record(compositor: &Compositor) -> Arc<Mutex<Vec<ShellEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    compositor.subscribe(move |event| sink.lock().unwrap().push(event.clone()));
    events
}

pub fn dispatch(compositor: &Compositor, client: ClientId, request: Request) {
    compositor
        .dispatch(client, request)
        .unwrap_or_else(|err| panic!("unexpected protocol error: {}", err));
}

pub fn xdg_surface(compositor: &Compositor, client: ClientId) -> SurfaceId {
    let surface = compositor.create_surface(client).unwrap();
    dispatch(compositor, client, Request::XdgSurface(surface, XdgSurfaceRequest::Create));
    surface
}

pub fn toplevel(compositor: &Compositor, client: ClientId) -> SurfaceId {
    let surface = xdg_surface(compositor, client);
    dispatch(compositor, client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel));
    surface
}

pub fn commit(compositor: &Compositor, client: ClientId, surface: SurfaceId) {
    dispatch(compositor, client, Request::Surface(surface, SurfaceRequest::Commit));
}

pub fn attach(compositor: &Compositor, client: ClientId, surface: SurfaceId, w: i32, h: i32) {
    let attach = SurfaceRequest::Attach(Some(BufferInfo { size: (w, h).into() }));
    dispatch(compositor, client, Request::Surface(surface, attach));
}

/// Serial of the last configure queued for `surface`
pub fn last_configure(events: &[ClientEvent], surface: SurfaceId) -> Option<Serial> {
    events.iter().rev().find_map(|event| match event {
        ClientEvent::ToplevelConfigure { surface: s, serial, .. }
        | ClientEvent::PopupConfigure { surface: s, serial, .. }
        | ClientEvent::LockSurfaceConfigure { surface: s, serial, .. }
            if *s == surface =>
        {
            Some(*serial)
        }
        _ => None,
    })
}

/// Run the initial commit/configure/ack/attach sequence of an xdg surface
pub fn map(compositor: &Compositor, client: ClientId, surface: SurfaceId) -> Vec<ClientEvent> {
    commit(compositor, client, surface);
    let events = compositor.drain_client_events(client);
    let serial = last_configure(&events, surface).expect("no initial configure");
    dispatch(
        compositor,
        client,
        Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(serial)),
    );
    attach(compositor, client, surface, 100, 100);
    commit(compositor, client, surface);
    events
}

pub fn mapped_toplevel(compositor: &Compositor, client: ClientId) -> SurfaceId {
    let surface = toplevel(compositor, client);
    map(compositor, client, surface);
    surface
}

/// A complete positioner placing a 50x50 popup below and right of `anchor`
pub fn positioner(
    compositor: &Compositor,
    client: ClientId,
    anchor: Rectangle<i32, trellis::utils::Logical>,
    adjustment: ConstraintAdjustment,
) -> PositionerId {
    let id = compositor.create_positioner(client).unwrap();
    for request in [
        PositionerRequest::SetSize((50, 50).into()),
        PositionerRequest::SetAnchorRect(anchor),
        PositionerRequest::SetAnchor(Anchor::BottomRight),
        PositionerRequest::SetGravity(Gravity::BottomRight),
        PositionerRequest::SetConstraintAdjustment(adjustment),
    ] {
        dispatch(compositor, client, Request::Positioner(id, request));
    }
    id
}

pub fn popup(
    compositor: &Compositor,
    client: ClientId,
    parent: SurfaceId,
    positioner: PositionerId,
) -> SurfaceId {
    let surface = xdg_surface(compositor, client);
    dispatch(
        compositor,
        client,
        Request::XdgSurface(
            surface,
            XdgSurfaceRequest::GetPopup {
                parent: Some(parent),
                positioner,
            },
        ),
    );
    surface
}
