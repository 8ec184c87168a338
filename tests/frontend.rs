mod common;

use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use trellis::config::ShellConfig;
use trellis::reexports::wayland_server::{self, protocol::wl_buffer::WlBuffer};
use trellis::state::Compositor;
use trellis::utils::{Buffer, Size};
use trellis::wayland::frontend::{ClientState, FrontendHandler, FrontendState};

use wayland_client::globals::{registry_queue_init, GlobalListContents};
use wayland_client::protocol::{wl_compositor::WlCompositor, wl_registry, wl_surface::WlSurface};
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum};
use wayland_protocols::xdg::decoration::zv1::client::{
    zxdg_decoration_manager_v1::ZxdgDecorationManagerV1,
    zxdg_toplevel_decoration_v1::{self, ZxdgToplevelDecorationV1},
};
use wayland_protocols::xdg::shell::client::{
    xdg_popup::XdgPopup,
    xdg_positioner::XdgPositioner,
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};

struct ServerState {
    frontend: FrontendState,
}

impl FrontendHandler for ServerState {
    fn frontend_state(&mut self) -> &mut FrontendState {
        &mut self.frontend
    }

    fn buffer_size(&mut self, _buffer: &WlBuffer) -> Size<i32, Buffer> {
        (100, 100).into()
    }
}

trellis::delegate_frontend!(ServerState);

/// A display dispatching a single client on its own thread
struct Server {
    stop: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Server {
    fn start(compositor: Compositor, stream: UnixStream) -> Server {
        let stop = Arc::new(AtomicBool::new(false));
        let stopped = stop.clone();
        let thread = std::thread::spawn(move || {
            let mut display = wayland_server::Display::<ServerState>::new().unwrap();
            let mut handle = display.handle();
            let mut state = ServerState {
                frontend: FrontendState::new::<ServerState>(&handle, compositor.clone()),
            };
            stream.set_nonblocking(true).unwrap();
            handle
                .insert_client(stream, Arc::new(ClientState::new(&compositor)))
                .unwrap();
            while !stopped.load(Ordering::SeqCst) {
                display.dispatch_clients(&mut state).unwrap();
                display.flush_clients().unwrap();
                std::thread::sleep(Duration::from_millis(1));
            }
        });
        Server {
            stop,
            thread: Some(thread),
        }
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::SeqCst);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

#[derive(Debug, Default)]
struct App {
    events: Vec<&'static str>,
    serials: Vec<u32>,
    decoration_mode: Option<WEnum<zxdg_toplevel_decoration_v1::Mode>>,
}

impl Dispatch<wl_registry::WlRegistry, GlobalListContents> for App {
    fn event(
        _state: &mut Self,
        _proxy: &wl_registry::WlRegistry,
        _event: wl_registry::Event,
        _data: &GlobalListContents,
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
    }
}

impl Dispatch<XdgWmBase, ()> for App {
    fn event(
        _state: &mut Self,
        wm_base: &XdgWmBase,
        event: xdg_wm_base::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            wm_base.pong(serial);
        }
    }
}

impl Dispatch<XdgSurface, ()> for App {
    fn event(
        state: &mut Self,
        _proxy: &XdgSurface,
        event: xdg_surface::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            state.events.push("xdg_surface.configure");
            state.serials.push(serial);
        }
    }
}

impl Dispatch<XdgToplevel, ()> for App {
    fn event(
        state: &mut Self,
        _proxy: &XdgToplevel,
        event: xdg_toplevel::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        if let xdg_toplevel::Event::Configure { .. } = event {
            state.events.push("xdg_toplevel.configure");
        }
    }
}

impl Dispatch<ZxdgToplevelDecorationV1, ()> for App {
    fn event(
        state: &mut Self,
        _proxy: &ZxdgToplevelDecorationV1,
        event: zxdg_toplevel_decoration_v1::Event,
        _data: &(),
        _conn: &Connection,
        _qhandle: &QueueHandle<Self>,
    ) {
        if let zxdg_toplevel_decoration_v1::Event::Configure { mode } = event {
            state.events.push("decoration.configure");
            state.decoration_mode = Some(mode);
        }
    }
}

wayland_client::delegate_noop!(App: ignore WlCompositor);
wayland_client::delegate_noop!(App: ignore WlSurface);
wayland_client::delegate_noop!(App: ignore XdgPositioner);
wayland_client::delegate_noop!(App: ignore XdgPopup);
wayland_client::delegate_noop!(App: ignore ZxdgDecorationManagerV1);

fn connect(compositor: &Compositor) -> (Server, Connection) {
    let (server_side, client_side) = UnixStream::pair().unwrap();
    let server = Server::start(compositor.clone(), server_side);
    (server, Connection::from_socket(client_side).unwrap())
}

#[test]
fn toplevel_over_the_wire() {
    let compositor = common::compositor(ShellConfig::default());
    let (_server, conn) = connect(&compositor);
    let (globals, mut queue) = registry_queue_init::<App>(&conn).unwrap();
    let qh = queue.handle();
    let wl_compositor: WlCompositor = globals.bind(&qh, 1..=4, ()).unwrap();
    let wm_base: XdgWmBase = globals.bind(&qh, 1..=3, ()).unwrap();
    let mut app = App::default();

    let surface = wl_compositor.create_surface(&qh, ());
    let xdg_surface = wm_base.get_xdg_surface(&surface, &qh, ());
    let toplevel = xdg_surface.get_toplevel(&qh, ());
    toplevel.set_title("hello".into());
    surface.commit();
    queue.roundtrip(&mut app).unwrap();

    assert_eq!(app.events, vec!["xdg_toplevel.configure", "xdg_surface.configure"]);
    let title = compositor.with_state(|state| {
        state
            .surfaces()
            .find_map(|s| state.toplevel(s.id()))
            .and_then(|toplevel| toplevel.title().map(str::to_owned))
    });
    assert_eq!(title.as_deref(), Some("hello"));

    xdg_surface.ack_configure(app.serials[0]);
    queue.roundtrip(&mut app).unwrap();

    // a serial that was never sent
    xdg_surface.ack_configure(app.serials[0].wrapping_add(1000));
    assert!(queue.roundtrip(&mut app).is_err());
    let error = conn.protocol_error().unwrap();
    assert_eq!(error.object_interface, "xdg_surface");
    assert_eq!(error.code, xdg_surface::Error::InvalidSerial as u32);
    assert_eq!(error.object_id, xdg_surface.id().protocol_id());
    assert_eq!(compositor.with_state(|state| state.surfaces().count()), 0);
}

#[test]
fn errors_are_posted_on_the_object_they_belong_to() {
    let compositor = common::compositor(ShellConfig::default());
    let (_server, conn) = connect(&compositor);
    let (globals, mut queue) = registry_queue_init::<App>(&conn).unwrap();
    let qh = queue.handle();
    let wl_compositor: WlCompositor = globals.bind(&qh, 1..=4, ()).unwrap();
    let wm_base: XdgWmBase = globals.bind(&qh, 1..=3, ()).unwrap();
    let mut app = App::default();

    let positioner = wm_base.create_positioner(&qh, ());
    positioner.set_size(50, 50);
    positioner.set_anchor_rect(0, 0, 10, 10);
    let surface = wl_compositor.create_surface(&qh, ());
    let xdg_surface = wm_base.get_xdg_surface(&surface, &qh, ());
    // sent on the xdg_surface, raised on xdg_wm_base
    let _popup = xdg_surface.get_popup(None, &positioner, &qh, ());
    assert!(queue.roundtrip(&mut app).is_err());

    let error = conn.protocol_error().unwrap();
    assert_eq!(error.object_interface, "xdg_wm_base");
    assert_eq!(error.code, xdg_wm_base::Error::InvalidPopupParent as u32);
    assert_eq!(error.object_id, wm_base.id().protocol_id());
}

#[test]
fn decoration_mode_is_sent_before_the_configure() {
    let compositor = common::compositor(ShellConfig::default());
    let (_server, conn) = connect(&compositor);
    let (globals, mut queue) = registry_queue_init::<App>(&conn).unwrap();
    let qh = queue.handle();
    let wl_compositor: WlCompositor = globals.bind(&qh, 1..=4, ()).unwrap();
    let wm_base: XdgWmBase = globals.bind(&qh, 1..=3, ()).unwrap();
    let manager: ZxdgDecorationManagerV1 = globals.bind(&qh, 1..=1, ()).unwrap();
    let mut app = App::default();

    let surface = wl_compositor.create_surface(&qh, ());
    let xdg_surface = wm_base.get_xdg_surface(&surface, &qh, ());
    let toplevel = xdg_surface.get_toplevel(&qh, ());
    let decoration = manager.get_toplevel_decoration(&toplevel, &qh, ());
    decoration.set_mode(zxdg_toplevel_decoration_v1::Mode::ServerSide);
    surface.commit();
    queue.roundtrip(&mut app).unwrap();

    assert_eq!(
        app.events,
        vec!["decoration.configure", "xdg_toplevel.configure", "xdg_surface.configure"]
    );
    assert_eq!(
        app.decoration_mode,
        Some(WEnum::Value(zxdg_toplevel_decoration_v1::Mode::ServerSide))
    );
}
