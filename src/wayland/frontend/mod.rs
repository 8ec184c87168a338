//! `wayland-server` bindings
//!
//! This module exposes the protocols handled by this crate as globals of a wayland
//! [`Display`](wayland_server::Display). Every request a client sends on them is turned into a
//! [`Request`] and processed by the [`Compositor`], and the [`ClientEvent`]s it queues are sent
//! back on the matching objects.
//!
//! ## How to use it
//!
//! Your compositor state keeps a [`FrontendState`] and implements [`FrontendHandler`], the
//! [`delegate_frontend!`](crate::delegate_frontend) macro then implements the `Dispatch` traits
//! needed by `wayland-server`. Clients must be inserted with a [`ClientState`] as their data,
//! which registers them with the [`Compositor`] and destroys their resources once they are gone.
//!
//! ```no_run
//! use std::sync::Arc;
//! use trellis::config::ShellConfig;
//! use trellis::delegate_frontend;
//! use trellis::reexports::wayland_server::{protocol::wl_buffer::WlBuffer, Display};
//! use trellis::state::Compositor;
//! use trellis::utils::{Buffer, Size};
//! use trellis::wayland::frontend::{ClientState, FrontendHandler, FrontendState};
//!
//! struct MyState {
//!     frontend: FrontendState,
//! }
//!
//! impl FrontendHandler for MyState {
//!     fn frontend_state(&mut self) -> &mut FrontendState {
//!         &mut self.frontend
//!     }
//!
//!     fn buffer_size(&mut self, _buffer: &WlBuffer) -> Size<i32, Buffer> {
//!         // ask your shm or dmabuf handling
//! #       (0, 0).into()
//!     }
//! }
//!
//! delegate_frontend!(MyState);
//!
//! # let stream: std::os::unix::net::UnixStream = unimplemented!();
//! let mut display = Display::<MyState>::new().unwrap();
//! let compositor = Compositor::new(ShellConfig::default());
//! let mut state = MyState {
//!     frontend: FrontendState::new::<MyState>(&display.handle(), compositor.clone()),
//! };
//! display
//!     .handle()
//!     .insert_client(stream, Arc::new(ClientState::new(&compositor)))
//!     .unwrap();
//! display.dispatch_clients(&mut state).unwrap();
//! display.flush_clients().unwrap();
//! ```
//!
//! Buffers are not handled here, the embedder reports their size through
//! [`FrontendHandler::buffer_size`].

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::{debug, trace};
use wayland_protocols::ext::session_lock::v1::server::{
    ext_session_lock_manager_v1::ExtSessionLockManagerV1, ext_session_lock_surface_v1::ExtSessionLockSurfaceV1,
    ext_session_lock_v1::ExtSessionLockV1,
};
use wayland_protocols::xdg::decoration::zv1::server::{
    zxdg_decoration_manager_v1::ZxdgDecorationManagerV1,
    zxdg_toplevel_decoration_v1::{self, ZxdgToplevelDecorationV1},
};
use wayland_protocols::xdg::shell::server::{
    xdg_popup::XdgPopup,
    xdg_positioner::XdgPositioner,
    xdg_surface::XdgSurface,
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::XdgWmBase,
};
use wayland_server::backend::protocol::ProtocolError as WireError;
use wayland_server::backend::{ClientData, ClientId as WireClientId, DisconnectReason, GlobalId, ObjectId};
use wayland_server::protocol::{
    wl_buffer::WlBuffer, wl_callback::WlCallback, wl_compositor::WlCompositor,
    wl_data_device::WlDataDevice, wl_data_device_manager::WlDataDeviceManager, wl_data_source::WlDataSource,
    __interfaces::WL_DISPLAY_INTERFACE, wl_keyboard::WlKeyboard, wl_output::WlOutput, wl_pointer::WlPointer,
    wl_region::WlRegion, wl_seat::WlSeat, wl_surface::WlSurface, wl_touch::WlTouch,
};
use wayland_server::{Client, DataInit, Dispatch, DisplayHandle, GlobalDispatch, New, Resource};

use crate::state::{Compositor, ShellError};
use crate::utils::{Buffer, ClientId, Logical, OutputId, PositionerId, Rectangle, Size, SurfaceId};
use crate::wayland::compositor::RegionAttributes;
use crate::wayland::protocol::{ClientEvent, ProtocolError, Request};
use crate::wayland::shell::xdg::{DecorationMode, ToplevelStates};

mod compositor;
mod output;
mod seat;
mod session_lock;
mod xdg;

const WL_COMPOSITOR_VERSION: u32 = 5;
const WL_SEAT_VERSION: u32 = 7;
const WL_DATA_DEVICE_MANAGER_VERSION: u32 = 3;
const WL_OUTPUT_VERSION: u32 = 4;
const DECORATION_MANAGER_VERSION: u32 = 1;
const SESSION_LOCK_MANAGER_VERSION: u32 = 1;

/// User data of the objects extending a surface
///
/// `wl_surface`, `xdg_surface`, `xdg_toplevel`, `xdg_popup`, the toplevel decoration and the
/// lock surface all carry it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceRef {
    client: ClientId,
    surface: SurfaceId,
}

impl SurfaceRef {
    /// The surface this object belongs to
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }
}

/// User data of `xdg_positioner` objects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionerRef {
    client: ClientId,
    positioner: PositionerId,
}

/// User data of `wl_region` objects
pub type RegionData = Mutex<RegionAttributes>;

/// Data associated with a wayland client
///
/// Insert every client with it, so that its requests reach the [`Compositor`].
#[derive(Debug)]
pub struct ClientState {
    id: ClientId,
    compositor: Compositor,
}

impl ClientState {
    /// Register a new client with the compositor
    pub fn new(compositor: &Compositor) -> ClientState {
        // the xdg_wm_base version is known once the client binds it
        let id = compositor.new_client(u32::MAX);
        ClientState {
            id,
            compositor: compositor.clone(),
        }
    }

    /// The identifier of this client in the [`Compositor`]
    pub fn id(&self) -> ClientId {
        self.id
    }
}

impl ClientData for ClientState {
    fn disconnected(&self, _client_id: WireClientId, reason: DisconnectReason) {
        debug!(client = %self.id, ?reason, "wayland client gone");
        self.compositor.disconnect(self.id);
    }
}

/// Handler trait for the wayland bindings
///
/// The supertraits are implemented by [`delegate_frontend!`](crate::delegate_frontend).
pub trait FrontendHandler:
    GlobalDispatch<WlCompositor, ()>
    + Dispatch<WlCompositor, ()>
    + Dispatch<WlSurface, SurfaceRef>
    + Dispatch<WlRegion, RegionData>
    + Dispatch<WlCallback, ()>
    + GlobalDispatch<XdgWmBase, ()>
    + Dispatch<XdgWmBase, ()>
    + Dispatch<XdgPositioner, PositionerRef>
    + Dispatch<XdgSurface, SurfaceRef>
    + Dispatch<XdgToplevel, SurfaceRef>
    + Dispatch<XdgPopup, SurfaceRef>
    + GlobalDispatch<ZxdgDecorationManagerV1, ()>
    + Dispatch<ZxdgDecorationManagerV1, ()>
    + Dispatch<ZxdgToplevelDecorationV1, SurfaceRef>
    + GlobalDispatch<ExtSessionLockManagerV1, ()>
    + Dispatch<ExtSessionLockManagerV1, ()>
    + Dispatch<ExtSessionLockV1, ()>
    + Dispatch<ExtSessionLockSurfaceV1, SurfaceRef>
    + GlobalDispatch<WlSeat, ()>
    + Dispatch<WlSeat, ()>
    + Dispatch<WlPointer, ()>
    + Dispatch<WlKeyboard, ()>
    + Dispatch<WlTouch, ()>
    + GlobalDispatch<WlDataDeviceManager, ()>
    + Dispatch<WlDataDeviceManager, ()>
    + Dispatch<WlDataSource, ()>
    + Dispatch<WlDataDevice, ()>
    + GlobalDispatch<WlOutput, OutputId>
    + Dispatch<WlOutput, OutputId>
    + 'static
{
    /// [`FrontendState`] getter
    fn frontend_state(&mut self) -> &mut FrontendState;

    /// Size of a buffer attached by a client
    fn buffer_size(&mut self, buffer: &WlBuffer) -> Size<i32, Buffer>;
}

#[derive(Debug, Default)]
struct SurfaceObjects {
    wl_surface: Option<WlSurface>,
    xdg_surface: Option<XdgSurface>,
    toplevel: Option<XdgToplevel>,
    popup: Option<XdgPopup>,
    decoration: Option<ZxdgToplevelDecorationV1>,
    lock_surface: Option<ExtSessionLockSurfaceV1>,
    pending_frames: Vec<WlCallback>,
    frames: Vec<WlCallback>,
}

impl SurfaceObjects {
    fn ids(&self) -> impl Iterator<Item = ObjectId> {
        [
            self.wl_surface.as_ref().map(Resource::id),
            self.xdg_surface.as_ref().map(Resource::id),
            self.toplevel.as_ref().map(Resource::id),
            self.popup.as_ref().map(Resource::id),
            self.decoration.as_ref().map(Resource::id),
            self.lock_surface.as_ref().map(Resource::id),
        ]
        .into_iter()
        .flatten()
    }

    fn forget(&mut self, id: &ObjectId) {
        fn clear<R: Resource>(slot: &mut Option<R>, id: &ObjectId) {
            if slot.as_ref().is_some_and(|r| &r.id() == id) {
                *slot = None;
            }
        }
        clear(&mut self.xdg_surface, id);
        clear(&mut self.toplevel, id);
        clear(&mut self.popup, id);
        clear(&mut self.decoration, id);
        clear(&mut self.lock_surface, id);
    }
}

/// State of the wayland bindings
#[derive(Debug)]
pub struct FrontendState {
    compositor: Compositor,
    display: DisplayHandle,
    surfaces: HashMap<SurfaceId, SurfaceObjects>,
    // per-client singletons protocol errors can be posted on
    client_objects: HashMap<ClientId, Vec<ObjectId>>,
    locks: HashMap<ClientId, ExtSessionLockV1>,
    outputs: HashMap<OutputId, GlobalId>,
}

impl FrontendState {
    /// Create the globals of the protocols handled by the [`Compositor`]
    ///
    /// `xdg_wm_base` is advertised with the version of the [`ShellConfig`](crate::config::ShellConfig).
    pub fn new<D: FrontendHandler>(display: &DisplayHandle, compositor: Compositor) -> FrontendState {
        let xdg_version = compositor
            .with_state(|state| state.config().xdg_version)
            .min(XdgWmBase::interface().version);
        debug!(xdg_version, "creating wayland globals");

        display.create_global::<D, WlCompositor, _>(WL_COMPOSITOR_VERSION, ());
        display.create_global::<D, XdgWmBase, _>(xdg_version, ());
        display.create_global::<D, ZxdgDecorationManagerV1, _>(DECORATION_MANAGER_VERSION, ());
        display.create_global::<D, ExtSessionLockManagerV1, _>(SESSION_LOCK_MANAGER_VERSION, ());
        display.create_global::<D, WlSeat, _>(WL_SEAT_VERSION, ());
        display.create_global::<D, WlDataDeviceManager, _>(WL_DATA_DEVICE_MANAGER_VERSION, ());

        let mut state = FrontendState {
            compositor,
            display: display.clone(),
            surfaces: HashMap::new(),
            client_objects: HashMap::new(),
            locks: HashMap::new(),
            outputs: HashMap::new(),
        };
        let outputs = state
            .compositor
            .with_state(|s| s.outputs().map(|o| o.id()).collect::<Vec<_>>());
        for output in outputs {
            state.advertise_output::<D>(output);
        }
        state
    }

    /// The compositor requests are forwarded to
    pub fn compositor(&self) -> &Compositor {
        &self.compositor
    }

    /// Register an output and advertise it as a `wl_output` global
    pub fn add_output<D: FrontendHandler>(
        &mut self,
        name: impl Into<String>,
        geometry: Rectangle<i32, Logical>,
    ) -> OutputId {
        let id = self.compositor.add_output(name, geometry);
        self.advertise_output::<D>(id);
        id
    }

    /// Remove an output and its global
    pub fn remove_output<D: FrontendHandler>(&mut self, id: OutputId) -> Result<(), ShellError> {
        self.compositor.remove_output(id)?;
        if let Some(global) = self.outputs.remove(&id) {
            self.display.remove_global::<D>(global);
        }
        Ok(())
    }

    fn advertise_output<D: FrontendHandler>(&mut self, id: OutputId) {
        let global = self
            .display
            .create_global::<D, WlOutput, _>(WL_OUTPUT_VERSION, id);
        self.outputs.insert(id, global);
    }

    /// Send the events the compositor queued for its clients
    ///
    /// Requests received through the bindings flush on their own, call this after acting on
    /// the [`Compositor`] directly.
    #[profiling::function]
    pub fn flush(&mut self) {
        for (client, events) in self.compositor.drain_all_client_events() {
            for event in events {
                self.send(client, event);
            }
        }
    }

    /// Fire the frame callbacks committed since the last call
    pub fn send_frames(&mut self, time: u32) {
        for objects in self.surfaces.values_mut() {
            for callback in objects.frames.drain(..) {
                callback.done(time);
            }
        }
    }

    /// Forward a request to the compositor, posting the protocol error it raises
    ///
    /// Returns whether the request was accepted.
    fn forward<R: Resource>(&mut self, client: &Client, resource: &R, owner: ClientId, request: Request) -> bool {
        let result = self.compositor.dispatch(owner, request);
        if let Err(err) = &result {
            self.post_error(client, resource, owner, err);
        }
        self.flush();
        result.is_ok()
    }

    fn post_error<R: Resource>(&self, client: &Client, resource: &R, owner: ClientId, err: &ProtocolError) {
        if R::interface().name == err.interface() {
            resource.post_error(err.code(), err.to_string());
            return;
        }
        // the error belongs to another object than the one the request was sent on
        let object_id = if err.interface() == WL_DISPLAY_INTERFACE.name {
            1
        } else {
            self.object_for(owner, err)
                .map(|id| id.protocol_id())
                .unwrap_or_else(|| resource.id().protocol_id())
        };
        debug!(client = %owner, object_id, interface = err.interface(), "posting protocol error");
        client.kill(
            &self.display,
            WireError {
                code: err.code(),
                object_id,
                object_interface: err.interface().into(),
                message: err.to_string(),
            },
        );
    }

    fn object_for(&self, owner: ClientId, err: &ProtocolError) -> Option<ObjectId> {
        let interface = err.interface();
        let surface_objects = err
            .surface()
            .and_then(|surface| self.surfaces.get(&surface))
            .into_iter()
            .flat_map(SurfaceObjects::ids);
        let client_objects = self.client_objects.get(&owner).into_iter().flatten().cloned();
        surface_objects
            .chain(client_objects)
            .find(|id| id.interface().name == interface)
    }

    fn objects(&mut self, surface: SurfaceId) -> &mut SurfaceObjects {
        self.surfaces.entry(surface).or_default()
    }

    fn add_client_object(&mut self, owner: ClientId, id: ObjectId) {
        self.client_objects.entry(owner).or_default().push(id);
    }

    fn forget_client_object(&mut self, id: &ObjectId) {
        for objects in self.client_objects.values_mut() {
            objects.retain(|o| o != id);
        }
        self.client_objects.retain(|_, objects| !objects.is_empty());
        self.locks.retain(|_, lock| &lock.id() != id);
    }

    fn forget_surface_object(&mut self, surface: SurfaceId, id: &ObjectId) {
        if let Some(objects) = self.surfaces.get_mut(&surface) {
            objects.forget(id);
        }
    }

    fn send(&mut self, client: ClientId, event: ClientEvent) {
        trace!(%client, ?event, "sending event");
        match event {
            ClientEvent::ToplevelConfigure {
                surface,
                serial,
                size,
                states,
            } => {
                let Some(objects) = self.surfaces.get(&surface) else {
                    return;
                };
                if let (Some(toplevel), Some(xdg_surface)) = (&objects.toplevel, &objects.xdg_surface) {
                    let size = size.unwrap_or_default();
                    toplevel.configure(size.w, size.h, wire_states(states));
                    xdg_surface.configure(u32::from(serial));
                }
            }
            ClientEvent::DecorationConfigure { surface, mode } => {
                if let Some(decoration) = self.surfaces.get(&surface).and_then(|o| o.decoration.as_ref()) {
                    decoration.configure(match mode {
                        DecorationMode::ClientSide => zxdg_toplevel_decoration_v1::Mode::ClientSide,
                        DecorationMode::ServerSide => zxdg_toplevel_decoration_v1::Mode::ServerSide,
                    });
                }
            }
            ClientEvent::PopupConfigure {
                surface,
                serial,
                geometry,
            } => {
                let Some(objects) = self.surfaces.get(&surface) else {
                    return;
                };
                if let (Some(popup), Some(xdg_surface)) = (&objects.popup, &objects.xdg_surface) {
                    popup.configure(geometry.loc.x, geometry.loc.y, geometry.size.w, geometry.size.h);
                    xdg_surface.configure(u32::from(serial));
                }
            }
            ClientEvent::Repositioned { surface, token } => {
                if let Some(popup) = self.surfaces.get(&surface).and_then(|o| o.popup.as_ref()) {
                    popup.repositioned(token);
                }
            }
            ClientEvent::PopupDone { surface } => {
                if let Some(popup) = self.surfaces.get(&surface).and_then(|o| o.popup.as_ref()) {
                    popup.popup_done();
                }
            }
            ClientEvent::Close { surface } => {
                if let Some(toplevel) = self.surfaces.get(&surface).and_then(|o| o.toplevel.as_ref()) {
                    toplevel.close();
                }
            }
            ClientEvent::LockSurfaceConfigure { surface, serial, size } => {
                if let Some(lock_surface) = self.surfaces.get(&surface).and_then(|o| o.lock_surface.as_ref()) {
                    lock_surface.configure(u32::from(serial), size.w.max(0) as u32, size.h.max(0) as u32);
                }
            }
            ClientEvent::Locked => {
                if let Some(lock) = self.locks.get(&client) {
                    lock.locked();
                }
            }
            ClientEvent::LockFinished => {
                if let Some(lock) = self.locks.get(&client) {
                    lock.finished();
                }
            }
            // already posted when the request failed
            ClientEvent::Error { .. } => {}
        }
    }
}

fn wire_states(states: ToplevelStates) -> Vec<u8> {
    let mapping = [
        (ToplevelStates::MAXIMIZED, xdg_toplevel::State::Maximized),
        (ToplevelStates::FULLSCREEN, xdg_toplevel::State::Fullscreen),
        (ToplevelStates::RESIZING, xdg_toplevel::State::Resizing),
        (ToplevelStates::ACTIVATED, xdg_toplevel::State::Activated),
        (ToplevelStates::TILED_LEFT, xdg_toplevel::State::TiledLeft),
        (ToplevelStates::TILED_RIGHT, xdg_toplevel::State::TiledRight),
        (ToplevelStates::TILED_TOP, xdg_toplevel::State::TiledTop),
        (ToplevelStates::TILED_BOTTOM, xdg_toplevel::State::TiledBottom),
    ];
    mapping
        .into_iter()
        .filter(|(flag, _)| states.contains(*flag))
        .flat_map(|(_, state)| (state as u32).to_ne_bytes())
        .collect()
}

/// The compositor-side identifier of a client
fn client_id(client: &Client) -> Option<ClientId> {
    client.get_data::<ClientState>().map(ClientState::id)
}

/// Refuse to create an object for a client the compositor does not know about
fn reject<I: Resource + 'static, D: 'static>(data_init: &mut DataInit<'_, D>, resource: New<I>) {
    debug!(interface = I::interface().name, "request from an unregistered client");
    data_init.post_error(resource, 0u32, "client is not registered with the compositor");
}

/// Implement the `wayland-server` dispatch traits of a [`FrontendHandler`]
#[macro_export]
macro_rules! delegate_frontend {
    ($ty: ty) => {
        $crate::reexports::wayland_server::delegate_global_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_compositor::WlCompositor: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_compositor::WlCompositor: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_surface::WlSurface: $crate::wayland::frontend::SurfaceRef
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_region::WlRegion: $crate::wayland::frontend::RegionData
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_callback::WlCallback: ()
        ] => $crate::wayland::frontend::FrontendState);

        $crate::reexports::wayland_server::delegate_global_dispatch!($ty: [
            $crate::reexports::wayland_protocols::xdg::shell::server::xdg_wm_base::XdgWmBase: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_protocols::xdg::shell::server::xdg_wm_base::XdgWmBase: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_protocols::xdg::shell::server::xdg_positioner::XdgPositioner: $crate::wayland::frontend::PositionerRef
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_protocols::xdg::shell::server::xdg_surface::XdgSurface: $crate::wayland::frontend::SurfaceRef
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_protocols::xdg::shell::server::xdg_toplevel::XdgToplevel: $crate::wayland::frontend::SurfaceRef
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_protocols::xdg::shell::server::xdg_popup::XdgPopup: $crate::wayland::frontend::SurfaceRef
        ] => $crate::wayland::frontend::FrontendState);

        $crate::reexports::wayland_server::delegate_global_dispatch!($ty: [
            $crate::reexports::wayland_protocols::xdg::decoration::zv1::server::zxdg_decoration_manager_v1::ZxdgDecorationManagerV1: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_protocols::xdg::decoration::zv1::server::zxdg_decoration_manager_v1::ZxdgDecorationManagerV1: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_protocols::xdg::decoration::zv1::server::zxdg_toplevel_decoration_v1::ZxdgToplevelDecorationV1: $crate::wayland::frontend::SurfaceRef
        ] => $crate::wayland::frontend::FrontendState);

        $crate::reexports::wayland_server::delegate_global_dispatch!($ty: [
            $crate::reexports::wayland_protocols::ext::session_lock::v1::server::ext_session_lock_manager_v1::ExtSessionLockManagerV1: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_protocols::ext::session_lock::v1::server::ext_session_lock_manager_v1::ExtSessionLockManagerV1: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_protocols::ext::session_lock::v1::server::ext_session_lock_v1::ExtSessionLockV1: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_protocols::ext::session_lock::v1::server::ext_session_lock_surface_v1::ExtSessionLockSurfaceV1: $crate::wayland::frontend::SurfaceRef
        ] => $crate::wayland::frontend::FrontendState);

        $crate::reexports::wayland_server::delegate_global_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_seat::WlSeat: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_seat::WlSeat: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_pointer::WlPointer: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_keyboard::WlKeyboard: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_touch::WlTouch: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_global_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_data_device_manager::WlDataDeviceManager: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_data_device_manager::WlDataDeviceManager: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_data_source::WlDataSource: ()
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_data_device::WlDataDevice: ()
        ] => $crate::wayland::frontend::FrontendState);

        $crate::reexports::wayland_server::delegate_global_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_output::WlOutput: $crate::utils::OutputId
        ] => $crate::wayland::frontend::FrontendState);
        $crate::reexports::wayland_server::delegate_dispatch!($ty: [
            $crate::reexports::wayland_server::protocol::wl_output::WlOutput: $crate::utils::OutputId
        ] => $crate::wayland::frontend::FrontendState);
    };
}
