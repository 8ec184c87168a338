//! The compositor context
//!
//! All the state of the shell lives in a single [`State`], guarded by one process-wide lock.
//! The [`Compositor`] handle is the entry point of every operation: client requests go
//! through [`Compositor::dispatch`], and the server-side policy calls the methods defined
//! on it by the various modules of this crate. Each call takes the lock once, performs a
//! synchronous state transition and releases it.
//!
//! Renderers running on other threads read the state through a [`StateReader`], which takes
//! the same lock:
//!
//! ```
//! use trellis::{config::ShellConfig, state::Compositor};
//!
//! let compositor = Compositor::new(ShellConfig::default());
//! let reader = compositor.reader();
//! std::thread::spawn(move || {
//!     reader.with_state(|state| state.stack().len());
//! })
//! .join()
//! .unwrap();
//! ```
//!
//! State changes relevant to the rest of the compositor are published as [`ShellEvent`]s.
//! They are delivered to the closures registered with [`Compositor::subscribe`] once the
//! lock is released, in the order they were emitted, so subscribers are free to call back
//! into the [`Compositor`].

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use indexmap::IndexMap;
use tracing::{debug, info, instrument, trace_span, warn};

use crate::config::ShellConfig;
use crate::output::{Output, OutputMap};
use crate::utils::{
    Buffer, ClientId, IdAllocator, Logical, OutputId, Point, PositionerId, Rectangle, Serial, SerialCounter,
    SignalToken, Signaler, SurfaceId,
};
use crate::wayland::compositor::{self, Stack, SurfaceData};
use crate::wayland::protocol::{ClientEvent, ProtocolError, Request};
use crate::wayland::seat::SeatState;
use crate::wayland::session_lock::SessionLockState;
use crate::wayland::shell::xdg::{
    DecorationMode, PopupConfigureError, PopupRole, PositionerState, ResizeEdge, ToplevelRole, ToplevelStates,
};
use crate::wayland::shell::RoleKind;
use crate::wayland::{compositor::handlers as surface_handlers, seat, session_lock, shell::xdg};

/// Notifications about state changes, for the rendering, input and scene layers
#[derive(Debug, Clone, PartialEq)]
pub enum ShellEvent {
    /// A surface got the toplevel role
    NewToplevel {
        /// The surface
        surface: SurfaceId,
    },
    /// A surface got the popup role
    NewPopup {
        /// The surface
        surface: SurfaceId,
        /// Its parent
        parent: SurfaceId,
    },
    /// A surface became visible
    Mapped {
        /// The surface
        surface: SurfaceId,
    },
    /// A surface stopped being visible
    Unmapped {
        /// The surface
        surface: SurfaceId,
    },
    /// New contents were committed
    Damaged {
        /// The surface
        surface: SurfaceId,
        /// Damaged area, in buffer coordinates
        damage: Vec<Rectangle<i32, Buffer>>,
    },
    /// A mapped surface was damaged on these outputs
    OutputsDamaged {
        /// The surface
        surface: SurfaceId,
        /// Outputs to redraw
        outputs: Vec<OutputId>,
    },
    /// The window geometry or position of a mapped surface changed
    GeometryChanged {
        /// The surface
        surface: SurfaceId,
        /// Window geometry in the global space
        geometry: Rectangle<i32, Logical>,
    },
    /// The parent of a surface changed
    ParentChanged {
        /// The surface
        surface: SurfaceId,
        /// The new parent
        parent: Option<SurfaceId>,
    },
    /// The stacking order changed
    OrderChanged,
    /// The states of a toplevel changed after an acknowledged configure was committed
    RoleStateChanged {
        /// The toplevel
        surface: SurfaceId,
        /// States before
        old: ToplevelStates,
        /// States now
        new: ToplevelStates,
    },
    /// The client adopted a new decoration mode
    DecorationModeChanged {
        /// The toplevel
        surface: SurfaceId,
        /// The mode now in effect
        mode: DecorationMode,
    },
    /// A toplevel got activated and should receive the keyboard focus
    KeyboardFocusRequested {
        /// The toplevel
        surface: SurfaceId,
    },
    /// Focus held by a surface was dropped
    FocusCleared {
        /// The surface that had the focus
        surface: SurfaceId,
        /// Whether the pointer focus was dropped
        pointer: bool,
        /// Whether the keyboard focus was dropped
        keyboard: bool,
    },
    /// A toplevel started an interactive move
    MoveRequested {
        /// The toplevel
        surface: SurfaceId,
        /// Serial of the triggering input event
        serial: Serial,
    },
    /// A toplevel started an interactive resize
    ResizeRequested {
        /// The toplevel
        surface: SurfaceId,
        /// Serial of the triggering input event
        serial: Serial,
        /// Edges being dragged
        edges: ResizeEdge,
    },
    /// An interactive move or resize was cancelled
    InteractiveCancelled {
        /// The toplevel
        surface: SurfaceId,
    },
    /// A popup asked for an explicit grab
    PopupGrabRequested {
        /// The popup
        surface: SurfaceId,
        /// Serial of the triggering input event
        serial: Serial,
    },
    /// A popup was dismissed
    PopupDismissed {
        /// The popup
        surface: SurfaceId,
    },
    /// A toplevel got minimized
    Minimized {
        /// The toplevel
        surface: SurfaceId,
    },
    /// A toplevel asked for its window menu
    WindowMenuRequested {
        /// The toplevel
        surface: SurfaceId,
        /// Serial of the triggering input event
        serial: Serial,
        /// Location of the menu, surface-local
        location: Point<i32, Logical>,
    },
    /// A toplevel changed its title
    TitleChanged {
        /// The toplevel
        surface: SurfaceId,
        /// New title
        title: String,
    },
    /// A toplevel changed its application id
    AppIdChanged {
        /// The toplevel
        surface: SurfaceId,
        /// New application id
        app_id: String,
    },
    /// The cursor image changed
    CursorChanged {
        /// Surface to draw, `None` hiding the cursor
        surface: Option<SurfaceId>,
        /// Hotspot, surface-local
        hotspot: Point<i32, Logical>,
    },
    /// A drag and drop operation started
    DragStarted {
        /// Surface the drag started on
        origin: SurfaceId,
        /// The icon surface
        icon: Option<SurfaceId>,
    },
    /// The drag and drop operation ended
    DragEnded,
    /// A role object was destroyed
    RoleDestroyed {
        /// The surface
        surface: SurfaceId,
        /// Kind of the destroyed role
        role: RoleKind,
    },
    /// A surface was destroyed
    SurfaceDestroyed {
        /// The surface
        surface: SurfaceId,
    },
    /// The session got locked
    SessionLocked {
        /// The locking client
        client: ClientId,
    },
    /// The session got unlocked
    SessionUnlocked,
    /// A client was disconnected
    ClientDisconnected {
        /// The client
        client: ClientId,
    },
}

/// Errors of the server-side API
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShellError {
    /// The client does not exist or was disconnected
    #[error("unknown client {0}")]
    UnknownClient(ClientId),
    /// The surface does not exist
    #[error("unknown surface {0}")]
    UnknownSurface(SurfaceId),
    /// The output does not exist
    #[error("unknown output {0}")]
    UnknownOutput(OutputId),
    /// The surface is not a toplevel
    #[error("{0} is not a toplevel")]
    NotAToplevel(SurfaceId),
    /// The surface is not a popup
    #[error("{0} is not a popup")]
    NotAPopup(SurfaceId),
    /// The popup cannot be configured again
    #[error(transparent)]
    PopupConfigure(#[from] PopupConfigureError),
}

#[derive(Debug)]
pub(crate) struct ClientData {
    pub(crate) xdg_version: u32,
    pub(crate) events: VecDeque<ClientEvent>,
    pub(crate) alive: bool,
}

#[derive(Debug)]
pub(crate) struct PositionerData {
    pub(crate) client: ClientId,
    pub(crate) state: PositionerState,
}

/// The whole state of the shell
#[derive(Debug)]
pub struct State {
    pub(crate) config: ShellConfig,
    pub(crate) clients: IndexMap<ClientId, ClientData>,
    pub(crate) surfaces: IndexMap<SurfaceId, SurfaceData>,
    pub(crate) positioners: IndexMap<PositionerId, PositionerData>,
    pub(crate) stack: Stack,
    pub(crate) outputs: OutputMap,
    pub(crate) seat: SeatState,
    pub(crate) session_lock: SessionLockState,
    pub(crate) serials: SerialCounter,
    pub(crate) ids: IdAllocator,
    pub(crate) events: Vec<ShellEvent>,
}

impl State {
    fn new(config: ShellConfig) -> State {
        State {
            config,
            clients: IndexMap::new(),
            surfaces: IndexMap::new(),
            positioners: IndexMap::new(),
            stack: Stack::default(),
            outputs: OutputMap::default(),
            seat: SeatState::default(),
            session_lock: SessionLockState::default(),
            serials: SerialCounter::new(),
            ids: IdAllocator::default(),
            events: Vec::new(),
        }
    }

    /// The configuration the compositor was created with
    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    /// Access a surface
    pub fn surface(&self, id: SurfaceId) -> Option<&SurfaceData> {
        self.surfaces.get(&id)
    }

    /// Iterate over every surface, in creation order
    pub fn surfaces(&self) -> impl Iterator<Item = &SurfaceData> {
        self.surfaces.values()
    }

    /// Access the toplevel role of a surface
    pub fn toplevel(&self, id: SurfaceId) -> Option<&ToplevelRole> {
        self.surfaces.get(&id)?.role.as_ref()?.as_toplevel()
    }

    /// Access the popup role of a surface
    pub fn popup(&self, id: SurfaceId) -> Option<&PopupRole> {
        self.surfaces.get(&id)?.role.as_ref()?.as_popup()
    }

    pub(crate) fn toplevel_mut(&mut self, id: SurfaceId) -> Option<&mut ToplevelRole> {
        self.surfaces.get_mut(&id)?.role.as_mut()?.as_toplevel_mut()
    }

    pub(crate) fn popup_mut(&mut self, id: SurfaceId) -> Option<&mut PopupRole> {
        self.surfaces.get_mut(&id)?.role.as_mut()?.as_popup_mut()
    }

    /// Mapped surfaces, back to front
    pub fn stack(&self) -> &Stack {
        &self.stack
    }

    /// Every known output
    pub fn outputs(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter()
    }

    /// The output maximize and fullscreen requests go to by default
    pub fn current_output(&self) -> Option<&Output> {
        self.outputs.current()
    }

    /// The surface holding the pointer focus
    pub fn pointer_focus(&self) -> Option<SurfaceId> {
        self.seat.pointer_focus
    }

    /// The surface holding the keyboard focus
    pub fn keyboard_focus(&self) -> Option<SurfaceId> {
        self.seat.keyboard_focus
    }

    /// Whether the surface holds the pointer focus
    pub fn has_pointer_focus(&self, id: SurfaceId) -> bool {
        self.seat.pointer_focus == Some(id)
    }

    /// Whether the surface holds the keyboard focus
    pub fn has_keyboard_focus(&self, id: SurfaceId) -> bool {
        self.seat.keyboard_focus == Some(id)
    }

    /// The surface currently used as cursor image
    pub fn cursor(&self) -> Option<SurfaceId> {
        self.seat.cursor
    }

    /// The seat state: focus, cursor, drag and interactive sessions
    pub fn seat(&self) -> &SeatState {
        &self.seat
    }

    /// Whether the session is locked
    pub fn is_locked(&self) -> bool {
        self.session_lock.is_locked()
    }

    /// The session lock state
    pub fn session_lock(&self) -> &SessionLockState {
        &self.session_lock
    }

    /// Whether the popup has no mapped popup above it
    pub fn is_topmost_popup(&self, id: SurfaceId) -> bool {
        xdg::is_topmost_popup(self, id)
    }

    /// `xdg_wm_base` version bound by a client
    pub(crate) fn xdg_version(&self, client: ClientId) -> u32 {
        self.clients.get(&client).map(|c| c.xdg_version).unwrap_or(1)
    }

    pub(crate) fn emit(&mut self, event: ShellEvent) {
        self.events.push(event);
    }

    pub(crate) fn send_event(&mut self, client: ClientId, event: ClientEvent) {
        if let Some(data) = self.clients.get_mut(&client).filter(|c| c.alive) {
            data.events.push_back(event);
        }
    }

    /// Look up a surface on behalf of a client
    pub(crate) fn client_surface(&self, client: ClientId, id: SurfaceId) -> Result<&SurfaceData, ProtocolError> {
        self.surfaces
            .get(&id)
            .filter(|s| s.client == client)
            .ok_or_else(|| ProtocolError::InvalidObject(id.to_string()))
    }

    pub(crate) fn client_surface_mut(
        &mut self,
        client: ClientId,
        id: SurfaceId,
    ) -> Result<&mut SurfaceData, ProtocolError> {
        self.surfaces
            .get_mut(&id)
            .filter(|s| s.client == client)
            .ok_or_else(|| ProtocolError::InvalidObject(id.to_string()))
    }

    pub(crate) fn client_positioner(
        &self,
        client: ClientId,
        id: PositionerId,
    ) -> Result<PositionerState, ProtocolError> {
        self.positioners
            .get(&id)
            .filter(|p| p.client == client)
            .map(|p| p.state)
            .ok_or_else(|| ProtocolError::InvalidObject(id.to_string()))
    }

    fn dispatch(&mut self, client: ClientId, request: Request) -> Result<(), ProtocolError> {
        if !self.clients.get(&client).map(|c| c.alive).unwrap_or(false) {
            debug!(%client, ?request, "ignoring request of a disconnected client");
            return Ok(());
        }

        let span = trace_span!("request", %client);
        let _guard = span.enter();
        let result = match request {
            Request::Surface(id, request) => surface_handlers::surface_request(self, client, id, request),
            Request::XdgSurface(id, request) => xdg::handlers::xdg_surface_request(self, client, id, request),
            Request::Toplevel(id, request) => xdg::handlers::toplevel_request(self, client, id, request),
            Request::Popup(id, request) => xdg::handlers::popup_request(self, client, id, request),
            Request::Positioner(id, request) => xdg::handlers::positioner_request(self, client, id, request),
            Request::Decoration(id, request) => xdg::handlers::decoration_request(self, client, id, request),
            Request::Pointer(request) => seat::handlers::pointer_request(self, client, request),
            Request::DataDevice(request) => seat::handlers::data_device_request(self, client, request),
            Request::SessionLock(request) => session_lock::lock_request(self, client, request),
        };

        if let Err(err) = &result {
            warn!(%client, error = %err, "protocol error, disconnecting client");
            self.send_event(
                client,
                ClientEvent::Error {
                    interface: err.interface(),
                    code: err.code(),
                    message: err.to_string(),
                },
            );
            self.kill_client(client);
        }
        result
    }

    fn kill_client(&mut self, client: ClientId) {
        compositor::destroy_client_resources(self, client);
        if let Some(data) = self.clients.get_mut(&client) {
            data.alive = false;
        }
        self.emit(ShellEvent::ClientDisconnected { client });
    }
}

/// Read-only access to the state from other threads
#[derive(Debug, Clone)]
pub struct StateReader {
    state: Arc<Mutex<State>>,
}

impl StateReader {
    /// Access the state while holding the lock
    pub fn with_state<T, F: FnOnce(&State) -> T>(&self, f: F) -> T {
        f(&lock_state(&self.state))
    }
}

// A panic while the lock was held leaves the state usable, keep serving other clients with it
fn lock_state(state: &Mutex<State>) -> MutexGuard<'_, State> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Handle to the compositor state
///
/// Cloning it gives another handle to the same state.
#[derive(Debug, Clone)]
pub struct Compositor {
    state: Arc<Mutex<State>>,
    signaler: Signaler<ShellEvent>,
}

impl Compositor {
    /// Create a new compositor
    pub fn new(config: ShellConfig) -> Compositor {
        info!(xdg_version = config.xdg_version, "creating compositor state");
        Compositor {
            state: Arc::new(Mutex::new(State::new(config))),
            signaler: Signaler::new(),
        }
    }

    /// Run `f` with exclusive access to the state, then deliver the notifications it emitted
    pub(crate) fn with_state_mut<T, F: FnOnce(&mut State) -> T>(&self, f: F) -> T {
        let (ret, events) = {
            let mut state = lock_state(&self.state);
            let ret = f(&mut state);
            (ret, std::mem::take(&mut state.events))
        };
        for event in &events {
            self.signaler.signal(event);
        }
        ret
    }

    /// Access the state while holding the lock
    pub fn with_state<T, F: FnOnce(&State) -> T>(&self, f: F) -> T {
        f(&lock_state(&self.state))
    }

    /// A handle for read-only access from other threads
    pub fn reader(&self) -> StateReader {
        StateReader {
            state: self.state.clone(),
        }
    }

    /// Register a closure receiving every [`ShellEvent`]
    pub fn subscribe<F: FnMut(&ShellEvent) + Send + 'static>(&self, f: F) -> SignalToken {
        self.signaler.register(f)
    }

    /// Remove a subscription
    pub fn unsubscribe(&self, token: SignalToken) {
        self.signaler.unregister(token);
    }

    /// Register a new client, which bound `xdg_wm_base` with the given version
    pub fn new_client(&self, xdg_version: u32) -> ClientId {
        self.with_state_mut(|state| {
            let id: ClientId = state.ids.next();
            let xdg_version = xdg_version.clamp(1, state.config.xdg_version);
            debug!(client = %id, xdg_version, "new client");
            state.clients.insert(
                id,
                ClientData {
                    xdg_version,
                    events: VecDeque::new(),
                    alive: true,
                },
            );
            id
        })
    }

    /// Record the version a client bound `xdg_wm_base` with
    pub(crate) fn set_xdg_version(&self, client: ClientId, version: u32) {
        self.with_state_mut(|state| {
            let max = state.config.xdg_version;
            if let Some(data) = state.clients.get_mut(&client) {
                data.xdg_version = version.clamp(1, max);
            }
        })
    }

    /// Create a surface for a client (`wl_compositor.create_surface`)
    pub fn create_surface(&self, client: ClientId) -> Result<SurfaceId, ShellError> {
        self.with_state_mut(|state| {
            if !state.clients.get(&client).map(|c| c.alive).unwrap_or(false) {
                return Err(ShellError::UnknownClient(client));
            }
            let id: SurfaceId = state.ids.next();
            state.surfaces.insert(id, SurfaceData::new(id, client));
            Ok(id)
        })
    }

    /// Create a positioner for a client (`xdg_wm_base.create_positioner`)
    pub fn create_positioner(&self, client: ClientId) -> Result<PositionerId, ShellError> {
        self.with_state_mut(|state| {
            if !state.clients.get(&client).map(|c| c.alive).unwrap_or(false) {
                return Err(ShellError::UnknownClient(client));
            }
            let id: PositionerId = state.ids.next();
            state.positioners.insert(
                id,
                PositionerData {
                    client,
                    state: PositionerState::default(),
                },
            );
            Ok(id)
        })
    }

    /// Process a request of a client
    ///
    /// A protocol error disconnects the client: all its resources are destroyed and an
    /// [`ClientEvent::Error`] is queued for it. Requests of disconnected clients are ignored.
    #[instrument(level = "trace", skip(self))]
    pub fn dispatch(&self, client: ClientId, request: Request) -> Result<(), ProtocolError> {
        self.with_state_mut(|state| state.dispatch(client, request))
    }

    /// A client went away
    pub fn disconnect(&self, client: ClientId) {
        self.with_state_mut(|state| {
            if state.clients.get(&client).map(|c| c.alive).unwrap_or(false) {
                debug!(%client, "client disconnected");
                state.kill_client(client);
            }
            state.clients.shift_remove(&client);
        })
    }

    /// Take the events queued for a client, oldest first
    pub fn drain_client_events(&self, client: ClientId) -> Vec<ClientEvent> {
        self.with_state_mut(|state| {
            state
                .clients
                .get_mut(&client)
                .map(|c| c.events.drain(..).collect())
                .unwrap_or_default()
        })
    }

    /// Take the events queued for every client
    pub(crate) fn drain_all_client_events(&self) -> Vec<(ClientId, Vec<ClientEvent>)> {
        self.with_state_mut(|state| {
            state
                .clients
                .iter_mut()
                .filter(|(_, c)| !c.events.is_empty())
                .map(|(id, c)| (*id, c.events.drain(..).collect()))
                .collect()
        })
    }

    /// Register an output
    pub fn add_output(&self, name: impl Into<String>, geometry: Rectangle<i32, Logical>) -> OutputId {
        self.with_state_mut(|state| {
            let id: OutputId = state.ids.next();
            let name = name.into();
            info!(output = %id, %name, ?geometry, "output added");
            state.outputs.add(Output::new(id, name, geometry));
            id
        })
    }

    /// Move or resize an output
    pub fn set_output_geometry(&self, id: OutputId, geometry: Rectangle<i32, Logical>) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            if !state.outputs.set_geometry(id, geometry) {
                return Err(ShellError::UnknownOutput(id));
            }
            session_lock::output_changed(state, id);
            Ok(())
        })
    }

    /// Remove an output
    pub fn remove_output(&self, id: OutputId) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            state.outputs.remove(id).ok_or(ShellError::UnknownOutput(id))?;
            info!(output = %id, "output removed");
            Ok(())
        })
    }

    /// Set the output maximize and fullscreen requests go to by default
    pub fn set_current_output(&self, id: Option<OutputId>) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            if let Some(id) = id {
                state.outputs.get(id).ok_or(ShellError::UnknownOutput(id))?;
            }
            state.outputs.set_current(id);
            Ok(())
        })
    }

    /// Move a surface in the global space
    ///
    /// Its popups follow it, reactive ones being re-constrained.
    pub fn set_position(&self, id: SurfaceId, position: Point<i32, Logical>) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            state.surfaces.get(&id).ok_or(ShellError::UnknownSurface(id))?;
            compositor::set_position(state, id, position);
            Ok(())
        })
    }

    /// Raise a mapped surface and its popups on top of the stack
    pub fn raise(&self, id: SurfaceId) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            state.surfaces.get(&id).ok_or(ShellError::UnknownSurface(id))?;
            xdg::raise_tree(state, id);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notifications_are_delivered_after_the_lock_is_released() {
        let compositor = Compositor::new(ShellConfig::default());
        let inner = compositor.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        compositor.subscribe(move |event| {
            // calling back into the compositor must not deadlock
            let outputs = inner.with_state(|state| state.outputs().count());
            seen2.lock().unwrap().push((event.clone(), outputs));
        });

        let client = compositor.new_client(6);
        compositor.disconnect(client);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![(ShellEvent::ClientDisconnected { client }, 0)]
        );
    }

    #[test]
    fn xdg_version_is_capped() {
        let compositor = Compositor::new(ShellConfig::default().with_xdg_version(2));
        let client = compositor.new_client(6);
        assert_eq!(compositor.with_state(|state| state.xdg_version(client)), 2);
    }

    #[test]
    fn unknown_client() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(1);
        compositor.disconnect(client);
        assert_eq!(
            compositor.create_surface(client),
            Err(ShellError::UnknownClient(client))
        );
    }

    #[test]
    fn subscribers_can_change_state() {
        let compositor = Compositor::new(ShellConfig::default());
        let inner = compositor.clone();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen2 = seen.clone();
        compositor.subscribe(move |event| {
            if let ShellEvent::ClientDisconnected { .. } = event {
                let client = inner.new_client(6);
                seen2.lock().unwrap().push(client);
            }
        });

        let client = compositor.new_client(6);
        compositor.disconnect(client);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn panic_under_the_lock_leaves_the_state_usable() {
        let compositor = Compositor::new(ShellConfig::default());
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            compositor.with_state_mut(|_| panic!("handler failure"))
        }));
        assert!(result.is_err());

        let client = compositor.new_client(6);
        assert!(compositor.create_surface(client).is_ok());
        assert_eq!(compositor.reader().with_state(|state| state.xdg_version(client)), 6);
    }
}
