use tracing::{debug, trace};

use super::{DecorationState, ToplevelState, ToplevelStates};
use crate::state::{Compositor, ShellError, ShellEvent, State};
use crate::utils::{Logical, OutputId, Rectangle, Serial, SurfaceId};
use crate::wayland::compositor::{self, PendingChanges};
use crate::wayland::protocol::{ClientEvent, ProtocolError};
use crate::wayland::shell::configure::ConfigureTracker;
use crate::wayland::shell::{self, RoleKind};

/// Role of an application window (`xdg_toplevel`)
#[derive(Debug)]
pub struct ToplevelRole {
    pub(crate) configure: ConfigureTracker<ToplevelState>,
    /// State the compositor last reacted to, see `configuration_changed`
    pub(crate) applied: ToplevelState,
    pub(crate) title: Option<String>,
    pub(crate) app_id: Option<String>,
    pub(crate) decoration: Option<DecorationState>,
    pub(crate) version: u32,
}

impl ToplevelRole {
    pub(crate) fn new(version: u32) -> ToplevelRole {
        ToplevelRole {
            configure: ConfigureTracker::default(),
            applied: ToplevelState::default(),
            title: None,
            app_id: None,
            decoration: None,
            version,
        }
    }

    /// The state of the last acknowledged configure
    pub fn current(&self) -> &ToplevelState {
        &self.configure.current
    }

    /// The configure negotiation of this toplevel
    pub fn configure_tracker(&self) -> &ConfigureTracker<ToplevelState> {
        &self.configure
    }

    /// Title set by the client
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Application id set by the client
    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    /// The decoration object of this toplevel, if the client created one
    pub fn decoration(&self) -> Option<&DecorationState> {
        self.decoration.as_ref()
    }

    /// `xdg_wm_base` version of the owning client
    pub fn version(&self) -> u32 {
        self.version
    }

    /// Whether the window is the activated one
    pub fn activated(&self) -> bool {
        self.current().states.contains(ToplevelStates::ACTIVATED)
    }

    /// Whether the window is maximized
    pub fn is_maximized(&self) -> bool {
        self.current().states.contains(ToplevelStates::MAXIMIZED)
    }

    /// Whether the window is fullscreen
    pub fn is_fullscreen(&self) -> bool {
        self.current().states.contains(ToplevelStates::FULLSCREEN)
    }

    /// Whether the window is being resized interactively
    pub fn is_resizing(&self) -> bool {
        self.current().states.contains(ToplevelStates::RESIZING)
    }

    #[profiling::function]
    pub(crate) fn commit_hook(state: &mut State, id: SurfaceId, dirty: PendingChanges) {
        let Some(surface) = state.surfaces.get(&id) else {
            return;
        };
        let has_buffer = surface.current().buffer_info().is_some();
        let was_mapped = surface.mapped;

        if was_mapped && !has_buffer {
            // a null buffer unmaps, the client has to start over with an initial commit
            super::dismiss_child_popups(state, id);
            shell::unmap(state, id);
            if let Some(toplevel) = state.toplevel_mut(id) {
                toplevel.configure.reset();
                toplevel.applied = ToplevelState::default();
                if let Some(decoration) = toplevel.decoration.as_mut() {
                    decoration.reset();
                }
            }
            return;
        }

        let Some((initial_sent, configured)) = state
            .toplevel(id)
            .map(|t| (t.configure.initial_configure_sent, t.configure.configured))
        else {
            return;
        };
        if !initial_sent {
            let initial_states = state.config.initial_toplevel_states;
            let default_mode = state.config.default_decoration_mode;
            if let Some(toplevel) = state.toplevel_mut(id) {
                let requested = toplevel.decoration.as_ref().map(|d| d.requested);
                toplevel.configure.with_pending_state(|s| {
                    s.states |= initial_states;
                    if let Some(requested) = requested {
                        s.decoration_mode = requested.unwrap_or(default_mode);
                    }
                });
            }
            send_configure(state, id, true);
            return;
        }

        let mut map_changed = false;
        if has_buffer && !was_mapped && configured {
            if let Some(surface) = state.surfaces.get_mut(&id) {
                surface.mapped = true;
            }
            debug!(surface = %id, "toplevel mapped");
            if state.stack.raise(id) {
                state.emit(ShellEvent::OrderChanged);
            }
            state.emit(ShellEvent::Mapped { surface: id });
            map_changed = true;
        }

        if map_changed || dirty.contains(PendingChanges::WINDOW_GEOMETRY) {
            compositor::geometry_changed(state, id);
            super::update_popup_positions(state, id);
        }

        if state.surfaces.get(&id).map(|s| s.mapped).unwrap_or(false) {
            configuration_changed(state, id);
        }
    }
}

/// React to the states the client adopted since the last commit
fn configuration_changed(state: &mut State, id: SurfaceId) {
    let Some(toplevel) = state.toplevel_mut(id) else {
        return;
    };
    let new = toplevel.configure.current.clone();
    if toplevel.applied == new {
        return;
    }
    let old = std::mem::replace(&mut toplevel.applied, new.clone());

    if old.states != new.states {
        trace!(surface = %id, old = ?old.states, new = ?new.states, "toplevel states changed");
        state.emit(ShellEvent::RoleStateChanged {
            surface: id,
            old: old.states,
            new: new.states,
        });
    }

    let gained = new.states.difference(old.states);
    if gained.contains(ToplevelStates::ACTIVATED) {
        state.seat.keyboard_focus = Some(id);
        state.emit(ShellEvent::KeyboardFocusRequested { surface: id });
    }
    if gained.contains(ToplevelStates::MAXIMIZED) {
        let output = state.outputs.current().map(|o| o.geometry());
        place_on_output(state, id, output, ToplevelStates::MAXIMIZED);
    }
    if gained.contains(ToplevelStates::FULLSCREEN) {
        let output = new
            .fullscreen_output
            .and_then(|o| state.outputs.get(o))
            .or_else(|| state.outputs.current())
            .map(|o| o.geometry());
        place_on_output(state, id, output, ToplevelStates::FULLSCREEN);
    }
}

/// Move a maximized or fullscreen window onto its output
///
/// Without an output, the state is taken back with a corrective configure.
fn place_on_output(
    state: &mut State,
    id: SurfaceId,
    output: Option<Rectangle<i32, Logical>>,
    flag: ToplevelStates,
) {
    match output {
        Some(output) => {
            super::raise_tree(state, id);
            let Some(surface) = state.surfaces.get_mut(&id) else {
                return;
            };
            surface.minimized = false;
            let position = output.loc - surface.window_geometry().loc;
            compositor::set_position(state, id, position);
        }
        None => {
            debug!(surface = %id, ?flag, "no output to place the toplevel on");
            if let Some(toplevel) = state.toplevel_mut(id) {
                toplevel.configure.with_pending_state(|s| {
                    s.states.remove(flag);
                    s.size = None;
                    if flag == ToplevelStates::FULLSCREEN {
                        s.fullscreen_output = None;
                    }
                });
            }
            send_toplevel_configure(state, id);
        }
    }
}

/// Send the pending state of a toplevel if it differs from what the client knows
///
/// Nothing is sent before the initial configure, which carries the pending state anyway.
pub(crate) fn send_toplevel_configure(state: &mut State, id: SurfaceId) -> Option<Serial> {
    if !state.toplevel(id)?.configure.initial_configure_sent {
        return None;
    }
    send_configure(state, id, false)
}

/// Send a configure, unconditionally if `force` is set
pub(crate) fn send_configure(state: &mut State, id: SurfaceId, force: bool) -> Option<Serial> {
    let surface = state.surfaces.get_mut(&id)?;
    let client = surface.client;
    let toplevel = surface.role.as_mut()?.as_toplevel_mut()?;
    let configure = if force {
        toplevel.configure.send(&state.serials)
    } else {
        toplevel.configure.send_pending(&state.serials)?
    };
    let version = toplevel.version;

    // the decoration mode goes first, the toplevel configure acts as its commit point.
    // A configure not carrying a new mode leaves the one in flight untouched.
    let mode = configure.state.decoration_mode;
    let decoration_event = toplevel.decoration.as_mut().and_then(|decoration| {
        if decoration.last_sent == Some(mode) {
            return None;
        }
        decoration.last_sent = Some(mode);
        decoration.pending = Some((mode, configure.serial));
        Some(ClientEvent::DecorationConfigure { surface: id, mode })
    });
    if let Some(event) = decoration_event {
        state.send_event(client, event);
    }

    trace!(surface = %id, serial = ?configure.serial, state = ?configure.state, "toplevel configure");
    state.send_event(
        client,
        ClientEvent::ToplevelConfigure {
            surface: id,
            serial: configure.serial,
            size: configure.state.size,
            states: configure.state.states.filtered_for_version(version),
        },
    );
    Some(configure.serial)
}

/// Handle `xdg_surface.ack_configure` for a toplevel
pub(crate) fn ack_configure(state: &mut State, id: SurfaceId, serial: Serial) -> Result<(), ProtocolError> {
    let toplevel = state.toplevel_mut(id).ok_or(ProtocolError::NotConstructed(id))?;
    toplevel
        .configure
        .ack(serial)
        .map_err(|_| ProtocolError::InvalidSerial(serial))?;
    trace!(surface = %id, ?serial, "toplevel configure acked");

    let changed = toplevel.decoration.as_mut().and_then(|d| d.ack(serial));
    if let Some(mode) = changed {
        debug!(surface = %id, ?mode, "decoration mode changed");
        state.emit(ShellEvent::DecorationModeChanged { surface: id, mode });
    }
    Ok(())
}

pub(crate) fn set_maximized(state: &mut State, id: SurfaceId) {
    let Some(size) = state.outputs.current().map(|o| o.size()) else {
        debug!(surface = %id, "ignoring maximize request without an output");
        return;
    };
    if let Some(toplevel) = state.toplevel_mut(id) {
        toplevel.configure.with_pending_state(|s| {
            s.size = Some(size);
            s.states.insert(ToplevelStates::ACTIVATED | ToplevelStates::MAXIMIZED);
        });
    }
    send_toplevel_configure(state, id);
}

pub(crate) fn unset_maximized(state: &mut State, id: SurfaceId) {
    unset_state(state, id, ToplevelStates::MAXIMIZED);
}

pub(crate) fn set_fullscreen(state: &mut State, id: SurfaceId, output: Option<OutputId>) {
    let output = output
        .and_then(|o| state.outputs.get(o))
        .or_else(|| state.outputs.current())
        .map(|o| (o.id(), o.size()));
    let Some((output, size)) = output else {
        debug!(surface = %id, "ignoring fullscreen request without an output");
        return;
    };
    if let Some(toplevel) = state.toplevel_mut(id) {
        toplevel.configure.with_pending_state(|s| {
            s.size = Some(size);
            s.states.insert(ToplevelStates::ACTIVATED | ToplevelStates::FULLSCREEN);
            s.fullscreen_output = Some(output);
        });
    }
    send_toplevel_configure(state, id);
}

pub(crate) fn unset_fullscreen(state: &mut State, id: SurfaceId) {
    unset_state(state, id, ToplevelStates::FULLSCREEN);
}

fn unset_state(state: &mut State, id: SurfaceId, flag: ToplevelStates) {
    if let Some(toplevel) = state.toplevel_mut(id) {
        toplevel.configure.with_pending_state(|s| {
            if s.states.contains(flag) {
                s.states.remove(flag);
                s.size = None;
                if flag == ToplevelStates::FULLSCREEN {
                    s.fullscreen_output = None;
                }
            }
        });
    }
    send_toplevel_configure(state, id);
}

/// Change the parent of a toplevel
pub(crate) fn set_parent(state: &mut State, id: SurfaceId, parent: Option<SurfaceId>) -> Result<(), ProtocolError> {
    if let Some(parent) = parent {
        let valid = state
            .surfaces
            .get(&parent)
            .map(|p| p.role_kind == Some(RoleKind::Toplevel) && p.role.is_some())
            .unwrap_or(false);
        if !valid || compositor::is_ancestor_or_self(&state.surfaces, id, parent) {
            return Err(ProtocolError::InvalidParent(id));
        }
    }

    let Some(surface) = state.surfaces.get_mut(&id) else {
        return Ok(());
    };
    let old = std::mem::replace(&mut surface.parent, parent);
    if old == parent {
        return Ok(());
    }
    if let Some(old) = old.and_then(|p| state.surfaces.get_mut(&p)) {
        old.children.retain(|c| *c != id);
    }
    if let Some(new) = parent.and_then(|p| state.surfaces.get_mut(&p)) {
        new.children.push(id);
    }
    state.emit(ShellEvent::ParentChanged { surface: id, parent });
    Ok(())
}

/// Unlink a toplevel whose role object went away from its parent and child toplevels
pub(crate) fn forget_toplevel(state: &mut State, id: SurfaceId) {
    let Some(surface) = state.surfaces.get(&id) else {
        return;
    };
    let children: Vec<SurfaceId> = surface
        .children
        .iter()
        .copied()
        .filter(|c| {
            state
                .surfaces
                .get(c)
                .map(|s| s.role_kind == Some(RoleKind::Toplevel))
                .unwrap_or(false)
        })
        .collect();
    let had_parent = surface.parent.is_some();

    for child in children {
        let _ = set_parent(state, child, None);
    }
    if had_parent {
        let _ = set_parent(state, id, None);
    }
}

impl Compositor {
    /// Change the state the next configure of a toplevel will carry
    ///
    /// Call [`Compositor::send_toplevel_configure`] afterwards to let the client know.
    pub fn with_toplevel_pending_state<F, T>(&self, id: SurfaceId, f: F) -> Result<T, ShellError>
    where
        F: FnOnce(&mut ToplevelState) -> T,
    {
        self.with_state_mut(|state| {
            let toplevel = state.toplevel_mut(id).ok_or(ShellError::NotAToplevel(id))?;
            Ok(toplevel.configure.with_pending_state(f))
        })
    }

    /// Send a configure to a toplevel if its pending state changed
    ///
    /// Returns the serial of the configure, if one was sent.
    pub fn send_toplevel_configure(&self, id: SurfaceId) -> Result<Option<Serial>, ShellError> {
        self.with_state_mut(|state| {
            state.toplevel(id).ok_or(ShellError::NotAToplevel(id))?;
            Ok(send_toplevel_configure(state, id))
        })
    }

    /// Ask a toplevel to close
    pub fn send_close(&self, id: SurfaceId) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            let client = state.surfaces.get(&id).ok_or(ShellError::UnknownSurface(id))?.client;
            state.toplevel(id).ok_or(ShellError::NotAToplevel(id))?;
            state.send_event(client, ClientEvent::Close { surface: id });
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ShellConfig;
    use crate::state::{Compositor, ShellEvent};
    use crate::utils::{ClientId, Point, Rectangle, Serial, SurfaceId};
    use crate::wayland::compositor::BufferInfo;
    use crate::wayland::protocol::{ClientEvent, Request, SurfaceRequest, ToplevelRequest, XdgSurfaceRequest};
    use crate::wayland::shell::xdg::ToplevelStates;
    use std::sync::{Arc, Mutex};

    fn toplevel(compositor: &Compositor, client: ClientId) -> SurfaceId {
        let surface = compositor.create_surface(client).unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::Create))
            .unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel))
            .unwrap();
        surface
    }

    fn commit(compositor: &Compositor, client: ClientId, surface: SurfaceId) {
        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Commit))
            .unwrap();
    }

    fn last_serial(events: &[ClientEvent]) -> Serial {
        events
            .iter()
            .rev()
            .find_map(|e| match e {
                ClientEvent::ToplevelConfigure { serial, .. } => Some(*serial),
                _ => None,
            })
            .unwrap()
    }

    fn map(compositor: &Compositor, client: ClientId, surface: SurfaceId) {
        commit(compositor, client, surface);
        let serial = last_serial(&compositor.drain_client_events(client));
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(serial)))
            .unwrap();
        let attach = SurfaceRequest::Attach(Some(BufferInfo { size: (200, 100).into() }));
        compositor.dispatch(client, Request::Surface(surface, attach)).unwrap();
        commit(compositor, client, surface);
    }

    #[test]
    fn initial_configure_is_sent_on_first_commit() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = toplevel(&compositor, client);
        assert!(compositor.drain_client_events(client).is_empty());

        commit(&compositor, client, surface);
        let events = compositor.drain_client_events(client);
        assert!(matches!(
            events.as_slice(),
            [ClientEvent::ToplevelConfigure { size: None, states, .. }] if *states == ToplevelStates::ACTIVATED
        ));
    }

    #[test]
    fn mapping_activates_and_focuses() {
        let compositor = Compositor::new(ShellConfig::default());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        compositor.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        let client = compositor.new_client(6);
        let surface = toplevel(&compositor, client);
        map(&compositor, client, surface);

        compositor.with_state(|state| {
            assert!(state.surface(surface).unwrap().is_mapped());
            assert_eq!(state.stack().top(), Some(surface));
            assert!(state.toplevel(surface).unwrap().activated());
            assert!(state.has_keyboard_focus(surface));
        });
        let events = events.lock().unwrap();
        assert!(events.contains(&ShellEvent::Mapped { surface }));
        assert!(events.contains(&ShellEvent::KeyboardFocusRequested { surface }));
        assert!(events.contains(&ShellEvent::RoleStateChanged {
            surface,
            old: ToplevelStates::empty(),
            new: ToplevelStates::ACTIVATED,
        }));
    }

    #[test]
    fn maximize_without_output_sends_nothing() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = toplevel(&compositor, client);
        map(&compositor, client, surface);
        compositor.drain_client_events(client);

        compositor
            .dispatch(client, Request::Toplevel(surface, ToplevelRequest::SetMaximized))
            .unwrap();
        assert!(compositor.drain_client_events(client).is_empty());
    }

    #[test]
    fn maximize_moves_to_the_output() {
        let compositor = Compositor::new(ShellConfig::default());
        compositor.add_output("DP-1", Rectangle::from((1920, 0, 1280, 720)));
        let client = compositor.new_client(6);
        let surface = toplevel(&compositor, client);
        map(&compositor, client, surface);
        compositor.drain_client_events(client);

        compositor
            .dispatch(client, Request::Toplevel(surface, ToplevelRequest::SetMaximized))
            .unwrap();
        let events = compositor.drain_client_events(client);
        assert!(matches!(
            events.as_slice(),
            [ClientEvent::ToplevelConfigure { size: Some(size), states, .. }]
                if *size == (1280, 720).into()
                    && *states == ToplevelStates::ACTIVATED | ToplevelStates::MAXIMIZED
        ));
        let serial = last_serial(&events);
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(serial)))
            .unwrap();
        commit(&compositor, client, surface);

        compositor.with_state(|state| {
            assert!(state.toplevel(surface).unwrap().is_maximized());
            assert_eq!(state.surface(surface).unwrap().position(), Point::from((1920, 0)));
        });
    }

    #[test]
    fn unmaximize_when_not_maximized_consumes_no_serial() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = toplevel(&compositor, client);
        map(&compositor, client, surface);
        compositor.drain_client_events(client);

        compositor
            .dispatch(client, Request::Toplevel(surface, ToplevelRequest::UnsetMaximized))
            .unwrap();
        assert!(compositor.drain_client_events(client).is_empty());
        compositor.with_state(|state| {
            assert!(state
                .toplevel(surface)
                .unwrap()
                .configure_tracker()
                .pending_configures()
                .is_empty());
        });
    }

    #[test]
    fn null_buffer_unmaps_and_restarts_negotiation() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = toplevel(&compositor, client);
        map(&compositor, client, surface);
        compositor.drain_client_events(client);

        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Attach(None)))
            .unwrap();
        commit(&compositor, client, surface);
        compositor.with_state(|state| {
            let data = state.surface(surface).unwrap();
            assert!(!data.is_mapped());
            assert!(!state.stack().contains(surface));
            assert!(!state.toplevel(surface).unwrap().configure_tracker().configured);
            assert!(!state.has_keyboard_focus(surface));
        });

        commit(&compositor, client, surface);
        assert_eq!(compositor.drain_client_events(client).len(), 1);
    }

    #[test]
    fn server_configure_and_close() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = toplevel(&compositor, client);
        map(&compositor, client, surface);
        compositor.drain_client_events(client);

        compositor
            .with_toplevel_pending_state(surface, |state| state.size = Some((640, 480).into()))
            .unwrap();
        let serial = compositor.send_toplevel_configure(surface).unwrap();
        assert!(serial.is_some());
        assert_eq!(compositor.send_toplevel_configure(surface).unwrap(), None);

        compositor.send_close(surface).unwrap();
        let events = compositor.drain_client_events(client);
        assert_eq!(events.len(), 2);
        assert_eq!(events[1], ClientEvent::Close { surface });
    }

    #[test]
    fn parent_cycles_are_rejected() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let a = toplevel(&compositor, client);
        let b = toplevel(&compositor, client);
        compositor
            .dispatch(client, Request::Toplevel(b, ToplevelRequest::SetParent(Some(a))))
            .unwrap();
        compositor.with_state(|state| assert_eq!(state.surface(b).unwrap().parent(), Some(a)));

        let result = compositor.dispatch(client, Request::Toplevel(a, ToplevelRequest::SetParent(Some(b))));
        assert!(result.is_err());
    }
}
