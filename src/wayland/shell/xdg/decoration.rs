//! XDG window decorations (`zxdg_toplevel_decoration_v1`)
//!
//! A client creating a decoration object for its toplevel lets the compositor decide who
//! draws the window decorations. The client may express a preference with `set_mode`,
//! which the compositor answers with a decoration configure followed by a toplevel
//! configure. The new mode is in effect once that configure is acknowledged.
//!
//! Toplevels without a decoration object always draw their own decorations.
//!
//! ```
//! use trellis::{config::ShellConfig, state::Compositor};
//! use trellis::wayland::shell::xdg::DecorationMode;
//!
//! // Suggest server-side decorations to every client that asks
//! let compositor = Compositor::new(
//!     ShellConfig::default().with_default_decoration_mode(DecorationMode::ServerSide),
//! );
//! # let _ = compositor;
//! ```

use tracing::debug;

use super::DecorationMode;
use crate::state::{Compositor, ShellError, State};
use crate::utils::{ClientId, Serial, SurfaceId};
use crate::wayland::protocol::{DecorationRequest, ProtocolError};

/// Decoration negotiation of a toplevel
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecorationState {
    pub(crate) requested: Option<DecorationMode>,
    pub(crate) mode: DecorationMode,
    pub(crate) pending: Option<(DecorationMode, Serial)>,
    pub(crate) last_sent: Option<DecorationMode>,
}

impl DecorationState {
    /// The mode the client asked for, `None` leaving the choice to the compositor
    pub fn requested(&self) -> Option<DecorationMode> {
        self.requested
    }

    /// The mode currently in effect
    pub fn mode(&self) -> DecorationMode {
        self.mode
    }

    /// The mode sent to the client and not acknowledged yet
    pub fn pending(&self) -> Option<DecorationMode> {
        self.pending.map(|(mode, _)| mode)
    }

    pub(crate) fn reset(&mut self) {
        self.pending = None;
        self.last_sent = None;
    }

    /// Promote the pending mode if `serial` covers its configure
    ///
    /// Returns the new mode if it changed.
    pub(crate) fn ack(&mut self, serial: Serial) -> Option<DecorationMode> {
        let (mode, sent) = self.pending?;
        if !serial.is_no_older_than(&sent) {
            return None;
        }
        self.pending = None;
        if self.mode == mode {
            return None;
        }
        self.mode = mode;
        Some(mode)
    }
}

pub(crate) fn decoration_request(
    state: &mut State,
    client: ClientId,
    id: SurfaceId,
    request: DecorationRequest,
) -> Result<(), ProtocolError> {
    let surface = state.client_surface(client, id)?;
    let has_buffer = surface.current().buffer_info().is_some();
    let toplevel = surface
        .role()
        .and_then(|r| r.as_toplevel())
        .ok_or_else(|| ProtocolError::InvalidObject(format!("xdg_toplevel for {}", id)))?;
    let exists = toplevel.decoration.is_some();

    match request {
        DecorationRequest::Create => {
            if exists {
                return Err(ProtocolError::DecorationAlreadyConstructed(id));
            }
            if has_buffer {
                return Err(ProtocolError::DecorationUnconfiguredBuffer(id));
            }
            debug!(surface = %id, "new toplevel decoration");
            if let Some(toplevel) = state.toplevel_mut(id) {
                toplevel.decoration = Some(DecorationState::default());
            }
            // the mode is announced by the initial configure, or right away if it went out already
            request_mode(state, id, None);
        }
        DecorationRequest::SetMode(mode) => {
            if !exists {
                return Err(ProtocolError::InvalidObject(format!("decoration of {}", id)));
            }
            request_mode(state, id, Some(mode));
        }
        DecorationRequest::UnsetMode => {
            if !exists {
                return Err(ProtocolError::InvalidObject(format!("decoration of {}", id)));
            }
            request_mode(state, id, None);
        }
        DecorationRequest::Destroy => {
            if let Some(toplevel) = state.toplevel_mut(id) {
                toplevel.decoration = None;
            }
        }
    }
    Ok(())
}

/// Record the mode preferred by the client and answer with a configure
fn request_mode(state: &mut State, id: SurfaceId, requested: Option<DecorationMode>) {
    let default_mode = state.config.default_decoration_mode;
    let Some(toplevel) = state.toplevel_mut(id) else {
        return;
    };
    let Some(decoration) = toplevel.decoration.as_mut() else {
        return;
    };
    decoration.requested = requested;
    decoration.last_sent = None;
    let mode = requested.unwrap_or(default_mode);
    toplevel.configure.with_pending_state(|s| s.decoration_mode = mode);
    // a decoration configure always needs an answer, even if nothing changed
    if toplevel.configure.initial_configure_sent {
        super::toplevel::send_configure(state, id, true);
    }
}

impl Compositor {
    /// Impose a decoration mode on a toplevel
    ///
    /// The mode is sent right away if the toplevel got its initial configure.
    pub fn set_decoration_mode(&self, id: SurfaceId, mode: DecorationMode) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            let toplevel = state.toplevel_mut(id).ok_or(ShellError::NotAToplevel(id))?;
            toplevel.configure.with_pending_state(|s| s.decoration_mode = mode);
            if toplevel.decoration.is_some() && toplevel.configure.initial_configure_sent {
                super::toplevel::send_configure(state, id, true);
            }
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ShellConfig;
    use crate::state::ShellEvent;
    use crate::wayland::protocol::{ClientEvent, Request, SurfaceRequest, ToplevelRequest, XdgSurfaceRequest};
    use std::sync::{Arc, Mutex};

    fn setup(config: ShellConfig) -> (Compositor, ClientId, SurfaceId) {
        let compositor = Compositor::new(config);
        let client = compositor.new_client(6);
        let surface = compositor.create_surface(client).unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::Create))
            .unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel))
            .unwrap();
        (compositor, client, surface)
    }

    #[test]
    fn mode_is_adopted_on_ack() {
        let (compositor, client, surface) =
            setup(ShellConfig::default().with_default_decoration_mode(DecorationMode::ServerSide));
        let changes = Arc::new(Mutex::new(Vec::new()));
        let sink = changes.clone();
        compositor.subscribe(move |e| {
            if let ShellEvent::DecorationModeChanged { mode, .. } = e {
                sink.lock().unwrap().push(*mode);
            }
        });

        compositor
            .dispatch(client, Request::Decoration(surface, DecorationRequest::Create))
            .unwrap();
        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Commit))
            .unwrap();

        let events = compositor.drain_client_events(client);
        let serial = match events.as_slice() {
            [ClientEvent::DecorationConfigure {
                mode: DecorationMode::ServerSide,
                ..
            }, ClientEvent::ToplevelConfigure { serial, .. }] => *serial,
            other => panic!("unexpected events {:?}", other),
        };
        compositor.with_state(|state| {
            let decoration = state.toplevel(surface).unwrap().decoration().unwrap();
            assert_eq!(decoration.mode(), DecorationMode::ClientSide);
            assert_eq!(decoration.pending(), Some(DecorationMode::ServerSide));
        });

        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(serial)))
            .unwrap();
        compositor.with_state(|state| {
            let decoration = state.toplevel(surface).unwrap().decoration().unwrap();
            assert_eq!(decoration.mode(), DecorationMode::ServerSide);
        });
        assert_eq!(*changes.lock().unwrap(), vec![DecorationMode::ServerSide]);
    }

    #[test]
    fn set_mode_after_initial_configure_sends_right_away() {
        let (compositor, client, surface) = setup(ShellConfig::default());
        compositor
            .dispatch(client, Request::Decoration(surface, DecorationRequest::Create))
            .unwrap();
        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Commit))
            .unwrap();
        compositor.drain_client_events(client);

        compositor
            .dispatch(
                client,
                Request::Decoration(surface, DecorationRequest::SetMode(DecorationMode::ServerSide)),
            )
            .unwrap();
        let events = compositor.drain_client_events(client);
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            ClientEvent::DecorationConfigure {
                mode: DecorationMode::ServerSide,
                ..
            }
        ));
    }

    #[test]
    fn later_configure_keeps_the_mode_in_flight() {
        let (compositor, client, surface) = setup(ShellConfig::default());
        let output = compositor.add_output("test", crate::utils::Rectangle::from((0, 0, 800, 600)));
        compositor.set_current_output(Some(output)).unwrap();
        compositor
            .dispatch(client, Request::Decoration(surface, DecorationRequest::Create))
            .unwrap();
        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Commit))
            .unwrap();
        compositor.drain_client_events(client);

        compositor
            .dispatch(
                client,
                Request::Decoration(surface, DecorationRequest::SetMode(DecorationMode::ServerSide)),
            )
            .unwrap();
        let first = match compositor.drain_client_events(client).as_slice() {
            [ClientEvent::DecorationConfigure { .. }, ClientEvent::ToplevelConfigure { serial, .. }] => *serial,
            other => panic!("unexpected events {:?}", other),
        };

        compositor
            .dispatch(client, Request::Toplevel(surface, ToplevelRequest::SetMaximized))
            .unwrap();
        let events = compositor.drain_client_events(client);
        assert!(matches!(events.as_slice(), [ClientEvent::ToplevelConfigure { .. }]));

        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(first)))
            .unwrap();
        compositor.with_state(|state| {
            let decoration = state.toplevel(surface).unwrap().decoration().unwrap();
            assert_eq!(decoration.mode(), DecorationMode::ServerSide);
            assert_eq!(decoration.pending(), None);
        });
    }

    #[test]
    fn second_decoration_is_an_error() {
        let (compositor, client, surface) = setup(ShellConfig::default());
        compositor
            .dispatch(client, Request::Decoration(surface, DecorationRequest::Create))
            .unwrap();
        let result = compositor.dispatch(client, Request::Decoration(surface, DecorationRequest::Create));
        assert_eq!(result, Err(ProtocolError::DecorationAlreadyConstructed(surface)));
    }

    #[test]
    fn older_serials_do_not_promote() {
        let mut decoration = DecorationState {
            pending: Some((DecorationMode::ServerSide, Serial::from(10))),
            ..Default::default()
        };
        assert_eq!(decoration.ack(Serial::from(9)), None);
        assert_eq!(decoration.ack(Serial::from(10)), Some(DecorationMode::ServerSide));
        assert_eq!(decoration.pending(), None);
    }
}
