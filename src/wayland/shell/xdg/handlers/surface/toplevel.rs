use tracing::trace;

use crate::state::{ShellEvent, State};
use crate::utils::{ClientId, SurfaceId};
use crate::wayland::compositor::PendingChanges;
use crate::wayland::protocol::{ProtocolError, ToplevelRequest};
use crate::wayland::seat::{self, InteractiveKind};
use crate::wayland::shell::{self, xdg::toplevel};

pub(crate) fn toplevel_request(
    state: &mut State,
    client: ClientId,
    id: SurfaceId,
    request: ToplevelRequest,
) -> Result<(), ProtocolError> {
    let role = state
        .client_surface(client, id)?
        .role()
        .and_then(|r| r.as_toplevel())
        .ok_or_else(|| ProtocolError::InvalidObject(format!("xdg_toplevel for {}", id)))?;
    let has_decoration = role.decoration.is_some();
    trace!(surface = %id, ?request, "xdg_toplevel request");

    match request {
        ToplevelRequest::SetParent(parent) => {
            if let Some(parent) = parent {
                state.client_surface(client, parent)?;
            }
            // not double buffered
            toplevel::set_parent(state, id, parent)?;
        }
        ToplevelRequest::SetTitle(title) => {
            if let Some(role) = state.toplevel_mut(id) {
                role.title = Some(title.clone());
            }
            state.emit(ShellEvent::TitleChanged { surface: id, title });
        }
        ToplevelRequest::SetAppId(app_id) => {
            if let Some(role) = state.toplevel_mut(id) {
                role.app_id = Some(app_id.clone());
            }
            state.emit(ShellEvent::AppIdChanged { surface: id, app_id });
        }
        ToplevelRequest::ShowWindowMenu { serial, location } => {
            state.emit(ShellEvent::WindowMenuRequested {
                surface: id,
                serial,
                location,
            });
        }
        ToplevelRequest::Move { serial } => {
            seat::start_interactive(state, id, serial, InteractiveKind::Move);
        }
        ToplevelRequest::Resize { serial, edges } => {
            seat::start_interactive(state, id, serial, InteractiveKind::Resize(edges));
        }
        ToplevelRequest::SetMaxSize(size) => {
            if size.w < 0 || size.h < 0 {
                return Err(ProtocolError::InvalidSize(id));
            }
            let surface = state.client_surface_mut(client, id)?;
            surface.cached.pending_mut().max_size = size;
            surface.dirty |= PendingChanges::MAX_SIZE;
        }
        ToplevelRequest::SetMinSize(size) => {
            if size.w < 0 || size.h < 0 {
                return Err(ProtocolError::InvalidSize(id));
            }
            let surface = state.client_surface_mut(client, id)?;
            surface.cached.pending_mut().min_size = size;
            surface.dirty |= PendingChanges::MIN_SIZE;
        }
        ToplevelRequest::SetMaximized => toplevel::set_maximized(state, id),
        ToplevelRequest::UnsetMaximized => toplevel::unset_maximized(state, id),
        ToplevelRequest::SetFullscreen(output) => toplevel::set_fullscreen(state, id, output),
        ToplevelRequest::UnsetFullscreen => toplevel::unset_fullscreen(state, id),
        ToplevelRequest::SetMinimized => seat::minimize(state, id),
        ToplevelRequest::Destroy => {
            if has_decoration {
                return Err(ProtocolError::DecorationOrphaned(id));
            }
            shell::destroy_role(state, id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::ShellConfig;
    use crate::state::{Compositor, ShellEvent};
    use crate::utils::{ClientId, Serial, SurfaceId};
    use crate::wayland::compositor::BufferInfo;
    use crate::wayland::protocol::{
        ClientEvent, DecorationRequest, ProtocolError, Request, SurfaceRequest, ToplevelRequest,
        XdgSurfaceRequest,
    };
    use crate::wayland::shell::xdg::{ResizeEdge, ToplevelStates};
    use std::sync::{Arc, Mutex};

    fn mapped_toplevel(compositor: &Compositor, client: ClientId) -> SurfaceId {
        let surface = compositor.create_surface(client).unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::Create))
            .unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel))
            .unwrap();
        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Commit))
            .unwrap();
        ack_last(compositor, client, surface);
        let attach = SurfaceRequest::Attach(Some(BufferInfo { size: (100, 100).into() }));
        compositor.dispatch(client, Request::Surface(surface, attach)).unwrap();
        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Commit))
            .unwrap();
        surface
    }

    fn ack_last(compositor: &Compositor, client: ClientId, surface: SurfaceId) -> Vec<ClientEvent> {
        let events = compositor.drain_client_events(client);
        let serial = events
            .iter()
            .rev()
            .find_map(|e| match e {
                ClientEvent::ToplevelConfigure { serial, .. } => Some(*serial),
                _ => None,
            })
            .unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(serial)))
            .unwrap();
        events
    }

    #[test]
    fn resize_sets_the_resizing_state() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = mapped_toplevel(&compositor, client);
        compositor.set_pointer_focus(Some(surface)).unwrap();

        compositor
            .dispatch(
                client,
                Request::Toplevel(
                    surface,
                    ToplevelRequest::Resize {
                        serial: Serial::from(7),
                        edges: ResizeEdge::BottomRight,
                    },
                ),
            )
            .unwrap();
        let events = compositor.drain_client_events(client);
        assert!(matches!(
            events.as_slice(),
            [ClientEvent::ToplevelConfigure { states, .. }] if states.contains(ToplevelStates::RESIZING)
        ));
        compositor.with_state(|state| assert!(state.seat().interactive().is_some()));

        compositor.end_interactive();
        let events = compositor.drain_client_events(client);
        assert!(matches!(
            events.as_slice(),
            [ClientEvent::ToplevelConfigure { states, .. }] if !states.contains(ToplevelStates::RESIZING)
        ));
    }

    #[test]
    fn move_without_pointer_focus_is_ignored() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = mapped_toplevel(&compositor, client);
        compositor
            .dispatch(
                client,
                Request::Toplevel(surface, ToplevelRequest::Move { serial: Serial::from(3) }),
            )
            .unwrap();
        compositor.with_state(|state| assert!(state.seat().interactive().is_none()));
    }

    #[test]
    fn minimize_drops_focus_and_session() {
        let compositor = Compositor::new(ShellConfig::default());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        compositor.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        let client = compositor.new_client(6);
        let surface = mapped_toplevel(&compositor, client);
        compositor.set_pointer_focus(Some(surface)).unwrap();
        compositor
            .dispatch(
                client,
                Request::Toplevel(surface, ToplevelRequest::Move { serial: Serial::from(3) }),
            )
            .unwrap();
        compositor
            .dispatch(client, Request::Toplevel(surface, ToplevelRequest::SetMinimized))
            .unwrap();

        compositor.with_state(|state| {
            assert!(state.surface(surface).unwrap().is_minimized());
            assert_eq!(state.pointer_focus(), None);
            assert_eq!(state.keyboard_focus(), None);
            assert!(state.seat().interactive().is_none());
        });
        let events = events.lock().unwrap();
        assert!(events.contains(&ShellEvent::Minimized { surface }));
        assert!(events.contains(&ShellEvent::InteractiveCancelled { surface }));
    }

    #[test]
    fn negative_min_size() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = mapped_toplevel(&compositor, client);
        let result = compositor.dispatch(
            client,
            Request::Toplevel(surface, ToplevelRequest::SetMinSize((-1, 0).into())),
        );
        assert_eq!(result, Err(ProtocolError::InvalidSize(surface)));
    }

    #[test]
    fn destroying_before_the_decoration() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = compositor.create_surface(client).unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::Create))
            .unwrap();
        compositor
            .dispatch(client, Request::XdgSurface(surface, XdgSurfaceRequest::GetToplevel))
            .unwrap();
        compositor
            .dispatch(client, Request::Decoration(surface, DecorationRequest::Create))
            .unwrap();
        let result = compositor.dispatch(client, Request::Toplevel(surface, ToplevelRequest::Destroy));
        assert_eq!(result, Err(ProtocolError::DecorationOrphaned(surface)));
    }

    #[test]
    fn destroying_drops_pending_configures() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = mapped_toplevel(&compositor, client);
        compositor.add_output("out", (0, 0, 800, 600).into());
        compositor
            .dispatch(client, Request::Toplevel(surface, ToplevelRequest::SetMaximized))
            .unwrap();
        compositor
            .dispatch(client, Request::Toplevel(surface, ToplevelRequest::SetFullscreen(None)))
            .unwrap();
        let serial = match compositor.drain_client_events(client).last() {
            Some(ClientEvent::ToplevelConfigure { serial, .. }) => *serial,
            other => panic!("unexpected event {:?}", other),
        };

        compositor
            .dispatch(client, Request::Toplevel(surface, ToplevelRequest::Destroy))
            .unwrap();
        compositor.with_state(|state| {
            assert!(state.toplevel(surface).is_none());
            assert!(!state.stack().contains(surface));
        });

        // the acked serial now targets a surface without role
        let result = compositor.dispatch(
            client,
            Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(serial)),
        );
        assert_eq!(result, Err(ProtocolError::NotConstructed(surface)));
    }
}
