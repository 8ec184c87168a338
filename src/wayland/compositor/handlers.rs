use tracing::trace;

use super::{BufferAssignment, PendingChanges};
use crate::state::State;
use crate::utils::{ClientId, SurfaceId};
use crate::wayland::protocol::{ProtocolError, SurfaceRequest};

pub(crate) fn surface_request(
    state: &mut State,
    client: ClientId,
    id: SurfaceId,
    request: SurfaceRequest,
) -> Result<(), ProtocolError> {
    let surface = state.client_surface_mut(client, id)?;
    trace!(surface = %id, ?request, "wl_surface request");
    match request {
        SurfaceRequest::Attach(buffer) => {
            surface.cached.pending_mut().buffer = Some(match buffer {
                Some(info) => BufferAssignment::NewBuffer(info),
                None => BufferAssignment::Removed,
            });
            surface.dirty |= PendingChanges::BUFFER;
        }
        SurfaceRequest::Offset(delta) => {
            let pending = surface.cached.pending_mut();
            let current = pending.buffer_delta.unwrap_or_default();
            pending.buffer_delta = Some(current + delta);
            surface.dirty |= PendingChanges::OFFSET;
        }
        SurfaceRequest::DamageBuffer(rect) => {
            surface.cached.pending_mut().damage.push(rect);
            surface.dirty |= PendingChanges::DAMAGE;
        }
        SurfaceRequest::SetOpaqueRegion(region) => {
            surface.cached.pending_mut().opaque_region = region;
            surface.dirty |= PendingChanges::OPAQUE_REGION;
        }
        SurfaceRequest::SetInputRegion(region) => {
            surface.cached.pending_mut().input_region = region;
            surface.dirty |= PendingChanges::INPUT_REGION;
        }
        SurfaceRequest::SetBufferScale(scale) => {
            if scale < 1 {
                return Err(ProtocolError::InvalidScale(scale));
            }
            surface.cached.pending_mut().buffer_scale = scale;
            surface.dirty |= PendingChanges::SCALE;
        }
        SurfaceRequest::Commit => {
            super::commit(state, id)?;
        }
        SurfaceRequest::Destroy => {
            super::destroy_surface(state, id, true)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::config::ShellConfig;
    use crate::state::{Compositor, ShellEvent};
    use crate::utils::Rectangle;
    use crate::wayland::compositor::{BufferInfo, PendingChanges};
    use crate::wayland::protocol::{ClientEvent, ProtocolError, Request, SurfaceRequest};
    use std::sync::{Arc, Mutex};

    #[test]
    fn null_commit_is_a_noop() {
        let compositor = Compositor::new(ShellConfig::default());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        compositor.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        let client = compositor.new_client(6);
        let surface = compositor.create_surface(client).unwrap();
        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::SetBufferScale(2)))
            .unwrap();
        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Commit))
            .unwrap();

        compositor.with_state(|state| {
            let data = state.surface(surface).unwrap();
            assert_eq!(data.current().buffer_scale, 2);
            assert_eq!(data.pending_changes(), PendingChanges::empty());
            assert!(data.role().is_none());
        });
        assert!(events.lock().unwrap().is_empty());
    }

    #[test]
    fn pending_state_is_not_visible_before_commit() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = compositor.create_surface(client).unwrap();
        let attach = SurfaceRequest::Attach(Some(BufferInfo { size: (10, 10).into() }));
        compositor.dispatch(client, Request::Surface(surface, attach)).unwrap();
        compositor
            .dispatch(
                client,
                Request::Surface(surface, SurfaceRequest::DamageBuffer(Rectangle::from((0, 0, 10, 10)))),
            )
            .unwrap();

        compositor.with_state(|state| {
            let data = state.surface(surface).unwrap();
            assert!(data.current().buffer_info().is_none());
            assert!(data.has_buffer_or_pending());
            assert!(data.pending_changes().contains(PendingChanges::BUFFER | PendingChanges::DAMAGE));
        });

        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Commit))
            .unwrap();
        compositor.with_state(|state| {
            let data = state.surface(surface).unwrap();
            assert_eq!(data.current().surface_size(), Some((10, 10).into()));
            assert_eq!(data.current().damage.len(), 1);
        });
    }

    #[test]
    fn invalid_scale_disconnects() {
        let compositor = Compositor::new(ShellConfig::default());
        let client = compositor.new_client(6);
        let surface = compositor.create_surface(client).unwrap();
        let result = compositor.dispatch(client, Request::Surface(surface, SurfaceRequest::SetBufferScale(0)));
        assert_eq!(result, Err(ProtocolError::InvalidScale(0)));

        let events = compositor.drain_client_events(client);
        assert!(matches!(
            events.as_slice(),
            [ClientEvent::Error {
                interface: "wl_surface",
                code: 0,
                ..
            }]
        ));
        compositor.with_state(|state| assert!(state.surface(surface).is_none()));
    }

    #[test]
    fn foreign_surface_is_an_invalid_object() {
        let compositor = Compositor::new(ShellConfig::default());
        let owner = compositor.new_client(6);
        let other = compositor.new_client(6);
        let surface = compositor.create_surface(owner).unwrap();
        let result = compositor.dispatch(other, Request::Surface(surface, SurfaceRequest::Commit));
        assert!(matches!(result, Err(ProtocolError::InvalidObject(_))));
        compositor.with_state(|state| assert!(state.surface(surface).is_some()));
    }

    #[test]
    fn destroying_a_plain_surface() {
        let compositor = Compositor::new(ShellConfig::default());
        let events = Arc::new(Mutex::new(Vec::new()));
        let sink = events.clone();
        compositor.subscribe(move |e| sink.lock().unwrap().push(e.clone()));

        let client = compositor.new_client(6);
        let surface = compositor.create_surface(client).unwrap();
        compositor
            .dispatch(client, Request::Surface(surface, SurfaceRequest::Destroy))
            .unwrap();
        assert_eq!(
            *events.lock().unwrap(),
            vec![ShellEvent::SurfaceDestroyed { surface }]
        );
    }
}
