mod common;

use trellis::config::ShellConfig;
use trellis::state::ShellEvent;
use trellis::utils::Rectangle;
use trellis::wayland::protocol::{
    ClientEvent, DecorationRequest, ProtocolError, Request, SessionLockRequest, SurfaceRequest,
    ToplevelRequest, XdgSurfaceRequest,
};
use trellis::wayland::shell::xdg::{DecorationMode, ToplevelStates};

use common::*;

#[test]
fn server_side_decorations() {
    let compositor = compositor(ShellConfig::default());
    let events = record(&compositor);
    let client = compositor.new_client(6);
    let surface = toplevel(&compositor, client);
    dispatch(&compositor, client, Request::Decoration(surface, DecorationRequest::Create));
    dispatch(
        &compositor,
        client,
        Request::Decoration(surface, DecorationRequest::SetMode(DecorationMode::ServerSide)),
    );

    commit(&compositor, client, surface);
    let configures = compositor.drain_client_events(client);
    let serial = match configures.as_slice() {
        [ClientEvent::DecorationConfigure {
            mode: DecorationMode::ServerSide,
            ..
        }, ClientEvent::ToplevelConfigure { serial, .. }] => *serial,
        other => panic!("unexpected events {:?}", other),
    };
    dispatch(
        &compositor,
        client,
        Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(serial)),
    );

    compositor.with_state(|state| {
        let decoration = state.toplevel(surface).unwrap().decoration().unwrap();
        assert_eq!(decoration.mode(), DecorationMode::ServerSide);
        assert_eq!(decoration.pending(), None);
    });
    assert!(events.lock().unwrap().contains(&ShellEvent::DecorationModeChanged {
        surface,
        mode: DecorationMode::ServerSide,
    }));
}

#[test]
fn fullscreen_on_a_given_output() {
    let compositor = compositor(ShellConfig::default());
    compositor.add_output("left", Rectangle::from((0, 0, 800, 600)));
    let right = compositor.add_output("right", Rectangle::from((800, 0, 1024, 768)));
    let client = compositor.new_client(6);
    let surface = mapped_toplevel(&compositor, client);

    dispatch(
        &compositor,
        client,
        Request::Toplevel(surface, ToplevelRequest::SetFullscreen(Some(right))),
    );
    let events = compositor.drain_client_events(client);
    let serial = match events.as_slice() {
        [ClientEvent::ToplevelConfigure {
            serial, size, states, ..
        }] => {
            assert_eq!(*size, Some((1024, 768).into()));
            assert!(states.contains(ToplevelStates::FULLSCREEN));
            *serial
        }
        other => panic!("unexpected events {:?}", other),
    };

    // nothing moves before the client adopted the state
    compositor.with_state(|state| assert_eq!(state.surface(surface).unwrap().position(), (0, 0).into()));

    dispatch(
        &compositor,
        client,
        Request::XdgSurface(surface, XdgSurfaceRequest::AckConfigure(serial)),
    );
    attach(&compositor, client, surface, 1024, 768);
    commit(&compositor, client, surface);
    compositor.with_state(|state| {
        assert!(state.toplevel(surface).unwrap().is_fullscreen());
        assert_eq!(state.surface(surface).unwrap().position(), (800, 0).into());
    });
}

#[test]
fn damage_is_reported_per_output() {
    let compositor = compositor(ShellConfig::default());
    let output = compositor.add_output("out", Rectangle::from((0, 0, 800, 600)));
    compositor.add_output("far", Rectangle::from((5000, 0, 800, 600)));
    let client = compositor.new_client(6);
    let surface = mapped_toplevel(&compositor, client);
    let events = record(&compositor);

    dispatch(
        &compositor,
        client,
        Request::Surface(surface, SurfaceRequest::DamageBuffer(Rectangle::from((0, 0, 10, 10)))),
    );
    commit(&compositor, client, surface);
    let events = events.lock().unwrap();
    assert!(events.contains(&ShellEvent::Damaged {
        surface,
        damage: vec![Rectangle::from((0, 0, 10, 10))],
    }));
    assert!(events.contains(&ShellEvent::OutputsDamaged {
        surface,
        outputs: vec![output],
    }));
}

#[test]
fn stacking_order_follows_mapping_and_raise() {
    let compositor = compositor(ShellConfig::default());
    let client = compositor.new_client(6);
    let first = mapped_toplevel(&compositor, client);
    let second = mapped_toplevel(&compositor, client);
    compositor.with_state(|state| {
        assert_eq!(state.stack().iter().collect::<Vec<_>>(), vec![first, second]);
        assert_eq!(state.stack().top(), Some(second));
    });

    compositor.raise(first).unwrap();
    compositor.with_state(|state| assert_eq!(state.stack().top(), Some(first)));
}

#[test]
fn protocol_error_only_affects_the_faulty_client() {
    let compositor = compositor(ShellConfig::default());
    let events = record(&compositor);
    let good = compositor.new_client(6);
    let bad = compositor.new_client(6);
    let kept = mapped_toplevel(&compositor, good);
    let lost = mapped_toplevel(&compositor, bad);

    let result = compositor.dispatch(bad, Request::Surface(lost, SurfaceRequest::SetBufferScale(0)));
    assert_eq!(result, Err(ProtocolError::InvalidScale(0)));
    assert!(matches!(
        compositor.drain_client_events(bad).last(),
        Some(ClientEvent::Error {
            interface: "wl_surface",
            ..
        })
    ));
    assert!(events
        .lock()
        .unwrap()
        .contains(&ShellEvent::ClientDisconnected { client: bad }));

    // further requests of the dead client are ignored
    assert_eq!(
        compositor.dispatch(bad, Request::Surface(lost, SurfaceRequest::Commit)),
        Ok(())
    );
    compositor.with_state(|state| {
        assert!(state.surface(lost).is_none());
        assert_eq!(state.stack().iter().collect::<Vec<_>>(), vec![kept]);
    });
}

#[test]
fn disconnect_cleans_up_everything() {
    let compositor = compositor(ShellConfig::default());
    let events = record(&compositor);
    let client = compositor.new_client(6);
    let parent = mapped_toplevel(&compositor, client);
    let positioner = positioner(
        &compositor,
        client,
        Rectangle::from((0, 0, 10, 10)),
        trellis::wayland::shell::xdg::ConstraintAdjustment::empty(),
    );
    let menu = popup(&compositor, client, parent, positioner);
    map(&compositor, client, menu);
    compositor.set_pointer_focus(Some(menu)).unwrap();

    compositor.disconnect(client);
    compositor.with_state(|state| {
        assert!(state.stack().is_empty());
        assert_eq!(state.surfaces().count(), 0);
        assert_eq!(state.pointer_focus(), None);
    });
    let events = events.lock().unwrap();
    assert!(events.contains(&ShellEvent::SurfaceDestroyed { surface: parent }));
    assert!(events.contains(&ShellEvent::SurfaceDestroyed { surface: menu }));
    assert!(matches!(events.last(), Some(ShellEvent::ClientDisconnected { .. })));
}

#[test]
fn another_locker_takes_over_a_dead_lock() {
    let compositor = compositor(ShellConfig::default());
    let output = compositor.add_output("out", Rectangle::from((0, 0, 800, 600)));
    let first = compositor.new_client(1);
    dispatch(&compositor, first, Request::SessionLock(SessionLockRequest::Lock));
    let surface = compositor.create_surface(first).unwrap();
    dispatch(
        &compositor,
        first,
        Request::SessionLock(SessionLockRequest::GetLockSurface { surface, output }),
    );

    compositor.disconnect(first);
    compositor.with_state(|state| {
        assert!(state.is_locked());
        assert!(state.session_lock().lock_surfaces().is_empty());
    });

    let second = compositor.new_client(1);
    dispatch(&compositor, second, Request::SessionLock(SessionLockRequest::Lock));
    assert_eq!(compositor.drain_client_events(second), vec![ClientEvent::Locked]);
    dispatch(&compositor, second, Request::SessionLock(SessionLockRequest::Unlock));
    compositor.with_state(|state| assert!(!state.is_locked()));
}
