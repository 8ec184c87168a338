mod client;
mod grabs;
mod handlers;
mod input;
mod state;

use tracing::info;
use trellis::{
    config::ShellConfig,
    utils::{Point, Rectangle, Serial},
    wayland::protocol::{Request, ToplevelRequest},
};

use crate::{client::ScriptedClient, input::InputEvent};
pub use state::Smallvil;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    if let Ok(env_filter) = tracing_subscriber::EnvFilter::try_from_default_env() {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter("info").init();
    }

    let mut state = Smallvil::new(ShellConfig::default());
    let compositor = state.compositor.clone();

    let mut clients = vec![
        ScriptedClient::connect(&compositor, "first")?,
        ScriptedClient::connect(&compositor, "second")?,
    ];
    roundtrip(&mut state, &mut clients)?;

    // Drag the first window around by its title bar
    let (first, first_location) = {
        let window = clients[0].window;
        let location = compositor.with_state(|s| s.surface(window).map(|s| s.position()).unwrap_or_default());
        (window, location)
    };
    let grab_point = first_location + Point::from((10, 10));
    state.process_input_event(InputEvent::PointerMotionAbsolute { location: grab_point });
    state.process_input_event(InputEvent::PointerButtonPressed);
    clients[0].request(
        &compositor,
        Request::Toplevel(first, ToplevelRequest::Move { serial: Serial::from(1) }),
    )?;
    roundtrip(&mut state, &mut clients)?;
    for step in 1..=5 {
        state.process_input_event(InputEvent::PointerMotionAbsolute {
            location: grab_point + Point::from((40 * step, 20 * step)),
        });
    }
    state.process_input_event(InputEvent::PointerButtonReleased);
    roundtrip(&mut state, &mut clients)?;

    // A menu follows its window around
    clients[0].open_menu(&compositor, Rectangle::from((0, 0, 80, 24)))?;
    roundtrip(&mut state, &mut clients)?;
    compositor.set_position(first, (600, 500).into())?;
    roundtrip(&mut state, &mut clients)?;

    // Maximize the second window, then ask both to close
    let second = clients[1].window;
    clients[1].request(&compositor, Request::Toplevel(second, ToplevelRequest::SetMaximized))?;
    roundtrip(&mut state, &mut clients)?;
    for client in &clients {
        compositor.send_close(client.window)?;
    }
    roundtrip(&mut state, &mut clients)?;

    for client in &clients {
        compositor.disconnect(client.id);
    }
    state.dispatch_events();
    info!(windows = state.windows.len(), "session over");
    Ok(())
}

/// Let every client process its events, until nothing happens anymore
fn roundtrip(state: &mut Smallvil, clients: &mut [ScriptedClient]) -> Result<(), Box<dyn std::error::Error>> {
    for _ in 0..8 {
        for client in clients.iter_mut().filter(|c| !c.is_closed()) {
            client.dispatch_events(&state.compositor)?;
        }
        state.dispatch_events();
    }
    Ok(())
}
