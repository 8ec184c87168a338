use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use trellis::{
    config::ShellConfig,
    state::{Compositor, ShellEvent},
    utils::{Logical, OutputId, Point, Rectangle, SurfaceId},
};

use crate::grabs::MoveSurfaceGrab;

pub struct Smallvil {
    pub compositor: Compositor,
    pub output: OutputId,

    pub windows: Vec<SurfaceId>,
    pub pointer_location: Point<i32, Logical>,
    pub grab: Option<MoveSurfaceGrab>,

    events: Arc<Mutex<VecDeque<ShellEvent>>>,
}

impl Smallvil {
    pub fn new(config: ShellConfig) -> Self {
        let compositor = Compositor::new(config);

        // A single headless output, which also takes the maximize and fullscreen requests
        let output = compositor.add_output("headless-1", Rectangle::from((0, 0, 1280, 800)));
        compositor
            .set_current_output(Some(output))
            .expect("the output was just added");

        // Notifications are delivered once the state lock is released, queue them and
        // react from the main loop.
        let events = Arc::new(Mutex::new(VecDeque::new()));
        let queue = events.clone();
        compositor.subscribe(move |event| queue.lock().unwrap().push_back(event.clone()));

        Self {
            compositor,
            output,
            windows: Vec::new(),
            pointer_location: Point::default(),
            grab: None,
            events,
        }
    }

    /// React to the notifications emitted since the last call
    pub fn dispatch_events(&mut self) {
        loop {
            let Some(event) = self.events.lock().unwrap().pop_front() else {
                break;
            };
            crate::handlers::handle_event(self, event);
        }
    }

    /// The topmost mapped surface under `location`
    pub fn surface_under(&self, location: Point<i32, Logical>) -> Option<SurfaceId> {
        self.compositor.with_state(|state| {
            state.stack().iter_front_to_back().find(|id| {
                state
                    .surface(*id)
                    .map(|s| s.bounding_box().contains(location))
                    .unwrap_or(false)
            })
        })
    }
}
