use trellis::utils::{Logical, Point, SurfaceId};

use crate::Smallvil;

pub struct MoveSurfaceGrab {
    pub window: SurfaceId,
    pub start_location: Point<i32, Logical>,
    pub initial_window_location: Point<i32, Logical>,
}

impl MoveSurfaceGrab {
    pub fn motion(&self, data: &mut Smallvil, location: Point<i32, Logical>) {
        let delta = location - self.start_location;
        let new_location = self.initial_window_location + delta;
        let _ = data.compositor.set_position(self.window, new_location);
    }

    pub fn button_released(self, data: &mut Smallvil) {
        // No more buttons are pressed, release the grab.
        data.compositor.end_interactive();
    }
}
