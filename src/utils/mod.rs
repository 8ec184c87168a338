//! Various utilities functions and types

mod geometry;
mod serial;
pub mod signaling;

pub use self::geometry::{Buffer, Coordinate, Logical, Point, Rectangle, Size};
pub use self::serial::{Serial, SerialCounter};
pub use self::signaling::{SignalToken, Signaler};

macro_rules! object_id {
    ($(#[$meta:meta])* $name:ident, $interface:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Name of the protocol interface this id refers to
            pub const INTERFACE: &'static str = $interface;

            /// The raw protocol id
            pub fn protocol_id(&self) -> u32 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}@{}", $interface, self.0)
            }
        }
    };
}

object_id!(
    /// Handle to a surface
    SurfaceId,
    "wl_surface"
);
object_id!(
    /// Handle to a positioner object
    PositionerId,
    "xdg_positioner"
);
object_id!(
    /// Handle to a connected client
    ClientId,
    "wl_client"
);
object_id!(
    /// Handle to an output
    OutputId,
    "wl_output"
);

/// Monotonic id allocator for the handles above
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: u32,
}

impl IdAllocator {
    pub(crate) fn next<T: From<u32>>(&mut self) -> T {
        self.next = self.next.wrapping_add(1).max(1);
        T::from(self.next)
    }
}

impl From<u32> for SurfaceId {
    fn from(id: u32) -> Self {
        SurfaceId(id)
    }
}

impl From<u32> for PositionerId {
    fn from(id: u32) -> Self {
        PositionerId(id)
    }
}

impl From<u32> for ClientId {
    fn from(id: u32) -> Self {
        ClientId(id)
    }
}

impl From<u32> for OutputId {
    fn from(id: u32) -> Self {
        OutputId(id)
    }
}
