//! Utilities for handling shell surfaces with the `xdg_shell` protocol
//!
//! This module handles the two xdg roles:
//!
//! - *toplevels* are the application windows. The compositor drives their size and
//!   state (maximized, fullscreen, activated, ...) through configures, see [`ToplevelRole`].
//! - *popups* are menus and tooltips placed relative to a parent xdg surface by a
//!   positioner, see [`PopupRole`] and [`PositionerState`].
//!
//! ## The configure handshake
//!
//! Every state suggestion goes out as a configure with a fresh serial. The client applies it
//! and answers with `ack_configure`, which makes the matching state current; configures sent
//! before it are superseded. Compositors suggest new state through
//! [`Compositor::with_toplevel_pending_state`](crate::state::Compositor::with_toplevel_pending_state)
//! followed by [`Compositor::send_toplevel_configure`](crate::state::Compositor::send_toplevel_configure),
//! which only sends something when the pending state differs from what the client already knows.
//!
//! ## Default policy
//!
//! Client requests to maximize, fullscreen or minimize are answered directly:
//!
//! - maximizing sizes the window to the current output; without an output nothing is sent.
//! - fullscreen uses the requested output, falling back to the current one.
//! - unmaximize and unfullscreen clear the state and let the client pick its size.
//! - minimizing drops the focus held by the window and cancels interactive move/resize.
//!
//! Once a configure carrying new states was acknowledged and committed, the compositor
//! reacts to the flipped bits: activated windows get the keyboard focus, maximized and
//! fullscreen windows are raised and moved to their output.

use crate::utils::{Logical, OutputId, Rectangle, Size};

mod decoration;
pub(crate) mod handlers;
mod popup;
mod positioner;
mod toplevel;

pub use self::decoration::DecorationState;
pub use self::popup::{PopupConfigureError, PopupRole};
pub use self::positioner::{Anchor, ConstraintAdjustment, Gravity, PositionerState};
pub use self::toplevel::ToplevelRole;

pub(crate) use self::popup::{dismiss_child_popups, is_topmost_popup, raise_tree, update_popup_positions};
pub(crate) use self::toplevel::{forget_toplevel, send_toplevel_configure};

/// The minimum version exposing tiled states
pub const XDG_TOPLEVEL_STATE_TILED_SINCE: u32 = 2;
/// The minimum version supporting `xdg_popup.reposition`
pub const XDG_POPUP_REPOSITION_SINCE: u32 = 3;

bitflags::bitflags! {
    /// States of a toplevel, as sent in its configures
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ToplevelStates: u32 {
        /// The surface is maximized
        const MAXIMIZED = 1;
        /// The surface is fullscreen
        const FULLSCREEN = 1 << 1;
        /// The surface is being resized interactively
        const RESIZING = 1 << 2;
        /// The surface is the focused window
        const ACTIVATED = 1 << 3;
        /// The left edge is adjacent to another part of the tiling grid
        const TILED_LEFT = 1 << 4;
        /// The right edge is adjacent to another part of the tiling grid
        const TILED_RIGHT = 1 << 5;
        /// The top edge is adjacent to another part of the tiling grid
        const TILED_TOP = 1 << 6;
        /// The bottom edge is adjacent to another part of the tiling grid
        const TILED_BOTTOM = 1 << 7;
    }
}

impl Default for ToplevelStates {
    fn default() -> Self {
        ToplevelStates::empty()
    }
}

impl ToplevelStates {
    /// All the tiled states
    pub const TILED: ToplevelStates = ToplevelStates::TILED_LEFT
        .union(ToplevelStates::TILED_RIGHT)
        .union(ToplevelStates::TILED_TOP)
        .union(ToplevelStates::TILED_BOTTOM);

    /// The states a client of the given `xdg_wm_base` version understands
    pub fn filtered_for_version(self, version: u32) -> ToplevelStates {
        if version >= XDG_TOPLEVEL_STATE_TILED_SINCE {
            self
        } else {
            self.difference(ToplevelStates::TILED)
        }
    }
}

/// Edges of an interactive resize
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum ResizeEdge {
    /// No edge
    #[default]
    None = 0,
    /// Top edge
    Top = 1,
    /// Bottom edge
    Bottom = 2,
    /// Left edge
    Left = 4,
    /// Top-left corner
    TopLeft = 5,
    /// Bottom-left corner
    BottomLeft = 6,
    /// Right edge
    Right = 8,
    /// Top-right corner
    TopRight = 9,
    /// Bottom-right corner
    BottomRight = 10,
}

/// Who draws the window decorations
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DecorationMode {
    /// The client draws its decorations
    #[default]
    ClientSide,
    /// The compositor draws the decorations
    ServerSide,
}

/// State of a toplevel as negotiated through configures
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ToplevelState {
    /// The suggested size of the surface, `None` letting the client decide
    pub size: Option<Size<i32, Logical>>,
    /// The states for this surface
    pub states: ToplevelStates,
    /// The output for a fullscreen display
    pub fullscreen_output: Option<OutputId>,
    /// The decoration mode of the surface
    pub decoration_mode: DecorationMode,
}

/// State of a popup as negotiated through configures
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PopupState {
    /// The positioner used for this placement
    pub positioner: PositionerState,
    /// Placement of the popup relative to its parent's window geometry
    pub geometry: Rectangle<i32, Logical>,
}
