//! Seat-related state
//!
//! Input devices are handled by an external backend. This module only records what the
//! shell needs to know about the seat:
//!
//! - which surfaces hold the pointer and keyboard focus, as reported by the input layer
//!   through [`Compositor::set_pointer_focus`] and [`Compositor::set_keyboard_focus`];
//! - the cursor image (the *cursor* role) and drag icon (the *drag icon* role);
//! - the interactive move/resize session started by a toplevel.
//!
//! Minimizing, unmapping or destroying a surface drops the focus held by it or its popups
//! and cancels its interactive session.

use tracing::{debug, trace};

use crate::state::{Compositor, ShellError, ShellEvent, State};
use crate::utils::{Logical, Point, Serial, SurfaceId};
use crate::wayland::compositor::is_ancestor_or_self;
use crate::wayland::shell::xdg::{self, ResizeEdge, ToplevelStates};
use crate::wayland::shell::Role;

pub(crate) mod handlers;

/// Kind of an interactive session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractiveKind {
    /// The toplevel is being moved
    Move,
    /// The toplevel is being resized by the given edges
    Resize(ResizeEdge),
}

/// An interactive move or resize in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InteractiveSession {
    /// The toplevel being moved or resized
    pub surface: SurfaceId,
    /// Serial of the input event that started it
    pub serial: Serial,
    /// Move or resize
    pub kind: InteractiveKind,
}

/// A drag and drop operation in progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragState {
    /// Surface the drag started on
    pub origin: SurfaceId,
    /// Icon following the pointer
    pub icon: Option<SurfaceId>,
}

/// State of the seat
#[derive(Debug, Default)]
pub struct SeatState {
    pub(crate) pointer_focus: Option<SurfaceId>,
    pub(crate) keyboard_focus: Option<SurfaceId>,
    pub(crate) cursor: Option<SurfaceId>,
    pub(crate) drag: Option<DragState>,
    pub(crate) interactive: Option<InteractiveSession>,
}

impl SeatState {
    /// The interactive session in progress
    pub fn interactive(&self) -> Option<&InteractiveSession> {
        self.interactive.as_ref()
    }

    /// The drag and drop operation in progress
    pub fn drag(&self) -> Option<&DragState> {
        self.drag.as_ref()
    }
}

/// Role of a surface used as cursor image
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CursorRole {
    /// Location of the pointer hotspot, surface-local
    pub hotspot: Point<i32, Logical>,
}

/// Role of a surface used as drag and drop icon
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DragIconRole {
    /// Offset of the icon relative to the pointer
    pub offset: Point<i32, Logical>,
}

pub(crate) fn cursor_commit_hook(state: &mut State, id: SurfaceId) {
    let Some(surface) = state.surfaces.get_mut(&id) else {
        return;
    };
    let delta = surface.current().buffer_delta;
    let has_buffer = surface.current().buffer_info().is_some();
    surface.mapped = has_buffer;
    let Some(Role::Cursor(cursor)) = surface.role.as_mut() else {
        return;
    };
    // moving the buffer keeps the hotspot on the same pixel
    if let Some(delta) = delta {
        cursor.hotspot -= delta;
        let hotspot = cursor.hotspot;
        trace!(surface = %id, ?hotspot, "cursor hotspot moved");
        if state.seat.cursor == Some(id) {
            state.emit(ShellEvent::CursorChanged {
                surface: Some(id),
                hotspot,
            });
        }
    }
}

pub(crate) fn drag_icon_commit_hook(state: &mut State, id: SurfaceId) {
    let Some(surface) = state.surfaces.get_mut(&id) else {
        return;
    };
    let delta = surface.current().buffer_delta;
    surface.mapped = surface.current().buffer_info().is_some();
    if let (Some(Role::DragIcon(icon)), Some(delta)) = (surface.role.as_mut(), delta) {
        icon.offset += delta;
    }
}

pub(crate) fn forget_cursor(state: &mut State, id: SurfaceId) {
    if state.seat.cursor == Some(id) {
        state.seat.cursor = None;
        state.emit(ShellEvent::CursorChanged {
            surface: None,
            hotspot: Point::default(),
        });
    }
}

pub(crate) fn forget_drag_icon(state: &mut State, id: SurfaceId) {
    if let Some(drag) = state.seat.drag.as_mut().filter(|d| d.icon == Some(id)) {
        drag.icon = None;
    }
}

/// Drop every reference the seat holds to a destroyed surface
pub(crate) fn forget_surface(state: &mut State, id: SurfaceId) {
    clear_focus(state, id);
    cancel_interactive(state, id);
    forget_cursor(state, id);
    if state.seat.drag.map(|d| d.origin == id).unwrap_or(false) {
        state.seat.drag = None;
        state.emit(ShellEvent::DragEnded);
    }
}

/// Drop the focus held by `root` or any of its descendants
pub(crate) fn clear_focus(state: &mut State, root: SurfaceId) {
    let in_tree = |focus: Option<SurfaceId>| {
        focus
            .map(|f| is_ancestor_or_self(&state.surfaces, root, f))
            .unwrap_or(false)
    };
    let pointer = in_tree(state.seat.pointer_focus);
    let keyboard = in_tree(state.seat.keyboard_focus);
    if !pointer && !keyboard {
        return;
    }
    let surface = if keyboard {
        state.seat.keyboard_focus
    } else {
        state.seat.pointer_focus
    }
    .unwrap_or(root);
    if pointer {
        state.seat.pointer_focus = None;
    }
    if keyboard {
        state.seat.keyboard_focus = None;
    }
    debug!(surface = %surface, pointer, keyboard, "focus cleared");
    state.emit(ShellEvent::FocusCleared {
        surface,
        pointer,
        keyboard,
    });
}

/// Start an interactive move or resize of a toplevel
///
/// Ignored unless the toplevel holds the pointer focus and is not fullscreen.
pub(crate) fn start_interactive(state: &mut State, id: SurfaceId, serial: Serial, kind: InteractiveKind) {
    let Some(toplevel) = state.toplevel(id) else {
        return;
    };
    if toplevel.current().states.contains(ToplevelStates::FULLSCREEN) {
        debug!(surface = %id, "ignoring interactive request of a fullscreen toplevel");
        return;
    }
    if !state.has_pointer_focus(id) {
        debug!(surface = %id, "ignoring interactive request without pointer focus");
        return;
    }
    if let Some(previous) = state.seat.interactive.map(|s| s.surface) {
        cancel_interactive(state, previous);
    }

    state.seat.interactive = Some(InteractiveSession {
        surface: id,
        serial,
        kind,
    });
    match kind {
        InteractiveKind::Move => state.emit(ShellEvent::MoveRequested { surface: id, serial }),
        InteractiveKind::Resize(edges) => {
            if let Some(toplevel) = state.toplevel_mut(id) {
                toplevel
                    .configure
                    .with_pending_state(|s| s.states.insert(ToplevelStates::RESIZING));
            }
            xdg::send_toplevel_configure(state, id);
            state.emit(ShellEvent::ResizeRequested {
                surface: id,
                serial,
                edges,
            });
        }
    }
}

/// Cancel the interactive session of a surface, if it has one
pub(crate) fn cancel_interactive(state: &mut State, id: SurfaceId) {
    if let Some(session) = end_session(state, id) {
        debug!(surface = %id, "interactive session cancelled");
        state.emit(ShellEvent::InteractiveCancelled { surface: session.surface });
    }
}

fn end_session(state: &mut State, id: SurfaceId) -> Option<InteractiveSession> {
    let session = state.seat.interactive.filter(|s| s.surface == id)?;
    state.seat.interactive = None;
    if let InteractiveKind::Resize(_) = session.kind {
        if let Some(toplevel) = state.toplevel_mut(id) {
            toplevel
                .configure
                .with_pending_state(|s| s.states.remove(ToplevelStates::RESIZING));
            xdg::send_toplevel_configure(state, id);
        }
    }
    Some(session)
}

/// Mark a toplevel as minimized
pub(crate) fn minimize(state: &mut State, id: SurfaceId) {
    let Some(surface) = state.surfaces.get_mut(&id) else {
        return;
    };
    if surface.minimized {
        return;
    }
    surface.minimized = true;
    debug!(surface = %id, "minimized");
    state.emit(ShellEvent::Minimized { surface: id });
    clear_focus(state, id);
    cancel_interactive(state, id);
}

impl Compositor {
    /// Record the surface under the pointer, as decided by the input layer
    pub fn set_pointer_focus(&self, focus: Option<SurfaceId>) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            if let Some(id) = focus {
                state.surfaces.get(&id).ok_or(ShellError::UnknownSurface(id))?;
            }
            state.seat.pointer_focus = focus;
            Ok(())
        })
    }

    /// Record the surface receiving keyboard input, as decided by the input layer
    pub fn set_keyboard_focus(&self, focus: Option<SurfaceId>) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            if let Some(id) = focus {
                state.surfaces.get(&id).ok_or(ShellError::UnknownSurface(id))?;
            }
            state.seat.keyboard_focus = focus;
            Ok(())
        })
    }

    /// Finish the interactive move or resize in progress
    pub fn end_interactive(&self) {
        self.with_state_mut(|state| {
            if let Some(id) = state.seat.interactive.map(|s| s.surface) {
                end_session(state, id);
            }
        })
    }

    /// Finish the drag and drop operation in progress
    pub fn end_drag(&self) {
        self.with_state_mut(|state| {
            if state.seat.drag.take().is_some() {
                state.emit(ShellEvent::DragEnded);
            }
        })
    }

    /// Minimize or restore a surface
    pub fn set_minimized(&self, id: SurfaceId, minimized: bool) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            let surface = state.surfaces.get_mut(&id).ok_or(ShellError::UnknownSurface(id))?;
            if minimized {
                minimize(state, id);
            } else {
                surface.minimized = false;
            }
            Ok(())
        })
    }
}
