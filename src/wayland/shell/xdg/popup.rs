use tracing::{debug, trace};

use super::{PopupState, PositionerState, XDG_POPUP_REPOSITION_SINCE};
use crate::state::{Compositor, ShellError, ShellEvent, State};
use crate::utils::{Logical, Point, Rectangle, Serial, SurfaceId};
use crate::wayland::compositor::{self, descendants, PendingChanges, TraversalAction};
use crate::wayland::protocol::{ClientEvent, ProtocolError};
use crate::wayland::shell::configure::ConfigureTracker;
use crate::wayland::shell::{self, RoleKind};

/// Role of a menu or tooltip (`xdg_popup`)
#[derive(Debug)]
pub struct PopupRole {
    pub(crate) configure: ConfigureTracker<PopupState>,
    pub(crate) positioner: PositionerState,
    pub(crate) grab: Option<Serial>,
    pub(crate) pending_reposition: Option<u32>,
    pub(crate) dismissed: bool,
    pub(crate) bounds: Option<Rectangle<i32, Logical>>,
    pub(crate) version: u32,
}

/// Error when configuring a popup from the compositor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PopupConfigureError {
    /// The popup got its initial configure and its client is too old to be repositioned
    #[error("the popup has already been configured")]
    AlreadyConfigured,
    /// The popup got its initial configure and its positioner is not reactive
    #[error("the popup positioner is not reactive")]
    NotReactive,
}

impl PopupRole {
    pub(crate) fn new(positioner: PositionerState, version: u32) -> PopupRole {
        PopupRole {
            configure: ConfigureTracker::default(),
            positioner,
            grab: None,
            pending_reposition: None,
            dismissed: false,
            bounds: None,
            version,
        }
    }

    /// The state of the last acknowledged configure
    pub fn current(&self) -> &PopupState {
        &self.configure.current
    }

    /// The configure negotiation of this popup
    pub fn configure_tracker(&self) -> &ConfigureTracker<PopupState> {
        &self.configure
    }

    /// The positioner the popup is placed with
    pub fn positioner(&self) -> &PositionerState {
        &self.positioner
    }

    /// Placement relative to the parent window geometry, as acknowledged by the client
    pub fn geometry(&self) -> Rectangle<i32, Logical> {
        self.current().geometry
    }

    /// Serial of the grab requested by the popup
    pub fn grab(&self) -> Option<Serial> {
        self.grab
    }

    /// Whether the popup was dismissed by the compositor
    pub fn is_dismissed(&self) -> bool {
        self.dismissed
    }

    /// Area the popup is constrained to, in the global space
    pub fn bounds(&self) -> Option<Rectangle<i32, Logical>> {
        self.bounds
    }

    /// `xdg_wm_base` version of the owning client
    pub fn version(&self) -> u32 {
        self.version
    }

    #[profiling::function]
    pub(crate) fn commit_hook(state: &mut State, id: SurfaceId, _dirty: PendingChanges) {
        let Some(surface) = state.surfaces.get(&id) else {
            return;
        };
        let has_buffer = surface.current().buffer_info().is_some();
        let was_mapped = surface.mapped;
        let Some(popup) = surface.role().and_then(|r| r.as_popup()) else {
            return;
        };
        if popup.dismissed {
            return;
        }
        let initial_sent = popup.configure.initial_configure_sent;
        let configured = popup.configure.configured;

        if was_mapped && !has_buffer {
            dismiss_child_popups(state, id);
            shell::unmap(state, id);
            if let Some(popup) = state.popup_mut(id) {
                popup.configure.reset();
            }
            return;
        }

        if !initial_sent {
            let parent_mapped = state
                .surfaces
                .get(&id)
                .and_then(|s| s.parent)
                .and_then(|p| state.surfaces.get(&p))
                .map(|p| p.mapped)
                .unwrap_or(false);
            if !parent_mapped {
                debug!(surface = %id, "popup committed over an unmapped parent");
                dismiss_popup_tree(state, id);
                return;
            }
            send_popup_configure(state, id);
            return;
        }

        if has_buffer && !was_mapped && configured {
            if let Some(surface) = state.surfaces.get_mut(&id) {
                surface.mapped = true;
            }
            debug!(surface = %id, "popup mapped");
            if state.stack.raise(id) {
                state.emit(ShellEvent::OrderChanged);
            }
            state.emit(ShellEvent::Mapped { surface: id });
            if !position_popup(state, id) {
                compositor::geometry_changed(state, id);
            }
        } else {
            position_popup(state, id);
        }
    }
}

/// Origin of the window geometry of a surface, in the global space
fn geometry_origin(state: &State, id: SurfaceId) -> Option<Point<i32, Logical>> {
    let surface = state.surfaces.get(&id)?;
    Some(surface.position + surface.window_geometry().loc)
}

/// The area a popup has to fit in, relative to its parent's window geometry
///
/// An empty rectangle leaves the popup unconstrained.
pub(crate) fn constraint_target(state: &State, id: SurfaceId) -> Rectangle<i32, Logical> {
    let Some(surface) = state.surfaces.get(&id) else {
        return Rectangle::zero();
    };
    let Some(parent_origin) = surface.parent.and_then(|p| geometry_origin(state, p)) else {
        return Rectangle::zero();
    };
    let bounds = surface
        .role()
        .and_then(|r| r.as_popup())
        .and_then(|p| p.bounds)
        .or(state.config.popup_bounds)
        .or_else(|| {
            state
                .config
                .constrain_popups_to_output
                .then(|| state.outputs.current().map(|o| o.geometry()))
                .flatten()
        });
    match bounds {
        Some(bounds) => Rectangle::new(bounds.loc - parent_origin, bounds.size),
        None => Rectangle::zero(),
    }
}

/// Place a popup and send it a configure
pub(crate) fn send_popup_configure(state: &mut State, id: SurfaceId) -> Option<Serial> {
    let target = constraint_target(state, id);
    let surface = state.surfaces.get_mut(&id)?;
    let client = surface.client;
    let popup = surface.role.as_mut()?.as_popup_mut()?;

    let positioner = popup.positioner;
    let geometry = positioner.get_unconstrained_geometry(target);
    popup.configure.with_pending_state(|s| {
        s.positioner = positioner;
        s.geometry = geometry;
    });
    let configure = popup.configure.send(&state.serials);
    let token = popup.pending_reposition.take();

    trace!(surface = %id, serial = ?configure.serial, ?geometry, "popup configure");
    if let Some(token) = token {
        state.send_event(client, ClientEvent::Repositioned { surface: id, token });
    }
    state.send_event(
        client,
        ClientEvent::PopupConfigure {
            surface: id,
            serial: configure.serial,
            geometry,
        },
    );
    Some(configure.serial)
}

/// Handle `xdg_surface.ack_configure` for a popup
pub(crate) fn ack_configure(state: &mut State, id: SurfaceId, serial: Serial) -> Result<(), ProtocolError> {
    let popup = state.popup_mut(id).ok_or(ProtocolError::NotConstructed(id))?;
    popup
        .configure
        .ack(serial)
        .map_err(|_| ProtocolError::InvalidSerial(serial))?;
    trace!(surface = %id, ?serial, "popup configure acked");
    Ok(())
}

/// Handle `xdg_popup.reposition`
pub(crate) fn reposition(state: &mut State, id: SurfaceId, positioner: PositionerState, token: u32) {
    let Some(popup) = state.popup_mut(id) else {
        return;
    };
    if popup.dismissed {
        return;
    }
    popup.positioner = positioner;
    popup.pending_reposition = Some(token);
    send_popup_configure(state, id);
}

/// Move a popup to the place its acknowledged geometry gives it
///
/// Returns whether the position changed.
fn position_popup(state: &mut State, id: SurfaceId) -> bool {
    let Some(surface) = state.surfaces.get(&id) else {
        return false;
    };
    let Some(popup) = surface.role().and_then(|r| r.as_popup()) else {
        return false;
    };
    let Some(parent_origin) = surface.parent.and_then(|p| geometry_origin(state, p)) else {
        return false;
    };
    let position = parent_origin + popup.geometry().loc - surface.window_geometry().loc;
    if position == surface.position {
        return false;
    }
    compositor::set_position(state, id, position);
    true
}

/// Keep the popups of a surface attached to it after it moved
///
/// Reactive popups are placed again and get a new configure if their geometry changed.
pub(crate) fn update_popup_positions(state: &mut State, parent: SurfaceId) {
    let Some(children) = state.surfaces.get(&parent).map(|s| s.children.clone()) else {
        return;
    };
    for child in children {
        let Some(popup) = state.popup(child).filter(|p| !p.dismissed) else {
            continue;
        };
        let reactive = popup.positioner.reactive
            && popup.version >= XDG_POPUP_REPOSITION_SINCE
            && popup.configure.initial_configure_sent;
        if reactive {
            let sent = popup.configure.current_server_state().geometry;
            let geometry = popup
                .positioner
                .get_unconstrained_geometry(constraint_target(state, child));
            if geometry != sent {
                debug!(surface = %child, ?geometry, "reactive popup placed again");
                send_popup_configure(state, child);
            }
        }
        position_popup(state, child);
    }
}

/// Dismiss a popup and every popup above it, the topmost first
pub(crate) fn dismiss_popup_tree(state: &mut State, root: SurfaceId) {
    let mut popups = descendants(&state.surfaces, root, |s| {
        if s.role_kind == Some(RoleKind::Popup) {
            TraversalAction::DoChildren
        } else {
            TraversalAction::SkipChildren
        }
    });
    popups.push(root);

    for id in popups {
        let Some(surface) = state.surfaces.get_mut(&id) else {
            continue;
        };
        let client = surface.client;
        let Some(popup) = surface.role.as_mut().and_then(|r| r.as_popup_mut()) else {
            continue;
        };
        if popup.dismissed {
            continue;
        }
        popup.dismissed = true;
        popup.grab = None;
        debug!(surface = %id, "popup dismissed");
        state.send_event(client, ClientEvent::PopupDone { surface: id });
        shell::unmap(state, id);
        state.emit(ShellEvent::PopupDismissed { surface: id });
    }
}

/// Dismiss every popup opened on a surface
pub(crate) fn dismiss_child_popups(state: &mut State, parent: SurfaceId) {
    let Some(children) = state.surfaces.get(&parent).map(|s| s.children.clone()) else {
        return;
    };
    for child in children {
        if state.popup(child).is_some() {
            dismiss_popup_tree(state, child);
        }
    }
}

/// Whether no mapped popup was opened on top of this one
pub(crate) fn is_topmost_popup(state: &State, id: SurfaceId) -> bool {
    let mut mapped_popup = false;
    descendants(&state.surfaces, id, |s| {
        if s.role_kind == Some(RoleKind::Popup) {
            mapped_popup |= s.mapped;
            TraversalAction::DoChildren
        } else {
            TraversalAction::SkipChildren
        }
    });
    !mapped_popup
}

/// Raise a surface along with its mapped popups and child windows
pub(crate) fn raise_tree(state: &mut State, id: SurfaceId) {
    let mut tree = descendants(&state.surfaces, id, |_| TraversalAction::DoChildren);
    tree.push(id);
    tree.retain(|s| state.stack.contains(*s));
    if state.stack.raise_all(&tree) {
        trace!(surface = %id, "surface tree raised");
        state.emit(ShellEvent::OrderChanged);
    }
}

impl Compositor {
    /// Constrain a popup to an area of the global space, or lift the constraint
    ///
    /// Takes effect on its next configure.
    pub fn set_popup_bounds(
        &self,
        id: SurfaceId,
        bounds: Option<Rectangle<i32, Logical>>,
    ) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            let popup = state.popup_mut(id).ok_or(ShellError::NotAPopup(id))?;
            popup.bounds = bounds;
            Ok(())
        })
    }

    /// Place a popup again, against its current constraints
    ///
    /// Once the initial configure went out, only reactive popups of clients supporting
    /// repositioning can be configured again.
    pub fn reconstrain_popup(&self, id: SurfaceId) -> Result<Serial, ShellError> {
        self.with_state_mut(|state| {
            let popup = state.popup(id).ok_or(ShellError::NotAPopup(id))?;
            if popup.configure.initial_configure_sent {
                if popup.version < XDG_POPUP_REPOSITION_SINCE {
                    return Err(PopupConfigureError::AlreadyConfigured.into());
                }
                if !popup.positioner.reactive {
                    return Err(PopupConfigureError::NotReactive.into());
                }
            }
            send_popup_configure(state, id).ok_or(ShellError::NotAPopup(id))
        })
    }

    /// Dismiss a popup and the popups opened on top of it
    pub fn dismiss_popup(&self, id: SurfaceId) -> Result<(), ShellError> {
        self.with_state_mut(|state| {
            state.popup(id).ok_or(ShellError::NotAPopup(id))?;
            dismiss_popup_tree(state, id);
            Ok(())
        })
    }
}
