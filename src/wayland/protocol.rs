//! Typed protocol messages
//!
//! The `wayland-server` bindings in [`frontend`](crate::wayland::frontend) turn every
//! request into a [`Request`], hand it to [`Compositor::dispatch`](crate::state::Compositor::dispatch)
//! and send the [`ClientEvent`]s queued for each client. Headless embedders and tests drive
//! the same entry point directly.
//!
//! Requests are grouped by the interface they target, and address their object by the
//! [`SurfaceId`] of the surface it extends (`xdg_surface`, `xdg_toplevel`, `xdg_popup` and
//! the decoration object are all one-per-surface).

use wayland_protocols::ext::session_lock::v1::server::{
    ext_session_lock_surface_v1::{self, ExtSessionLockSurfaceV1},
    ext_session_lock_v1::{self, ExtSessionLockV1},
};
use wayland_protocols::xdg::decoration::zv1::server::zxdg_toplevel_decoration_v1::{
    self, ZxdgToplevelDecorationV1,
};
use wayland_protocols::xdg::shell::server::{
    xdg_popup::{self, XdgPopup},
    xdg_positioner::{self, XdgPositioner},
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};
use wayland_server::backend::protocol::Interface;
use wayland_server::protocol::{
    wl_data_device::{self, WlDataDevice},
    __interfaces::WL_DISPLAY_INTERFACE,
    wl_pointer::{self, WlPointer},
    wl_surface::{self, WlSurface},
};
use wayland_server::Resource;

// wayland-server does not generate a `wl_display` module (the display object is
// handled by the backend), so the `wl_display.error` codes from wayland.xml are
// mirrored here.
const WL_DISPLAY_ERROR_INVALID_OBJECT: u32 = 0;
const WL_DISPLAY_ERROR_INVALID_METHOD: u32 = 1;

use crate::utils::{Buffer, Logical, OutputId, Point, PositionerId, Rectangle, Serial, Size, SurfaceId};
use crate::wayland::compositor::{BufferInfo, RegionAttributes};
use crate::wayland::shell::xdg::{
    Anchor, ConstraintAdjustment, DecorationMode, Gravity, ResizeEdge, ToplevelStates,
};
use crate::wayland::shell::RoleKind;

/// A request sent by a client
#[derive(Debug, Clone, PartialEq)]
pub enum Request {
    /// `wl_surface` requests
    Surface(SurfaceId, SurfaceRequest),
    /// `xdg_wm_base.get_xdg_surface` and `xdg_surface` requests
    XdgSurface(SurfaceId, XdgSurfaceRequest),
    /// `xdg_toplevel` requests
    Toplevel(SurfaceId, ToplevelRequest),
    /// `xdg_popup` requests
    Popup(SurfaceId, PopupRequest),
    /// `xdg_positioner` requests
    Positioner(PositionerId, PositionerRequest),
    /// `zxdg_decoration_manager_v1.get_toplevel_decoration` and `zxdg_toplevel_decoration_v1` requests
    Decoration(SurfaceId, DecorationRequest),
    /// `wl_pointer` requests
    Pointer(PointerRequest),
    /// `wl_data_device` requests
    DataDevice(DataDeviceRequest),
    /// `ext_session_lock_manager_v1`, `ext_session_lock_v1` and `ext_session_lock_surface_v1` requests
    SessionLock(SessionLockRequest),
}

/// Requests of `wl_surface`
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceRequest {
    /// Attach a buffer, `None` removing the current one
    Attach(Option<BufferInfo>),
    /// Move the next buffer relative to the current one
    Offset(Point<i32, Logical>),
    /// Mark a part of the buffer as damaged
    DamageBuffer(Rectangle<i32, Buffer>),
    /// Set the opaque region
    SetOpaqueRegion(Option<RegionAttributes>),
    /// Set the input region
    SetInputRegion(Option<RegionAttributes>),
    /// Set the buffer scale
    SetBufferScale(i32),
    /// Apply the pending state
    Commit,
    /// Destroy the surface
    Destroy,
}

/// Requests of `xdg_surface`
#[derive(Debug, Clone, PartialEq)]
pub enum XdgSurfaceRequest {
    /// `xdg_wm_base.get_xdg_surface`
    Create,
    /// Assign the toplevel role
    GetToplevel,
    /// Assign the popup role
    GetPopup {
        /// Parent surface of the popup
        parent: Option<SurfaceId>,
        /// Positioner describing the placement
        positioner: PositionerId,
    },
    /// Set the window geometry
    SetWindowGeometry(Rectangle<i32, Logical>),
    /// Acknowledge a configure
    AckConfigure(Serial),
    /// Destroy the `xdg_surface`
    Destroy,
}

/// Requests of `xdg_toplevel`
#[derive(Debug, Clone, PartialEq)]
pub enum ToplevelRequest {
    /// Set the parent toplevel
    SetParent(Option<SurfaceId>),
    /// Set the window title
    SetTitle(String),
    /// Set the application id
    SetAppId(String),
    /// Ask for the window menu
    ShowWindowMenu {
        /// Serial of the triggering input event
        serial: Serial,
        /// Location of the menu, surface-local
        location: Point<i32, Logical>,
    },
    /// Start an interactive move
    Move {
        /// Serial of the triggering input event
        serial: Serial,
    },
    /// Start an interactive resize
    Resize {
        /// Serial of the triggering input event
        serial: Serial,
        /// Edges being dragged
        edges: ResizeEdge,
    },
    /// Set the maximum size
    SetMaxSize(Size<i32, Logical>),
    /// Set the minimum size
    SetMinSize(Size<i32, Logical>),
    /// Ask to be maximized
    SetMaximized,
    /// Ask to be unmaximized
    UnsetMaximized,
    /// Ask to be made fullscreen, optionally on a given output
    SetFullscreen(Option<OutputId>),
    /// Ask to leave fullscreen
    UnsetFullscreen,
    /// Ask to be minimized
    SetMinimized,
    /// Destroy the toplevel role object
    Destroy,
}

/// Requests of `xdg_popup`
#[derive(Debug, Clone, PartialEq)]
pub enum PopupRequest {
    /// Take an explicit grab
    Grab {
        /// Serial of the triggering input event
        serial: Serial,
    },
    /// Re-position the popup with a new positioner (version 3 and later)
    Reposition {
        /// The new positioner
        positioner: PositionerId,
        /// Token echoed in the `repositioned` event
        token: u32,
    },
    /// Destroy the popup role object
    Destroy,
}

/// Requests of `xdg_positioner`
#[derive(Debug, Clone, PartialEq)]
pub enum PositionerRequest {
    /// Set the size of the positioned rectangle
    SetSize(Size<i32, Logical>),
    /// Set the anchor rectangle
    SetAnchorRect(Rectangle<i32, Logical>),
    /// Set the anchor edges
    SetAnchor(Anchor),
    /// Set the gravity
    SetGravity(Gravity),
    /// Set the allowed constraint adjustments
    SetConstraintAdjustment(ConstraintAdjustment),
    /// Set the offset from the anchor point
    SetOffset(Point<i32, Logical>),
    /// Make the popup reactive
    SetReactive,
    /// Parent size the placement is computed for
    SetParentSize(Size<i32, Logical>),
    /// Parent configure the placement is computed for
    SetParentConfigure(Serial),
    /// Destroy the positioner
    Destroy,
}

/// Requests of `zxdg_toplevel_decoration_v1`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecorationRequest {
    /// `zxdg_decoration_manager_v1.get_toplevel_decoration`
    Create,
    /// Ask for a decoration mode
    SetMode(DecorationMode),
    /// Let the compositor pick the decoration mode
    UnsetMode,
    /// Destroy the decoration object
    Destroy,
}

/// Requests of `wl_pointer`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerRequest {
    /// Set the cursor image
    SetCursor {
        /// Serial of the enter event
        serial: Serial,
        /// Surface to use as cursor, `None` hiding it
        surface: Option<SurfaceId>,
        /// Hotspot, surface-local
        hotspot: Point<i32, Logical>,
    },
}

/// Requests of `wl_data_device`
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DataDeviceRequest {
    /// Start a drag and drop operation
    StartDrag {
        /// Surface the drag starts on
        origin: SurfaceId,
        /// Surface to use as drag icon
        icon: Option<SurfaceId>,
        /// Serial of the triggering input event
        serial: Serial,
    },
}

/// Requests of the session lock protocol
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionLockRequest {
    /// `ext_session_lock_manager_v1.lock`
    Lock,
    /// Create a lock surface for an output
    GetLockSurface {
        /// The surface to use
        surface: SurfaceId,
        /// Output it should cover
        output: OutputId,
    },
    /// Acknowledge a lock surface configure
    AckConfigure {
        /// The lock surface
        surface: SurfaceId,
        /// The acknowledged serial
        serial: Serial,
    },
    /// Destroy a lock surface
    DestroyLockSurface(SurfaceId),
    /// Unlock the session and destroy the lock object
    Unlock,
}

/// An event sent to a client
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    /// `xdg_toplevel.configure` followed by `xdg_surface.configure`
    ToplevelConfigure {
        /// The toplevel
        surface: SurfaceId,
        /// Serial to acknowledge
        serial: Serial,
        /// Suggested size, `None` letting the client decide
        size: Option<Size<i32, Logical>>,
        /// Window states, as understood by the client's protocol version
        states: ToplevelStates,
    },
    /// `zxdg_toplevel_decoration_v1.configure`, sent right before the toplevel configure
    DecorationConfigure {
        /// The toplevel
        surface: SurfaceId,
        /// Decoration mode to use
        mode: DecorationMode,
    },
    /// `xdg_popup.configure` followed by `xdg_surface.configure`
    PopupConfigure {
        /// The popup
        surface: SurfaceId,
        /// Serial to acknowledge
        serial: Serial,
        /// Placement relative to the parent's window geometry
        geometry: Rectangle<i32, Logical>,
    },
    /// `xdg_popup.repositioned`, sent right before the matching popup configure
    Repositioned {
        /// The popup
        surface: SurfaceId,
        /// Token of the reposition request
        token: u32,
    },
    /// `xdg_popup.popup_done`
    PopupDone {
        /// The dismissed popup
        surface: SurfaceId,
    },
    /// `xdg_toplevel.close`
    Close {
        /// The toplevel
        surface: SurfaceId,
    },
    /// `ext_session_lock_surface_v1.configure`
    LockSurfaceConfigure {
        /// The lock surface
        surface: SurfaceId,
        /// Serial to acknowledge
        serial: Serial,
        /// Size of the output
        size: Size<i32, Logical>,
    },
    /// `ext_session_lock_v1.locked`
    Locked,
    /// `ext_session_lock_v1.finished`
    LockFinished,
    /// `wl_display.error`, after which the client is disconnected
    Error {
        /// Interface of the faulty object
        interface: &'static str,
        /// Error code, as defined by that interface
        code: u32,
        /// Human readable description
        message: String,
    },
}

/// Protocol errors
///
/// Every protocol error is fatal: the client gets an [`ClientEvent::Error`] and is disconnected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    /// The request targets an object that does not exist or belongs to another client
    #[error("invalid object {0}")]
    InvalidObject(String),
    /// The request is not supported by the protocol version of the object
    #[error("{request} is not supported by this version of {interface}")]
    InvalidMethod {
        /// Interface of the object
        interface: &'static str,
        /// Name of the request
        request: &'static str,
    },
    /// The buffer scale is not positive
    #[error("buffer scale {0} is not positive")]
    InvalidScale(i32),
    /// The surface was destroyed before its role object
    #[error("{0} was destroyed before its role object")]
    SurfaceDefunctRoleObject(SurfaceId),
    /// The surface already has another role
    #[error("{surface} already has a role, cannot become a {requested:?}")]
    RoleAlreadyAssigned {
        /// The surface
        surface: SurfaceId,
        /// The role that was asked for
        requested: RoleKind,
    },
    /// The surface has a buffer attached or already carries an xdg role object
    #[error("{0} already has a buffer or role object")]
    AlreadyConstructed(SurfaceId),
    /// The popup parent is missing or would create a cycle
    #[error("invalid popup parent: {0}")]
    InvalidPopupParent(&'static str),
    /// The positioner lacks a size or anchor rectangle
    #[error("{0} is incomplete")]
    InvalidPositioner(PositionerId),
    /// The grabbing popup is not on top of its parent's popups
    #[error("{0} is not the topmost popup")]
    NotTheTopmostPopup(SurfaceId),
    /// The `xdg_surface` has no role yet
    #[error("{0} has no xdg role")]
    NotConstructed(SurfaceId),
    /// A buffer was committed before the first configure was acknowledged
    #[error("{0} committed a buffer before acknowledging a configure")]
    UnconfiguredBuffer(SurfaceId),
    /// An acknowledged serial does not match any pending configure
    #[error("serial {0} does not match any pending configure")]
    InvalidSerial(Serial),
    /// The `xdg_surface` was destroyed before its role object
    #[error("the xdg_surface of {0} was destroyed before its role object")]
    DefunctRoleObject(SurfaceId),
    /// The window geometry is empty
    #[error("window geometry of {0} must be positive")]
    InvalidWindowGeometry(SurfaceId),
    /// Invalid positioner input
    #[error("invalid positioner input: {0}")]
    InvalidInput(&'static str),
    /// The popup was already mapped when taking a grab
    #[error("{0} cannot take a grab once mapped")]
    InvalidGrab(SurfaceId),
    /// The resize edge is not one defined by the protocol
    #[error("invalid resize edge {0}")]
    InvalidResizeEdge(u32),
    /// The toplevel parent would create a cycle
    #[error("invalid parent for {0}")]
    InvalidParent(SurfaceId),
    /// Negative minimum or maximum size
    #[error("invalid size for {0}")]
    InvalidSize(SurfaceId),
    /// The toplevel already has a decoration object
    #[error("{0} already has a decoration object")]
    DecorationAlreadyConstructed(SurfaceId),
    /// The decoration object outlived its toplevel
    #[error("the toplevel of {0} was destroyed before its decoration object")]
    DecorationOrphaned(SurfaceId),
    /// The decoration object was created after a buffer was attached
    #[error("{0} got a decoration object after attaching a buffer")]
    DecorationUnconfiguredBuffer(SurfaceId),
    /// A lock surface committed a buffer before acknowledging a configure
    #[error("lock surface {0} committed before acknowledging a configure")]
    LockCommitBeforeFirstAck(SurfaceId),
    /// A lock surface acknowledged an unknown serial
    #[error("lock surface {surface} acknowledged unknown serial {serial}")]
    LockInvalidSerial {
        /// The lock surface
        surface: SurfaceId,
        /// The serial
        serial: Serial,
    },
    /// A lock surface already exists for this output
    #[error("a lock surface already exists for {0}")]
    LockDuplicateOutput(OutputId),
    /// The lock surface already has a buffer attached
    #[error("{0} has a buffer attached and cannot become a lock surface")]
    LockAlreadyConstructed(SurfaceId),
}

impl ProtocolError {
    /// Interface the error is posted on
    pub fn interface(&self) -> &'static str {
        self.wire().0.name
    }

    /// Error code, as defined by [`ProtocolError::interface`]
    pub fn code(&self) -> u32 {
        self.wire().1
    }

    /// The surface whose role object the error concerns, if any
    pub fn surface(&self) -> Option<SurfaceId> {
        match *self {
            ProtocolError::SurfaceDefunctRoleObject(id)
            | ProtocolError::RoleAlreadyAssigned { surface: id, .. }
            | ProtocolError::AlreadyConstructed(id)
            | ProtocolError::NotTheTopmostPopup(id)
            | ProtocolError::NotConstructed(id)
            | ProtocolError::UnconfiguredBuffer(id)
            | ProtocolError::DefunctRoleObject(id)
            | ProtocolError::InvalidWindowGeometry(id)
            | ProtocolError::InvalidGrab(id)
            | ProtocolError::InvalidParent(id)
            | ProtocolError::InvalidSize(id)
            | ProtocolError::DecorationAlreadyConstructed(id)
            | ProtocolError::DecorationOrphaned(id)
            | ProtocolError::DecorationUnconfiguredBuffer(id)
            | ProtocolError::LockCommitBeforeFirstAck(id)
            | ProtocolError::LockInvalidSerial { surface: id, .. }
            | ProtocolError::LockAlreadyConstructed(id) => Some(id),
            ProtocolError::InvalidObject(_)
            | ProtocolError::InvalidMethod { .. }
            | ProtocolError::InvalidScale(_)
            | ProtocolError::InvalidPopupParent(_)
            | ProtocolError::InvalidPositioner(_)
            | ProtocolError::InvalidSerial(_)
            | ProtocolError::InvalidInput(_)
            | ProtocolError::InvalidResizeEdge(_)
            | ProtocolError::LockDuplicateOutput(_) => None,
        }
    }

    fn wire(&self) -> (&'static Interface, u32) {
        match self {
            ProtocolError::InvalidObject(_) => (&WL_DISPLAY_INTERFACE, WL_DISPLAY_ERROR_INVALID_OBJECT),
            ProtocolError::InvalidMethod { .. } => (&WL_DISPLAY_INTERFACE, WL_DISPLAY_ERROR_INVALID_METHOD),
            ProtocolError::InvalidScale(_) => (WlSurface::interface(), wl_surface::Error::InvalidScale as u32),
            ProtocolError::SurfaceDefunctRoleObject(_) => {
                (WlSurface::interface(), wl_surface::Error::DefunctRoleObject as u32)
            }
            ProtocolError::RoleAlreadyAssigned { requested, .. } => match requested {
                RoleKind::Toplevel | RoleKind::Popup => (XdgWmBase::interface(), xdg_wm_base::Error::Role as u32),
                RoleKind::Cursor => (WlPointer::interface(), wl_pointer::Error::Role as u32),
                RoleKind::DragIcon => (WlDataDevice::interface(), wl_data_device::Error::Role as u32),
                RoleKind::SessionLock => (ExtSessionLockV1::interface(), ext_session_lock_v1::Error::Role as u32),
            },
            ProtocolError::NotTheTopmostPopup(_) => {
                (XdgWmBase::interface(), xdg_wm_base::Error::NotTheTopmostPopup as u32)
            }
            ProtocolError::InvalidPopupParent(_) => {
                (XdgWmBase::interface(), xdg_wm_base::Error::InvalidPopupParent as u32)
            }
            ProtocolError::InvalidPositioner(_) => {
                (XdgWmBase::interface(), xdg_wm_base::Error::InvalidPositioner as u32)
            }
            ProtocolError::NotConstructed(_) => (XdgSurface::interface(), xdg_surface::Error::NotConstructed as u32),
            ProtocolError::AlreadyConstructed(_) => {
                (XdgSurface::interface(), xdg_surface::Error::AlreadyConstructed as u32)
            }
            ProtocolError::UnconfiguredBuffer(_) => {
                (XdgSurface::interface(), xdg_surface::Error::UnconfiguredBuffer as u32)
            }
            ProtocolError::InvalidSerial(_) => (XdgSurface::interface(), xdg_surface::Error::InvalidSerial as u32),
            ProtocolError::InvalidWindowGeometry(_) => {
                (XdgSurface::interface(), xdg_surface::Error::InvalidSize as u32)
            }
            ProtocolError::DefunctRoleObject(_) => {
                (XdgSurface::interface(), xdg_surface::Error::DefunctRoleObject as u32)
            }
            ProtocolError::InvalidInput(_) => (XdgPositioner::interface(), xdg_positioner::Error::InvalidInput as u32),
            ProtocolError::InvalidGrab(_) => (XdgPopup::interface(), xdg_popup::Error::InvalidGrab as u32),
            ProtocolError::InvalidResizeEdge(_) => {
                (XdgToplevel::interface(), xdg_toplevel::Error::InvalidResizeEdge as u32)
            }
            ProtocolError::InvalidParent(_) => (XdgToplevel::interface(), xdg_toplevel::Error::InvalidParent as u32),
            ProtocolError::InvalidSize(_) => (XdgToplevel::interface(), xdg_toplevel::Error::InvalidSize as u32),
            ProtocolError::DecorationUnconfiguredBuffer(_) => (
                ZxdgToplevelDecorationV1::interface(),
                zxdg_toplevel_decoration_v1::Error::UnconfiguredBuffer as u32,
            ),
            ProtocolError::DecorationAlreadyConstructed(_) => (
                ZxdgToplevelDecorationV1::interface(),
                zxdg_toplevel_decoration_v1::Error::AlreadyConstructed as u32,
            ),
            ProtocolError::DecorationOrphaned(_) => (
                ZxdgToplevelDecorationV1::interface(),
                zxdg_toplevel_decoration_v1::Error::Orphaned as u32,
            ),
            ProtocolError::LockCommitBeforeFirstAck(_) => (
                ExtSessionLockSurfaceV1::interface(),
                ext_session_lock_surface_v1::Error::CommitBeforeFirstAck as u32,
            ),
            ProtocolError::LockInvalidSerial { .. } => (
                ExtSessionLockSurfaceV1::interface(),
                ext_session_lock_surface_v1::Error::InvalidSerial as u32,
            ),
            ProtocolError::LockDuplicateOutput(_) => (
                ExtSessionLockV1::interface(),
                ext_session_lock_v1::Error::DuplicateOutput as u32,
            ),
            ProtocolError::LockAlreadyConstructed(_) => (
                ExtSessionLockV1::interface(),
                ext_session_lock_v1::Error::AlreadyConstructed as u32,
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_codes() {
        let surface = SurfaceId(3);
        assert_eq!(ProtocolError::AlreadyConstructed(surface).code(), 2);
        assert_eq!(ProtocolError::NotConstructed(surface).code(), 1);
        assert_eq!(ProtocolError::InvalidPopupParent("null").interface(), "xdg_wm_base");
        let role = ProtocolError::RoleAlreadyAssigned {
            surface,
            requested: RoleKind::Cursor,
        };
        assert_eq!((role.interface(), role.code()), ("wl_pointer", 0));
        let role = ProtocolError::RoleAlreadyAssigned {
            surface,
            requested: RoleKind::SessionLock,
        };
        assert_eq!((role.interface(), role.code()), ("ext_session_lock_v1", 2));
    }

    #[test]
    fn every_error_names_a_real_interface() {
        let surface = SurfaceId(1);
        let errors = [
            ProtocolError::InvalidObject("wl_surface@9".into()),
            ProtocolError::InvalidScale(0),
            ProtocolError::SurfaceDefunctRoleObject(surface),
            ProtocolError::InvalidWindowGeometry(surface),
            ProtocolError::InvalidInput("negative size"),
            ProtocolError::InvalidGrab(surface),
            ProtocolError::InvalidResizeEdge(42),
            ProtocolError::DecorationOrphaned(surface),
            ProtocolError::LockCommitBeforeFirstAck(surface),
            ProtocolError::LockDuplicateOutput(OutputId(2)),
        ];
        let expected = [
            ("wl_display", 0),
            ("wl_surface", 0),
            ("wl_surface", 4),
            ("xdg_surface", 5),
            ("xdg_positioner", 0),
            ("xdg_popup", 0),
            ("xdg_toplevel", 0),
            ("zxdg_toplevel_decoration_v1", 2),
            ("ext_session_lock_surface_v1", 0),
            ("ext_session_lock_v1", 3),
        ];
        for (err, expected) in errors.iter().zip(expected) {
            assert_eq!((err.interface(), err.code()), expected, "{:?}", err);
        }
    }

    #[test]
    fn messages_name_the_object() {
        let err = ProtocolError::UnconfiguredBuffer(SurfaceId(7));
        assert_eq!(
            err.to_string(),
            "wl_surface@7 committed a buffer before acknowledging a configure"
        );
    }
}
