//! Surfaces and their double-buffered state
//!
//! Every `wl_surface` is represented by a [`SurfaceData`] stored in the compositor state,
//! addressed by its [`SurfaceId`]. Requests only ever modify the *pending* half of its
//! [`SurfaceCachedState`]; `wl_surface.commit` promotes it to *current* atomically and then
//! lets the role of the surface (if any) react to the new state.
//!
//! Mapped surfaces are ordered in a compositor-wide [`Stack`], which renderers traverse
//! back to front while holding the state lock:
//!
//! ```
//! use trellis::{config::ShellConfig, state::Compositor};
//!
//! let compositor = Compositor::new(ShellConfig::default());
//! compositor.with_state(|state| {
//!     for surface in state.stack().iter() {
//!         let data = state.surface(surface).unwrap();
//!         let _geometry = data.global_geometry();
//!         // draw it
//!     }
//! });
//! ```

use tracing::trace;

mod cache;
pub(crate) mod handlers;
mod tree;

pub use self::cache::{
    BufferAssignment, BufferInfo, Cacheable, Cached, PendingChanges, RectangleKind, RegionAttributes,
    SurfaceCachedState,
};
pub use self::tree::Stack;
pub(crate) use self::tree::{descendants, is_ancestor_or_self, TraversalAction};

use crate::state::{ShellEvent, State};
use crate::utils::{ClientId, Logical, Point, Rectangle, SurfaceId};
use crate::wayland::protocol::ProtocolError;
use crate::wayland::shell::{self, Role, RoleKind};

/// Data associated with a surface
#[derive(Debug)]
pub struct SurfaceData {
    pub(crate) id: SurfaceId,
    pub(crate) client: ClientId,
    pub(crate) cached: Cached<SurfaceCachedState>,
    pub(crate) dirty: PendingChanges,
    pub(crate) role: Option<Role>,
    pub(crate) role_kind: Option<RoleKind>,
    pub(crate) xdg_surface: bool,
    pub(crate) mapped: bool,
    pub(crate) minimized: bool,
    pub(crate) position: Point<i32, Logical>,
    pub(crate) parent: Option<SurfaceId>,
    pub(crate) children: Vec<SurfaceId>,
}

impl SurfaceData {
    pub(crate) fn new(id: SurfaceId, client: ClientId) -> SurfaceData {
        SurfaceData {
            id,
            client,
            cached: Cached::default(),
            dirty: PendingChanges::empty(),
            role: None,
            role_kind: None,
            xdg_surface: false,
            mapped: false,
            minimized: false,
            position: Point::default(),
            parent: None,
            children: Vec::new(),
        }
    }

    /// Handle of this surface
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// Client owning this surface
    pub fn client(&self) -> ClientId {
        self.client
    }

    /// The last committed state
    pub fn current(&self) -> &SurfaceCachedState {
        self.cached.current()
    }

    /// The state the next commit will apply
    pub fn pending(&self) -> &SurfaceCachedState {
        self.cached.pending()
    }

    /// Parts of the pending state touched since the last commit
    pub fn pending_changes(&self) -> PendingChanges {
        self.dirty
    }

    /// The role object currently attached to this surface
    pub fn role(&self) -> Option<&Role> {
        self.role.as_ref()
    }

    /// The kind of role this surface was given, even if its role object is gone
    pub fn role_kind(&self) -> Option<RoleKind> {
        self.role_kind
    }

    /// Whether the surface is currently mapped
    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    /// Whether the surface was minimized
    pub fn is_minimized(&self) -> bool {
        self.minimized
    }

    /// Location of the surface origin in the global space
    pub fn position(&self) -> Point<i32, Logical> {
        self.position
    }

    /// Parent surface, for popups and toplevels with a parent toplevel
    pub fn parent(&self) -> Option<SurfaceId> {
        self.parent
    }

    /// Child surfaces, in creation order
    pub fn children(&self) -> &[SurfaceId] {
        &self.children
    }

    /// Whether a buffer is attached, or an attach is pending
    pub fn has_buffer_or_pending(&self) -> bool {
        self.current().buffer_info().is_some()
            || matches!(self.pending().buffer, Some(BufferAssignment::NewBuffer(_)))
    }

    /// Window geometry in surface-local coordinates
    pub fn window_geometry(&self) -> Rectangle<i32, Logical> {
        self.current().effective_window_geometry()
    }

    /// Window geometry in the global space
    pub fn global_geometry(&self) -> Rectangle<i32, Logical> {
        let geometry = self.window_geometry();
        Rectangle::new(self.position + geometry.loc, geometry.size)
    }

    /// Area covered by the buffer in the global space
    pub fn bounding_box(&self) -> Rectangle<i32, Logical> {
        let size = self.current().surface_size().unwrap_or_default();
        Rectangle::new(self.position, size)
    }
}

/// Apply the pending state of a surface
#[profiling::function]
pub(crate) fn commit(state: &mut State, id: SurfaceId) -> Result<(), ProtocolError> {
    shell::pre_commit(state, id)?;

    let Some(surface) = state.surfaces.get_mut(&id) else {
        return Ok(());
    };
    let dirty = std::mem::replace(&mut surface.dirty, PendingChanges::empty());
    surface.cached.commit();
    let has_role = surface.role.is_some();
    let damage = surface.current().damage.to_vec();
    trace!(surface = %id, ?dirty, "commit");

    if !has_role && surface.current().buffer.is_none() {
        // null commit
        return Ok(());
    }

    shell::role_commit(state, id, dirty);

    let Some(surface) = state.surfaces.get(&id) else {
        return Ok(());
    };
    if !damage.is_empty() || dirty.contains(PendingChanges::BUFFER) {
        let mapped = surface.mapped;
        let bbox = surface.bounding_box();
        state.emit(ShellEvent::Damaged { surface: id, damage });
        if mapped {
            let outputs = state.outputs.intersecting(bbox);
            if !outputs.is_empty() {
                state.emit(ShellEvent::OutputsDamaged { surface: id, outputs });
            }
        }
    }
    Ok(())
}

/// Emit a geometry notification for a mapped surface
pub(crate) fn geometry_changed(state: &mut State, id: SurfaceId) {
    if let Some(surface) = state.surfaces.get(&id).filter(|s| s.mapped) {
        let geometry = surface.global_geometry();
        state.emit(ShellEvent::GeometryChanged { surface: id, geometry });
    }
}

/// Move a surface and keep its popups attached to it
pub(crate) fn set_position(state: &mut State, id: SurfaceId, position: Point<i32, Logical>) {
    let Some(surface) = state.surfaces.get_mut(&id) else {
        return;
    };
    if surface.position == position {
        return;
    }
    surface.position = position;
    geometry_changed(state, id);
    shell::xdg::update_popup_positions(state, id);
}

/// Destroy a surface
///
/// With `checked`, fails if a role object that has to be destroyed first is still alive.
pub(crate) fn destroy_surface(state: &mut State, id: SurfaceId, checked: bool) -> Result<(), ProtocolError> {
    let Some(surface) = state.surfaces.get(&id) else {
        return Ok(());
    };
    if checked
        && (surface.xdg_surface || matches!(surface.role, Some(Role::SessionLock(_))))
    {
        return Err(ProtocolError::SurfaceDefunctRoleObject(id));
    }

    shell::destroy_role(state, id);
    crate::wayland::seat::forget_surface(state, id);

    let Some(surface) = state.surfaces.shift_remove(&id) else {
        return Ok(());
    };
    if let Some(parent) = surface.parent.and_then(|p| state.surfaces.get_mut(&p)) {
        parent.children.retain(|c| *c != id);
    }
    for child in surface.children {
        if let Some(data) = state.surfaces.get_mut(&child) {
            data.parent = None;
            state.emit(ShellEvent::ParentChanged {
                surface: child,
                parent: None,
            });
        }
    }
    if state.stack.remove(id) {
        state.emit(ShellEvent::OrderChanged);
    }
    trace!(surface = %id, "surface destroyed");
    state.emit(ShellEvent::SurfaceDestroyed { surface: id });
    Ok(())
}

/// Destroy every resource of a client
pub(crate) fn destroy_client_resources(state: &mut State, client: ClientId) {
    let surfaces: Vec<SurfaceId> = state
        .surfaces
        .values()
        .filter(|s| s.client == client)
        .map(|s| s.id)
        .collect();
    // children go first, so that popups are dismissed before their parents
    for id in surfaces.iter().rev() {
        if let Some(surface) = state.surfaces.get_mut(id) {
            surface.xdg_surface = false;
        }
        let _ = destroy_surface(state, *id, false);
    }
    state.positioners.retain(|_, p| p.client != client);
    crate::wayland::session_lock::forget_client(state, client);
}
