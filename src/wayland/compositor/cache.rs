// Surface state is double-buffered: requests only ever touch the `pending` half of
// a `Cached<T>`, and `wl_surface.commit` turns it into `current` in one step.
//
// The promotion goes through the `Cacheable` trait: `commit` takes a snapshot of the
// pending state (moving out the one-shot values such as the attached buffer and the
// accumulated damage), and `merge_into` applies that snapshot onto the current state.
// Persistent values stay in `pending`, so a later commit without new requests leaves
// `current` unchanged.

use smallvec::SmallVec;

use crate::utils::{Buffer, Logical, Point, Rectangle, Size};

/// Trait representing a value that can be used in double-buffered storage
///
/// [`Cacheable::commit`] produces the update to apply from the pending state,
/// [`Cacheable::merge_into`] applies such an update onto the current state.
pub trait Cacheable: Default {
    /// Produce a new state to be applied from the pending state
    fn commit(&mut self) -> Self;
    /// Merge a state update into the current state
    fn merge_into(self, into: &mut Self);
}

/// A pending/current pair of some double-buffered state
#[derive(Debug, Default)]
pub struct Cached<T> {
    pending: T,
    current: T,
}

impl<T: Cacheable> Cached<T> {
    /// The state the next commit will apply
    pub fn pending(&self) -> &T {
        &self.pending
    }

    pub(crate) fn pending_mut(&mut self) -> &mut T {
        &mut self.pending
    }

    /// The last committed state
    pub fn current(&self) -> &T {
        &self.current
    }

    pub(crate) fn commit(&mut self) {
        let update = self.pending.commit();
        update.merge_into(&mut self.current);
    }
}

bitflags::bitflags! {
    /// Parts of the pending state that were touched since the last commit
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PendingChanges: u32 {
        /// A buffer was attached or removed
        const BUFFER = 1;
        /// The buffer offset changed
        const OFFSET = 1 << 1;
        /// Damage was posted
        const DAMAGE = 1 << 2;
        /// The opaque region changed
        const OPAQUE_REGION = 1 << 3;
        /// The input region changed
        const INPUT_REGION = 1 << 4;
        /// The buffer scale changed
        const SCALE = 1 << 5;
        /// The window geometry changed
        const WINDOW_GEOMETRY = 1 << 6;
        /// The minimum size changed
        const MIN_SIZE = 1 << 7;
        /// The maximum size changed
        const MAX_SIZE = 1 << 8;
    }
}

impl Default for PendingChanges {
    fn default() -> Self {
        PendingChanges::empty()
    }
}

/// Metadata of a buffer attached to a surface
///
/// The buffer contents belong to the renderer, only its size matters here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferInfo {
    /// Size of the buffer in buffer coordinates
    pub size: Size<i32, Buffer>,
}

/// New buffer assignation for a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferAssignment {
    /// The surface no longer has a buffer attached to it
    Removed,
    /// A new buffer has been attached
    NewBuffer(BufferInfo),
}

/// Kind of a rectangle part of a region
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RectangleKind {
    /// This rectangle should be added to the region
    Add,
    /// The intersection of this rectangle with the region should
    /// be removed from the region
    Subtract,
}

/// Description of the contents of a region
///
/// A region is defined as an union and difference of rectangles, applied in order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionAttributes {
    /// List of rectangle part of this region
    pub rects: Vec<(RectangleKind, Rectangle<i32, Logical>)>,
}

impl RegionAttributes {
    /// Checks whether given point is inside the region.
    pub fn contains<P: Into<Point<i32, Logical>>>(&self, point: P) -> bool {
        let point = point.into();
        let mut contains = false;
        for (kind, rect) in &self.rects {
            if rect.contains(point) {
                match kind {
                    RectangleKind::Add => contains = true,
                    RectangleKind::Subtract => contains = false,
                }
            }
        }
        contains
    }
}

/// The double-buffered state of a `wl_surface`
///
/// This includes the state contributed by `xdg_surface` and `xdg_toplevel`
/// (window geometry, minimum and maximum size), which follow the same rules.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceCachedState {
    /// Buffer defining the contents of the surface
    ///
    /// In the pending state, `None` means that no attach happened since the last commit.
    pub buffer: Option<BufferAssignment>,
    /// Location of the new buffer relative to the previous one
    ///
    /// Accumulated by `wl_surface.offset` and reset by every commit.
    pub buffer_delta: Option<Point<i32, Logical>>,
    /// Scale of the attached buffer
    pub buffer_scale: i32,
    /// Region of the surface that is guaranteed to be opaque
    pub opaque_region: Option<RegionAttributes>,
    /// Region of the surface that accepts input
    ///
    /// `None` means the whole surface.
    pub input_region: Option<RegionAttributes>,
    /// Damage posted since the last commit, in buffer coordinates
    pub damage: SmallVec<[Rectangle<i32, Buffer>; 4]>,
    /// Window geometry set by the client, in surface-local coordinates
    pub window_geometry: Option<Rectangle<i32, Logical>>,
    /// Minimum size requested by the client, `0` meaning unbounded
    pub min_size: Size<i32, Logical>,
    /// Maximum size requested by the client, `0` meaning unbounded
    pub max_size: Size<i32, Logical>,
}

impl Default for SurfaceCachedState {
    fn default() -> Self {
        SurfaceCachedState {
            buffer: None,
            buffer_delta: None,
            buffer_scale: 1,
            opaque_region: None,
            input_region: None,
            damage: SmallVec::new(),
            window_geometry: None,
            min_size: Size::default(),
            max_size: Size::default(),
        }
    }
}

impl SurfaceCachedState {
    /// The attached buffer, if any
    pub fn buffer_info(&self) -> Option<BufferInfo> {
        match self.buffer {
            Some(BufferAssignment::NewBuffer(info)) => Some(info),
            _ => None,
        }
    }

    /// Size of the surface in logical coordinates, derived from its buffer
    pub fn surface_size(&self) -> Option<Size<i32, Logical>> {
        self.buffer_info().map(|info| info.size.to_logical(self.buffer_scale))
    }

    /// The window geometry, or the full buffer extent if the client never set one
    pub fn effective_window_geometry(&self) -> Rectangle<i32, Logical> {
        self.window_geometry
            .or_else(|| self.surface_size().map(Rectangle::from_size))
            .unwrap_or_default()
    }
}

impl Cacheable for SurfaceCachedState {
    fn commit(&mut self) -> Self {
        SurfaceCachedState {
            buffer: self.buffer.take(),
            buffer_delta: self.buffer_delta.take(),
            damage: std::mem::take(&mut self.damage),
            ..self.clone()
        }
    }

    fn merge_into(self, into: &mut Self) {
        if self.buffer.is_some() {
            into.buffer = self.buffer;
        }
        into.buffer_delta = self.buffer_delta;
        into.damage = self.damage;
        into.buffer_scale = self.buffer_scale;
        into.opaque_region = self.opaque_region;
        into.input_region = self.input_region;
        into.window_geometry = self.window_geometry;
        into.min_size = self.min_size;
        into.max_size = self.max_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(w: i32, h: i32) -> BufferAssignment {
        BufferAssignment::NewBuffer(BufferInfo { size: (w, h).into() })
    }

    #[test]
    fn commit_promotes_pending() {
        let mut cached = Cached::<SurfaceCachedState>::default();
        cached.pending_mut().buffer = Some(buffer(100, 50));
        cached.pending_mut().window_geometry = Some(Rectangle::from((5, 5, 90, 40)));
        cached.commit();

        assert_eq!(cached.current().buffer, Some(buffer(100, 50)));
        assert_eq!(cached.current().window_geometry, Some(Rectangle::from((5, 5, 90, 40))));
        // one-shot values are consumed by the commit, persistent ones are kept
        assert_eq!(cached.pending().buffer, None);
        assert_eq!(cached.pending().window_geometry, Some(Rectangle::from((5, 5, 90, 40))));
    }

    #[test]
    fn commit_without_attach_keeps_buffer() {
        let mut cached = Cached::<SurfaceCachedState>::default();
        cached.pending_mut().buffer = Some(buffer(10, 10));
        cached.commit();
        cached.pending_mut().damage.push(Rectangle::from((0, 0, 1, 1)));
        cached.commit();

        assert_eq!(cached.current().buffer, Some(buffer(10, 10)));
        assert_eq!(cached.current().damage.len(), 1);
        cached.commit();
        assert!(cached.current().damage.is_empty());
    }

    #[test]
    fn removed_buffer_unsets_contents() {
        let mut cached = Cached::<SurfaceCachedState>::default();
        cached.pending_mut().buffer = Some(buffer(10, 10));
        cached.commit();
        cached.pending_mut().buffer = Some(BufferAssignment::Removed);
        cached.commit();
        assert_eq!(cached.current().buffer_info(), None);
        assert_eq!(cached.current().surface_size(), None);
    }

    #[test]
    fn window_geometry_falls_back_to_buffer() {
        let mut cached = Cached::<SurfaceCachedState>::default();
        cached.pending_mut().buffer = Some(buffer(200, 100));
        cached.pending_mut().buffer_scale = 2;
        cached.commit();
        assert_eq!(
            cached.current().effective_window_geometry(),
            Rectangle::from((0, 0, 100, 50))
        );
    }

    #[test]
    fn region_contains() {
        let region = RegionAttributes {
            rects: vec![
                (RectangleKind::Add, Rectangle::from((0, 0, 10, 10))),
                (RectangleKind::Subtract, Rectangle::from((0, 0, 5, 5))),
            ],
        };
        assert!(region.contains((7, 7)));
        assert!(!region.contains((2, 2)));
        assert!(!region.contains((20, 20)));
    }
}
