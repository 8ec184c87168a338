//! Popup placement
//!
//! A positioner describes where a popup wants to appear relative to its parent: an anchor
//! rectangle inside the parent's window geometry, an anchor edge picking a point on that
//! rectangle, a gravity pushing the popup away from that point, and a set of adjustments
//! the compositor may apply when the result does not fit into the available area.
//!
//! [`PositionerState::get_unconstrained_geometry`] implements the adjustments in the order
//! mandated by `xdg_shell`: flip, then slide, then resize, independently on each axis.
//!
//! ```
//! use trellis::utils::Rectangle;
//! use trellis::wayland::shell::xdg::{Anchor, Gravity, PositionerState};
//!
//! let positioner = PositionerState {
//!     rect_size: (50, 50).into(),
//!     anchor_rect: Rectangle::from((0, 0, 100, 100)),
//!     anchor_edges: Anchor::BottomRight,
//!     gravity: Gravity::BottomRight,
//!     ..Default::default()
//! };
//! assert_eq!(positioner.get_geometry(), Rectangle::from((100, 100, 50, 50)));
//! ```

use std::cmp::min;

use crate::utils::{Logical, Point, Rectangle, Serial, Size};

/// Edges of the anchor rectangle the anchor point is derived from
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Anchor {
    /// Center of the anchor rectangle
    #[default]
    None,
    /// Center of the top edge
    Top,
    /// Center of the bottom edge
    Bottom,
    /// Center of the left edge
    Left,
    /// Center of the right edge
    Right,
    /// Top-left corner
    TopLeft,
    /// Bottom-left corner
    BottomLeft,
    /// Top-right corner
    TopRight,
    /// Bottom-right corner
    BottomRight,
}

/// Direction in which the popup is placed relative to the anchor point
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Gravity {
    /// Centered over the anchor point
    #[default]
    None,
    /// Above the anchor point
    Top,
    /// Below the anchor point
    Bottom,
    /// Left of the anchor point
    Left,
    /// Right of the anchor point
    Right,
    /// Above and left of the anchor point
    TopLeft,
    /// Below and left of the anchor point
    BottomLeft,
    /// Above and right of the anchor point
    TopRight,
    /// Below and right of the anchor point
    BottomRight,
}

bitflags::bitflags! {
    /// Adjustments the compositor may apply to a constrained popup
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ConstraintAdjustment: u32 {
        /// Move the popup horizontally until it fits
        const SLIDE_X = 1;
        /// Move the popup vertically until it fits
        const SLIDE_Y = 2;
        /// Mirror anchor and gravity horizontally
        const FLIP_X = 4;
        /// Mirror anchor and gravity vertically
        const FLIP_Y = 8;
        /// Shrink the popup horizontally
        const RESIZE_X = 16;
        /// Shrink the popup vertically
        const RESIZE_Y = 32;
    }
}

impl Default for ConstraintAdjustment {
    fn default() -> Self {
        ConstraintAdjustment::empty()
    }
}

impl Anchor {
    fn has_top(self) -> bool {
        matches!(self, Anchor::Top | Anchor::TopLeft | Anchor::TopRight)
    }

    fn has_bottom(self) -> bool {
        matches!(self, Anchor::Bottom | Anchor::BottomLeft | Anchor::BottomRight)
    }

    fn has_left(self) -> bool {
        matches!(self, Anchor::Left | Anchor::TopLeft | Anchor::BottomLeft)
    }

    fn has_right(self) -> bool {
        matches!(self, Anchor::Right | Anchor::TopRight | Anchor::BottomRight)
    }

    fn invert_x(self) -> Anchor {
        match self {
            Anchor::Left => Anchor::Right,
            Anchor::Right => Anchor::Left,
            Anchor::TopLeft => Anchor::TopRight,
            Anchor::TopRight => Anchor::TopLeft,
            Anchor::BottomLeft => Anchor::BottomRight,
            Anchor::BottomRight => Anchor::BottomLeft,
            x => x,
        }
    }

    fn invert_y(self) -> Anchor {
        match self {
            Anchor::Top => Anchor::Bottom,
            Anchor::Bottom => Anchor::Top,
            Anchor::TopLeft => Anchor::BottomLeft,
            Anchor::BottomLeft => Anchor::TopLeft,
            Anchor::TopRight => Anchor::BottomRight,
            Anchor::BottomRight => Anchor::TopRight,
            x => x,
        }
    }
}

impl Gravity {
    fn has_top(self) -> bool {
        matches!(self, Gravity::Top | Gravity::TopLeft | Gravity::TopRight)
    }

    fn has_bottom(self) -> bool {
        matches!(self, Gravity::Bottom | Gravity::BottomLeft | Gravity::BottomRight)
    }

    fn has_left(self) -> bool {
        matches!(self, Gravity::Left | Gravity::TopLeft | Gravity::BottomLeft)
    }

    fn has_right(self) -> bool {
        matches!(self, Gravity::Right | Gravity::TopRight | Gravity::BottomRight)
    }

    fn invert_x(self) -> Gravity {
        match self {
            Gravity::Left => Gravity::Right,
            Gravity::Right => Gravity::Left,
            Gravity::TopLeft => Gravity::TopRight,
            Gravity::TopRight => Gravity::TopLeft,
            Gravity::BottomLeft => Gravity::BottomRight,
            Gravity::BottomRight => Gravity::BottomLeft,
            x => x,
        }
    }

    fn invert_y(self) -> Gravity {
        match self {
            Gravity::Top => Gravity::Bottom,
            Gravity::Bottom => Gravity::Top,
            Gravity::TopLeft => Gravity::BottomLeft,
            Gravity::BottomLeft => Gravity::TopLeft,
            Gravity::TopRight => Gravity::BottomRight,
            Gravity::BottomRight => Gravity::TopRight,
            x => x,
        }
    }
}

/// The state of a positioner, as set by the client
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PositionerState {
    /// Size of the rectangle that needs to be positioned
    pub rect_size: Size<i32, Logical>,
    /// Anchor rectangle in the parent surface coordinates
    /// relative to which the surface must be positioned
    pub anchor_rect: Rectangle<i32, Logical>,
    /// Edges defining the anchor point
    pub anchor_edges: Anchor,
    /// Gravity direction for positioning the child surface
    /// relative to its anchor point
    pub gravity: Gravity,
    /// Adjustments to do if previous criteria constrain the
    /// surface
    pub constraint_adjustment: ConstraintAdjustment,
    /// Offset placement relative to the anchor point
    pub offset: Point<i32, Logical>,
    /// When set reactive, the surface is reconstrained if the conditions
    /// used for constraining changed, e.g. the parent window moved.
    pub reactive: bool,
    /// The parent window geometry size the client expects when repositioning
    pub parent_size: Option<Size<i32, Logical>>,
    /// The serial of the parent configure event the client based this positioner on
    pub parent_configure: Option<Serial>,
}

impl PositionerState {
    /// Whether a popup can be created from this positioner
    ///
    /// Both the size and the anchor rectangle have to be set.
    pub fn is_complete(&self) -> bool {
        self.rect_size.w > 0 && self.rect_size.h > 0 && self.anchor_rect.size.w > 0 && self.anchor_rect.size.h > 0
    }

    /// Get the anchor point for a popup as defined by this positioner.
    pub fn get_anchor_point(&self) -> Point<i32, Logical> {
        let rect = self.anchor_rect;
        let edges = self.anchor_edges;

        let y = rect.loc.y.saturating_add(if edges.has_top() {
            0
        } else if edges.has_bottom() {
            rect.size.h
        } else {
            rect.size.h / 2
        });

        let x = rect.loc.x.saturating_add(if edges.has_left() {
            0
        } else if edges.has_right() {
            rect.size.w
        } else {
            rect.size.w / 2
        });

        (x, y).into()
    }

    /// Get the geometry without taking any constraint into account.
    ///
    /// The location is relative to the parent surface's window geometry. Coordinates
    /// saturate at the `i32` bounds instead of wrapping.
    pub fn get_geometry(&self) -> Rectangle<i32, Logical> {
        // the offset is relative to the anchor point: a popup with bottom-right
        // gravity anchored at (x, y) with offset (ox, oy) ends up at (x + ox, y + oy)
        let anchor = self.get_anchor_point();
        let size = self.rect_size;

        let y = anchor.y.saturating_add(self.offset.y);
        let y = if self.gravity.has_top() {
            y.saturating_sub(size.h)
        } else if !self.gravity.has_bottom() {
            y.saturating_sub(size.h / 2)
        } else {
            y
        };

        let x = anchor.x.saturating_add(self.offset.x);
        let x = if self.gravity.has_left() {
            x.saturating_sub(size.w)
        } else if !self.gravity.has_right() {
            x.saturating_sub(size.w / 2)
        } else {
            x
        };

        Rectangle {
            loc: (x, y).into(),
            size,
        }
    }

    /// Get the geometry for a popup as defined by this positioner, after trying to fit the popup into the
    /// target rectangle.
    ///
    /// The target rectangle is in the same coordinate space as the result, i.e. relative to the parent
    /// surface's window geometry. An empty target disables every adjustment.
    pub fn get_unconstrained_geometry(self, target: Rectangle<i32, Logical>) -> Rectangle<i32, Logical> {
        let geo = self.get_geometry();
        if target.is_empty() {
            return geo;
        }
        [Axis::X, Axis::Y]
            .into_iter()
            .fold(geo, |geo, axis| self.unconstrain_axis(axis, geo, target))
    }

    /// Flip, then slide, then resize `geo` along one axis until it fits into `target`
    ///
    /// A flip is only kept if it removes the constraint entirely. Slides keep the leading
    /// edge visible, and a resize only happens while part of the popup is still inside.
    fn unconstrain_axis(
        &self,
        axis: Axis,
        mut geo: Rectangle<i32, Logical>,
        target: Rectangle<i32, Logical>,
    ) -> Rectangle<i32, Logical> {
        let mut overflow = Overflow::along(axis, target, geo);
        if !overflow.is_constrained() {
            return geo;
        }
        let (flip, slide, resize) = axis.adjustments();

        if self.constraint_adjustment.contains(flip) {
            let flipped = axis.flip(*self).get_geometry();
            if !Overflow::along(axis, target, flipped).is_constrained() {
                axis.set_start(&mut geo, axis.start(flipped));
                return geo;
            }
        }

        if self.constraint_adjustment.contains(slide) {
            let start = axis.start(geo);
            let start = if overflow.before > 0 {
                start.saturating_add(overflow.before)
            } else {
                start.saturating_sub(min(overflow.after, overflow.before.saturating_neg()))
            };
            axis.set_start(&mut geo, start);
            overflow = Overflow::along(axis, target, geo);
        }

        if self.constraint_adjustment.contains(resize) && overflow.after > 0 && overflow.after < axis.len(geo) {
            let len = axis.len(geo) - overflow.after;
            axis.set_len(&mut geo, len);
        }

        geo
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

impl Axis {
    fn start(self, rect: Rectangle<i32, Logical>) -> i32 {
        match self {
            Axis::X => rect.loc.x,
            Axis::Y => rect.loc.y,
        }
    }

    fn len(self, rect: Rectangle<i32, Logical>) -> i32 {
        match self {
            Axis::X => rect.size.w,
            Axis::Y => rect.size.h,
        }
    }

    fn set_start(self, rect: &mut Rectangle<i32, Logical>, start: i32) {
        match self {
            Axis::X => rect.loc.x = start,
            Axis::Y => rect.loc.y = start,
        }
    }

    fn set_len(self, rect: &mut Rectangle<i32, Logical>, len: i32) {
        match self {
            Axis::X => rect.size.w = len,
            Axis::Y => rect.size.h = len,
        }
    }

    /// Flip, slide and resize flags acting on this axis
    fn adjustments(self) -> (ConstraintAdjustment, ConstraintAdjustment, ConstraintAdjustment) {
        match self {
            Axis::X => (
                ConstraintAdjustment::FLIP_X,
                ConstraintAdjustment::SLIDE_X,
                ConstraintAdjustment::RESIZE_X,
            ),
            Axis::Y => (
                ConstraintAdjustment::FLIP_Y,
                ConstraintAdjustment::SLIDE_Y,
                ConstraintAdjustment::RESIZE_Y,
            ),
        }
    }

    fn flip(self, mut positioner: PositionerState) -> PositionerState {
        match self {
            Axis::X => {
                positioner.anchor_edges = positioner.anchor_edges.invert_x();
                positioner.gravity = positioner.gravity.invert_x();
            }
            Axis::Y => {
                positioner.anchor_edges = positioner.anchor_edges.invert_y();
                positioner.gravity = positioner.gravity.invert_y();
            }
        }
        positioner
    }
}

/// How far a popup sticks out of the target on both ends of one axis
///
/// Positive values are outside the target.
#[derive(Debug, Clone, Copy)]
struct Overflow {
    before: i32,
    after: i32,
}

impl Overflow {
    fn along(axis: Axis, target: Rectangle<i32, Logical>, popup: Rectangle<i32, Logical>) -> Overflow {
        let target_end = axis.start(target).saturating_add(axis.len(target));
        let popup_end = axis.start(popup).saturating_add(axis.len(popup));
        Overflow {
            before: axis.start(target).saturating_sub(axis.start(popup)),
            after: popup_end.saturating_sub(target_end),
        }
    }

    fn is_constrained(self) -> bool {
        self.before > 0 || self.after > 0
    }
}
