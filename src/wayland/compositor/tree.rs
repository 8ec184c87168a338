use indexmap::{IndexMap, IndexSet};

use super::SurfaceData;
use crate::utils::SurfaceId;

/// Compositor-wide ordering of mapped surfaces, back to front
///
/// This replaces intrusive sibling links: reordering is an index operation, so a reader
/// traversing the stack under the state lock never sees dangling entries.
#[derive(Debug, Default, Clone)]
pub struct Stack {
    order: IndexSet<SurfaceId>,
}

impl Stack {
    /// Place a surface on top of every other one
    ///
    /// Returns `false` if it already was the topmost surface.
    pub(crate) fn raise(&mut self, id: SurfaceId) -> bool {
        if self.order.last() == Some(&id) {
            return false;
        }
        self.order.shift_remove(&id);
        self.order.insert(id);
        true
    }

    /// Raise a set of surfaces, keeping their relative order
    ///
    /// Returns `false` if they already were the topmost surfaces, in that order.
    pub(crate) fn raise_all(&mut self, ids: &[SurfaceId]) -> bool {
        let before = self.order.clone();
        let mut ordered = ids.to_vec();
        ordered.sort_by_key(|id| self.order.get_index_of(id).unwrap_or(usize::MAX));
        for id in ordered {
            self.raise(id);
        }
        !self.order.iter().eq(before.iter())
    }

    /// Remove a surface from the stack
    ///
    /// Returns `false` if it was not part of it.
    pub(crate) fn remove(&mut self, id: SurfaceId) -> bool {
        self.order.shift_remove(&id)
    }

    /// Whether the surface is part of the stack
    pub fn contains(&self, id: SurfaceId) -> bool {
        self.order.contains(&id)
    }

    /// Index of the surface, `0` being the bottom-most one
    pub fn position(&self, id: SurfaceId) -> Option<usize> {
        self.order.get_index_of(&id)
    }

    /// The topmost surface
    pub fn top(&self) -> Option<SurfaceId> {
        self.order.last().copied()
    }

    /// Iterate from the bottom-most surface to the topmost one
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = SurfaceId> + '_ {
        self.order.iter().copied()
    }

    /// Iterate from the topmost surface to the bottom-most one
    pub fn iter_front_to_back(&self) -> impl Iterator<Item = SurfaceId> + '_ {
        self.order.iter().rev().copied()
    }

    /// Number of stacked surfaces
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no surface is stacked
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Possible actions to do after handling a node during tree traversal
pub(crate) enum TraversalAction {
    /// Traverse its children as well
    DoChildren,
    /// Skip its children
    SkipChildren,
}

/// Whether `ancestor` is `of` itself, or one of its parents, grand-parents, ...
pub(crate) fn is_ancestor_or_self(
    surfaces: &IndexMap<SurfaceId, SurfaceData>,
    ancestor: SurfaceId,
    of: SurfaceId,
) -> bool {
    let mut current = Some(of);
    // the parent relation is kept acyclic, the bound only guards against corrupted state
    for _ in 0..=surfaces.len() {
        match current {
            Some(id) if id == ancestor => return true,
            Some(id) => current = surfaces.get(&id).and_then(|s| s.parent),
            None => return false,
        }
    }
    false
}

/// Walk the children of `root` depth-first, calling `filter` on each of them
///
/// Returns the visited children in post-order: every surface comes after its own children,
/// so the deepest descendants are listed first. `root` itself is not part of the result.
pub(crate) fn descendants<F>(surfaces: &IndexMap<SurfaceId, SurfaceData>, root: SurfaceId, mut filter: F) -> Vec<SurfaceId>
where
    F: FnMut(&SurfaceData) -> TraversalAction,
{
    fn visit<F>(
        surfaces: &IndexMap<SurfaceId, SurfaceData>,
        id: SurfaceId,
        filter: &mut F,
        out: &mut Vec<SurfaceId>,
    ) where
        F: FnMut(&SurfaceData) -> TraversalAction,
    {
        let Some(data) = surfaces.get(&id) else {
            return;
        };
        for child in data.children.iter().rev() {
            let Some(child_data) = surfaces.get(child) else {
                continue;
            };
            if let TraversalAction::DoChildren = filter(child_data) {
                visit(surfaces, *child, filter, out);
                out.push(*child);
            }
        }
    }

    let mut out = Vec::new();
    visit(surfaces, root, &mut filter, &mut out);
    out
}
