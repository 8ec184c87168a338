//! Outputs
//!
//! The core only needs to know where outputs are in the global logical space: maximized and
//! fullscreen toplevels are sized to an output, lock surfaces cover one, and damage of a
//! mapped surface is reported per output it intersects.
//!
//! Outputs are registered on the [`Compositor`](crate::state::Compositor) by the backend.
//! One of them may be marked as the *current* output, which is where maximize and
//! fullscreen requests without an explicit target end up (typically the output under the
//! cursor).

use crate::utils::{Logical, OutputId, Point, Rectangle, Size};

/// An output known to the compositor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Output {
    id: OutputId,
    name: String,
    geometry: Rectangle<i32, Logical>,
}

impl Output {
    pub(crate) fn new(id: OutputId, name: String, geometry: Rectangle<i32, Logical>) -> Self {
        Output { id, name, geometry }
    }

    /// Handle of this output
    pub fn id(&self) -> OutputId {
        self.id
    }

    /// Name of this output, as given by the backend
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Area covered by this output in the global logical space
    pub fn geometry(&self) -> Rectangle<i32, Logical> {
        self.geometry
    }

    /// Top-left corner of this output
    pub fn location(&self) -> Point<i32, Logical> {
        self.geometry.loc
    }

    /// Logical size of this output
    pub fn size(&self) -> Size<i32, Logical> {
        self.geometry.size
    }
}

/// The set of outputs plus the current one
#[derive(Debug, Default)]
pub(crate) struct OutputMap {
    outputs: Vec<Output>,
    current: Option<OutputId>,
}

impl OutputMap {
    pub(crate) fn add(&mut self, output: Output) {
        if self.current.is_none() {
            self.current = Some(output.id);
        }
        self.outputs.push(output);
    }

    pub(crate) fn remove(&mut self, id: OutputId) -> Option<Output> {
        let idx = self.outputs.iter().position(|o| o.id == id)?;
        let output = self.outputs.remove(idx);
        if self.current == Some(id) {
            self.current = self.outputs.first().map(|o| o.id);
        }
        Some(output)
    }

    pub(crate) fn set_geometry(&mut self, id: OutputId, geometry: Rectangle<i32, Logical>) -> bool {
        match self.outputs.iter_mut().find(|o| o.id == id) {
            Some(output) => {
                output.geometry = geometry;
                true
            }
            None => false,
        }
    }

    pub(crate) fn set_current(&mut self, id: Option<OutputId>) {
        self.current = id.filter(|id| self.outputs.iter().any(|o| o.id == *id));
    }

    pub(crate) fn current(&self) -> Option<&Output> {
        self.current.and_then(|id| self.get(id))
    }

    pub(crate) fn get(&self, id: OutputId) -> Option<&Output> {
        self.outputs.iter().find(|o| o.id == id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Output> {
        self.outputs.iter()
    }

    /// Outputs overlapping the given rectangle
    pub(crate) fn intersecting(&self, rect: Rectangle<i32, Logical>) -> Vec<OutputId> {
        self.outputs
            .iter()
            .filter(|o| o.geometry.overlaps(rect))
            .map(|o| o.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::{Output, OutputMap};
    use crate::utils::{OutputId, Rectangle};

    fn output(id: u32, x: i32) -> Output {
        Output::new(OutputId(id), format!("out-{}", id), Rectangle::from((x, 0, 1920, 1080)))
    }

    #[test]
    fn first_output_becomes_current() {
        let mut map = OutputMap::default();
        map.add(output(1, 0));
        map.add(output(2, 1920));
        assert_eq!(map.current().map(|o| o.id()), Some(OutputId(1)));
    }

    #[test]
    fn removing_current_falls_back() {
        let mut map = OutputMap::default();
        map.add(output(1, 0));
        map.add(output(2, 1920));
        map.remove(OutputId(1));
        assert_eq!(map.current().map(|o| o.id()), Some(OutputId(2)));
        map.remove(OutputId(2));
        assert!(map.current().is_none());
    }

    #[test]
    fn unknown_current_is_ignored() {
        let mut map = OutputMap::default();
        map.add(output(1, 0));
        map.set_current(Some(OutputId(9)));
        assert!(map.current().is_none());
    }

    #[test]
    fn intersecting_outputs() {
        let mut map = OutputMap::default();
        map.add(output(1, 0));
        map.add(output(2, 1920));
        let hits = map.intersecting(Rectangle::from((1900, 10, 100, 100)));
        assert_eq!(hits, vec![OutputId(1), OutputId(2)]);
    }
}
