//! Ordered geometry slots of one tool

use crate::capture::tool::{SlotPolicy, ToolKind};
use crate::capture::Point;

/// The points a tool has collected so far
///
/// A slot is either a complete display coordinate or empty. Text that does not
/// parse never reaches the buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct GeometryBuffer {
    kind: ToolKind,
    policy: SlotPolicy,
    slots: Vec<Option<Point>>,
}

impl GeometryBuffer {
    pub fn new(kind: ToolKind) -> Self {
        let policy = kind.descriptor().slots;
        Self {
            kind,
            policy,
            slots: vec![None; policy.initial_rows()],
        }
    }

    pub fn kind(&self) -> ToolKind {
        self.kind
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Point> {
        self.slots.get(index).copied().flatten()
    }

    pub fn is_filled(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Overwrites a slot; returns false if the index does not exist
    pub fn set(&mut self, index: usize, point: Option<Point>) -> bool {
        match self.slots.get_mut(index) {
            Some(slot) => {
                *slot = point;
                true
            }
            None => false,
        }
    }

    /// Appends an empty slot and returns its index, unless the slot count is fixed
    pub fn push_empty(&mut self) -> Option<usize> {
        match self.policy {
            SlotPolicy::Fixed(_) => None,
            SlotPolicy::Unbounded => {
                self.slots.push(None);
                Some(self.slots.len() - 1)
            }
        }
    }

    /// Removes a slot, unless the slot count is fixed
    pub fn remove(&mut self, index: usize) -> bool {
        match self.policy {
            SlotPolicy::Unbounded if index < self.slots.len() => {
                self.slots.remove(index);
                true
            }
            _ => false,
        }
    }

    pub fn last_is_empty(&self) -> bool {
        matches!(self.slots.last(), Some(None))
    }

    /// Filled slots in row order
    pub fn points(&self) -> Vec<Point> {
        self.slots.iter().flatten().copied().collect()
    }

    /// Both corners of a fixed two-slot buffer, once present
    pub fn corners(&self) -> Option<(Point, Point)> {
        match self.slots.as_slice() {
            [Some(a), Some(b)] => Some((*a, *b)),
            _ => None,
        }
    }

    /// True when every slot is filled
    pub fn is_complete(&self) -> bool {
        !self.slots.is_empty() && self.slots.iter().all(Option::is_some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounding_box_slots_are_fixed() {
        let mut buffer = GeometryBuffer::new(ToolKind::BoundingBox);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.push_empty(), None);
        assert!(!buffer.remove(0));
        assert!(buffer.corners().is_none());

        buffer.set(0, Some(Point::new(5.0, 52.0)));
        assert!(!buffer.is_complete());
        buffer.set(1, Some(Point::new(5.1, 52.1)));
        assert_eq!(
            buffer.corners(),
            Some((Point::new(5.0, 52.0), Point::new(5.1, 52.1)))
        );
    }

    #[test]
    fn test_unbounded_grows_and_shrinks() {
        let mut buffer = GeometryBuffer::new(ToolKind::Polyline);
        assert!(buffer.last_is_empty());
        buffer.set(0, Some(Point::new(1.0, 1.0)));
        assert_eq!(buffer.push_empty(), Some(1));
        buffer.set(1, Some(Point::new(2.0, 2.0)));
        assert_eq!(buffer.points().len(), 2);

        assert!(buffer.remove(0));
        assert_eq!(buffer.points(), vec![Point::new(2.0, 2.0)]);
        assert!(!buffer.remove(5));
        assert!(!buffer.set(5, None));
    }
}
