//! Picking one subject when the detector reports several.

use crate::landmarks::{LandmarkSet, Orientation};
use crate::shapes::point::Point;
use crate::shapes::rect::Rect;
use tracing::debug;

pub const SUBJECT_PADDING: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubjectBox {
    pub bounds: Rect,
}

impl SubjectBox {
    pub fn from_landmarks(
        set: &LandmarkSet,
        orientation: Orientation,
        padding: f32,
    ) -> Option<SubjectBox> {
        let mut bounds = Rect::from_points(&set.display_points(orientation))?;
        bounds.pad(padding);
        Some(SubjectBox { bounds })
    }
}

/// One entry per subject, index-aligned with `sets`. Subjects without
/// landmarks have no box.
pub fn subject_boxes(sets: &[LandmarkSet], orientation: Orientation) -> Vec<Option<SubjectBox>> {
    sets.iter()
        .map(|s| SubjectBox::from_landmarks(s, orientation, SUBJECT_PADDING))
        .collect()
}

#[derive(Debug, Clone, Default)]
pub struct SubjectSelector {
    selected: Option<usize>,
}

impl SubjectSelector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Select the first box containing the normalized tap point. A tap that
    /// misses every box clears the selection.
    pub fn select_at(&mut self, point: &Point, boxes: &[Option<SubjectBox>]) -> Option<usize> {
        self.selected = boxes
            .iter()
            .position(|b| b.is_some_and(|b| b.bounds.contains(point)));
        debug!("Selected subject: {:?}", self.selected);
        self.selected
    }

    /// The selected subject if it is still present, otherwise the first one.
    pub fn pick<'a>(&self, sets: &'a [LandmarkSet]) -> Option<&'a LandmarkSet> {
        self.selected
            .and_then(|idx| sets.get(idx))
            .or_else(|| sets.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::Landmark;

    fn subject(cx: f32, cy: f32) -> LandmarkSet {
        LandmarkSet::new(vec![
            Landmark::new(cx - 0.05, cy - 0.05),
            Landmark::new(cx + 0.05, cy + 0.05),
        ])
    }

    #[test]
    fn test_boxes_are_padded() {
        let boxes = subject_boxes(&[subject(0.3, 0.5)], Orientation::Upright);
        assert_eq!(boxes.len(), 1);
        let b = boxes[0].unwrap().bounds;
        assert!((b.left - 0.15).abs() < 1e-6);
        assert!((b.right - 0.45).abs() < 1e-6);
    }

    #[test]
    fn test_empty_set_keeps_alignment() {
        let sets = vec![LandmarkSet::default(), subject(0.5, 0.5)];
        let boxes = subject_boxes(&sets, Orientation::Upright);
        assert_eq!(boxes.len(), 2);
        assert!(boxes[0].is_none());

        let mut selector = SubjectSelector::new();
        assert_eq!(selector.select_at(&Point::new(0.5, 0.5), &boxes), Some(1));
    }

    #[test]
    fn test_select_and_pick() {
        let sets = vec![subject(0.2, 0.5), subject(0.75, 0.5)];
        let boxes = subject_boxes(&sets, Orientation::Upright);
        let mut selector = SubjectSelector::new();

        assert_eq!(selector.pick(&sets), Some(&sets[0]));
        assert_eq!(selector.select_at(&Point::new(0.8, 0.5), &boxes), Some(1));
        assert_eq!(selector.pick(&sets), Some(&sets[1]));

        // selection outlives a frame without that subject
        assert_eq!(selector.pick(&sets[..1]), Some(&sets[0]));

        assert_eq!(selector.select_at(&Point::new(0.5, 0.05), &boxes), None);
        assert_eq!(selector.selected(), None);
    }
}
