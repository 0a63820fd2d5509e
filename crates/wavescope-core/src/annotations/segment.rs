//! Segments: labelled time ranges, optionally editable by dragging their
//! start and end markers in the zoom view

use crate::annotations::{Annotation, AnnotationStore, EntityId, Overlay, RenderHandle, TimeRange};
use crate::error::{AnnotationError, AnnotationResult};
use crate::types::{FrameGeometry, Seconds, ViewportKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    range: TimeRange,
    pub label: String,
    pub color: Option<String>,
    pub editable: bool,
}

impl Segment {
    pub fn start(&self) -> Seconds {
        self.range.start()
    }

    pub fn end(&self) -> Seconds {
        self.range.end()
    }
}

impl Annotation for Segment {
    fn range(&self) -> TimeRange {
        self.range
    }
}

/// Optional fields for a new segment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentOptions {
    pub label: String,
    pub color: Option<String>,
    pub editable: bool,
}

/// Which edge of a segment is being dragged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Start,
    End,
}

#[derive(Debug, Default)]
pub struct SegmentOverlay {
    store: AnnotationStore<Segment>,
}

impl SegmentOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &AnnotationStore<Segment> {
        &self.store
    }

    pub fn get(&self, id: EntityId) -> Option<&Segment> {
        self.store.get(id)
    }

    pub fn create(&mut self, start: Seconds, end: Seconds, options: SegmentOptions) -> AnnotationResult<EntityId> {
        let range = TimeRange::new(start, end)?;
        Ok(self.store.insert(Segment {
            range,
            label: options.label,
            color: options.color,
            editable: options.editable,
        }))
    }

    /// Replace a segment's time range
    pub fn update(&mut self, id: EntityId, start: Seconds, end: Seconds) -> AnnotationResult<()> {
        let range = TimeRange::new(start, end)?;
        self.store
            .modify(id, |segment| segment.range = range)
            .ok_or(AnnotationError::NotFound(id))
    }

    /// Remove segments starting at `start` (and ending at `end`, if given)
    pub fn remove_by_time(&mut self, start: Seconds, end: Option<Seconds>) -> Vec<EntityId> {
        let matching: Vec<EntityId> = self
            .store
            .iter()
            .filter(|(_, s)| s.start() == start && end.is_none_or(|end| s.end() == end))
            .map(|(id, _)| id)
            .collect();
        for &id in &matching {
            self.store.remove(id);
        }
        matching
    }

    pub fn remove_all(&mut self) -> Vec<EntityId> {
        self.store.clear()
    }

    /// Segments covering a time, in creation order
    pub fn segments_at(&self, time: Seconds) -> Vec<EntityId> {
        self.store
            .iter()
            .filter(|(_, s)| s.range.contains(time))
            .map(|(id, _)| id)
            .collect()
    }

    /// Move one marker of an editable segment
    ///
    /// The marker is clamped so it stays at least `min_gap` from its sibling
    /// and inside `[0, max_time]`; a drag past the sibling pins at the bound
    /// rather than failing.
    pub fn drag_marker(
        &mut self,
        id: EntityId,
        marker: Marker,
        time: Seconds,
        min_gap: Seconds,
        max_time: Seconds,
    ) -> AnnotationResult<TimeRange> {
        let segment = self.store.get(id).ok_or(AnnotationError::NotFound(id))?;
        if !segment.editable {
            return Err(AnnotationError::NotEditable(id));
        }

        let (start, end) = (segment.start(), segment.end());
        let gap = min_gap.max(f64::EPSILON);
        let (start, end) = match marker {
            Marker::Start => (time.clamp(0.0, (end - gap).max(0.0)), end),
            Marker::End => (start, time.clamp(start + gap, max_time.max(start + gap))),
        };
        let range = TimeRange::new(start, end)?;
        self.store.modify(id, |segment| segment.range = range);
        Ok(range)
    }
}

impl Overlay for SegmentOverlay {
    fn name(&self) -> &'static str {
        "segments"
    }

    fn on_frame_changed(&mut self, frame: &FrameGeometry) {
        self.store.on_frame_changed(frame);
    }

    fn set_zoom_hidden(&mut self, hidden: bool) {
        self.store.set_zoom_hidden(hidden);
    }

    fn remove(&mut self, id: EntityId) -> bool {
        self.store.remove(id).is_some()
    }

    fn len(&self) -> usize {
        self.store.len()
    }

    fn handle(&self, kind: ViewportKind, id: EntityId) -> Option<&RenderHandle> {
        self.store.handle(kind, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::test_support::zoom_frame;

    fn editable() -> SegmentOptions {
        SegmentOptions {
            label: "intro".into(),
            editable: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_create_validation() {
        let mut overlay = SegmentOverlay::new();
        assert!(overlay.create(-1.0, 2.0, SegmentOptions::default()).is_err());
        assert!(overlay.create(0.0, 0.0, SegmentOptions::default()).is_err());
        assert!(overlay.create(2.0, 1.0, SegmentOptions::default()).is_err());
        assert!(overlay.is_empty());

        let id = overlay.create(1.0, 2.0, editable()).unwrap();
        assert_eq!(overlay.get(id).unwrap().label, "intro");
    }

    #[test]
    fn test_update_and_not_found() {
        let mut overlay = SegmentOverlay::new();
        let id = overlay.create(1.0, 2.0, SegmentOptions::default()).unwrap();
        overlay.update(id, 3.0, 4.0).unwrap();
        assert_eq!(overlay.get(id).unwrap().start(), 3.0);

        assert_eq!(overlay.update(id, 4.0, 3.0), Err(AnnotationError::InvalidRange { start: 4.0, end: 3.0 }));
        assert_eq!(overlay.get(id).unwrap().end(), 4.0);
        assert_eq!(overlay.update(77, 1.0, 2.0), Err(AnnotationError::NotFound(77)));
    }

    #[test]
    fn test_remove_by_time() {
        let mut overlay = SegmentOverlay::new();
        let a = overlay.create(1.0, 2.0, SegmentOptions::default()).unwrap();
        let b = overlay.create(1.0, 3.0, SegmentOptions::default()).unwrap();
        let c = overlay.create(2.0, 3.0, SegmentOptions::default()).unwrap();

        assert_eq!(overlay.remove_by_time(1.0, Some(3.0)), vec![b]);
        assert_eq!(overlay.remove_by_time(1.0, None), vec![a]);
        assert_eq!(overlay.remove_by_time(9.0, None), Vec::<EntityId>::new());
        assert_eq!(overlay.remove_all(), vec![c]);
    }

    #[test]
    fn test_segments_at() {
        let mut overlay = SegmentOverlay::new();
        let a = overlay.create(1.0, 3.0, SegmentOptions::default()).unwrap();
        let b = overlay.create(2.0, 4.0, SegmentOptions::default()).unwrap();
        assert_eq!(overlay.segments_at(2.5), vec![a, b]);
        assert_eq!(overlay.segments_at(3.0), vec![b]);
        assert!(overlay.segments_at(0.5).is_empty());
    }

    #[test]
    fn test_drag_clamps_at_sibling() {
        let mut overlay = SegmentOverlay::new();
        overlay.on_frame_changed(&zoom_frame(0));
        let id = overlay.create(1.0, 2.0, editable()).unwrap();
        let gap = 512.0 / 44100.0;

        let range = overlay.drag_marker(id, Marker::Start, 5.0, gap, 10.0).unwrap();
        assert_eq!(range.start(), 2.0 - gap);
        assert!(range.start() < range.end());

        let range = overlay.drag_marker(id, Marker::End, 0.0, gap, 10.0).unwrap();
        assert_eq!(range.end(), range.start() + gap);

        let range = overlay.drag_marker(id, Marker::End, 99.0, gap, 10.0).unwrap();
        assert_eq!(range.end(), 10.0);

        let range = overlay.drag_marker(id, Marker::Start, -3.0, gap, 10.0).unwrap();
        assert_eq!(range.start(), 0.0);
        assert_eq!(overlay.handle(ViewportKind::ZoomView, id).unwrap().x_start, 0.0);
    }

    #[test]
    fn test_drag_live_updates_handle() {
        let mut overlay = SegmentOverlay::new();
        overlay.on_frame_changed(&zoom_frame(0));
        let id = overlay.create(1.0, 2.0, editable()).unwrap();
        overlay.drag_marker(id, Marker::End, 3.0, 0.01, 10.0).unwrap();
        assert_eq!(overlay.handle(ViewportKind::ZoomView, id).unwrap().x_end, 258.0);
    }

    #[test]
    fn test_drag_rejected_for_read_only() {
        let mut overlay = SegmentOverlay::new();
        let id = overlay.create(1.0, 2.0, SegmentOptions::default()).unwrap();
        assert_eq!(
            overlay.drag_marker(id, Marker::End, 3.0, 0.01, 10.0),
            Err(AnnotationError::NotEditable(id))
        );
        assert_eq!(overlay.get(id).unwrap().end(), 2.0);
    }
}
