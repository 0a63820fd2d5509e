//! Time-anchored annotation overlays
//!
//! Every overlay kind (segments, speakers, tags, keywords) keeps its entities
//! in an [`AnnotationStore`]: entities by id plus one render-handle table per
//! viewport, keyed by the same id. Entities never point at their handles and
//! handles never point back; the id is the only link.
//!
//! Handles are created once with the entity and updated in place on every
//! `frame-changed`. Overview handles are always visible (the overview shows the
//! whole timeline). Zoom view handles are visible only while the entity's
//! pixel span intersects the frame, and never while a zoom animation runs.

pub mod keyword;
pub mod layer;
pub mod segment;
pub mod speaker;
pub mod tag;

pub use keyword::{Keyword, KeywordOverlay};
pub use layer::AnnotationLayer;
pub use segment::{Marker, Segment, SegmentOptions, SegmentOverlay};
pub use speaker::{merge_intervals, SpeakerInterval, SpeakerOverlay, SpeakerSegment};
pub use tag::{Tag, TagOverlay};

use std::collections::BTreeMap;

use crate::error::{AnnotationError, AnnotationResult};
use crate::types::{FrameGeometry, Seconds, ViewportKind};

/// Identifier of an entity, unique and monotonically increasing per overlay kind
pub type EntityId = u64;

/// Validated `[start, end)` time range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    start: Seconds,
    end: Seconds,
}

impl TimeRange {
    /// Requires `start >= 0`, `end > 0` and `end > start`
    pub fn new(start: Seconds, end: Seconds) -> AnnotationResult<Self> {
        let valid = start.is_finite() && end.is_finite() && start >= 0.0 && end > 0.0 && end > start;
        if !valid {
            return Err(AnnotationError::InvalidRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> Seconds {
        self.start
    }

    pub fn end(&self) -> Seconds {
        self.end
    }

    pub fn duration(&self) -> Seconds {
        self.end - self.start
    }

    pub fn contains(&self, time: Seconds) -> bool {
        time >= self.start && time < self.end
    }
}

/// Anything an overlay can place on the timeline
pub trait Annotation {
    fn range(&self) -> TimeRange;
}

/// How a visible handle should be drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Emphasis {
    #[default]
    Normal,
    /// Cluster leader: label drawn
    Prominent,
    /// Cluster member behind a leader: indicator only
    Suppressed,
}

/// Per-viewport drawing state of one entity
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RenderHandle {
    pub visible: bool,
    /// Clipped span relative to the frame's left edge
    pub x_start: f32,
    pub x_end: f32,
    pub emphasis: Emphasis,
    /// Members in this entity's tag cluster (0 outside clustering)
    pub cluster_size: usize,
    /// Keyword marker width (0 outside keywords)
    pub marker_width: f32,
}

impl RenderHandle {
    /// Recompute position and visibility against a frame
    fn project(&mut self, range: &TimeRange, frame: &FrameGeometry, hidden: bool) {
        let offset = frame.frame_offset;
        let frame_end = frame.frame_end();
        let start_px = frame.time_to_pixel(range.start);
        let end_px = frame.time_to_pixel(range.end);

        let lo = start_px.clamp(offset, frame_end);
        let hi = end_px.clamp(offset, frame_end);
        self.x_start = (lo - offset) as f32;
        self.x_end = (hi - offset) as f32;

        self.visible = match frame.kind {
            ViewportKind::Overview => true,
            ViewportKind::ZoomView => {
                let intersects = lo < hi || (start_px >= offset && start_px < frame_end);
                !hidden && intersects
            }
        };
    }
}

/// Entities of one kind plus their render handles
#[derive(Debug)]
pub struct AnnotationStore<T> {
    next_id: EntityId,
    entities: BTreeMap<EntityId, T>,
    handles: [BTreeMap<EntityId, RenderHandle>; 2],
    frames: [Option<FrameGeometry>; 2],
    zoom_hidden: bool,
}

impl<T> Default for AnnotationStore<T> {
    fn default() -> Self {
        Self {
            next_id: 0,
            entities: BTreeMap::new(),
            handles: [BTreeMap::new(), BTreeMap::new()],
            frames: [None, None],
            zoom_hidden: false,
        }
    }
}

impl<T: Annotation> AnnotationStore<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, create both handles and position them
    pub fn insert(&mut self, entity: T) -> EntityId {
        self.next_id += 1;
        let id = self.next_id;
        let range = entity.range();
        self.entities.insert(id, entity);

        for kind in ViewportKind::ALL {
            let mut handle = RenderHandle::default();
            if let Some(frame) = &self.frames[kind.index()] {
                handle.project(&range, frame, self.zoom_hidden);
            }
            self.handles[kind.index()].insert(id, handle);
        }
        id
    }

    /// Remove an entity and both handles; `None` if it was not there
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let entity = self.entities.remove(&id)?;
        for table in &mut self.handles {
            table.remove(&id);
        }
        Some(entity)
    }

    /// Remove everything, returning the removed ids in id order
    pub fn clear(&mut self) -> Vec<EntityId> {
        let ids: Vec<EntityId> = self.entities.keys().copied().collect();
        self.entities.clear();
        for table in &mut self.handles {
            table.clear();
        }
        ids
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        self.entities.get(&id)
    }

    /// Mutate an entity, then reposition its handles
    pub fn modify<R>(&mut self, id: EntityId, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let entity = self.entities.get_mut(&id)?;
        let out = f(entity);
        self.reposition(id);
        Some(out)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in id (creation) order
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &T)> {
        self.entities.iter().map(|(&id, e)| (id, e))
    }

    pub fn handle(&self, kind: ViewportKind, id: EntityId) -> Option<&RenderHandle> {
        self.handles[kind.index()].get(&id)
    }

    pub fn handle_mut(&mut self, kind: ViewportKind, id: EntityId) -> Option<&mut RenderHandle> {
        self.handles[kind.index()].get_mut(&id)
    }

    pub fn handles_mut(&mut self, kind: ViewportKind) -> impl Iterator<Item = &mut RenderHandle> {
        self.handles[kind.index()].values_mut()
    }

    /// Visible entities with their handle for one viewport
    pub fn visible(&self, kind: ViewportKind) -> impl Iterator<Item = (EntityId, &T, &RenderHandle)> {
        let table = &self.handles[kind.index()];
        self.entities.iter().filter_map(move |(&id, e)| {
            table.get(&id).filter(|h| h.visible).map(|h| (id, e, h))
        })
    }

    pub fn visible_count(&self, kind: ViewportKind) -> usize {
        self.handles[kind.index()].values().filter(|h| h.visible).count()
    }

    /// Last frame seen for a viewport
    pub fn frame(&self, kind: ViewportKind) -> Option<&FrameGeometry> {
        self.frames[kind.index()].as_ref()
    }

    /// Reproject every handle of the frame's viewport in place
    pub fn on_frame_changed(&mut self, frame: &FrameGeometry) {
        let slot = frame.kind.index();
        self.frames[slot] = Some(*frame);

        let table = &mut self.handles[slot];
        for (id, entity) in &self.entities {
            if let Some(handle) = table.get_mut(id) {
                handle.project(&entity.range(), frame, self.zoom_hidden);
            }
        }
    }

    fn reposition(&mut self, id: EntityId) {
        let Some(range) = self.entities.get(&id).map(|e| e.range()) else {
            return;
        };
        for kind in ViewportKind::ALL {
            let slot = kind.index();
            if let (Some(frame), Some(handle)) = (&self.frames[slot], self.handles[slot].get_mut(&id)) {
                handle.project(&range, frame, self.zoom_hidden);
            }
        }
    }

    /// Hide zoom view handles during a zoom animation
    ///
    /// Unhiding does not reproject; the caller follows up with the corrective
    /// frame.
    pub fn set_zoom_hidden(&mut self, hidden: bool) {
        self.zoom_hidden = hidden;
        if hidden {
            for handle in self.handles[ViewportKind::ZoomView.index()].values_mut() {
                handle.visible = false;
            }
        }
    }

    pub fn is_zoom_hidden(&self) -> bool {
        self.zoom_hidden
    }
}

/// Behaviour shared by the four overlay kinds, used by [`AnnotationLayer`]
pub trait Overlay {
    fn name(&self) -> &'static str;

    fn on_frame_changed(&mut self, frame: &FrameGeometry);

    fn set_zoom_hidden(&mut self, hidden: bool);

    /// Remove an entity; false if it was already gone
    fn remove(&mut self, id: EntityId) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn handle(&self, kind: ViewportKind, id: EntityId) -> Option<&RenderHandle>;
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    pub struct Span(pub TimeRange);

    impl Annotation for Span {
        fn range(&self) -> TimeRange {
            self.0
        }
    }

    pub fn span(start: f64, end: f64) -> Span {
        Span(TimeRange::new(start, end).unwrap())
    }

    pub fn zoom_frame(offset: i64) -> FrameGeometry {
        FrameGeometry {
            kind: ViewportKind::ZoomView,
            frame_offset: offset,
            width: 800,
            scale: 512.0,
            sample_rate: 44100,
        }
    }

    pub fn overview_frame() -> FrameGeometry {
        FrameGeometry {
            kind: ViewportKind::Overview,
            frame_offset: 0,
            width: 500,
            scale: 882.0,
            sample_rate: 44100,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_range_validation() {
        assert!(TimeRange::new(-1.0, 2.0).is_err());
        assert!(TimeRange::new(0.0, 0.0).is_err());
        assert!(TimeRange::new(2.0, 2.0).is_err());
        assert!(TimeRange::new(3.0, 2.0).is_err());
        assert!(TimeRange::new(0.0, f64::NAN).is_err());
        assert!(TimeRange::new(1.0, 2.0).is_ok());
        assert_eq!(
            TimeRange::new(-1.0, 2.0),
            Err(AnnotationError::InvalidRange { start: -1.0, end: 2.0 })
        );
    }

    #[test]
    fn test_ids_are_monotonic() {
        let mut store = AnnotationStore::new();
        let a = store.insert(span(0.0, 1.0));
        let b = store.insert(span(0.0, 1.0));
        store.remove(b);
        let c = store.insert(span(0.0, 1.0));
        assert!(a < b && b < c);
    }

    #[test]
    fn test_segment_pixel_span_scenario() {
        let mut store = AnnotationStore::new();
        store.on_frame_changed(&zoom_frame(0));
        let id = store.insert(span(1.0, 2.0));

        let handle = store.handle(ViewportKind::ZoomView, id).unwrap();
        assert!(handle.visible);
        assert_eq!((handle.x_start, handle.x_end), (86.0, 172.0));
    }

    #[test]
    fn test_culling_and_clipping() {
        let mut store = AnnotationStore::new();
        let id = store.insert(span(1.0, 2.0));

        store.on_frame_changed(&zoom_frame(150));
        let handle = *store.handle(ViewportKind::ZoomView, id).unwrap();
        assert!(handle.visible);
        assert_eq!((handle.x_start, handle.x_end), (0.0, 22.0));

        store.on_frame_changed(&zoom_frame(172));
        assert!(!store.handle(ViewportKind::ZoomView, id).unwrap().visible);
    }

    #[test]
    fn test_overview_always_visible() {
        let mut store = AnnotationStore::new();
        let id = store.insert(span(9.0, 9.5));
        store.on_frame_changed(&overview_frame());
        let handle = store.handle(ViewportKind::Overview, id).unwrap();
        assert!(handle.visible);
        assert_eq!(handle.x_start, 450.0);
    }

    #[test]
    fn test_handles_updated_in_place_not_recreated() {
        let mut store = AnnotationStore::new();
        let id = store.insert(span(1.0, 2.0));
        for offset in [0, 50, 100] {
            store.on_frame_changed(&zoom_frame(offset));
        }
        assert_eq!(store.handles[ViewportKind::ZoomView.index()].len(), 1);
        assert_eq!(store.handle(ViewportKind::ZoomView, id).unwrap().x_start, 0.0);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = AnnotationStore::new();
        let id = store.insert(span(1.0, 2.0));
        assert!(store.remove(id).is_some());
        assert!(store.remove(id).is_none());
        assert!(store.handle(ViewportKind::Overview, id).is_none());
        assert!(store.handle(ViewportKind::ZoomView, id).is_none());
    }

    #[test]
    fn test_zoom_hidden() {
        let mut store = AnnotationStore::new();
        store.on_frame_changed(&zoom_frame(0));
        store.on_frame_changed(&overview_frame());
        let id = store.insert(span(1.0, 2.0));

        store.set_zoom_hidden(true);
        assert_eq!(store.visible_count(ViewportKind::ZoomView), 0);
        store.on_frame_changed(&zoom_frame(0));
        assert!(!store.handle(ViewportKind::ZoomView, id).unwrap().visible);
        assert!(store.handle(ViewportKind::Overview, id).unwrap().visible);

        store.set_zoom_hidden(false);
        store.on_frame_changed(&zoom_frame(0));
        assert_eq!(store.visible_count(ViewportKind::ZoomView), 1);
    }

    #[test]
    fn test_modify_repositions() {
        let mut store = AnnotationStore::new();
        store.on_frame_changed(&zoom_frame(0));
        let id = store.insert(span(1.0, 2.0));
        store.modify(id, |s| s.0 = TimeRange::new(2.0, 3.0).unwrap());
        assert_eq!(store.handle(ViewportKind::ZoomView, id).unwrap().x_start, 172.0);
        assert!(store.modify(999, |_| ()).is_none());
    }

    #[test]
    fn test_clear_returns_ids() {
        let mut store = AnnotationStore::new();
        let a = store.insert(span(1.0, 2.0));
        let b = store.insert(span(3.0, 4.0));
        assert_eq!(store.clear(), vec![a, b]);
        assert!(store.is_empty());
    }
}
