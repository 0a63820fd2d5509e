//! Keyword markers
//!
//! No clustering: every visible keyword draws its marker, and the zoom view
//! width is shared evenly between the keywords currently visible.

use crate::annotations::{Annotation, AnnotationStore, EntityId, Overlay, RenderHandle, TimeRange};
use crate::error::AnnotationResult;
use crate::types::{FrameGeometry, Seconds, ViewportKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Keyword {
    range: TimeRange,
    pub label: String,
}

impl Keyword {
    pub fn start(&self) -> Seconds {
        self.range.start()
    }

    pub fn end(&self) -> Seconds {
        self.range.end()
    }
}

impl Annotation for Keyword {
    fn range(&self) -> TimeRange {
        self.range
    }
}

#[derive(Debug, Default)]
pub struct KeywordOverlay {
    store: AnnotationStore<Keyword>,
}

impl KeywordOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &AnnotationStore<Keyword> {
        &self.store
    }

    pub fn get(&self, id: EntityId) -> Option<&Keyword> {
        self.store.get(id)
    }

    pub fn create(&mut self, start: Seconds, end: Seconds, label: &str) -> AnnotationResult<EntityId> {
        let range = TimeRange::new(start, end)?;
        Ok(self.insert(range, label))
    }

    /// Add a keyword with an already validated range
    pub fn insert(&mut self, range: TimeRange, label: &str) -> EntityId {
        let id = self.store.insert(Keyword {
            range,
            label: label.to_string(),
        });
        self.resize_markers();
        id
    }

    fn resize_markers(&mut self) {
        let Some(width) = self.store.frame(ViewportKind::ZoomView).map(|f| f.width) else {
            return;
        };
        let count = self.store.visible_count(ViewportKind::ZoomView);
        let marker_width = if count == 0 { 0.0 } else { width as f32 / count as f32 };

        for handle in self.store.handles_mut(ViewportKind::ZoomView) {
            handle.marker_width = if handle.visible { marker_width } else { 0.0 };
        }
    }
}

impl Overlay for KeywordOverlay {
    fn name(&self) -> &'static str {
        "keywords"
    }

    fn on_frame_changed(&mut self, frame: &FrameGeometry) {
        self.store.on_frame_changed(frame);
        if frame.kind == ViewportKind::ZoomView {
            self.resize_markers();
        }
    }

    fn set_zoom_hidden(&mut self, hidden: bool) {
        self.store.set_zoom_hidden(hidden);
    }

    fn remove(&mut self, id: EntityId) -> bool {
        let removed = self.store.remove(id).is_some();
        if removed {
            self.resize_markers();
        }
        removed
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

    #[test]
    fn test_width_shared_by_visible_keywords() {
        let mut overlay = KeywordOverlay::new();
        overlay.on_frame_changed(&zoom_frame(0));
        let a = overlay.create(1.0, 1.5, "alpha").unwrap();
        let b = overlay.create(1.01, 1.2, "beta").unwrap();
        let off = overlay.create(40.0, 41.0, "gamma").unwrap();

        assert_eq!(overlay.handle(ViewportKind::ZoomView, a).unwrap().marker_width, 400.0);
        assert_eq!(overlay.handle(ViewportKind::ZoomView, b).unwrap().marker_width, 400.0);
        assert_eq!(overlay.handle(ViewportKind::ZoomView, off).unwrap().marker_width, 0.0);

        overlay.remove(b);
        assert_eq!(overlay.handle(ViewportKind::ZoomView, a).unwrap().marker_width, 800.0);
    }

    #[test]
    fn test_frame_change_recounts() {
        let mut overlay = KeywordOverlay::new();
        overlay.on_frame_changed(&zoom_frame(0));
        let a = overlay.create(1.0, 1.5, "alpha").unwrap();
        let far = overlay.create(40.0, 41.0, "far").unwrap();

        // 40s is pixel 3445 at 512 spp
        overlay.on_frame_changed(&zoom_frame(3400));
        assert!(!overlay.handle(ViewportKind::ZoomView, a).unwrap().visible);
        assert_eq!(overlay.handle(ViewportKind::ZoomView, far).unwrap().marker_width, 800.0);
    }

    #[test]
    fn test_invalid_keyword_rejected() {
        let mut overlay = KeywordOverlay::new();
        assert!(overlay.create(2.0, 1.0, "bad").is_err());
        assert!(overlay.is_empty());
    }
}
