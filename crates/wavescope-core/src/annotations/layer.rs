//! Annotation layer: owns the four overlays and connects them to the bus
//!
//! Frame changes fan out to every overlay in a fixed order. While a zoom
//! animation runs the zoom view handles stay hidden; on `finished` they are
//! reprojected against the corrective frame, which the zoom view publishes
//! just before the `finished` phase.

use crate::annotations::{
    EntityId, KeywordOverlay, Marker, Overlay, SegmentOptions, SegmentOverlay, SpeakerInterval, SpeakerOverlay,
    TagOverlay, TimeRange,
};
use crate::context::ViewContext;
use crate::error::{AnnotationError, AnnotationResult};
use crate::events::{AnimationPhase, ViewEvent};
use crate::payload::AnnotationPayload;
use crate::types::{FrameGeometry, Seconds, ViewportKind};

/// Counts of loaded annotations, per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationCounts {
    pub segments: usize,
    pub speakers: usize,
    pub tags: usize,
    pub keywords: usize,
}

#[derive(Debug)]
pub struct AnnotationLayer {
    ctx: ViewContext,
    segments: SegmentOverlay,
    speakers: SpeakerOverlay,
    tags: TagOverlay,
    keywords: KeywordOverlay,
    frames: [Option<FrameGeometry>; 2],
    animating: bool,
}

impl AnnotationLayer {
    pub fn new(ctx: ViewContext) -> Self {
        let gap_px = ctx.config.overlays.tag_cluster_gap_px;
        Self {
            ctx,
            segments: SegmentOverlay::new(),
            speakers: SpeakerOverlay::new(),
            tags: TagOverlay::new(gap_px),
            keywords: KeywordOverlay::new(),
            frames: [None, None],
            animating: false,
        }
    }

    pub fn segments(&self) -> &SegmentOverlay {
        &self.segments
    }

    pub fn speakers(&self) -> &SpeakerOverlay {
        &self.speakers
    }

    pub fn tags(&self) -> &TagOverlay {
        &self.tags
    }

    pub fn keywords(&self) -> &KeywordOverlay {
        &self.keywords
    }

    pub fn is_animating(&self) -> bool {
        self.animating
    }

    pub fn counts(&self) -> AnnotationCounts {
        AnnotationCounts {
            segments: self.segments.len(),
            speakers: self.speakers.len(),
            tags: self.tags.len(),
            keywords: self.keywords.len(),
        }
    }

    fn overlays_mut(&mut self) -> [&mut dyn Overlay; 4] {
        [&mut self.segments, &mut self.speakers, &mut self.tags, &mut self.keywords]
    }

    pub fn on_frame_changed(&mut self, frame: &FrameGeometry) {
        self.frames[frame.kind.index()] = Some(*frame);
        for overlay in self.overlays_mut() {
            overlay.on_frame_changed(frame);
        }
    }

    pub fn on_zoom_animation(&mut self, phase: AnimationPhase) {
        match phase {
            AnimationPhase::Started => {
                self.animating = true;
                for overlay in self.overlays_mut() {
                    overlay.set_zoom_hidden(true);
                }
            }
            AnimationPhase::Finished => {
                self.animating = false;
                let frame = self.frames[ViewportKind::ZoomView.index()];
                for overlay in self.overlays_mut() {
                    overlay.set_zoom_hidden(false);
                    if let Some(frame) = &frame {
                        overlay.on_frame_changed(frame);
                    }
                }
            }
        }
    }

    pub fn add_segment(&mut self, start: Seconds, end: Seconds, options: SegmentOptions) -> AnnotationResult<EntityId> {
        let id = self.segments.create(start, end, options)?;
        log::debug!("segments: created {} [{:.3}, {:.3}]", id, start, end);
        self.ctx.bus.publish(ViewEvent::SegmentCreated { id });
        Ok(id)
    }

    pub fn update_segment(&mut self, id: EntityId, start: Seconds, end: Seconds) -> AnnotationResult<()> {
        self.segments.update(id, start, end)?;
        self.ctx.bus.publish(ViewEvent::SegmentChanged { id });
        Ok(())
    }

    /// Remove a segment; a missing id is a no-op
    pub fn remove_segment(&mut self, id: EntityId) -> bool {
        let removed = self.segments.remove(id);
        if removed {
            self.ctx.bus.publish(ViewEvent::SegmentRemoved { id });
        }
        removed
    }

    pub fn remove_segments_by_time(&mut self, start: Seconds, end: Option<Seconds>) -> Vec<EntityId> {
        let removed = self.segments.remove_by_time(start, end);
        self.publish_removed(&removed);
        removed
    }

    pub fn remove_all_segments(&mut self) -> Vec<EntityId> {
        let removed = self.segments.remove_all();
        self.publish_removed(&removed);
        removed
    }

    fn publish_removed(&self, ids: &[EntityId]) {
        for &id in ids {
            self.ctx.bus.publish(ViewEvent::SegmentRemoved { id });
        }
    }

    /// Drag a segment marker to a zoom view pixel (frame-relative)
    ///
    /// The marker keeps at least one zoom view pixel from its sibling.
    pub fn drag_segment_marker(&mut self, id: EntityId, marker: Marker, x: f64) -> AnnotationResult<TimeRange> {
        let frame = self.frames[ViewportKind::ZoomView.index()].ok_or(AnnotationError::NotFound(id))?;
        let time = frame.frame_pixel_to_time(x);
        let range = self
            .segments
            .drag_marker(id, marker, time, frame.pixel_duration(), self.ctx.duration())?;
        self.ctx.bus.publish(ViewEvent::SegmentChanged { id });
        Ok(range)
    }

    pub fn add_tag(&mut self, start: Seconds, end: Seconds, label: &str, confidence: f64) -> AnnotationResult<EntityId> {
        self.tags.create(start, end, label, confidence)
    }

    pub fn remove_tag(&mut self, id: EntityId) -> bool {
        self.tags.remove(id)
    }

    pub fn add_keyword(&mut self, start: Seconds, end: Seconds, label: &str) -> AnnotationResult<EntityId> {
        self.keywords.create(start, end, label)
    }

    pub fn remove_keyword(&mut self, id: EntityId) -> bool {
        self.keywords.remove(id)
    }

    pub fn add_speaker(&mut self, start: Seconds, end: Seconds, speaker: &str) -> AnnotationResult<EntityId> {
        self.speakers.create(start, end, speaker)
    }

    pub fn remove_speaker(&mut self, id: EntityId) -> bool {
        self.speakers.remove(id)
    }

    /// Merge and load raw speaker intervals
    pub fn load_speakers(&mut self, raw: &[SpeakerInterval]) -> AnnotationResult<Vec<EntityId>> {
        let gap = self.ctx.config.overlays.speaker_merge_gap;
        self.speakers.load(raw, gap)
    }

    /// Load every decodable feature of a payload
    ///
    /// Optional features (tags, keywords, speakers) are all-or-nothing: one
    /// invalid record drops that feature with a warning. Invalid segments are
    /// skipped one by one.
    pub fn load_payload(&mut self, payload: &AnnotationPayload) -> AnnotationCounts {
        for record in payload.segments.iter().flatten() {
            let options = SegmentOptions {
                label: record.label.clone(),
                color: record.color.clone(),
                editable: record.editable,
            };
            if let Err(e) = self.add_segment(record.start, record.end, options) {
                log::warn!("payload: skipping segment: {}", e);
            }
        }

        if let Some(tags) = &payload.tags {
            match validate_all(tags.iter().map(|t| (t.start, t.end))) {
                Ok(ranges) => {
                    for (t, range) in tags.iter().zip(ranges) {
                        self.tags.insert(range, &t.label, t.confidence);
                    }
                }
                Err(e) => log::warn!("payload: skipping tags: {}", e),
            }
        }

        if let Some(keywords) = &payload.keywords {
            match validate_all(keywords.iter().map(|k| (k.start, k.end))) {
                Ok(ranges) => {
                    for (k, range) in keywords.iter().zip(ranges) {
                        self.keywords.insert(range, &k.label);
                    }
                }
                Err(e) => log::warn!("payload: skipping keywords: {}", e),
            }
        }

        if let Some(speakers) = &payload.speakers {
            if let Err(e) = self.load_speakers(speakers) {
                log::warn!("payload: skipping speakers: {}", e);
            }
        }

        let counts = self.counts();
        log::info!(
            "annotations: {} segments, {} speaker regions, {} tags, {} keywords",
            counts.segments,
            counts.speakers,
            counts.tags,
            counts.keywords
        );
        counts
    }
}

fn validate_all(ranges: impl Iterator<Item = (Seconds, Seconds)>) -> AnnotationResult<Vec<TimeRange>> {
    ranges.map(|(start, end)| TimeRange::new(start, end)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotations::test_support::{overview_frame, zoom_frame};
    use crate::events::Topic;
    use crate::viewport::test_support::context;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn record(ctx: &ViewContext) -> Rc<RefCell<Vec<ViewEvent>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        for topic in [Topic::SegmentCreated, Topic::SegmentRemoved, Topic::SegmentChanged] {
            let s = Rc::clone(&seen);
            ctx.bus.subscribe(topic, move |e| s.borrow_mut().push(e.clone()));
        }
        seen
    }

    fn layer() -> (AnnotationLayer, ViewContext) {
        let ctx = context(10);
        let mut layer = AnnotationLayer::new(ctx.clone());
        layer.on_frame_changed(&overview_frame());
        layer.on_frame_changed(&zoom_frame(0));
        (layer, ctx)
    }

    #[test]
    fn test_segment_lifecycle_events() {
        let (mut layer, ctx) = layer();
        let seen = record(&ctx);

        let id = layer.add_segment(1.0, 2.0, SegmentOptions::default()).unwrap();
        assert!(layer.add_segment(-1.0, 2.0, SegmentOptions::default()).is_err());
        layer.update_segment(id, 1.5, 2.5).unwrap();
        assert!(layer.remove_segment(id));
        assert!(!layer.remove_segment(id));
        ctx.bus.flush();

        assert_eq!(
            *seen.borrow(),
            vec![
                ViewEvent::SegmentCreated { id },
                ViewEvent::SegmentChanged { id },
                ViewEvent::SegmentRemoved { id },
            ]
        );
    }

    #[test]
    fn test_overlays_hidden_during_animation() {
        let (mut layer, _) = layer();
        let seg = layer.add_segment(1.0, 2.0, SegmentOptions::default()).unwrap();
        let tag = layer.add_tag(1.0, 1.2, "t", 0.5).unwrap();

        layer.on_zoom_animation(AnimationPhase::Started);
        assert!(!layer.segments().handle(ViewportKind::ZoomView, seg).unwrap().visible);
        assert!(layer.segments().handle(ViewportKind::Overview, seg).unwrap().visible);
        assert_eq!(layer.tags().cluster_count(), 0);

        // Corrective frame arrives before `finished`; handles stay hidden
        let corrective = FrameGeometry {
            scale: 1024.0,
            ..zoom_frame(0)
        };
        layer.on_frame_changed(&corrective);
        assert!(!layer.segments().handle(ViewportKind::ZoomView, seg).unwrap().visible);

        layer.on_zoom_animation(AnimationPhase::Finished);
        let handle = layer.segments().handle(ViewportKind::ZoomView, seg).unwrap();
        assert!(handle.visible);
        assert_eq!(handle.x_start, 43.0);
        assert_eq!(layer.tags().cluster_count(), 1);
        assert!(layer.tags().handle(ViewportKind::ZoomView, tag).unwrap().visible);
    }

    #[test]
    fn test_drag_marker_by_pixel() {
        let (mut layer, ctx) = layer();
        let seen = record(&ctx);
        let id = layer
            .add_segment(1.0, 2.0, SegmentOptions { editable: true, ..Default::default() })
            .unwrap();

        let range = layer.drag_segment_marker(id, Marker::End, 258.0).unwrap();
        assert!((range.end() - 258.0 * 512.0 / 44100.0).abs() < 1e-9);

        // Past the sibling: pinned one pixel after the start
        let range = layer.drag_segment_marker(id, Marker::End, 0.0).unwrap();
        assert!((range.end() - range.start() - 512.0 / 44100.0).abs() < 1e-9);

        ctx.bus.flush();
        assert_eq!(seen.borrow().len(), 3);
    }

    #[test]
    fn test_remove_all_publishes_each() {
        let (mut layer, ctx) = layer();
        let seen = record(&ctx);
        layer.add_segment(1.0, 2.0, SegmentOptions::default()).unwrap();
        layer.add_segment(3.0, 4.0, SegmentOptions::default()).unwrap();
        assert_eq!(layer.remove_all_segments().len(), 2);
        ctx.bus.flush();
        let removed = seen
            .borrow()
            .iter()
            .filter(|e| matches!(e, ViewEvent::SegmentRemoved { .. }))
            .count();
        assert_eq!(removed, 2);
    }

    #[test]
    fn test_load_payload_skips_bad_features() {
        let (mut layer, _) = layer();
        let json = r#"{
            "segments": [{ "start": 1.0, "end": 2.0 }, { "start": 3.0, "end": 2.0 }],
            "tags": [{ "start": 1.0, "end": 1.5, "label": "a" }, { "start": 4.0, "end": 3.0, "label": "bad" }],
            "keywords": [{ "start": 5.0, "end": 5.5, "label": "k" }],
            "speakers": [{ "speaker": "A", "start": 0.0, "end": 2.0 }, { "speaker": "A", "start": 2.5, "end": 4.0 }]
        }"#;
        let payload = AnnotationPayload::from_json(json).unwrap();
        let counts = layer.load_payload(&payload);
        assert_eq!(
            counts,
            AnnotationCounts {
                segments: 1,
                speakers: 1,
                tags: 0,
                keywords: 1
            }
        );
    }
}
