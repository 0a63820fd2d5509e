//! Speaker regions
//!
//! Raw diarization output is usually fragmented: one speaker's turn arrives
//! as several intervals separated by short pauses. Consecutive intervals with
//! the same speaker are merged once at load time when the gap between them is
//! at most the configured merge gap.

use serde::Deserialize;

use crate::annotations::{Annotation, AnnotationStore, EntityId, Overlay, RenderHandle, TimeRange};
use crate::error::AnnotationResult;
use crate::types::{FrameGeometry, Seconds, ViewportKind};

/// One raw speaker-tagged interval
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpeakerInterval {
    pub speaker: String,
    pub start: Seconds,
    pub end: Seconds,
}

/// Merge same-speaker neighbours separated by at most `gap` seconds
///
/// Intervals are ordered by start time first.
pub fn merge_intervals(raw: &[SpeakerInterval], gap: Seconds) -> Vec<SpeakerInterval> {
    let mut sorted: Vec<&SpeakerInterval> = raw.iter().collect();
    sorted.sort_by(|a, b| a.start.total_cmp(&b.start));

    let mut merged: Vec<SpeakerInterval> = Vec::with_capacity(sorted.len());
    for interval in sorted {
        match merged.last_mut() {
            Some(last) if last.speaker == interval.speaker && interval.start - last.end <= gap => {
                last.end = last.end.max(interval.end);
            }
            _ => merged.push(interval.clone()),
        }
    }
    merged
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpeakerSegment {
    range: TimeRange,
    pub speaker: String,
    /// Palette slot, assigned by first appearance of the speaker
    pub color_index: usize,
}

impl SpeakerSegment {
    pub fn start(&self) -> Seconds {
        self.range.start()
    }

    pub fn end(&self) -> Seconds {
        self.range.end()
    }
}

impl Annotation for SpeakerSegment {
    fn range(&self) -> TimeRange {
        self.range
    }
}

#[derive(Debug, Default)]
pub struct SpeakerOverlay {
    store: AnnotationStore<SpeakerSegment>,
    speakers: Vec<String>,
}

impl SpeakerOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &AnnotationStore<SpeakerSegment> {
        &self.store
    }

    pub fn get(&self, id: EntityId) -> Option<&SpeakerSegment> {
        self.store.get(id)
    }

    /// Distinct speakers in order of first appearance
    pub fn speakers(&self) -> &[String] {
        &self.speakers
    }

    fn color_index(&mut self, speaker: &str) -> usize {
        match self.speakers.iter().position(|s| s == speaker) {
            Some(index) => index,
            None => {
                self.speakers.push(speaker.to_string());
                self.speakers.len() - 1
            }
        }
    }

    pub fn create(&mut self, start: Seconds, end: Seconds, speaker: &str) -> AnnotationResult<EntityId> {
        let range = TimeRange::new(start, end)?;
        let color_index = self.color_index(speaker);
        Ok(self.store.insert(SpeakerSegment {
            range,
            speaker: speaker.to_string(),
            color_index,
        }))
    }

    /// Merge and insert a raw interval list
    ///
    /// Every merged interval is validated before anything is inserted, so an
    /// invalid list leaves the overlay untouched.
    pub fn load(&mut self, raw: &[SpeakerInterval], gap: Seconds) -> AnnotationResult<Vec<EntityId>> {
        let merged = merge_intervals(raw, gap);
        let ranges = merged
            .iter()
            .map(|i| TimeRange::new(i.start, i.end))
            .collect::<AnnotationResult<Vec<_>>>()?;

        let ids = merged
            .iter()
            .zip(ranges)
            .map(|(interval, range)| {
                let color_index = self.color_index(&interval.speaker);
                self.store.insert(SpeakerSegment {
                    range,
                    speaker: interval.speaker.clone(),
                    color_index,
                })
            })
            .collect();

        log::debug!(
            "speakers: merged {} raw intervals into {} regions ({} speakers)",
            raw.len(),
            merged.len(),
            self.speakers.len()
        );
        Ok(ids)
    }
}

impl Overlay for SpeakerOverlay {
    fn name(&self) -> &'static str {
        "speakers"
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

    fn interval(speaker: &str, start: f64, end: f64) -> SpeakerInterval {
        SpeakerInterval {
            speaker: speaker.into(),
            start,
            end,
        }
    }

    #[test]
    fn test_merge_bridges_short_gaps() {
        let raw = vec![
            interval("A", 0.0, 2.0),
            interval("A", 2.5, 4.0),
            interval("A", 5.0, 6.0),
            interval("B", 6.2, 8.0),
            interval("A", 8.5, 9.0),
        ];
        let merged = merge_intervals(&raw, 1.0);
        assert_eq!(
            merged,
            vec![interval("A", 0.0, 6.0), interval("B", 6.2, 8.0), interval("A", 8.5, 9.0)]
        );
    }

    #[test]
    fn test_merge_keeps_long_gaps() {
        let raw = vec![interval("A", 0.0, 1.0), interval("A", 2.5, 3.0)];
        assert_eq!(merge_intervals(&raw, 1.0).len(), 2);
    }

    #[test]
    fn test_merge_sorts_by_start() {
        let raw = vec![interval("A", 3.0, 4.0), interval("A", 0.0, 2.5)];
        assert_eq!(merge_intervals(&raw, 1.0), vec![interval("A", 0.0, 4.0)]);
    }

    #[test]
    fn test_merge_contained_interval() {
        let raw = vec![interval("A", 0.0, 5.0), interval("A", 1.0, 2.0)];
        assert_eq!(merge_intervals(&raw, 1.0), vec![interval("A", 0.0, 5.0)]);
    }

    #[test]
    fn test_load_assigns_colors_by_first_appearance() {
        let mut overlay = SpeakerOverlay::new();
        let raw = vec![interval("B", 0.0, 1.0), interval("A", 3.0, 4.0), interval("B", 6.0, 7.0)];
        let ids = overlay.load(&raw, 1.0).unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(overlay.speakers(), &["B".to_string(), "A".to_string()]);
        assert_eq!(overlay.get(ids[0]).unwrap().color_index, 0);
        assert_eq!(overlay.get(ids[1]).unwrap().color_index, 1);
        assert_eq!(overlay.get(ids[2]).unwrap().color_index, 0);
    }

    #[test]
    fn test_load_invalid_leaves_overlay_untouched() {
        let mut overlay = SpeakerOverlay::new();
        let raw = vec![interval("A", 0.0, 1.0), interval("B", 5.0, 4.0)];
        assert!(overlay.load(&raw, 1.0).is_err());
        assert!(overlay.is_empty());
        assert!(overlay.speakers().is_empty());
    }
}
