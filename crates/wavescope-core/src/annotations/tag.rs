//! Semantic tags with label-collision clustering
//!
//! On every zoom view frame change the visible tags are ordered by start time
//! and merged pairwise: each pass finds the closest pair of adjacent clusters
//! (distance between their mean start times) and merges it if the distance is
//! within `gap_px` zoom view pixels converted to time. Passes repeat until no
//! adjacent pair is that close. Every pass removes one cluster, so the loop
//! ends after at most `n - 1` merges. Equal distances resolve to the earliest
//! pair.
//!
//! Inside a cluster only the highest-confidence tag is drawn prominently; the
//! others are suppressed. Cluster buffers are reused across frames.

use crate::annotations::{Annotation, AnnotationStore, Emphasis, EntityId, Overlay, RenderHandle, TimeRange};
use crate::error::AnnotationResult;
use crate::types::{FrameGeometry, Seconds, ViewportKind};

#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    range: TimeRange,
    pub label: String,
    /// Detector confidence or relevance score; higher wins a cluster
    pub confidence: f64,
}

impl Tag {
    pub fn start(&self) -> Seconds {
        self.range.start()
    }

    pub fn end(&self) -> Seconds {
        self.range.end()
    }
}

impl Annotation for Tag {
    fn range(&self) -> TimeRange {
        self.range
    }
}

/// Contiguous run of `members`
#[derive(Debug, Clone, Copy)]
struct ClusterSpan {
    first: usize,
    len: usize,
    start_sum: f64,
}

impl ClusterSpan {
    fn mean_start(&self) -> f64 {
        self.start_sum / self.len as f64
    }
}

#[derive(Debug)]
pub struct TagOverlay {
    store: AnnotationStore<Tag>,
    gap_px: f64,
    /// Visible tags as (start, id), ordered by start
    members: Vec<(Seconds, EntityId)>,
    clusters: Vec<ClusterSpan>,
}

impl TagOverlay {
    pub fn new(gap_px: f64) -> Self {
        Self {
            store: AnnotationStore::new(),
            gap_px,
            members: Vec::new(),
            clusters: Vec::new(),
        }
    }

    pub fn store(&self) -> &AnnotationStore<Tag> {
        &self.store
    }

    pub fn get(&self, id: EntityId) -> Option<&Tag> {
        self.store.get(id)
    }

    pub fn create(&mut self, start: Seconds, end: Seconds, label: &str, confidence: f64) -> AnnotationResult<EntityId> {
        let range = TimeRange::new(start, end)?;
        Ok(self.insert(range, label, confidence))
    }

    /// Add a tag with an already validated range
    pub fn insert(&mut self, range: TimeRange, label: &str, confidence: f64) -> EntityId {
        let id = self.store.insert(Tag {
            range,
            label: label.to_string(),
            confidence,
        });
        self.recluster();
        id
    }

    /// Clusters from the last zoom view frame, each as member ids ordered by start
    pub fn clusters(&self) -> impl Iterator<Item = impl Iterator<Item = EntityId> + '_> + '_ {
        self.clusters
            .iter()
            .map(|c| self.members[c.first..c.first + c.len].iter().map(|&(_, id)| id))
    }

    pub fn cluster_count(&self) -> usize {
        self.clusters.len()
    }

    fn recluster(&mut self) {
        let Some(frame) = self.store.frame(ViewportKind::ZoomView).copied() else {
            return;
        };
        let threshold = self.gap_px * frame.pixel_duration();

        self.members.clear();
        self.members.extend(self.store.visible(ViewportKind::ZoomView).map(|(id, tag, _)| (tag.start(), id)));
        self.members
            .sort_unstable_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));

        self.clusters.clear();
        self.clusters.extend(self.members.iter().enumerate().map(|(i, &(start, _))| ClusterSpan {
            first: i,
            len: 1,
            start_sum: start,
        }));

        while let Some(i) = closest_pair(&self.clusters, threshold) {
            let next = self.clusters.remove(i + 1);
            let merged = &mut self.clusters[i];
            merged.len += next.len;
            merged.start_sum += next.start_sum;
        }

        self.assign_emphasis();
    }

    fn assign_emphasis(&mut self) {
        for handle in self.store.handles_mut(ViewportKind::ZoomView) {
            handle.emphasis = Emphasis::Normal;
            handle.cluster_size = 0;
        }

        for cluster in &self.clusters {
            let members = &self.members[cluster.first..cluster.first + cluster.len];
            let leader = members
                .iter()
                .map(|&(_, id)| id)
                .reduce(|best, id| {
                    let conf = |id| self.store.get(id).map_or(f64::NEG_INFINITY, |t| t.confidence);
                    if conf(id) > conf(best) {
                        id
                    } else {
                        best
                    }
                });

            for &(_, id) in members {
                if let Some(handle) = self.store.handle_mut(ViewportKind::ZoomView, id) {
                    handle.cluster_size = cluster.len;
                    handle.emphasis = if Some(id) == leader {
                        Emphasis::Prominent
                    } else {
                        Emphasis::Suppressed
                    };
                }
            }
        }
    }
}

/// Index of the closest adjacent cluster pair within `threshold`
fn closest_pair(clusters: &[ClusterSpan], threshold: f64) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, pair) in clusters.windows(2).enumerate() {
        let distance = pair[1].mean_start() - pair[0].mean_start();
        if distance > threshold {
            continue;
        }
        if best.is_none_or(|(_, d)| distance < d) {
            best = Some((i, distance));
        }
    }
    best.map(|(i, _)| i)
}

impl Overlay for TagOverlay {
    fn name(&self) -> &'static str {
        "tags"
    }

    fn on_frame_changed(&mut self, frame: &FrameGeometry) {
        self.store.on_frame_changed(frame);
        if frame.kind == ViewportKind::ZoomView {
            self.recluster();
        }
    }

    fn set_zoom_hidden(&mut self, hidden: bool) {
        self.store.set_zoom_hidden(hidden);
        if hidden {
            self.members.clear();
            self.clusters.clear();
        }
    }

    fn remove(&mut self, id: EntityId) -> bool {
        let removed = self.store.remove(id).is_some();
        if removed {
            self.recluster();
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
