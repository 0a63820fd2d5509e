//! Waveform canvas state
//!
//! Pure data copied out of a viewport surface and the annotation layer, so a
//! canvas can be drawn without borrowing the session. Buffers are reused
//! across captures.

use iced::Color;
use wavescope_core::annotations::{AnnotationLayer, Emphasis};
use wavescope_core::config::{OverviewConfig, ZoomViewConfig};
use wavescope_core::viewport::RenderQuality;
use wavescope_core::{Session, Viewport, ViewportKind};

use crate::theme;

/// Height of the axis strip at the bottom of each canvas
pub const AXIS_HEIGHT: f32 = 14.0;

/// Which overlay a mark came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkKind {
    Speaker,
    Segment,
    Keyword,
    Tag,
}

/// One visible overlay handle, ready to draw
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayMark {
    pub kind: MarkKind,
    pub x_start: f32,
    pub x_end: f32,
    pub color: Color,
    /// Drawn next to the mark; `None` for suppressed tags
    pub label: Option<String>,
    /// Tag cluster size, shown on cluster leaders
    pub cluster_size: usize,
    /// Keyword marker width
    pub marker_width: f32,
}

/// Drawing state of one viewport
#[derive(Debug, Clone)]
pub struct WaveformState {
    pub kind: ViewportKind,
    /// Surface height in pixels
    pub height: f32,
    pub columns: Vec<(i8, i8)>,
    /// Tick x positions and labels
    pub ticks: Vec<(f32, String)>,
    pub playhead_x: Option<f32>,
    pub highlight: Option<(f32, f32)>,
    pub quality: RenderQuality,
    pub marks: Vec<OverlayMark>,
}

impl WaveformState {
    pub fn new(kind: ViewportKind) -> Self {
        let height = match kind {
            ViewportKind::Overview => OverviewConfig::default().height,
            ViewportKind::ZoomView => ZoomViewConfig::default().height,
        };
        Self {
            kind,
            height: height as f32,
            columns: Vec::new(),
            ticks: Vec::new(),
            playhead_x: None,
            highlight: None,
            quality: RenderQuality::Exact,
            marks: Vec::new(),
        }
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    /// Copy what a viewport and the overlays currently show
    pub fn capture<V: Viewport + ?Sized>(&mut self, viewport: &V, layer: &AnnotationLayer) {
        let surface = viewport.surface();
        self.kind = viewport.kind();
        self.height = surface.height() as f32;

        self.columns.clear();
        self.columns.extend_from_slice(surface.columns());
        self.ticks.clear();
        self.ticks
            .extend(surface.ticks().iter().map(|t| (t.x, t.label.clone())));
        self.playhead_x = surface.playhead_x();
        self.highlight = surface.highlight();
        self.quality = surface.quality();

        self.capture_marks(layer);
    }

    fn capture_marks(&mut self, layer: &AnnotationLayer) {
        let kind = self.kind;
        self.marks.clear();

        for (_, speaker, handle) in layer.speakers().store().visible(kind) {
            self.marks.push(OverlayMark {
                kind: MarkKind::Speaker,
                x_start: handle.x_start,
                x_end: handle.x_end,
                color: theme::speaker_color(speaker.color_index),
                label: Some(speaker.speaker.clone()),
                cluster_size: 0,
                marker_width: 0.0,
            });
        }

        for (_, segment, handle) in layer.segments().store().visible(kind) {
            self.marks.push(OverlayMark {
                kind: MarkKind::Segment,
                x_start: handle.x_start,
                x_end: handle.x_end,
                color: theme::segment_color(segment.color.as_deref()),
                label: (!segment.label.is_empty()).then(|| segment.label.clone()),
                cluster_size: 0,
                marker_width: 0.0,
            });
        }

        for (_, keyword, handle) in layer.keywords().store().visible(kind) {
            self.marks.push(OverlayMark {
                kind: MarkKind::Keyword,
                x_start: handle.x_start,
                x_end: handle.x_end,
                color: theme::KEYWORD_COLOR,
                label: Some(keyword.label.clone()),
                cluster_size: 0,
                marker_width: handle.marker_width,
            });
        }

        for (_, tag, handle) in layer.tags().store().visible(kind) {
            let suppressed = handle.emphasis == Emphasis::Suppressed;
            self.marks.push(OverlayMark {
                kind: MarkKind::Tag,
                x_start: handle.x_start,
                x_end: handle.x_end,
                color: if suppressed {
                    theme::TAG_SUPPRESSED_COLOR
                } else {
                    theme::TAG_COLOR
                },
                label: (!suppressed).then(|| tag.label.clone()),
                cluster_size: handle.cluster_size,
                marker_width: 0.0,
            });
        }
    }
}

/// Canvas state for both viewports of a session
#[derive(Debug, Clone)]
pub struct SessionState {
    pub overview: WaveformState,
    pub zoomview: WaveformState,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            overview: WaveformState::new(ViewportKind::Overview),
            zoomview: WaveformState::new(ViewportKind::ZoomView),
        }
    }
}

impl SessionState {
    /// Refresh both viewports from a live session
    ///
    /// Call after every input or tick that may have redrawn a surface.
    pub fn refresh(&mut self, session: &Session) {
        let layer = session.annotations();
        self.overview.capture(&*session.overview(), &layer);
        self.zoomview.capture(&*session.zoomview(), &layer);
    }
}
