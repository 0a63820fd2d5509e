//! Shared types used across the engine

use crate::resample::{pixel_to_time, time_to_pixel};

/// Playback time in seconds
pub type Seconds = f64;

/// Which of the two viewports something belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewportKind {
    /// Fixed whole-timeline view
    Overview,
    /// Scrollable, zoomable detail view
    ZoomView,
}

impl ViewportKind {
    /// Both kinds, in handle-table order
    pub const ALL: [ViewportKind; 2] = [ViewportKind::Overview, ViewportKind::ZoomView];

    /// Slot index used by per-viewport tables
    pub const fn index(self) -> usize {
        match self {
            ViewportKind::Overview => 0,
            ViewportKind::ZoomView => 1,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ViewportKind::Overview => "overview",
            ViewportKind::ZoomView => "zoomview",
        }
    }
}

/// Snapshot of a viewport's visible frame
///
/// Carried by every `frame-changed` event so subscribers can project time
/// ranges into the viewport's pixel space without reaching back into the
/// viewport itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameGeometry {
    /// Viewport that produced the frame
    pub kind: ViewportKind,
    /// Absolute pixel index (at `scale`) of the frame's left edge
    pub frame_offset: i64,
    /// Visible width in pixels
    pub width: u32,
    /// Source samples per pixel
    pub scale: f64,
    /// Source sample rate in Hz
    pub sample_rate: u32,
}

impl FrameGeometry {
    /// Time at the left edge of the frame
    pub fn start_time(&self) -> Seconds {
        pixel_to_time(self.frame_offset, self.sample_rate, self.scale)
    }

    /// Time at the right edge of the frame
    pub fn end_time(&self) -> Seconds {
        pixel_to_time(self.frame_end(), self.sample_rate, self.scale)
    }

    /// Absolute pixel index one past the right edge
    pub fn frame_end(&self) -> i64 {
        self.frame_offset + self.width as i64
    }

    /// Absolute pixel for a time at this frame's scale
    pub fn time_to_pixel(&self, time: Seconds) -> i64 {
        time_to_pixel(time, self.sample_rate, self.scale)
    }

    /// Time for a pixel relative to the frame's left edge
    pub fn frame_pixel_to_time(&self, x: f64) -> Seconds {
        (self.frame_offset as f64 + x) * self.scale / self.sample_rate as f64
    }

    /// Duration covered by one pixel
    pub fn pixel_duration(&self) -> Seconds {
        self.scale / self.sample_rate as f64
    }

    /// Whether a time falls inside the visible frame
    pub fn contains_time(&self, time: Seconds) -> bool {
        let px = self.time_to_pixel(time);
        px >= self.frame_offset && px < self.frame_end()
    }
}
