//! Rendering surface: a retained display list a frontend paints from
//!
//! The surface never owns platform resources. It holds exactly what is on
//! screen: one min/max pair per pixel column, the axis ticks, the playhead
//! and (overview only) the zoom window highlight. Buffers are reused across
//! redraws so scrolling does not allocate.

use crate::resample::ResampledView;
use crate::types::Seconds;

/// Whether the columns on screen are authoritative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderQuality {
    /// Drawn from a view at the viewport's settled scale
    #[default]
    Exact,
    /// Drawn from an intermediate zoom animation frame
    Interpolated,
}

/// Axis tick
#[derive(Debug, Clone, PartialEq)]
pub struct AxisTick {
    /// Position relative to the frame's left edge
    pub x: f32,
    pub time: Seconds,
    pub label: String,
}

/// Retained drawing state for one viewport
#[derive(Debug, Clone)]
pub struct Surface {
    width: u32,
    height: u32,
    columns: Vec<(i8, i8)>,
    ticks: Vec<AxisTick>,
    playhead_x: Option<f32>,
    highlight: Option<(f32, f32)>,
    quality: RenderQuality,
    redraws: u64,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            columns: Vec::with_capacity(width as usize),
            ticks: Vec::new(),
            playhead_x: None,
            highlight: None,
            quality: RenderQuality::Exact,
            redraws: 0,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn resize(&mut self, width: u32) {
        self.width = width;
        self.columns.truncate(width as usize);
    }

    /// Min/max per screen column, left to right
    pub fn columns(&self) -> &[(i8, i8)] {
        &self.columns
    }

    pub fn ticks(&self) -> &[AxisTick] {
        &self.ticks
    }

    pub fn ticks_mut(&mut self) -> &mut Vec<AxisTick> {
        &mut self.ticks
    }

    pub fn playhead_x(&self) -> Option<f32> {
        self.playhead_x
    }

    pub fn highlight(&self) -> Option<(f32, f32)> {
        self.highlight
    }

    pub fn quality(&self) -> RenderQuality {
        self.quality
    }

    /// Number of waveform redraws since creation
    pub fn redraws(&self) -> u64 {
        self.redraws
    }

    /// Draw the slice `[frame_offset, frame_offset + width)` of a view
    ///
    /// `frame_offset` is an absolute pixel index at the view's scale.
    /// Pixels the view does not cover draw as silence.
    pub fn draw_waveform(&mut self, view: &ResampledView, frame_offset: i64) {
        self.columns.clear();
        self.columns.extend(
            (0..self.width as i64).map(|x| view.column(frame_offset + x).unwrap_or((0, 0))),
        );
        self.quality = RenderQuality::Exact;
        self.redraws += 1;
    }

    /// Draw a view whose column 0 is the frame's left edge
    ///
    /// Used for zoom animation frames, which are resampled to exactly the
    /// frame width.
    pub fn draw_interpolated(&mut self, view: &ResampledView) {
        let width = self.width as usize;
        self.columns.clear();
        self.columns
            .extend(view.min().iter().zip(view.max()).take(width).map(|(&lo, &hi)| (lo, hi)));
        self.columns.resize(width, (0, 0));
        self.quality = RenderQuality::Interpolated;
        self.redraws += 1;
    }

    pub fn set_playhead(&mut self, x: Option<f32>) {
        self.playhead_x = x;
    }

    pub fn set_highlight(&mut self, span: Option<(f32, f32)>) {
        self.highlight = span;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::Envelope;
    use crate::resample::{ResampleEngine, ResampleRequest, Resampler};
    use std::sync::Arc;

    fn view() -> ResampledView {
        let max: Vec<i8> = (0..50).collect();
        let min: Vec<i8> = max.iter().map(|v| -v).collect();
        let engine = ResampleEngine::new(Arc::new(Envelope::from_native(100, min, max).unwrap()));
        engine.resample(&ResampleRequest::Scale(1.0)).unwrap()
    }

    #[test]
    fn test_draw_waveform_slice() {
        let mut surface = Surface::new(10, 50);
        surface.draw_waveform(&view(), 20);
        assert_eq!(surface.columns().len(), 10);
        assert_eq!(surface.columns()[0], (-20, 20));
        assert_eq!(surface.quality(), RenderQuality::Exact);
        assert_eq!(surface.redraws(), 1);
    }

    #[test]
    fn test_draw_past_end_is_silent() {
        let mut surface = Surface::new(10, 50);
        surface.draw_waveform(&view(), 45);
        assert_eq!(surface.columns()[4], (-49, 49));
        assert_eq!(surface.columns()[5], (0, 0));
    }

    #[test]
    fn test_draw_interpolated_pads_to_width() {
        let mut surface = Surface::new(60, 50);
        surface.draw_interpolated(&view());
        assert_eq!(surface.columns().len(), 60);
        assert_eq!(surface.columns()[59], (0, 0));
        assert_eq!(surface.quality(), RenderQuality::Interpolated);
    }

    #[test]
    fn test_resize_truncates() {
        let mut surface = Surface::new(10, 50);
        surface.draw_waveform(&view(), 0);
        surface.resize(4);
        assert_eq!(surface.columns().len(), 4);
        assert_eq!(surface.width(), 4);
    }
}
