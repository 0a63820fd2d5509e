//! Viewports: the overview and the zoom view
//!
//! Both variants share a [`ViewportCore`] that owns the surface, the current
//! resampled view, the frame offset and the playhead. The [`Viewport`] trait
//! exposes the common capability set; [`ViewportKind`] tags which variant a
//! frame, event or overlay handle belongs to.
//!
//! ## Frame updates
//!
//! `update_frame(offset)`:
//! 1. clamps the offset to `[0, data_length - width]`
//! 2. redraws the envelope slice `[offset, offset + width)` and the axis
//! 3. repositions the playhead marker if it falls inside the frame
//! 4. publishes `frame-changed` with the new geometry

pub mod axis;
pub mod debounce;
pub mod overview;
pub mod surface;
pub mod zoomview;

pub use debounce::Debounced;
pub use overview::Overview;
pub use surface::{AxisTick, RenderQuality, Surface};
pub use zoomview::{ZoomOutcome, ZoomView};

use crate::context::ViewContext;
use crate::error::{SessionError, SessionResult};
use crate::events::ViewEvent;
use crate::resample::{ResampleRequest, ResampledView};
use crate::types::{FrameGeometry, Seconds, ViewportKind};

/// State shared by both viewport variants
#[derive(Debug)]
pub struct ViewportCore {
    kind: ViewportKind,
    ctx: ViewContext,
    surface: Surface,
    view: ResampledView,
    frame_offset: i64,
    playhead_time: Seconds,
    derivations: u64,
}

impl ViewportCore {
    /// Build the core and derive its first view
    ///
    /// Fails for a zero-sized container or when the first resample fails;
    /// both are construction errors and never retried.
    pub fn new(
        kind: ViewportKind,
        ctx: ViewContext,
        width: u32,
        height: u32,
        request: ResampleRequest,
    ) -> SessionResult<Self> {
        if width == 0 || height == 0 {
            return Err(SessionError::InvalidContainer { width, height });
        }
        let view = ctx.resampler.resample(&request)?;

        log::debug!(
            "{}: created {}x{} at scale {:.2} ({} columns)",
            kind.name(),
            width,
            height,
            view.scale(),
            view.len()
        );

        Ok(Self {
            kind,
            ctx,
            surface: Surface::new(width, height),
            view,
            frame_offset: 0,
            playhead_time: 0.0,
            derivations: 1,
        })
    }

    pub fn kind(&self) -> ViewportKind {
        self.kind
    }

    pub fn ctx(&self) -> &ViewContext {
        &self.ctx
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    pub fn view(&self) -> &ResampledView {
        &self.view
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn frame_offset(&self) -> i64 {
        self.frame_offset
    }

    pub fn playhead_time(&self) -> Seconds {
        self.playhead_time
    }

    /// Number of views derived since construction (including the first)
    pub fn derivations(&self) -> u64 {
        self.derivations
    }

    /// Replace the current view; on failure keep the last good one
    pub fn rederive(&mut self, request: ResampleRequest) -> bool {
        match self.ctx.resampler.resample(&request) {
            Ok(view) => {
                self.view = view;
                self.derivations += 1;
                true
            }
            Err(e) => {
                log::warn!(
                    "{}: resample {:?} failed ({}), keeping last good view",
                    self.kind.name(),
                    request,
                    e
                );
                false
            }
        }
    }

    /// Absolute pixel index one past the last data column
    pub fn data_end(&self) -> i64 {
        self.view.start_pixel() + self.view.len() as i64
    }

    pub fn clamp_offset(&self, offset: i64) -> i64 {
        let max_offset = (self.data_end() - self.width() as i64).max(0);
        offset.clamp(0, max_offset)
    }

    pub fn geometry(&self) -> FrameGeometry {
        FrameGeometry {
            kind: self.kind,
            frame_offset: self.frame_offset,
            width: self.width(),
            scale: self.view.scale(),
            sample_rate: self.view.sample_rate(),
        }
    }

    pub fn resize_surface(&mut self, width: u32) {
        self.surface.resize(width);
    }

    pub fn update_frame(&mut self, offset: i64) {
        self.frame_offset = self.clamp_offset(offset);
        self.surface.draw_waveform(&self.view, self.frame_offset);

        let frame = self.geometry();
        let spacing = self.ctx.config.axis.min_tick_spacing_px;
        axis::compute_ticks(&frame, spacing, self.surface.ticks_mut());

        self.redraw_playhead();
        self.ctx.bus.publish(ViewEvent::FrameChanged(frame));
    }

    /// Move the playhead marker without touching the frame
    pub fn set_playhead(&mut self, time: Seconds) {
        self.playhead_time = time.clamp(0.0, self.ctx.duration());
        self.redraw_playhead();
    }

    fn redraw_playhead(&mut self) {
        let px = self.view.time_to_pixel(self.playhead_time);
        let x = px - self.frame_offset;
        let marker = (x >= 0 && x < self.width() as i64).then_some(x as f32);
        self.surface.set_playhead(marker);
    }

    /// Time under a frame-relative pixel, clamped to the recording
    pub fn frame_pixel_to_time(&self, x: f64) -> Seconds {
        self.geometry().frame_pixel_to_time(x).clamp(0.0, self.ctx.duration())
    }
}

/// Common capability set of the two viewport variants
pub trait Viewport {
    fn core(&self) -> &ViewportCore;

    fn core_mut(&mut self) -> &mut ViewportCore;

    /// Rebuild the view for a new container width
    fn resize(&mut self, width: u32);

    /// React to playback progress
    fn set_playhead_time(&mut self, time: Seconds);

    fn kind(&self) -> ViewportKind {
        self.core().kind()
    }

    fn update_frame(&mut self, offset: i64) {
        self.core_mut().update_frame(offset);
    }

    fn surface(&self) -> &Surface {
        self.core().surface()
    }

    fn current_view(&self) -> &ResampledView {
        self.core().view()
    }

    fn frame(&self) -> FrameGeometry {
        self.core().geometry()
    }

    fn time_to_pixel(&self, time: Seconds) -> i64 {
        self.core().view().time_to_pixel(time)
    }

    fn pixel_to_time(&self, pixel: i64) -> Seconds {
        self.core().view().pixel_to_time(pixel)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::rc::Rc;
    use std::sync::Arc;

    use crate::config::ViewerConfig;
    use crate::context::ViewContext;
    use crate::envelope::Envelope;
    use crate::events::EventBus;
    use crate::resample::ResampleEngine;

    /// Context over a silent-with-ramp native envelope of `seconds` at 44.1kHz
    pub fn context(seconds: usize) -> ViewContext {
        let len = 44100 * seconds;
        let max: Vec<i8> = (0..len).map(|i| (i % 100) as i8).collect();
        let min: Vec<i8> = max.iter().map(|v| -v).collect();
        let env = Envelope::from_native(44100, min, max).unwrap();
        ViewContext::new(
            Rc::new(EventBus::new()),
            Rc::new(ResampleEngine::new(Arc::new(env))),
            Rc::new(ViewerConfig::default()),
        )
    }
}
