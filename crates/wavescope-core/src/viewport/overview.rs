//! Overview: the whole recording fitted into the container width
//!
//! Pointer down and drag seek. The highlight rectangle only ever shows the
//! zoom view's current frame, so a seek moves it once the zoom view reports
//! its new frame.

use crate::context::ViewContext;
use crate::error::SessionResult;
use crate::events::ViewEvent;
use crate::resample::ResampleRequest;
use crate::types::{FrameGeometry, Seconds, ViewportKind};
use crate::viewport::{Viewport, ViewportCore};

#[derive(Debug)]
pub struct Overview {
    core: ViewportCore,
    /// Pointer is down; playhead updates from the player are ignored
    seeking: bool,
    /// Zoom view window in time
    highlight: Option<(Seconds, Seconds)>,
}

impl Overview {
    pub fn new(ctx: ViewContext, width: u32, height: u32) -> SessionResult<Self> {
        let core = ViewportCore::new(
            ViewportKind::Overview,
            ctx,
            width,
            height,
            ResampleRequest::Width(width),
        )?;
        let mut overview = Self {
            core,
            seeking: false,
            highlight: None,
        };
        overview.core.update_frame(0);
        Ok(overview)
    }

    pub fn is_seeking(&self) -> bool {
        self.seeking
    }

    /// Highlighted zoom window in seconds
    pub fn highlight(&self) -> Option<(Seconds, Seconds)> {
        self.highlight
    }

    pub fn pointer_down(&mut self, x: f64) {
        self.seeking = true;
        self.seek_to(x);
    }

    pub fn pointer_move(&mut self, x: f64) {
        if self.seeking {
            self.seek_to(x);
        }
    }

    pub fn pointer_up(&mut self, x: f64) {
        if self.seeking {
            self.seek_to(x);
            self.seeking = false;
        }
    }

    fn seek_to(&mut self, x: f64) {
        let time = self.core.frame_pixel_to_time(x);
        self.core.ctx().bus.publish(ViewEvent::UserSeek { time });
        self.core.set_playhead(time);
    }

    /// Track the zoom view's visible window
    pub fn show_zoom_window(&mut self, frame: &FrameGeometry) {
        if frame.kind != ViewportKind::ZoomView {
            return;
        }
        let duration = self.core.ctx().duration();
        self.highlight = Some((frame.start_time(), frame.end_time().min(duration)));
        self.redraw_highlight();
    }

    fn redraw_highlight(&mut self) {
        let span = self.highlight.map(|(start, end)| {
            let offset = self.core.frame_offset();
            let x0 = (self.core.view().time_to_pixel(start) - offset) as f32;
            let x1 = (self.core.view().time_to_pixel(end) - offset) as f32;
            (x0, x1.max(x0 + 1.0))
        });
        self.core.surface_mut().set_highlight(span);
    }
}

impl Viewport for Overview {
    fn core(&self) -> &ViewportCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewportCore {
        &mut self.core
    }

    fn resize(&mut self, width: u32) {
        if width == 0 {
            log::warn!("overview: ignoring resize to zero width");
            return;
        }
        self.core.resize_surface(width);
        self.core.rederive(ResampleRequest::Width(width));
        self.core.update_frame(0);
        self.redraw_highlight();
    }

    fn set_playhead_time(&mut self, time: Seconds) {
        if self.seeking {
            return;
        }
        self.core.set_playhead(time);
    }
}
