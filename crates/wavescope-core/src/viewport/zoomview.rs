//! Zoom view: scrollable detail viewport at one of the configured zoom levels
//!
//! Input handling:
//! - pointer drag pans by moving the frame offset (no rescale)
//! - pointer down and up without movement seeks
//! - wheel deltas accumulate and, after the configured quiet period, map
//!   through the wheel table to a `zoom-level-changed` request
//!
//! Zoom changes run through [`ZoomTransitionAnimator`]. While animating the
//! surface shows interpolated frames and pointer/wheel input is ignored; the
//! last tick redraws at the exact target scale before `zoom-animation(finished)`
//! is published.

use std::time::Instant;

use crate::animator::{ZoomTarget, ZoomTransition, ZoomTransitionAnimator};
use crate::context::ViewContext;
use crate::error::SessionResult;
use crate::events::{AnimationPhase, ViewEvent, ZoomSource};
use crate::resample::ResampleRequest;
use crate::types::{Seconds, ViewportKind};
use crate::viewport::{Debounced, Viewport, ViewportCore};

/// Pointer travel (px) before a press becomes a drag
const DRAG_THRESHOLD_PX: f64 = 2.0;

/// Result of a zoom level request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomOutcome {
    /// Transition queued
    Animating,
    /// Applied without animation (planning failed)
    Applied,
    /// Already at that level
    Unchanged,
    /// Playback in progress
    Frozen,
    /// A transition is still draining
    Busy,
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    start_x: f64,
    start_offset: i64,
    moved: bool,
}

#[derive(Debug)]
pub struct ZoomView {
    core: ViewportCore,
    level: usize,
    animator: ZoomTransitionAnimator,
    playing: bool,
    drag: Option<DragState>,
    wheel: Debounced<f64>,
}

impl ZoomView {
    pub fn new(ctx: ViewContext, width: u32, height: u32) -> SessionResult<Self> {
        let level = ctx
            .config
            .initial_zoom_level
            .min(ctx.config.zoom_levels.len().saturating_sub(1));
        let scale = ctx.config.scale_for_level(level);
        let wheel = Debounced::new(ctx.config.zoomview.wheel_settle());

        let core = ViewportCore::new(
            ViewportKind::ZoomView,
            ctx,
            width,
            height,
            ResampleRequest::Scale(scale),
        )?;
        let mut view = Self {
            core,
            level,
            animator: ZoomTransitionAnimator::new(),
            playing: false,
            drag: None,
            wheel,
        };
        view.core.update_frame(0);
        Ok(view)
    }

    pub fn zoom_level(&self) -> usize {
        self.level
    }

    /// Settled scale in source samples per pixel
    pub fn scale(&self) -> f64 {
        self.core.view().scale()
    }

    pub fn is_animating(&self) -> bool {
        self.animator.is_animating()
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some_and(|d| d.moved)
    }

    /// Accumulated wheel delta waiting to settle
    pub fn pending_wheel(&self) -> Option<f64> {
        self.wheel.pending_value().copied()
    }

    pub fn set_playing(&mut self, playing: bool) {
        self.playing = playing;
    }

    /// Start a transition to a zoom level
    pub fn request_zoom_level(&mut self, index: usize) -> ZoomOutcome {
        let levels = self.core.ctx().config.zoom_levels.len();
        let index = index.min(levels.saturating_sub(1));

        if index == self.level {
            return ZoomOutcome::Unchanged;
        }
        if self.playing {
            log::warn!("zoomview: zoom to level {} ignored during playback", index);
            return ZoomOutcome::Frozen;
        }
        if self.animator.is_animating() {
            log::debug!("zoomview: zoom to level {} ignored, transition in progress", index);
            return ZoomOutcome::Busy;
        }

        let ctx = self.core.ctx().clone();
        let old_scale = self.scale();
        let new_scale = ctx.config.scale_for_level(index);
        let (anchor_time, anchor_x) = self.anchor();

        let transition = ZoomTransition {
            old_scale,
            new_scale,
            current_time: anchor_time,
            anchor_x,
            width: self.core.width(),
            num_frames: ctx.config.animation.frames_for(old_scale, new_scale),
        };
        let target = ZoomTarget {
            level: index,
            previous_level: self.level,
            scale: new_scale,
            anchor_time,
            anchor_x,
        };

        match self.animator.begin(ctx.resampler.as_ref(), &transition, target) {
            Ok(_) => {
                ctx.bus.publish(ViewEvent::ZoomAnimation(AnimationPhase::Started));
                ZoomOutcome::Animating
            }
            Err(e) => {
                log::warn!("zoomview: animation plan failed ({}), applying level {} directly", e, index);
                self.apply_target(&target);
                ZoomOutcome::Applied
            }
        }
    }

    /// Time kept fixed on screen during a zoom, and its frame-relative column
    ///
    /// The playhead when it is visible, otherwise the frame centre.
    fn anchor(&self) -> (Seconds, i64) {
        let frame = self.core.geometry();
        let playhead = self.core.playhead_time();
        if frame.contains_time(playhead) {
            (playhead, frame.time_to_pixel(playhead) - frame.frame_offset)
        } else {
            let x = frame.width as i64 / 2;
            (frame.frame_pixel_to_time(x as f64), x)
        }
    }

    fn apply_target(&mut self, target: &ZoomTarget) {
        if self.core.rederive(ResampleRequest::Scale(target.scale)) {
            self.level = target.level;
        }
        let offset = self.core.view().time_to_pixel(target.anchor_time) - target.anchor_x;
        self.core.update_frame(offset);
    }

    /// Advance timers and animation by one refresh tick
    ///
    /// Returns true if the surface changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(delta) = self.wheel.poll(now) {
            self.settle_wheel(delta);
        }

        if let Some(frame) = self.animator.next_frame() {
            self.core.surface_mut().draw_interpolated(&frame);
            return true;
        }

        if let Some(target) = self.animator.finish() {
            log::debug!(
                "zoomview: transition {} -> {} finished at scale {:.1}",
                target.previous_level,
                target.level,
                target.scale
            );
            self.apply_target(&target);
            self.core
                .ctx()
                .bus
                .publish(ViewEvent::ZoomAnimation(AnimationPhase::Finished));
            return true;
        }
        false
    }

    fn settle_wheel(&mut self, delta: f64) {
        let ctx = self.core.ctx();
        let steps = ctx.config.zoomview.levels_for_delta(delta);
        let max_level = ctx.config.zoom_levels.len().saturating_sub(1) as i64;
        let index = (self.level as i64 + steps as i64).clamp(0, max_level) as usize;

        if index != self.level {
            log::debug!("zoomview: wheel delta {:.0} settled to level {}", delta, index);
            ctx.bus.publish(ViewEvent::ZoomLevelChanged {
                index,
                source: ZoomSource::Wheel,
            });
        }
    }

    /// Accumulate a wheel delta; positive zooms out
    pub fn wheel(&mut self, delta: f64, now: Instant) {
        if self.animator.is_animating() || !delta.is_finite() {
            return;
        }
        self.wheel.accumulate(now, |prev| prev.unwrap_or(0.0) + delta);
    }

    pub fn pointer_down(&mut self, x: f64) {
        if self.animator.is_animating() {
            return;
        }
        self.drag = Some(DragState {
            start_x: x,
            start_offset: self.core.frame_offset(),
            moved: false,
        });
    }

    pub fn pointer_move(&mut self, x: f64) {
        let Some(drag) = self.drag.as_mut() else {
            return;
        };
        let dx = x - drag.start_x;
        if !drag.moved && dx.abs() < DRAG_THRESHOLD_PX {
            return;
        }
        drag.moved = true;
        let offset = drag.start_offset - dx.round() as i64;
        self.core.update_frame(offset);
    }

    pub fn pointer_up(&mut self, x: f64) {
        let Some(drag) = self.drag.take() else {
            return;
        };
        if drag.moved {
            return;
        }
        let time = self.core.frame_pixel_to_time(x);
        self.core.ctx().bus.publish(ViewEvent::UserSeek { time });
        self.core.set_playhead(time);
    }

    /// Follow a seek made elsewhere, centring the frame if the time is off screen
    pub fn on_user_seek(&mut self, time: Seconds) {
        self.core.set_playhead(time);
        if self.animator.is_animating() || self.is_dragging() {
            return;
        }
        let frame = self.core.geometry();
        if !frame.contains_time(time) {
            self.core
                .update_frame(frame.time_to_pixel(time) - frame.width as i64 / 2);
        }
    }
}

impl Viewport for ZoomView {
    fn core(&self) -> &ViewportCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut ViewportCore {
        &mut self.core
    }

    fn resize(&mut self, width: u32) {
        if width == 0 {
            log::warn!("zoomview: ignoring resize to zero width");
            return;
        }
        let start = self.core.geometry().start_time();
        self.core.resize_surface(width);
        self.core.rederive(ResampleRequest::Scale(self.scale()));
        let offset = self.core.view().time_to_pixel(start);
        self.core.update_frame(offset);
    }

    fn set_playhead_time(&mut self, time: Seconds) {
        self.core.set_playhead(time);
        if !self.playing || self.is_dragging() || self.animator.is_animating() {
            return;
        }
        let frame = self.core.geometry();
        if !frame.contains_time(time) {
            self.core.update_frame(frame.time_to_pixel(time));
        }
    }
}
