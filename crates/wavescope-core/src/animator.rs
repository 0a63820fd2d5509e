//! Zoom transition animator
//!
//! A scale change is played back as a scripted sequence of windowed
//! resamples. Every frame is computed up front when the transition starts;
//! the zoom view then pops one per refresh tick and, once the queue is empty,
//! redraws authoritatively at the exact target scale.
//!
//! Frame `i` of `n` uses the linearly interpolated scale
//! `old + (new - old) * (i + 1) / n`, with the source sample under the anchor
//! time pinned to the same screen column throughout, so the waveform grows or
//! shrinks around the anchor without jumping.
//!
//! ```text
//! Idle --begin--> Animating --(queue drained, finish)--> Idle
//! ```
//!
//! There is no preemption: `begin` while animating is refused.

use std::collections::VecDeque;

use crate::error::ResampleResult;
use crate::resample::{ResampleRequest, ResampledView, Resampler};
use crate::types::Seconds;

/// Parameters of one scale change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTransition {
    pub old_scale: f64,
    pub new_scale: f64,
    /// Time kept under `anchor_x`
    pub current_time: Seconds,
    /// Frame-relative screen column of `current_time`
    pub anchor_x: i64,
    pub width: u32,
    pub num_frames: usize,
}

/// Where the zoom view lands once the transition drains
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomTarget {
    pub level: usize,
    pub previous_level: usize,
    pub scale: f64,
    pub anchor_time: Seconds,
    pub anchor_x: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnimatorState {
    #[default]
    Idle,
    Animating,
}

/// Compute every intermediate frame of a transition
pub fn plan(resampler: &dyn Resampler, transition: &ZoomTransition) -> ResampleResult<VecDeque<ResampledView>> {
    let n = transition.num_frames.max(1);
    let input_index = (transition.current_time * resampler.sample_rate() as f64).round() as i64;
    let step = (transition.new_scale - transition.old_scale) / n as f64;

    (0..n)
        .map(|i| {
            let scale = transition.old_scale + step * (i + 1) as f64;
            resampler.resample(&ResampleRequest::Window {
                scale,
                input_index,
                output_index: transition.anchor_x,
                length: transition.width as f64,
            })
        })
        .collect()
}

#[derive(Debug, Default)]
pub struct ZoomTransitionAnimator {
    state: AnimatorState,
    frames: VecDeque<ResampledView>,
    target: Option<ZoomTarget>,
}

impl ZoomTransitionAnimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AnimatorState {
        self.state
    }

    pub fn is_animating(&self) -> bool {
        self.state == AnimatorState::Animating
    }

    /// Frames still queued
    pub fn remaining(&self) -> usize {
        self.frames.len()
    }

    pub fn target(&self) -> Option<&ZoomTarget> {
        self.target.as_ref()
    }

    /// Plan and queue a transition
    ///
    /// Returns `Ok(false)` without touching the queue if a transition is
    /// already running.
    pub fn begin(
        &mut self,
        resampler: &dyn Resampler,
        transition: &ZoomTransition,
        target: ZoomTarget,
    ) -> ResampleResult<bool> {
        if self.is_animating() {
            return Ok(false);
        }
        let frames = plan(resampler, transition)?;

        log::debug!(
            "animator: {} frames from scale {:.1} to {:.1} anchored at {:.3}s (x={})",
            frames.len(),
            transition.old_scale,
            transition.new_scale,
            transition.current_time,
            transition.anchor_x
        );

        self.frames = frames;
        self.target = Some(target);
        self.state = AnimatorState::Animating;
        Ok(true)
    }

    /// Next queued frame, one per refresh tick
    pub fn next_frame(&mut self) -> Option<ResampledView> {
        self.frames.pop_front()
    }

    /// Return to idle once the queue has drained
    ///
    /// Yields the target the caller must redraw at; `None` while frames remain
    /// or when idle.
    pub fn finish(&mut self) -> Option<ZoomTarget> {
        if !self.is_animating() || !self.frames.is_empty() {
            return None;
        }
        self.state = AnimatorState::Idle;
        self.target.take()
    }
}
