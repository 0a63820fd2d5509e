//! Canvas Program implementations for wavescope viewports
//!
//! Both canvases paint a [`WaveformState`] and translate mouse input into
//! callback messages. They never touch the session; the application forwards
//! the messages to it and refreshes the state.

use super::state::{MarkKind, OverlayMark, WaveformState, AXIS_HEIGHT};
use crate::theme;
use iced::widget::canvas::{self, Event, Frame, Geometry, Path, Program, Stroke, Text};
use iced::{mouse, Color, Point, Rectangle, Size, Theme};
use wavescope_core::viewport::RenderQuality;

/// Pixels of wheel delta per scrolled line
pub const WHEEL_LINE_PIXELS: f64 = 40.0;

/// Pointer input, as an x position relative to the canvas' left edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(f64),
    Move(f64),
    Up(f64),
}

/// Canvas state for tracking a pressed mouse button
#[derive(Debug, Clone, Copy, Default)]
pub struct PointerInteraction {
    pub is_pressed: bool,
}

/// Translate a mouse event into a pointer event
///
/// Moves are reported only while pressed. A release outside the canvas still
/// ends the gesture, at the clamped edge position.
fn pointer_event(
    interaction: &mut PointerInteraction,
    event: &Event,
    bounds: Rectangle,
    cursor: mouse::Cursor,
) -> Option<PointerEvent> {
    let Event::Mouse(mouse_event) = event else {
        return None;
    };

    let inside = cursor.position_in(bounds);
    let clamped_x = || {
        cursor
            .position()
            .map(|p| (p.x - bounds.x).clamp(0.0, bounds.width) as f64)
    };

    match mouse_event {
        mouse::Event::ButtonPressed(mouse::Button::Left) => {
            let position = inside?;
            interaction.is_pressed = true;
            Some(PointerEvent::Down(position.x as f64))
        }
        mouse::Event::CursorMoved { .. } if interaction.is_pressed => clamped_x().map(PointerEvent::Move),
        mouse::Event::ButtonReleased(mouse::Button::Left) if interaction.is_pressed => {
            interaction.is_pressed = false;
            Some(PointerEvent::Up(clamped_x().unwrap_or(0.0)))
        }
        _ => None,
    }
}

/// Wheel delta in pixels; positive zooms out
fn wheel_delta(delta: &mouse::ScrollDelta) -> f64 {
    match *delta {
        mouse::ScrollDelta::Lines { y, .. } => -(y as f64) * WHEEL_LINE_PIXELS,
        mouse::ScrollDelta::Pixels { y, .. } => -(y as f64),
    }
}

// =============================================================================
// Overview Canvas Program
// =============================================================================

/// Canvas program for the overview: click or drag to seek
pub struct OverviewCanvas<'a, Message, F>
where
    F: Fn(PointerEvent) -> Message,
{
    pub state: &'a WaveformState,
    pub on_pointer: F,
}

impl<'a, Message, F> Program<Message> for OverviewCanvas<'a, Message, F>
where
    Message: Clone,
    F: Fn(PointerEvent) -> Message,
{
    type State = PointerInteraction;

    fn update(
        &self,
        interaction: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        pointer_event(interaction, event, bounds, cursor)
            .map(|pointer| canvas::Action::publish((self.on_pointer)(pointer)))
    }

    fn mouse_interaction(
        &self,
        _interaction: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if cursor.is_over(bounds) {
            mouse::Interaction::Pointer
        } else {
            mouse::Interaction::default()
        }
    }

    fn draw(
        &self,
        _interaction: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        draw_viewport(&mut frame, self.state, bounds.size());
        vec![frame.into_geometry()]
    }
}

// =============================================================================
// Zoom View Canvas Program
// =============================================================================

/// Canvas program for the zoom view: drag to pan, click to seek, wheel to zoom
pub struct ZoomViewCanvas<'a, Message, F, W>
where
    F: Fn(PointerEvent) -> Message,
    W: Fn(f64) -> Message,
{
    pub state: &'a WaveformState,
    pub on_pointer: F,
    pub on_wheel: W,
}

impl<'a, Message, F, W> Program<Message> for ZoomViewCanvas<'a, Message, F, W>
where
    Message: Clone,
    F: Fn(PointerEvent) -> Message,
    W: Fn(f64) -> Message,
{
    type State = PointerInteraction;

    fn update(
        &self,
        interaction: &mut Self::State,
        event: &Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Message>> {
        if let Event::Mouse(mouse::Event::WheelScrolled { delta }) = event {
            if cursor.is_over(bounds) {
                let delta = wheel_delta(delta);
                if delta != 0.0 {
                    return Some(canvas::Action::publish((self.on_wheel)(delta)).and_capture());
                }
            }
            return None;
        }

        pointer_event(interaction, event, bounds, cursor)
            .map(|pointer| canvas::Action::publish((self.on_pointer)(pointer)))
    }

    fn mouse_interaction(
        &self,
        interaction: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if interaction.is_pressed {
            mouse::Interaction::Grabbing
        } else if cursor.is_over(bounds) {
            mouse::Interaction::Grab
        } else {
            mouse::Interaction::default()
        }
    }

    fn draw(
        &self,
        _interaction: &Self::State,
        renderer: &iced::Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = Frame::new(renderer, bounds.size());
        draw_viewport(&mut frame, self.state, bounds.size());
        vec![frame.into_geometry()]
    }
}

// =============================================================================
// Drawing
// =============================================================================

/// Paint one viewport: background, overlays, waveform, axis, highlight, playhead
fn draw_viewport(frame: &mut Frame, state: &WaveformState, size: Size) {
    frame.fill_rectangle(Point::ORIGIN, size, theme::BACKGROUND);

    let wave_height = (size.height - AXIS_HEIGHT).max(0.0);

    draw_marks(frame, &state.marks, MarkKind::Speaker, wave_height);
    draw_marks(frame, &state.marks, MarkKind::Segment, wave_height);

    let color = match state.quality {
        RenderQuality::Exact => theme::WAVEFORM_COLOR,
        RenderQuality::Interpolated => theme::WAVEFORM_INTERPOLATED_COLOR,
    };
    draw_columns(frame, &state.columns, wave_height, color);

    draw_marks(frame, &state.marks, MarkKind::Keyword, wave_height);
    draw_marks(frame, &state.marks, MarkKind::Tag, wave_height);

    draw_axis(frame, &state.ticks, wave_height, size);

    if let Some((x_start, x_end)) = state.highlight {
        frame.fill_rectangle(
            Point::new(x_start, 0.0),
            Size::new((x_end - x_start).max(1.0), wave_height),
            theme::HIGHLIGHT_COLOR,
        );
    }

    if let Some(x) = state.playhead_x {
        frame.stroke(
            &Path::line(Point::new(x, 0.0), Point::new(x, wave_height)),
            Stroke::default().with_color(theme::PLAYHEAD_COLOR).with_width(1.0),
        );
    }
}

/// One filled bar per column, min/max scaled around the center line
fn draw_columns(frame: &mut Frame, columns: &[(i8, i8)], height: f32, color: Color) {
    let center_y = height / 2.0;
    let height_scale = center_y / 128.0;

    for (x, &(lo, hi)) in columns.iter().enumerate() {
        let top = center_y - hi as f32 * height_scale;
        let bottom = center_y - lo as f32 * height_scale;
        frame.fill_rectangle(
            Point::new(x as f32, top),
            Size::new(1.0, (bottom - top).max(1.0)),
            color,
        );
    }
}

fn draw_marks(frame: &mut Frame, marks: &[OverlayMark], kind: MarkKind, height: f32) {
    for mark in marks.iter().filter(|m| m.kind == kind) {
        match mark.kind {
            MarkKind::Speaker | MarkKind::Segment => {
                let band_height = if kind == MarkKind::Speaker { 6.0 } else { height };
                let top = if kind == MarkKind::Speaker { height - band_height } else { 0.0 };
                frame.fill_rectangle(
                    Point::new(mark.x_start, top),
                    Size::new((mark.x_end - mark.x_start).max(1.0), band_height),
                    mark.color,
                );
                if let Some(label) = &mark.label {
                    draw_label(frame, label, Point::new(mark.x_start + 2.0, top + 1.0), 10.0);
                }
            }
            MarkKind::Keyword => {
                let width = if mark.marker_width > 0.0 {
                    mark.marker_width.min((mark.x_end - mark.x_start).max(1.0))
                } else {
                    (mark.x_end - mark.x_start).max(1.0)
                };
                frame.fill_rectangle(Point::new(mark.x_start, 0.0), Size::new(width, 4.0), mark.color);
            }
            MarkKind::Tag => {
                frame.stroke(
                    &Path::line(Point::new(mark.x_start, 0.0), Point::new(mark.x_start, height)),
                    Stroke::default().with_color(mark.color).with_width(1.0),
                );
                if let Some(label) = &mark.label {
                    let text = if mark.cluster_size > 1 {
                        format!("{} +{}", label, mark.cluster_size - 1)
                    } else {
                        label.clone()
                    };
                    draw_label(frame, &text, Point::new(mark.x_start + 3.0, 6.0), 11.0);
                }
            }
        }
    }
}

fn draw_axis(frame: &mut Frame, ticks: &[(f32, String)], wave_height: f32, size: Size) {
    frame.stroke(
        &Path::line(Point::new(0.0, wave_height), Point::new(size.width, wave_height)),
        Stroke::default().with_color(theme::AXIS_COLOR).with_width(1.0),
    );

    for (x, label) in ticks {
        frame.stroke(
            &Path::line(Point::new(*x, wave_height), Point::new(*x, wave_height + 4.0)),
            Stroke::default().with_color(theme::AXIS_COLOR).with_width(1.0),
        );
        frame.fill_text(Text {
            content: label.clone(),
            position: Point::new(*x + 2.0, wave_height + 2.0),
            color: theme::AXIS_LABEL_COLOR,
            size: 10.0.into(),
            ..Text::default()
        });
    }
}

fn draw_label(frame: &mut Frame, label: &str, position: Point, size: f32) {
    frame.fill_text(Text {
        content: label.to_string(),
        position,
        color: theme::LABEL_COLOR,
        size: size.into(),
        ..Text::default()
    });
}
