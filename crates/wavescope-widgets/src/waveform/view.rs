//! Waveform view functions
//!
//! Plain functions that take state references and callback closures and
//! return Elements.
//!
//! ## Usage
//!
//! ```ignore
//! fn view(&self) -> Element<Message> {
//!     column![
//!         waveform_zoomview(&self.canvas.zoomview, Message::ZoomPointer, Message::Wheel),
//!         waveform_overview(&self.canvas.overview, Message::OverviewPointer),
//!     ]
//!     .into()
//! }
//!
//! fn update(&mut self, message: Message) {
//!     match message {
//!         Message::OverviewPointer(PointerEvent::Down(x)) => self.session.overview_pointer_down(x),
//!         // ...
//!     }
//!     self.canvas.refresh(&self.session);
//! }
//! ```

use super::canvas::{OverviewCanvas, PointerEvent, ZoomViewCanvas};
use super::state::WaveformState;
use iced::widget::Canvas;
use iced::{Element, Length};

/// Create the overview element with click/drag-to-seek
///
/// `on_pointer` receives canvas-relative x positions; forward them to the
/// session's `overview_pointer_*` methods.
pub fn waveform_overview<'a, Message>(
    state: &'a WaveformState,
    on_pointer: impl Fn(PointerEvent) -> Message + 'a,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    Canvas::new(OverviewCanvas { state, on_pointer })
        .width(Length::Fill)
        .height(Length::Fixed(state.height()))
        .into()
}

/// Create the zoom view element with drag-to-pan, click-to-seek and wheel zoom
///
/// `on_wheel` receives pixel deltas, positive for zooming out.
pub fn waveform_zoomview<'a, Message>(
    state: &'a WaveformState,
    on_pointer: impl Fn(PointerEvent) -> Message + 'a,
    on_wheel: impl Fn(f64) -> Message + 'a,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    Canvas::new(ZoomViewCanvas {
        state,
        on_pointer,
        on_wheel,
    })
    .width(Length::Fill)
    .height(Length::Fixed(state.height()))
    .into()
}
