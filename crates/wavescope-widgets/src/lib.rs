//! iced widgets for wavescope sessions
//!
//! ## Architecture (iced 0.14 patterns)
//!
//! - **State structs**: Pure data copied from a session (`WaveformState`, `SessionState`)
//! - **View functions**: Take state + callbacks, return `Element<Message>`
//! - **Canvas Programs**: Paint the display list and translate input to callbacks
//!
//! The session stays in the application. Canvas callbacks produce messages;
//! the application forwards them to the session, ticks it from a timer
//! subscription and refreshes the `SessionState` afterwards.

pub mod theme;
pub mod waveform;

pub use waveform::{
    waveform_overview, waveform_zoomview, MarkKind, OverlayMark, OverviewCanvas, PointerEvent,
    PointerInteraction, SessionState, WaveformState, ZoomViewCanvas,
};
