//! Waveform canvases for the overview and zoom view

mod canvas;
mod state;
mod view;

pub use canvas::{OverviewCanvas, PointerEvent, PointerInteraction, ZoomViewCanvas, WHEEL_LINE_PIXELS};
pub use state::{MarkKind, OverlayMark, SessionState, WaveformState, AXIS_HEIGHT};
pub use view::{waveform_overview, waveform_zoomview};
