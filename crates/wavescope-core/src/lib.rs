//! Wavescope Core - headless waveform viewport engine
//!
//! Renders a navigable, multi-resolution view of a precomputed amplitude
//! envelope across two synchronised viewports (a fixed overview and a
//! scrollable zoom view) and projects time-anchored annotations onto both.
//!
//! ## Architecture
//!
//! - **Resample engine**: pixel-aligned min/max views at any scale (`resample`)
//! - **Viewports**: `Overview` and `ZoomView` behind the `Viewport` trait
//! - **Animator**: scripted zoom transitions between configured levels
//! - **Annotations**: segments, speakers, tags (clustered) and keywords
//! - **Event bus**: session-scoped, synchronous, FIFO delivery
//!
//! Everything a component needs comes from the `ViewContext` it is built
//! with; `Session` wires one envelope into the full graph.

pub mod animator;
pub mod annotations;
pub mod config;
pub mod context;
pub mod envelope;
pub mod error;
pub mod events;
pub mod payload;
pub mod resample;
pub mod session;
pub mod types;
pub mod viewport;

pub use types::*;

pub use context::ViewContext;
pub use envelope::Envelope;
pub use error::{AnnotationError, ConfigError, EnvelopeError, ResampleError, SessionError};
pub use events::{AnimationPhase, EventBus, SubscriptionId, Topic, ViewEvent, ZoomSource};
pub use resample::{ResampleEngine, ResampleRequest, ResampledView, Resampler};
pub use session::{Session, SessionOptions};
pub use viewport::{Overview, Viewport, ZoomView};
