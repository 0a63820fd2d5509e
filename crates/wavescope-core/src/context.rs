//! Explicit per-session context handed to every component at construction

use std::rc::Rc;

use crate::config::ViewerConfig;
use crate::events::EventBus;
use crate::resample::Resampler;

/// Shared collaborators for one session
///
/// Cloning is cheap (reference counts only). Nothing in the engine looks
/// these up globally; a component only sees the context it was built with.
#[derive(Clone)]
pub struct ViewContext {
    pub bus: Rc<EventBus>,
    pub resampler: Rc<dyn Resampler>,
    pub config: Rc<ViewerConfig>,
}

impl ViewContext {
    pub fn new(bus: Rc<EventBus>, resampler: Rc<dyn Resampler>, config: Rc<ViewerConfig>) -> Self {
        Self {
            bus,
            resampler,
            config,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.resampler.sample_rate()
    }

    /// Recording length in seconds
    pub fn duration(&self) -> f64 {
        self.resampler.duration()
    }
}

impl std::fmt::Debug for ViewContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ViewContext")
            .field("bus", &self.bus)
            .field("sample_rate", &self.resampler.sample_rate())
            .field("zoom_levels", &self.config.zoom_levels)
            .finish()
    }
}
