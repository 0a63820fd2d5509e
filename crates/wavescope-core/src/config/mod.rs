//! Viewer configuration
//!
//! Configuration is stored as YAML. Every section uses `#[serde(default)]`
//! so partial files only override what they mention.
//!
//! ```yaml
//! zoom_levels: [512, 1024, 2048, 4096]
//! initial_zoom_level: 0
//! zoomview:
//!   wheel_settle_ms: 1000
//!   wheel_steps:
//!     - { max_delta: 120.0, levels: 1 }
//!     - { max_delta: 480.0, levels: 2 }
//! overlays:
//!   tag_cluster_gap_px: 15.0
//! ```

mod io;

pub use io::{default_config_path, load_config, save_config};

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Root configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Zoom view scales in source samples per pixel, ascending
    pub zoom_levels: Vec<u32>,
    /// Index into `zoom_levels` used when a session starts
    pub initial_zoom_level: usize,
    pub overview: OverviewConfig,
    pub zoomview: ZoomViewConfig,
    pub animation: AnimationConfig,
    pub overlays: OverlayConfig,
    pub axis: AxisConfig,
    /// Quiet period before a container resize is applied
    pub resize_settle_ms: u64,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            zoom_levels: vec![512, 1024, 2048, 4096],
            initial_zoom_level: 0,
            overview: OverviewConfig::default(),
            zoomview: ZoomViewConfig::default(),
            animation: AnimationConfig::default(),
            overlays: OverlayConfig::default(),
            axis: AxisConfig::default(),
            resize_settle_ms: 500,
        }
    }
}

impl ViewerConfig {
    /// Check invariants the viewports rely on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.zoom_levels.is_empty() {
            return Err(ConfigError::NoZoomLevels);
        }
        let ascending = self.zoom_levels[0] > 0
            && self.zoom_levels.windows(2).all(|w| w[0] < w[1]);
        if !ascending {
            return Err(ConfigError::ZoomLevelsNotAscending(self.zoom_levels.clone()));
        }
        if self.initial_zoom_level >= self.zoom_levels.len() {
            return Err(ConfigError::InitialZoomOutOfRange {
                index: self.initial_zoom_level,
                count: self.zoom_levels.len(),
            });
        }
        if self.animation.zoom_in_frames == 0 || self.animation.zoom_out_frames == 0 {
            return Err(ConfigError::InvalidFrameCount {
                zoom_in: self.animation.zoom_in_frames,
                zoom_out: self.animation.zoom_out_frames,
            });
        }
        if self.overlays.tag_cluster_gap_px <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "overlays.tag_cluster_gap_px",
                value: self.overlays.tag_cluster_gap_px,
            });
        }
        if self.axis.min_tick_spacing_px <= 0.0 {
            return Err(ConfigError::NotPositive {
                name: "axis.min_tick_spacing_px",
                value: self.axis.min_tick_spacing_px,
            });
        }
        Ok(())
    }

    pub fn resize_settle(&self) -> Duration {
        Duration::from_millis(self.resize_settle_ms)
    }

    /// Scale for a zoom level index, clamped to the configured range
    pub fn scale_for_level(&self, index: usize) -> f64 {
        let idx = index.min(self.zoom_levels.len().saturating_sub(1));
        self.zoom_levels.get(idx).copied().unwrap_or(1) as f64
    }
}

/// Overview section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverviewConfig {
    /// Surface height in pixels
    pub height: u32,
}

impl Default for OverviewConfig {
    fn default() -> Self {
        Self { height: 85 }
    }
}

/// Zoom view section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomViewConfig {
    /// Surface height in pixels
    pub height: u32,
    /// Quiet period after the last wheel event before the zoom settles
    pub wheel_settle_ms: u64,
    /// Accumulated wheel delta ranges mapped to zoom level steps
    ///
    /// Looked up by absolute delta; the first entry whose `max_delta` is not
    /// exceeded wins, larger deltas use the last entry.
    pub wheel_steps: Vec<WheelStep>,
}

impl Default for ZoomViewConfig {
    fn default() -> Self {
        Self {
            height: 200,
            wheel_settle_ms: 1000,
            wheel_steps: vec![
                WheelStep { max_delta: 120.0, levels: 1 },
                WheelStep { max_delta: 480.0, levels: 2 },
                WheelStep { max_delta: f64::MAX, levels: 3 },
            ],
        }
    }
}

impl ZoomViewConfig {
    pub fn wheel_settle(&self) -> Duration {
        Duration::from_millis(self.wheel_settle_ms)
    }

    /// Signed number of zoom levels to move for an accumulated wheel delta
    ///
    /// Positive deltas zoom out (towards larger scales).
    pub fn levels_for_delta(&self, delta: f64) -> i32 {
        if delta == 0.0 || !delta.is_finite() {
            return 0;
        }
        let magnitude = delta.abs();
        let levels = self
            .wheel_steps
            .iter()
            .find(|step| magnitude <= step.max_delta)
            .or_else(|| self.wheel_steps.last())
            .map(|step| step.levels as i32)
            .unwrap_or(1);
        if delta > 0.0 {
            levels
        } else {
            -levels
        }
    }
}

/// One row of the wheel gesture table
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelStep {
    /// Upper bound (inclusive) of accumulated absolute delta for this row
    pub max_delta: f64,
    /// Zoom levels moved
    pub levels: u32,
}

/// Zoom transition animation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Intermediate frames when moving to a smaller scale
    pub zoom_in_frames: usize,
    /// Intermediate frames when moving to a larger scale
    pub zoom_out_frames: usize,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            zoom_in_frames: 15,
            zoom_out_frames: 10,
        }
    }
}

impl AnimationConfig {
    pub fn frames_for(&self, old_scale: f64, new_scale: f64) -> usize {
        if new_scale < old_scale {
            self.zoom_in_frames
        } else {
            self.zoom_out_frames
        }
    }
}

/// Annotation overlays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    /// Tags closer than this many zoom view pixels collapse into one cluster
    pub tag_cluster_gap_px: f64,
    /// Same-speaker intervals separated by at most this many seconds are merged
    pub speaker_merge_gap: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            tag_cluster_gap_px: 15.0,
            speaker_merge_gap: 1.0,
        }
    }
}

/// Time axis ruler
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    /// Minimum distance between ticks in pixels
    pub min_tick_spacing_px: f64,
}

impl Default for AxisConfig {
    fn default() -> Self {
        Self {
            min_tick_spacing_px: 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ViewerConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.animation.zoom_in_frames > config.animation.zoom_out_frames);
    }

    #[test]
    fn test_rejects_empty_levels() {
        let config = ViewerConfig {
            zoom_levels: vec![],
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoZoomLevels));
    }

    #[test]
    fn test_rejects_unsorted_levels() {
        let config = ViewerConfig {
            zoom_levels: vec![1024, 512],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZoomLevelsNotAscending(_))));

        let config = ViewerConfig {
            zoom_levels: vec![0, 512],
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::ZoomLevelsNotAscending(_))));
    }

    #[test]
    fn test_rejects_initial_level_out_of_range() {
        let config = ViewerConfig {
            initial_zoom_level: 4,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::InitialZoomOutOfRange { index: 4, count: 4 })
        );
    }

    #[test]
    fn test_rejects_zero_frames() {
        let mut config = ViewerConfig::default();
        config.animation.zoom_out_frames = 0;
        assert!(matches!(config.validate(), Err(ConfigError::InvalidFrameCount { .. })));
    }

    #[test]
    fn test_wheel_table_lookup() {
        let zoom = ZoomViewConfig::default();
        assert_eq!(zoom.levels_for_delta(0.0), 0);
        assert_eq!(zoom.levels_for_delta(100.0), 1);
        assert_eq!(zoom.levels_for_delta(-100.0), -1);
        assert_eq!(zoom.levels_for_delta(300.0), 2);
        assert_eq!(zoom.levels_for_delta(-5000.0), -3);
    }

    #[test]
    fn test_frames_for_direction() {
        let anim = AnimationConfig::default();
        assert_eq!(anim.frames_for(1024.0, 512.0), anim.zoom_in_frames);
        assert_eq!(anim.frames_for(512.0, 1024.0), anim.zoom_out_frames);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = "zoom_levels: [256, 512]\noverlays:\n  tag_cluster_gap_px: 20.0\n";
        let config: ViewerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.zoom_levels, vec![256, 512]);
        assert_eq!(config.overlays.tag_cluster_gap_px, 20.0);
        assert_eq!(config.overlays.speaker_merge_gap, 1.0);
        assert_eq!(config.resize_settle_ms, 500);
    }

    #[test]
    fn test_scale_for_level_clamps() {
        let config = ViewerConfig::default();
        assert_eq!(config.scale_for_level(1), 1024.0);
        assert_eq!(config.scale_for_level(99), 4096.0);
    }
}
