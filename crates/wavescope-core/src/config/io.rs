//! Viewer configuration file
//!
//! A missing, unparseable or out-of-range file never stops a viewer from
//! starting: it falls back to defaults and logs why. Saving refuses a config
//! that would be rejected on the next load.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use super::ViewerConfig;

/// Default config file location
///
/// Returns: `<user config dir>/wavescope/config.yaml`
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("wavescope")
        .join("config.yaml")
}

/// Load and validate the viewer configuration
///
/// Sections left out of the file take their defaults. A file whose values
/// fail [`ViewerConfig::validate`] is discarded as a whole.
pub fn load_config(path: &Path) -> ViewerConfig {
    log::info!("load_config: Loading from {:?}", path);

    if !path.exists() {
        log::info!("load_config: Config file doesn't exist, using defaults");
        return ViewerConfig::default();
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            log::warn!("load_config: Failed to read config file: {}, using defaults", e);
            return ViewerConfig::default();
        }
    };

    let config = match serde_yaml::from_str::<ViewerConfig>(&contents) {
        Ok(config) => config,
        Err(e) => {
            log::warn!("load_config: Failed to parse config: {}, using defaults", e);
            return ViewerConfig::default();
        }
    };

    match config.validate() {
        Ok(()) => {
            log::info!(
                "load_config: Loaded {} zoom levels, initial level {}",
                config.zoom_levels.len(),
                config.initial_zoom_level
            );
            config
        }
        Err(e) => {
            log::warn!("load_config: {}, using defaults", e);
            ViewerConfig::default()
        }
    }
}

/// Validate and save the viewer configuration
///
/// Creates parent directories if they don't exist.
pub fn save_config(config: &ViewerConfig, path: &Path) -> Result<()> {
    config.validate().context("Refusing to save invalid config")?;
    log::info!("save_config: Saving to {:?}", path);

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;
    std::fs::write(path, yaml).with_context(|| format!("Failed to write config file: {:?}", path))?;

    log::info!("save_config: Config saved");
    Ok(())
}
