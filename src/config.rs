//! Configuration module for the Battery Overlay application.
//!
//! This module provides functionality for managing application configuration,
//! including:
//! - Hotkey combination and gesture thresholds
//! - Metrics refresh cadence and optional GPU/audio lines
//! - Where and whether the window position is persisted
//! - Determining the appropriate data directory for the application
//!
//! The configuration is loaded from a `config.json` file located in the
//! platform-specific application data directory
//! (%APPDATA%/BatteryOverlay/ on Windows). Every field has a default, so a
//! partial file only overrides what it names.
//!
//! # Example
//!
//! ```rust
//! use battery_overlay::config::OverlayConfig;
//!
//! let config: OverlayConfig = serde_json::from_str(r#"{ "hotkey": "Shift+L" }"#).unwrap();
//! assert_eq!(config.hotkey, "Shift+L");
//! assert_eq!(config.refresh_interval_ms, 1000);
//! ```

use crate::position::Position;
use anyhow::{anyhow, Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

pub const CONFIG_FILE: &str = "config.json";

/// Application configuration
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    /// Global hotkey toggling visibility, e.g. "Ctrl+Shift+T"
    pub hotkey: String,
    /// Metrics refresh period
    pub refresh_interval_ms: u64,
    /// Keep polling metrics while the overlay is hidden
    pub poll_when_hidden: bool,
    /// Start in the hidden state instead of visible
    pub start_hidden: bool,
    /// Re-assert always-on-top every time the overlay is shown
    pub reassert_topmost: bool,
    /// How long the developer credit is shown after startup (0 disables it)
    pub credit_grace_secs: u64,
    pub credit_text: String,
    /// Window opacity, 0.1 - 1.0
    pub opacity: f32,
    pub size: WindowSize,
    /// Used when no persisted position can be read
    pub default_position: Position,
    pub show_gpu: bool,
    pub show_audio: bool,
    pub gesture: GestureConfig,
    pub position: PositionConfig,
    pub debug_logging: bool,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        OverlayConfig {
            hotkey: "Ctrl+Shift+T".to_string(),
            refresh_interval_ms: 1000,
            poll_when_hidden: true,
            start_hidden: false,
            reassert_topmost: true,
            credit_grace_secs: 5,
            credit_text: "Battery Overlay by the BatteryOverlay developers".to_string(),
            opacity: 0.8,
            size: WindowSize::default(),
            default_position: Position { x: 20, y: 20 },
            show_gpu: false,
            show_audio: false,
            gesture: GestureConfig::default(),
            position: PositionConfig::default(),
            debug_logging: false,
        }
    }
}

impl OverlayConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms.max(100))
    }

    /// Refresh period as a `SetTimer` interval, saturating at `u32::MAX`
    pub fn refresh_timer_ms(&self) -> u32 {
        u32::try_from(self.refresh_interval().as_millis()).unwrap_or(u32::MAX)
    }

    pub fn credit_grace(&self) -> Duration {
        Duration::from_secs(self.credit_grace_secs)
    }

    /// Opacity as a layered-window alpha byte
    pub fn alpha(&self) -> u8 {
        let opacity = if self.opacity.is_finite() {
            self.opacity.clamp(0.1, 1.0)
        } else {
            1.0
        };
        (opacity * 255.0).round() as u8
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct WindowSize {
    pub width: i32,
    pub height: i32,
}

impl Default for WindowSize {
    fn default() -> Self {
        WindowSize {
            width: 260,
            height: 110,
        }
    }
}

/// Edge-drag gesture parameters
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct GestureConfig {
    pub enabled: bool,
    pub poll_interval_ms: u64,
    /// Max distance from the top screen edge for a press to arm the gesture
    pub edge_tolerance_px: i32,
    /// Downward travel from the anchor needed to fire
    pub drag_threshold_px: i32,
    /// Only fire while the overlay is hidden
    pub only_when_hidden: bool,
}

impl Default for GestureConfig {
    fn default() -> Self {
        GestureConfig {
            enabled: true,
            poll_interval_ms: 20,
            edge_tolerance_px: 20,
            drag_threshold_px: 50,
            only_when_hidden: true,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PositionBackend {
    /// Two-line text file in the data directory
    #[default]
    File,
    /// HKCU registry values
    Registry,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct PositionConfig {
    pub persist: bool,
    pub backend: PositionBackend,
}

impl Default for PositionConfig {
    fn default() -> Self {
        PositionConfig {
            persist: true,
            backend: PositionBackend::File,
        }
    }
}

/// Get the application's data directory
/// Returns %APPDATA%/BatteryOverlay/ on Windows
/// Creates directory if it doesn't exist
pub fn get_data_directory() -> Result<PathBuf> {
    let project_dirs = ProjectDirs::from("", "", "BatteryOverlay")
        .ok_or_else(|| anyhow!("Failed to determine user data directory"))?;

    let data_dir = project_dirs.data_dir();

    fs::create_dir_all(data_dir)
        .map_err(|e| anyhow!("Failed to create data directory: {}", e))?;

    Ok(data_dir.to_path_buf())
}

/// Load configuration from config.json in the data directory
/// Returns default config if file doesn't exist or on error
pub fn load_config() -> OverlayConfig {
    let Ok(data_dir) = get_data_directory() else {
        return OverlayConfig::default();
    };

    load_config_from(&data_dir.join(CONFIG_FILE))
}

/// Load configuration from an explicit path, falling back to defaults
pub fn load_config_from(path: &Path) -> OverlayConfig {
    if !path.exists() {
        debug!("No config at {}, using defaults", path.display());
        return OverlayConfig::default();
    }

    match read_config(path) {
        Ok(config) => config,
        Err(e) => {
            warn!("Ignoring config {}: {:#}", path.display(), e);
            OverlayConfig::default()
        }
    }
}

fn read_config(path: &Path) -> Result<OverlayConfig> {
    let contents = fs::read_to_string(path).context("Failed to read config")?;
    serde_json::from_str(&contents).context("Failed to parse config")
}

/// Save configuration to the given path as pretty-printed JSON
pub fn save_config(config: &OverlayConfig, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(config)
        .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

    fs::write(path, json).map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OverlayConfig::default();
        assert_eq!(config.hotkey, "Ctrl+Shift+T");
        assert_eq!(config.refresh_interval_ms, 1000);
        assert!(config.poll_when_hidden);
        assert_eq!(config.gesture.edge_tolerance_px, 20);
        assert_eq!(config.gesture.drag_threshold_px, 50);
        assert_eq!(config.position.backend, PositionBackend::File);
    }

    #[test]
    fn test_partial_config_keeps_defaults() {
        let json = r#"{ "gesture": { "drag_threshold_px": 80 }, "position": { "backend": "registry" } }"#;
        let config: OverlayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.gesture.drag_threshold_px, 80);
        assert_eq!(config.gesture.edge_tolerance_px, 20);
        assert_eq!(config.position.backend, PositionBackend::Registry);
        assert!(config.position.persist);
        assert_eq!(config.hotkey, "Ctrl+Shift+T");
    }

    #[test]
    fn test_partial_nested_objects_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        fs::write(&path, r#"{ "hotkey": "Shift+L", "size": { "width": 300 } }"#).unwrap();
        let config = load_config_from(&path);
        assert_eq!(config.hotkey, "Shift+L");
        assert_eq!(config.size, WindowSize { width: 300, height: 110 });

        // Missing coordinates are 0
        fs::write(&path, r#"{ "hotkey": "Shift+L", "default_position": { "x": 5 } }"#).unwrap();
        let config = load_config_from(&path);
        assert_eq!(config.hotkey, "Shift+L");
        assert_eq!(config.default_position, Position { x: 5, y: 0 });
    }

    #[test]
    fn test_refresh_timer_saturates() {
        let mut config = OverlayConfig::default();
        assert_eq!(config.refresh_timer_ms(), 1000);

        config.refresh_interval_ms = 10;
        assert_eq!(config.refresh_timer_ms(), 100);

        config.refresh_interval_ms = u64::MAX;
        assert_eq!(config.refresh_timer_ms(), u32::MAX);

        config.refresh_interval_ms = u32::MAX as u64 + 1;
        assert_eq!(config.refresh_timer_ms(), u32::MAX);
    }

    #[test]
    fn test_alpha_is_clamped() {
        let mut config = OverlayConfig::default();
        config.opacity = 5.0;
        assert_eq!(config.alpha(), 255);
        config.opacity = 0.0;
        assert_eq!(config.alpha(), 26);
        config.opacity = f32::NAN;
        assert_eq!(config.alpha(), 255);
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        let mut config = OverlayConfig::default();
        config.hotkey = "Ctrl+Alt+F1".to_string();
        config.show_audio = true;
        save_config(&config, &path).unwrap();

        assert_eq!(load_config_from(&path), config);
    }

    #[test]
    fn test_invalid_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(load_config_from(&path), OverlayConfig::default());
    }

    #[test]
    fn test_get_data_directory() {
        let result = get_data_directory();
        assert!(result.is_ok());

        let path = result.unwrap();
        // Linux lowercases the application name
        assert!(path.to_string_lossy().to_lowercase().contains("batteryoverlay"));
    }
}
