//! Configuration management for the dispatch core
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files. It combines the root window's host settings with the
//! gesture recognizer's thresholds.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration struct
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct AuraConfig {
    /// Host window and draw settings
    #[serde(default)]
    pub root_window: RootWindowConfig,

    /// Gesture recognition thresholds
    #[serde(default)]
    pub gestures: GestureConfig,

    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
}

/// Root window configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RootWindowConfig {
    /// Initial host width (pixels)
    pub width: i32,

    /// Initial host height (pixels)
    pub height: i32,

    /// Honour `hold_mouse_moves` requests
    pub hold_mouse_moves: bool,

    /// Longest a compositor lock may defer drawing (milliseconds)
    pub compositor_lock_timeout_ms: u64,
}

/// Gesture recognizer thresholds
///
/// Times are in seconds unless the name says otherwise, distances in
/// pixels and speeds in pixels per second.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GestureConfig {
    pub long_press_time_ms: u64,
    pub max_seconds_between_double_click: f64,
    pub max_touch_down_duration_for_click: f64,
    pub min_touch_down_duration_for_click: f64,
    pub max_touch_move_in_pixels_for_click: i32,
    pub min_distance_for_pinch_scroll_in_pixels: i32,
    pub min_flick_speed_squared: f32,
    pub min_pinch_update_distance_in_pixels: f32,
    pub min_rail_break_velocity: f32,
    pub min_scroll_delta_squared: i32,
    pub points_buffered_for_velocity: usize,
    pub rail_break_proportion: f32,
    pub rail_start_proportion: i32,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable debug logging
    pub debug: bool,
}

impl Default for RootWindowConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            hold_mouse_moves: true,
            compositor_lock_timeout_ms: 67,
        }
    }
}

impl RootWindowConfig {
    pub fn compositor_lock_timeout(&self) -> Duration {
        Duration::from_millis(self.compositor_lock_timeout_ms)
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            long_press_time_ms: 1000,
            max_seconds_between_double_click: 0.7,
            max_touch_down_duration_for_click: 0.8,
            min_touch_down_duration_for_click: 0.01,
            max_touch_move_in_pixels_for_click: 20,
            min_distance_for_pinch_scroll_in_pixels: 20,
            min_flick_speed_squared: 550.0 * 550.0,
            min_pinch_update_distance_in_pixels: 5.0,
            min_rail_break_velocity: 200.0,
            min_scroll_delta_squared: 5 * 5,
            points_buffered_for_velocity: 3,
            rail_break_proportion: 15.0,
            rail_start_proportion: 2,
        }
    }
}

impl GestureConfig {
    pub fn long_press_time(&self) -> Duration {
        Duration::from_millis(self.long_press_time_ms)
    }
}

impl AuraConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let expanded_path = Self::expand_path(path)?;

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: AuraConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Expand a leading `~` to the home directory
    pub fn expand_path<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
        let path = path.as_ref();
        if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            let rest = path.strip_prefix("~").unwrap_or(path);
            Ok(Path::new(&home).join(rest))
        } else {
            Ok(path.to_path_buf())
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let root = &self.root_window;
        if root.width <= 0 || root.height <= 0 {
            anyhow::bail!(
                "Invalid root window size {}x{}: both dimensions must be positive",
                root.width,
                root.height
            );
        }
        if root.compositor_lock_timeout_ms == 0 {
            anyhow::bail!("Invalid compositor_lock_timeout_ms: must be greater than 0");
        }

        let g = &self.gestures;
        if g.long_press_time_ms == 0 {
            anyhow::bail!("Invalid long_press_time_ms: must be greater than 0");
        }
        if g.min_touch_down_duration_for_click < 0.0
            || g.min_touch_down_duration_for_click >= g.max_touch_down_duration_for_click
        {
            anyhow::bail!(
                "Invalid click window: min_touch_down_duration_for_click ({}) must be non-negative and below max_touch_down_duration_for_click ({})",
                g.min_touch_down_duration_for_click,
                g.max_touch_down_duration_for_click
            );
        }
        if g.max_seconds_between_double_click <= 0.0 {
            anyhow::bail!("Invalid max_seconds_between_double_click: must be positive");
        }
        if g.max_touch_move_in_pixels_for_click <= 0
            || g.min_distance_for_pinch_scroll_in_pixels <= 0
            || g.min_scroll_delta_squared <= 0
            || g.rail_start_proportion <= 0
        {
            anyhow::bail!("Invalid gesture distance thresholds: all must be positive");
        }
        if g.min_flick_speed_squared <= 0.0
            || g.min_pinch_update_distance_in_pixels <= 0.0
            || g.min_rail_break_velocity <= 0.0
            || g.rail_break_proportion <= 0.0
        {
            anyhow::bail!("Invalid gesture speed thresholds: all must be positive");
        }
        if g.points_buffered_for_velocity < 2 {
            anyhow::bail!("Invalid points_buffered_for_velocity: at least 2 points are needed");
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Merge a partial configuration into this one
    /// Sections of the partial config that differ from the defaults win
    pub fn merge_partial(mut self, partial: AuraConfig) -> Self {
        let default_config = AuraConfig::default();

        if partial.root_window != default_config.root_window {
            self.root_window = partial.root_window;
        }
        if partial.gestures != default_config.gestures {
            self.gestures = partial.gestures;
        }
        if partial.general != default_config.general {
            self.general = partial.general;
        }

        self
    }
}
