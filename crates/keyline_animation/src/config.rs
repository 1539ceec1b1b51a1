//! Engine configuration
//!
//! Plain serde structs with defaults for every field, so a config file only
//! needs the values it changes. Parsing the file format is left to the
//! embedding application.

use crate::clock::{PlaybackClock, DEFAULT_TICK_RATE_HZ};
use crate::collision::PROBE_STEP;
use crate::easing::PREVIEW_SAMPLES;
use crate::error::ConfigError;
use crate::history::DEFAULT_CAPACITY;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level engine configuration
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub history: HistoryConfig,
    #[serde(default)]
    pub playback: PlaybackConfig,
    #[serde(default)]
    pub timeline: TimelineConfig,
    #[serde(default)]
    pub preview: PreviewConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Undo history
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct HistoryConfig {
    /// Maximum number of undo steps
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

/// Internal playback clock
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_tick_rate")]
    pub tick_rate_hz: f64,
    /// Wrap to the start at the end of the step
    #[serde(default = "default_true")]
    pub loop_playback: bool,
}

fn default_tick_rate() -> f64 {
    DEFAULT_TICK_RATE_HZ
}

fn default_true() -> bool {
    true
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            tick_rate_hz: default_tick_rate(),
            loop_playback: true,
        }
    }
}

/// Timeline editing
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct TimelineConfig {
    /// Collision probe step in seconds
    #[serde(default = "default_probe_step")]
    pub probe_step: f64,
}

fn default_probe_step() -> f64 {
    PROBE_STEP
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            probe_step: default_probe_step(),
        }
    }
}

/// Easing curve previews
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct PreviewConfig {
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_width")]
    pub width: f64,
    #[serde(default = "default_height")]
    pub height: f64,
}

fn default_samples() -> usize {
    PREVIEW_SAMPLES
}

fn default_width() -> f64 {
    100.0
}

fn default_height() -> f64 {
    60.0
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            width: default_width(),
            height: default_height(),
        }
    }
}

/// File repository location
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
}

fn default_root() -> PathBuf {
    PathBuf::from("animations")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
        }
    }
}

impl EngineConfig {
    /// Reject values the engine cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history.capacity == 0 {
            return Err(invalid("history.capacity", "must be at least 1"));
        }
        if !(self.playback.tick_rate_hz.is_finite() && self.playback.tick_rate_hz > 0.0) {
            return Err(invalid("playback.tick_rate_hz", "must be a positive number"));
        }
        let step = self.timeline.probe_step;
        if !(step.is_finite() && step >= 0.001) {
            return Err(invalid(
                "timeline.probe_step",
                "must be at least 0.001 (keyframe time precision)",
            ));
        }
        if self.preview.samples < 2 {
            return Err(invalid("preview.samples", "must be at least 2"));
        }
        if !(self.preview.width > 0.0 && self.preview.height > 0.0) {
            return Err(invalid("preview", "width and height must be positive"));
        }
        Ok(())
    }

    /// A stopped playback clock configured for a step of `duration` seconds
    pub fn playback_clock(&self, duration: f64) -> PlaybackClock {
        PlaybackClock::new(duration)
            .with_tick_rate(self.playback.tick_rate_hz)
            .with_loop(self.playback.loop_playback)
    }
}

fn invalid(field: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.to_string(),
    }
}
