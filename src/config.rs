use crate::history::DEFAULT_CAPACITY;
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Editor settings. Every field has a default, so a config file only needs
/// the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Undo entries kept before the oldest is dropped
    pub history_capacity: usize,

    /// Seconds between autosaves
    pub autosave_interval_secs: u64,

    /// Title for boards that have none
    pub default_title: String,

    pub zoom: ZoomLimits,

    /// Canvas padding kept around content by fit-to-screen
    pub fit_padding: f32,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_CAPACITY,
            autosave_interval_secs: 30,
            default_title: "Untitled board".to_string(),
            zoom: ZoomLimits::default(),
            fit_padding: 50.0,
        }
    }
}

impl EditorConfig {
    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open config file: {}", path.display()))?;
        let reader = BufReader::new(file);
        let config: Self = serde_json::from_reader(reader)
            .with_context(|| format!("Failed to parse config from: {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("Invalid config in: {}", path.display()))?;
        Ok(config)
    }

    /// Load the file if it exists, otherwise use defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject values the editor cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(anyhow!("history_capacity must be at least 1"));
        }
        if self.autosave_interval_secs == 0 {
            return Err(anyhow!("autosave_interval_secs must be at least 1"));
        }
        if self.fit_padding < 0.0 {
            return Err(anyhow!("fit_padding must not be negative"));
        }
        self.zoom.validate()
    }
}

/// Zoom clamp range and the factor used by zoom in/out
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.1,
            max: 5.0,
            step: 1.2,
        }
    }
}

impl ZoomLimits {
    /// Clamp into `min..=max`. Inverted limits settle on `max` and NaN on
    /// `min` instead of panicking.
    pub fn clamp(&self, zoom: f32) -> f32 {
        zoom.max(self.min).min(self.max)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min > 0.0 && self.min <= self.max) {
            return Err(anyhow!(
                "zoom range must satisfy 0 < min <= max (got {}..{})",
                self.min,
                self.max
            ));
        }
        if self.step <= 1.0 {
            return Err(anyhow!("zoom step must be greater than 1 (got {})", self.step));
        }
        Ok(())
    }
}
