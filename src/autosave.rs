use crate::config::EditorConfig;
use crate::serialization::Project;
use crate::Board;
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use log::debug;

/// Decides when the board is due for a save, driven by the host's clock ticks
#[derive(Debug, Clone)]
pub struct Autosave {
    interval: Duration,
    last_saved: Option<DateTime<Utc>>,
}

impl Autosave {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_saved: None,
        }
    }

    pub fn from_config(config: &EditorConfig) -> Self {
        let secs = i64::try_from(config.autosave_interval_secs).unwrap_or(i64::MAX);
        Self::new(Duration::try_seconds(secs).unwrap_or(Duration::MAX))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn last_saved(&self) -> Option<DateTime<Utc>> {
        self.last_saved
    }

    /// Due when nothing was saved yet or a full interval has passed
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_saved {
            None => true,
            Some(last) => now - last >= self.interval,
        }
    }

    /// Note a save made outside of `tick`, such as an explicit one
    pub fn mark_saved(&mut self, at: DateTime<Utc>) {
        self.last_saved = Some(at);
    }

    /// Save the board if due. Returns whether a save happened. A failed save
    /// leaves the schedule alone so the next tick retries.
    pub fn tick(&mut self, now: DateTime<Utc>, board: &Board, project: &Project) -> Result<bool> {
        if !self.is_due(now) {
            return Ok(false);
        }

        project.save(board)?;
        self.mark_saved(now);
        debug!("autosaved at {}", now);
        Ok(true)
    }
}
