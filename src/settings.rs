use crate::hotkey::StopKey;
use crate::runner::Timing;
use crate::store::CONFIGS_FILE;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";

fn default_store_path() -> String {
    CONFIGS_FILE.to_string()
}

fn default_stop_key() -> String {
    StopKey::default().to_string()
}

fn default_settle_ms() -> u64 {
    1000
}

fn default_repeat_pause_ms() -> u64 {
    1000
}

fn default_hold_min_ms() -> u64 {
    50
}

fn default_hold_max_ms() -> u64 {
    100
}

fn default_poll_ms() -> u64 {
    50
}

fn default_true() -> bool {
    true
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Settings {
    /// Where configs are loaded from and saved to.
    #[serde(default = "default_store_path")]
    pub store_path: String,
    /// Key that stops a running playback, e.g. "Esc" or "F9".
    #[serde(default = "default_stop_key")]
    pub stop_key: String,
    /// Pause after activating the target window, before each click.
    #[serde(default = "default_settle_ms")]
    pub settle_ms: u64,
    /// Pause after each full pass over the steps.
    #[serde(default = "default_repeat_pause_ms")]
    pub repeat_pause_ms: u64,
    #[serde(default = "default_hold_min_ms")]
    pub hold_min_ms: u64,
    #[serde(default = "default_hold_max_ms")]
    pub hold_max_ms: u64,
    /// How often the stop listener checks the stop key.
    #[serde(default = "default_poll_ms")]
    pub poll_ms: u64,
    /// Move the pointer along a curved path before clicking.
    #[serde(default = "default_true")]
    pub glide: bool,
    #[serde(default)]
    pub debug_logging: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            stop_key: default_stop_key(),
            settle_ms: default_settle_ms(),
            repeat_pause_ms: default_repeat_pause_ms(),
            hold_min_ms: default_hold_min_ms(),
            hold_max_ms: default_hold_max_ms(),
            poll_ms: default_poll_ms(),
            glide: true,
            debug_logging: false,
        }
    }
}

impl Settings {
    /// Load settings from `path`, falling back to defaults when the file is
    /// missing or empty.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path).unwrap_or_default();
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_json::from_str(&content)?)
    }

    pub fn stop_key(&self) -> StopKey {
        StopKey::parse_or_default(&self.stop_key)
    }

    pub fn timing(&self) -> Timing {
        Timing {
            settle: Duration::from_millis(self.settle_ms),
            repeat_pause: Duration::from_millis(self.repeat_pause_ms),
            hold_min: Duration::from_millis(self.hold_min_ms.min(self.hold_max_ms)),
            hold_max: Duration::from_millis(self.hold_min_ms.max(self.hold_max_ms)),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_timing_defaults() {
        let s = Settings::default();
        assert_eq!(s.timing(), Timing::default());
        assert_eq!(s.stop_key(), StopKey::Escape);
        assert_eq!(s.poll_interval(), Duration::from_millis(50));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let s: Settings = serde_json::from_str(r#"{"stop_key": "F8", "settle_ms": 0}"#).unwrap();
        assert_eq!(s.stop_key(), StopKey::F(8));
        assert_eq!(s.timing().settle, Duration::ZERO);
        assert_eq!(s.store_path, "configs.json");
        assert!(s.glide);
    }

    #[test]
    fn test_hold_bounds_are_ordered() {
        let s = Settings { hold_min_ms: 90, hold_max_ms: 10, ..Settings::default() };
        let t = s.timing();
        assert_eq!((t.hold_min, t.hold_max), (Duration::from_millis(10), Duration::from_millis(90)));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings::load(dir.path().join("nope.json")).unwrap();
        assert_eq!(s, Settings::default());
    }
}
