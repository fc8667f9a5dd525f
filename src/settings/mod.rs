// Settings persistence
//
// The settings record is tiny: the on/off switch, the selected policy and one
// interval per policy. It is written wholesale after every change.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{SettingsError, SettingsResult};
use crate::schedule::{Interval, Policy};

/// Default interval in minutes for every policy
pub const DEFAULT_INTERVAL_MINUTES: u32 = 15;

/// Whether scheduling is armed, persisted as 0 or 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SwitchState {
    /// Scheduling off
    #[default]
    Off,
    /// Scheduling armed
    On,
}

impl SwitchState {
    /// Whether the switch is on
    pub fn is_on(self) -> bool {
        self == SwitchState::On
    }
}

impl TryFrom<u8> for SwitchState {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(SwitchState::Off),
            1 => Ok(SwitchState::On),
            other => Err(format!("on_state must be 0 or 1, got {}", other)),
        }
    }
}

impl From<SwitchState> for u8 {
    fn from(state: SwitchState) -> Self {
        match state {
            SwitchState::Off => 0,
            SwitchState::On => 1,
        }
    }
}

/// Persisted settings record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether scheduling was armed when last saved
    #[serde(default)]
    pub on_state: SwitchState,

    /// Last selected policy (1 = from the hour, 2 = every, 3 = random)
    #[serde(default)]
    pub policy: Policy,

    /// Minutes past the hour alignment
    #[serde(default = "default_interval")]
    pub interval_from_hour: u32,

    /// Minutes between plays
    #[serde(default = "default_interval")]
    pub interval_every: u32,

    /// Width of the random window in minutes
    #[serde(default = "default_interval")]
    pub interval_random_max: u32,
}

fn default_interval() -> u32 {
    DEFAULT_INTERVAL_MINUTES
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            on_state: SwitchState::Off,
            policy: Policy::FromTheHour,
            interval_from_hour: DEFAULT_INTERVAL_MINUTES,
            interval_every: DEFAULT_INTERVAL_MINUTES,
            interval_random_max: DEFAULT_INTERVAL_MINUTES,
        }
    }
}

impl Settings {
    /// Configured interval for a policy, normalized for evaluation
    pub fn interval(&self, policy: Policy) -> Interval {
        let minutes = match policy {
            Policy::FromTheHour => self.interval_from_hour,
            Policy::EveryInterval => self.interval_every,
            Policy::RandomInterval => self.interval_random_max,
        };
        Interval::for_policy(policy, minutes)
    }

    /// Interval of the currently selected policy
    pub fn active_interval(&self) -> Interval {
        self.interval(self.policy)
    }

    /// Store an interval for a policy; the value is normalized first
    pub fn set_interval(&mut self, policy: Policy, minutes: u32) {
        let minutes = Interval::for_policy(policy, minutes).minutes();
        match policy {
            Policy::FromTheHour => self.interval_from_hour = minutes,
            Policy::EveryInterval => self.interval_every = minutes,
            Policy::RandomInterval => self.interval_random_max = minutes,
        }
    }

    /// Replace out-of-range intervals (zero, or above an hour for the
    /// from-the-hour policy) with their normalized values
    pub fn normalized(mut self) -> Self {
        for policy in Policy::ALL {
            let minutes = self.interval(policy).minutes();
            self.set_interval(policy, minutes);
        }
        self
    }

    /// Parse a settings record from TOML text
    pub fn from_toml(content: &str) -> SettingsResult<Self> {
        let settings: Settings = toml::from_str(content)?;
        Ok(settings.normalized())
    }

    /// Serialize the record to TOML text
    pub fn to_toml(&self) -> SettingsResult<String> {
        Ok(toml::to_string(self)?)
    }
}

/// File-backed store for the settings record
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Store backed by an explicit file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config_dir>/random-sounds/settings.toml`
    pub fn default_location() -> SettingsResult<Self> {
        let config_dir = dirs::config_dir().ok_or(SettingsError::NoConfigDir)?;
        Ok(Self::new(
            config_dir.join("random-sounds").join("settings.toml"),
        ))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether a persisted copy exists
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the record; a missing file yields the defaults
    pub fn load(&self) -> SettingsResult<Settings> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "No settings file, using defaults");
            return Ok(Settings::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let settings = Settings::from_toml(&content)?;
        debug!(path = %self.path.display(), ?settings, "Settings loaded");
        Ok(settings)
    }

    /// Write the record wholesale
    pub fn save(&self, settings: &Settings) -> SettingsResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| SettingsError::WriteError {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let content = settings.to_toml()?;
        std::fs::write(&self.path, content).map_err(|source| SettingsError::WriteError {
            path: self.path.clone(),
            source,
        })?;

        info!(path = %self.path.display(), "Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.on_state, SwitchState::Off);
        assert_eq!(settings.policy, Policy::FromTheHour);
        assert_eq!(settings.interval_from_hour, 15);
        assert_eq!(settings.interval_every, 15);
        assert_eq!(settings.interval_random_max, 15);
    }

    #[test]
    fn test_settings_serialize_as_integers() {
        let mut settings = Settings::default();
        settings.on_state = SwitchState::On;
        settings.policy = Policy::RandomInterval;

        let text = settings.to_toml().unwrap();
        assert!(text.contains("on_state = 1"));
        assert!(text.contains("policy = 3"));
    }

    #[test]
    fn test_settings_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("settings.toml"));

        let mut settings = Settings::default();
        settings.policy = Policy::EveryInterval;
        settings.set_interval(Policy::EveryInterval, 42);
        store.save(&settings).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded, settings);

        store.save(&loaded).unwrap();
        assert_eq!(store.load().unwrap(), settings);
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let dir = TempDir::new().unwrap();
        let store = SettingsStore::new(dir.path().join("absent.toml"));
        assert!(!store.exists());
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "policy = 7\n").unwrap();

        let store = SettingsStore::new(&path);
        assert!(matches!(store.load(), Err(SettingsError::ParseError(_))));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let settings = Settings::from_toml("policy = 2\ninterval_every = 5\n").unwrap();
        assert_eq!(settings.policy, Policy::EveryInterval);
        assert_eq!(settings.interval_every, 5);
        assert_eq!(settings.interval_from_hour, 15);
        assert_eq!(settings.on_state, SwitchState::Off);
    }

    #[test]
    fn test_zero_intervals_are_normalized() {
        let settings =
            Settings::from_toml("interval_from_hour = 0\ninterval_every = 0\ninterval_random_max = 0\n")
                .unwrap();
        assert_eq!(settings.interval_from_hour, 1);
        assert_eq!(settings.interval_every, 1);
        assert_eq!(settings.interval_random_max, 1);
    }

    #[test]
    fn test_from_hour_interval_clamped_to_hour() {
        let mut settings = Settings::default();
        settings.set_interval(Policy::FromTheHour, 90);
        assert_eq!(settings.interval_from_hour, 60);

        settings.set_interval(Policy::EveryInterval, 90);
        assert_eq!(settings.interval_every, 90);
    }

    #[test]
    fn test_save_failure_is_reported() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "file").unwrap();

        let store = SettingsStore::new(blocker.join("settings.toml"));
        let result = store.save(&Settings::default());
        assert!(matches!(result, Err(SettingsError::WriteError { .. })));
    }
}
