//! Random Sounds Library
//!
//! This library provides the core of the random sounds daemon: schedule
//! policies, the sound catalog, the playback driver, settings persistence
//! and the polling engine that ties them together.

#![warn(missing_docs)]

pub mod audio;
pub mod autostart;
pub mod catalog;
pub mod countdown;
pub mod engine;
pub mod error;
pub mod presenter;
pub mod schedule;
pub mod settings;
pub mod settings_watcher;

// Re-export commonly used types
pub use audio::{AudioError, AudioPlayer, NullOutput, PlaybackDriver, PlaybackHandle, SoundOutput};
pub use autostart::{set_autostart, Autostart, AutostartOutcome, XdgAutostart};
pub use catalog::SoundCatalog;
pub use countdown::{friendly_remaining, Countdown};
pub use engine::{local_now, EngineState, Scheduler, TickReport};
pub use error::{AutostartError, CatalogError, SettingsError, SoundsError};
pub use presenter::{Notice, Presentation, StatusLine};
pub use schedule::{next_trigger, Interval, Policy, ScheduleState};
pub use settings::{Settings, SettingsStore, SwitchState};
pub use settings_watcher::{SettingsReloadEvent, SettingsWatcher};
