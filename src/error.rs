// Error types for Random Sounds
//
// This module defines error types using thiserror. None of them is fatal to
// the engine: each one is turned into a user-facing notice by the caller.

use std::path::PathBuf;

use thiserror::Error;

use crate::audio::AudioError;

/// Main error type for engine operations
#[derive(Error, Debug)]
pub enum SoundsError {
    /// No sound files to arm or play with
    #[error("Please add sound files (.wav) to the sound directory.")]
    EmptyCatalog,

    /// Rescan requested while scheduling is on
    #[error("Turn scheduling off before rescanning the sound directory.")]
    RescanWhileArmed,

    /// Run-at-login registration failed
    #[error("Autostart registration failed: {0}")]
    Autostart(#[from] AutostartError),

    /// Failure inside the periodic tick
    #[error("{0}")]
    TickFailure(#[source] Box<SoundsError>),

    /// Settings could not be loaded or saved
    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    /// Sound directory could not be scanned
    #[error("Sound scan failed: {0}")]
    Scan(#[from] CatalogError),

    /// Sound could not be started
    #[error("Playback failed: {0}")]
    Audio(#[from] AudioError),
}

impl SoundsError {
    /// Title of the notice shown to the user for this error
    pub fn notice_title(&self) -> &'static str {
        match self {
            SoundsError::EmptyCatalog => "Empty sounds list",
            SoundsError::RescanWhileArmed => "Scheduling is on",
            SoundsError::Autostart(_) => "Autostart error",
            SoundsError::TickFailure(_) => "Action timer error",
            SoundsError::Settings(_) => "Settings error",
            SoundsError::Scan(_) => "Scan error",
            SoundsError::Audio(_) => "Playback error",
        }
    }

    /// Wrap an error raised inside the periodic tick
    pub fn tick(source: SoundsError) -> Self {
        SoundsError::TickFailure(Box::new(source))
    }
}

/// Settings persistence errors
#[derive(Error, Debug)]
pub enum SettingsError {
    /// Settings file unreadable
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Settings file or its directory unwritable
    #[error("Failed to write settings file {path}: {source}")]
    WriteError {
        /// File or directory being written
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// Settings file is not a valid record
    #[error("Failed to parse settings: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Record could not be encoded
    #[error("Failed to serialize settings: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// No per-user config directory on this system
    #[error("Config directory not found")]
    NoConfigDir,
}

/// Sound directory scan errors
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Directory does not exist
    #[error("Sound directory not found: {0}")]
    NotFound(PathBuf),

    /// Root of the directory could not be read
    #[error("Failed to walk sound directory: {0}")]
    Walk(#[from] walkdir::Error),
}

/// OS autostart registration errors
#[derive(Error, Debug)]
pub enum AutostartError {
    /// No per-user config directory on this system
    #[error("Config directory not found")]
    NoConfigDir,

    /// Path of the running binary is unknown
    #[error("Failed to locate the running executable: {0}")]
    NoExecutable(#[source] std::io::Error),

    /// Desktop entry could not be written or removed
    #[error("Failed to update autostart entry {path}: {source}")]
    Io {
        /// Desktop entry path
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
}

// Convenience type aliases for common Result types
/// Result of engine operations
pub type Result<T> = std::result::Result<T, SoundsError>;
/// Result of settings persistence
pub type SettingsResult<T> = std::result::Result<T, SettingsError>;
/// Result of directory scans
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
/// Result of autostart registration
pub type AutostartResult<T> = std::result::Result<T, AutostartError>;
