//! Audio playback for scheduled sounds
//!
//! This module provides the playback driver and the audio backends behind
//! it. The real backend uses rodio and is compiled with the `audio` feature;
//! without it a silent stub keeps the scheduler fully functional.

mod driver;

#[cfg(feature = "audio")]
mod player;

#[cfg(feature = "audio")]
pub use player::{AudioPlayer, SinkHandle};

#[cfg(not(feature = "audio"))]
mod stub;

#[cfg(not(feature = "audio"))]
pub use stub::{AudioPlayer, SilentHandle};

pub use driver::PlaybackDriver;

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during audio playback
#[derive(Debug, Error)]
pub enum AudioError {
    /// Output device or stream could not be opened
    #[error("Failed to create output stream: {0}")]
    StreamError(String),

    /// File could not be opened or decoded
    #[error("Failed to decode {path}: {reason}")]
    DecodeError {
        /// File that failed
        path: PathBuf,
        /// Decoder or I/O message
        reason: String,
    },

    /// Sound file vanished since the last scan
    #[error("Sound file not found: {0}")]
    FileNotFound(PathBuf),

    /// Backend cannot play at all
    #[error("Audio system not available")]
    NotAvailable,
}

/// A live playback that can be stopped
pub trait PlaybackHandle {
    /// Stop playback and release the underlying resources
    fn stop(self);
}

/// Backend able to start playback of a sound file
pub trait SoundOutput {
    /// Handle returned for each started sound
    type Handle: PlaybackHandle;

    /// Open `path` and start playing it without blocking
    fn start(&mut self, path: &Path) -> Result<Self::Handle, AudioError>;
}

/// Backend for commands that only edit the schedule and never play
#[derive(Debug, Default, Clone, Copy)]
pub struct NullOutput;

/// Handle type of [`NullOutput`]; never constructed
#[derive(Debug)]
pub enum NullHandle {}

impl PlaybackHandle for NullHandle {
    fn stop(self) {
        match self {}
    }
}

impl SoundOutput for NullOutput {
    type Handle = NullHandle;

    fn start(&mut self, _path: &Path) -> Result<NullHandle, AudioError> {
        Err(AudioError::NotAvailable)
    }
}

/// Clamp a 0-100 volume percentage to rodio's 0.0-1.0 scale
pub fn volume_from_percent(percent: u8) -> f32 {
    (f32::from(percent) / 100.0).clamp(0.0, 1.0)
}
