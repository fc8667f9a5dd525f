//! Stub implementation when audio feature is disabled

use std::path::{Path, PathBuf};
use tracing::debug;

use super::{AudioError, PlaybackHandle, SoundOutput};

/// Stub audio player (logs instead of playing when audio feature is disabled)
#[derive(Debug, Default)]
pub struct AudioPlayer {
    volume: f32,
}

/// Handle of a sound "played" by the stub
#[derive(Debug)]
pub struct SilentHandle {
    path: PathBuf,
}

impl PlaybackHandle for SilentHandle {
    fn stop(self) {
        debug!(path = %self.path.display(), "Silent playback stopped");
    }
}

impl AudioPlayer {
    /// Create a new audio player stub
    pub fn new() -> Result<Self, AudioError> {
        debug!("Audio feature not enabled, using stub player");
        Ok(Self { volume: 0.8 })
    }

    /// Set volume (stored only)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Current volume
    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl SoundOutput for AudioPlayer {
    type Handle = SilentHandle;

    fn start(&mut self, path: &Path) -> Result<SilentHandle, AudioError> {
        if !path.exists() {
            return Err(AudioError::FileNotFound(path.to_path_buf()));
        }
        debug!(path = %path.display(), "Audio playback skipped (feature not enabled)");
        Ok(SilentHandle {
            path: path.to_path_buf(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stub_rejects_missing_file() {
        let mut player = AudioPlayer::new().unwrap();
        let result = player.start(Path::new("/definitely/not/here.wav"));
        assert!(matches!(result, Err(AudioError::FileNotFound(_))));
    }

    #[test]
    fn test_stub_volume_is_clamped() {
        let mut player = AudioPlayer::default();
        player.set_volume(3.0);
        assert_eq!(player.volume(), 1.0);
    }
}
