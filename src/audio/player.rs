//! Audio player implementation using rodio

use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink};
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

use super::{AudioError, PlaybackHandle, SoundOutput};

/// Audio player backed by the default output device
pub struct AudioPlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    volume: f32,
}

/// Sink of a sound started by [`AudioPlayer`]
pub struct SinkHandle {
    sink: Sink,
}

impl PlaybackHandle for SinkHandle {
    fn stop(self) {
        self.sink.stop();
    }
}

impl AudioPlayer {
    /// Create a new audio player
    pub fn new() -> Result<Self, AudioError> {
        let (stream, stream_handle) = OutputStream::try_default()
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        info!("Audio player initialized");

        Ok(Self {
            _stream: stream,
            stream_handle,
            volume: 0.8,
        })
    }

    /// Set the master volume (0.0 to 1.0)
    pub fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
    }

    /// Current volume
    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl SoundOutput for AudioPlayer {
    type Handle = SinkHandle;

    fn start(&mut self, path: &Path) -> Result<SinkHandle, AudioError> {
        debug!(path = %path.display(), "Playing sound file");

        if !path.exists() {
            return Err(AudioError::FileNotFound(path.to_path_buf()));
        }

        let decode_error = |reason: String| AudioError::DecodeError {
            path: path.to_path_buf(),
            reason,
        };

        let file = std::fs::File::open(path).map_err(|e| decode_error(e.to_string()))?;
        let source = Decoder::new(BufReader::new(file)).map_err(|e| decode_error(e.to_string()))?;

        let sink = Sink::try_new(&self.stream_handle)
            .map_err(|e| AudioError::StreamError(e.to_string()))?;

        sink.set_volume(self.volume);
        sink.append(source);

        Ok(SinkHandle { sink })
    }
}
