//! Playback driver: picks a random catalog entry and keeps a single live handle

use std::path::PathBuf;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info};

use super::{PlaybackHandle, SoundOutput};
use crate::catalog::SoundCatalog;
use crate::error::{Result, SoundsError};

/// Owns the audio backend and at most one playing sound
pub struct PlaybackDriver<O: SoundOutput, R: Rng = StdRng> {
    output: O,
    current: Option<O::Handle>,
    rng: R,
}

impl<O: SoundOutput> PlaybackDriver<O, StdRng> {
    /// Driver with an entropy-seeded generator
    pub fn new(output: O) -> Self {
        Self::with_rng(output, StdRng::from_entropy())
    }
}

impl<O: SoundOutput, R: Rng> PlaybackDriver<O, R> {
    /// Driver with an explicit generator
    pub fn with_rng(output: O, rng: R) -> Self {
        Self {
            output,
            current: None,
            rng,
        }
    }

    /// Play a uniformly chosen file from `catalog`
    ///
    /// Any sound still playing is stopped before the new one starts.
    pub fn play_random(&mut self, catalog: &SoundCatalog) -> Result<PathBuf> {
        if catalog.is_empty() {
            return Err(SoundsError::EmptyCatalog);
        }

        let index = self.rng.gen_range(0..catalog.len());
        let path = catalog
            .get(index)
            .ok_or(SoundsError::EmptyCatalog)?
            .to_path_buf();

        self.stop();
        let handle = self.output.start(&path)?;
        self.current = Some(handle);

        info!(path = %path.display(), index, "Playing random sound");
        Ok(path)
    }

    /// Stop the current sound, if any
    pub fn stop(&mut self) {
        if let Some(handle) = self.current.take() {
            handle.stop();
            debug!("Previous sound stopped");
        }
    }

    /// Whether a handle is currently held
    pub fn is_playing(&self) -> bool {
        self.current.is_some()
    }
}
