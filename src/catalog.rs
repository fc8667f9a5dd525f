// Sound file catalog built by scanning a directory tree

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::error::{CatalogError, CatalogResult};

/// Extension of the sound files picked up by a scan
pub const SOUND_EXTENSION: &str = "wav";

/// Ordered list of playable sound files
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SoundCatalog {
    files: Vec<PathBuf>,
}

impl SoundCatalog {
    /// Empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog over an explicit list of files
    pub fn from_files(files: Vec<PathBuf>) -> Self {
        Self { files }
    }

    /// Scan `dir` into a fresh catalog
    pub fn scan(dir: &Path) -> CatalogResult<Self> {
        let mut catalog = Self::new();
        catalog.rescan(dir)?;
        Ok(catalog)
    }

    /// Replace the catalog with the sound files found under `dir`
    ///
    /// Unreadable entries below `dir` are skipped. The previous contents are
    /// kept if `dir` itself cannot be read.
    pub fn rescan(&mut self, dir: &Path) -> CatalogResult<usize> {
        if !dir.is_dir() {
            return Err(CatalogError::NotFound(dir.to_path_buf()));
        }

        let root = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
        let mut files = Vec::new();
        for entry in WalkDir::new(&root).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry in sound directory");
                    continue;
                }
            };
            if entry.file_type().is_file() && is_sound_file(entry.path()) {
                files.push(entry.into_path());
            }
        }
        files.sort();

        debug!(dir = %root.display(), count = files.len(), "Sound directory scanned");
        self.files = files;
        info!(count = self.files.len(), "Sound catalog rebuilt");
        Ok(self.files.len())
    }

    /// Number of files
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether there is nothing to play
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// File at `index` in sorted order
    pub fn get(&self, index: usize) -> Option<&Path> {
        self.files.get(index).map(PathBuf::as_path)
    }

    /// Files in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &Path> {
        self.files.iter().map(PathBuf::as_path)
    }

    /// Status text describing the catalog size
    pub fn summary(&self) -> String {
        format!("Found {} sound files to play", self.files.len())
    }
}

fn is_sound_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(SOUND_EXTENSION))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, b"RIFF").unwrap();
    }

    #[test]
    fn test_scan_is_recursive_and_filtered() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("bell.wav"));
        touch(&dir.path().join("nested/deeper/gong.WAV"));
        touch(&dir.path().join("notes.txt"));
        touch(&dir.path().join("nested/track.mp3"));

        let catalog = SoundCatalog::scan(dir.path()).unwrap();
        assert_eq!(catalog.len(), 2);
        assert!(catalog.iter().all(|p| p.is_absolute()));
        assert!(catalog.iter().any(|p| p.ends_with("bell.wav")));
        assert!(catalog.iter().any(|p| p.ends_with("gong.WAV")));
    }

    #[test]
    fn test_empty_directory() {
        let dir = TempDir::new().unwrap();
        let catalog = SoundCatalog::scan(dir.path()).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.summary(), "Found 0 sound files to play");
    }

    #[test]
    fn test_rescan_replaces_contents() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("a.wav"));
        let mut catalog = SoundCatalog::scan(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);

        touch(&dir.path().join("b.wav"));
        std::fs::remove_file(dir.path().join("a.wav")).unwrap();
        assert_eq!(catalog.rescan(dir.path()).unwrap(), 1);
        assert!(catalog.get(0).unwrap().ends_with("b.wav"));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_loop_is_skipped() {
        let dir = TempDir::new().unwrap();
        touch(&dir.path().join("bell.wav"));
        std::fs::create_dir_all(dir.path().join("sub")).unwrap();
        std::os::unix::fs::symlink(dir.path(), dir.path().join("sub/loop")).unwrap();

        let catalog = SoundCatalog::scan(dir.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.get(0).unwrap().ends_with("bell.wav"));
    }

    #[test]
    fn test_missing_directory_keeps_previous() {
        let dir = TempDir::new().unwrap();
        let mut catalog = SoundCatalog::from_files(vec![PathBuf::from("/tmp/kept.wav")]);

        let result = catalog.rescan(&dir.path().join("gone"));
        assert!(matches!(result, Err(CatalogError::NotFound(_))));
        assert_eq!(catalog.len(), 1);
    }
}
