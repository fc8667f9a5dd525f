// Settings file watcher so external edits reach a running daemon

use anyhow::{Context, Result};
use notify::{
    event::{EventKind, ModifyKind},
    Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Settings reload event
#[derive(Debug, Clone)]
pub struct SettingsReloadEvent {
    /// Timestamp when the event was generated
    pub timestamp: Instant,
}

/// Settings file watcher
///
/// Watches the directory holding the settings file, so editors that save by
/// renaming a temporary file over it are seen too. Events closer than
/// 100ms apart are collapsed into one reload.
pub struct SettingsWatcher {
    _watcher: RecommendedWatcher,
    receiver: mpsc::Receiver<SettingsReloadEvent>,
}

const DEBOUNCE_DURATION: Duration = Duration::from_millis(100);

fn is_relevant(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any)
    )
}

impl SettingsWatcher {
    /// Start watching `settings_path`
    ///
    /// The parent directory must exist.
    pub fn new(settings_path: &Path) -> Result<Self> {
        let (tx, rx) = mpsc::channel();

        let directory = settings_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        let file_name: OsString = settings_path
            .file_name()
            .context("Settings path has no file name")?
            .to_os_string();

        let mut last_event: Option<Instant> = None;

        let mut watcher = RecommendedWatcher::new(
            move |res: Result<notify::Event, notify::Error>| match res {
                Ok(event) => {
                    if !is_relevant(&event.kind) {
                        tracing::trace!(kind = ?event.kind, "Ignoring file event");
                        return;
                    }
                    if !event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == Some(file_name.as_os_str()))
                    {
                        return;
                    }

                    let now = Instant::now();
                    if let Some(last) = last_event {
                        if now.duration_since(last) < DEBOUNCE_DURATION {
                            tracing::trace!("Settings change debounced");
                            return;
                        }
                    }
                    last_event = Some(now);

                    tracing::debug!("Settings file changed, triggering reload");
                    if let Err(e) = tx.send(SettingsReloadEvent { timestamp: now }) {
                        tracing::error!(error = %e, "Failed to send settings reload event");
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "File watcher error");
                }
            },
            NotifyConfig::default(),
        )
        .context("Failed to create file watcher")?;

        watcher
            .watch(&directory, RecursiveMode::NonRecursive)
            .with_context(|| format!("Failed to watch settings directory: {}", directory.display()))?;

        tracing::info!(
            path = %settings_path.display(),
            "Settings file watcher initialized"
        );

        Ok(Self {
            _watcher: watcher,
            receiver: rx,
        })
    }

    /// Try to receive a reload event (non-blocking)
    pub fn try_recv(&self) -> Option<SettingsReloadEvent> {
        self.receiver.try_recv().ok()
    }

    /// Drain all pending events; true if at least one reload is due
    pub fn reload_pending(&self) -> bool {
        let mut pending = false;
        while self.try_recv().is_some() {
            pending = true;
        }
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_watcher_creation() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "policy = 1\n").unwrap();

        let watcher = SettingsWatcher::new(&path);
        assert!(watcher.is_ok());
    }

    #[test]
    fn test_settings_watcher_detects_changes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "policy = 1\n").unwrap();

        let watcher = SettingsWatcher::new(&path).unwrap();

        std::fs::write(&path, "policy = 2\n").unwrap();

        // Give the watcher time to detect the change
        std::thread::sleep(Duration::from_millis(200));

        assert!(watcher.reload_pending(), "Expected reload event after file modification");
        assert!(!watcher.reload_pending());
    }

    #[test]
    fn test_settings_watcher_ignores_other_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.toml");
        std::fs::write(&path, "policy = 1\n").unwrap();

        let watcher = SettingsWatcher::new(&path).unwrap();
        std::fs::write(dir.path().join("other.txt"), "noise").unwrap();
        std::thread::sleep(Duration::from_millis(200));

        assert!(watcher.try_recv().is_none());
    }
}
