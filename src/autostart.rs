//! Run-at-login registration
//!
//! The engine only needs three capabilities from the operating system:
//! register a command line, unregister it, and ask whether it is registered.
//! [`XdgAutostart`] implements them with a desktop entry in the XDG autostart
//! directory, which desktop sessions launch at login.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::{AutostartError, AutostartResult, SoundsError};

/// Flag passed on the command line when launched at login
pub const AUTOSTART_FLAG: &str = "--autostart";

/// OS persistent run mechanism
pub trait Autostart {
    /// Register `command_line` to run at login
    fn register(&mut self, command_line: &str) -> AutostartResult<()>;

    /// Remove the registration; absent registrations are not an error
    fn unregister(&mut self) -> AutostartResult<()>;

    /// Whether a registration currently exists
    fn is_registered(&self) -> bool;
}

/// Autostart through `<config_dir>/autostart/<name>.desktop`
#[derive(Debug, Clone)]
pub struct XdgAutostart {
    entry_path: PathBuf,
}

impl XdgAutostart {
    /// Entry name used for this application
    pub const ENTRY_NAME: &'static str = "random-sounds";

    /// Entry in the user's autostart directory
    pub fn new() -> AutostartResult<Self> {
        let config_dir = dirs::config_dir().ok_or(AutostartError::NoConfigDir)?;
        Ok(Self::in_dir(config_dir.join("autostart")))
    }

    /// Entry in an explicit autostart directory
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            entry_path: dir
                .as_ref()
                .join(format!("{}.desktop", Self::ENTRY_NAME)),
        }
    }

    /// Path of the desktop entry
    pub fn entry_path(&self) -> &Path {
        &self.entry_path
    }

    fn desktop_entry(command_line: &str) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name=Random Sounds\n\
             Comment=Play a random sound on a schedule\n\
             Exec={}\n\
             Terminal=false\n\
             X-GNOME-Autostart-enabled=true\n",
            command_line
        )
    }

    fn io_error(&self, source: std::io::Error) -> AutostartError {
        AutostartError::Io {
            path: self.entry_path.clone(),
            source,
        }
    }
}

impl Autostart for XdgAutostart {
    fn register(&mut self, command_line: &str) -> AutostartResult<()> {
        if let Some(parent) = self.entry_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        std::fs::write(&self.entry_path, Self::desktop_entry(command_line))
            .map_err(|e| self.io_error(e))?;
        info!(path = %self.entry_path.display(), "Autostart entry written");
        Ok(())
    }

    fn unregister(&mut self) -> AutostartResult<()> {
        match std::fs::remove_file(&self.entry_path) {
            Ok(()) => {
                info!(path = %self.entry_path.display(), "Autostart entry removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn is_registered(&self) -> bool {
        self.entry_path.is_file()
    }
}

/// Command line that launches this executable in background mode
pub fn autostart_command_line() -> AutostartResult<String> {
    let exe = std::env::current_exe().map_err(AutostartError::NoExecutable)?;
    Ok(format!("\"{}\" {}", exe.display(), AUTOSTART_FLAG))
}

/// Result of flipping the autostart toggle
#[derive(Debug)]
pub struct AutostartOutcome {
    /// Registration state re-read from the OS after the attempt
    pub registered: bool,
    /// Failure of the attempt, if any
    pub error: Option<SoundsError>,
}

/// Enable or disable autostart
///
/// The reported state always reflects what the OS holds after the attempt,
/// so a failed toggle rolls back to the actual registration.
pub fn set_autostart<A: Autostart + ?Sized>(
    registry: &mut A,
    enabled: bool,
    command_line: &str,
) -> AutostartOutcome {
    let attempt = if enabled {
        registry.register(command_line)
    } else {
        registry.unregister()
    };

    let error = attempt.err().map(|e| {
        warn!(error = %e, enabled, "Autostart toggle failed");
        SoundsError::from(e)
    });

    AutostartOutcome {
        registered: registry.is_registered(),
        error,
    }
}
