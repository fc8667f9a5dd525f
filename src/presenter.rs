//! Status line and notices shown to the user
//!
//! In foreground presentation the status text is redrawn in place on the
//! terminal and notices are printed on their own line. In background
//! presentation (the tray equivalent used at login) nothing is written to the
//! terminal; notices still go to the log.

use std::io::{self, Write};

use tracing::{info, warn};

use crate::error::SoundsError;

/// Where the daemon shows itself
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    /// Status line rendered on the terminal
    Foreground,
    /// Running silently, as when sent to the tray
    Background,
}

impl Presentation {
    /// The other presentation
    pub fn toggled(self) -> Self {
        match self {
            Presentation::Foreground => Presentation::Background,
            Presentation::Background => Presentation::Foreground,
        }
    }
}

/// A non-fatal message for the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Short heading
    pub title: &'static str,
    /// Full error text
    pub message: String,
}

impl From<&SoundsError> for Notice {
    fn from(error: &SoundsError) -> Self {
        Self {
            title: error.notice_title(),
            message: error.to_string(),
        }
    }
}

/// Renders status text and notices to a writer
pub struct StatusLine<W: Write> {
    writer: W,
    presentation: Presentation,
    last: Option<String>,
}

impl StatusLine<io::Stdout> {
    /// Status line on standard output
    pub fn stdout(presentation: Presentation) -> Self {
        Self::new(io::stdout(), presentation)
    }
}

impl<W: Write> StatusLine<W> {
    /// Status line over any writer
    pub fn new(writer: W, presentation: Presentation) -> Self {
        Self {
            writer,
            presentation,
            last: None,
        }
    }

    /// Current presentation
    pub fn presentation(&self) -> Presentation {
        self.presentation
    }

    /// Switch presentation, redrawing the last status when coming back
    pub fn set_presentation(&mut self, presentation: Presentation) -> io::Result<()> {
        if presentation == self.presentation {
            return Ok(());
        }
        info!(?presentation, "Presentation changed");
        if self.presentation == Presentation::Foreground {
            writeln!(self.writer)?;
        }
        self.presentation = presentation;
        if let Some(last) = self.last.take() {
            self.show(&last)?;
        }
        Ok(())
    }

    /// Show a status text; unchanged text is not redrawn
    pub fn show(&mut self, status: &str) -> io::Result<()> {
        if self.last.as_deref() == Some(status) {
            return Ok(());
        }
        self.last = Some(status.to_string());

        if self.presentation == Presentation::Foreground {
            write!(self.writer, "\r\x1b[2K{}", status)?;
            self.writer.flush()?;
        }
        Ok(())
    }

    /// Report a notice without interrupting the loop
    pub fn notice(&mut self, notice: &Notice) -> io::Result<()> {
        warn!(title = notice.title, message = %notice.message, "Notice");

        if self.presentation == Presentation::Foreground {
            writeln!(self.writer, "\r\x1b[2K{}: {}", notice.title, notice.message)?;
            if let Some(last) = &self.last {
                write!(self.writer, "{}", last)?;
            }
            self.writer.flush()?;
        }
        Ok(())
    }

    /// Underlying writer
    pub fn writer(&self) -> &W {
        &self.writer
    }
}
