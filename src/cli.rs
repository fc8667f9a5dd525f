//! Command-line arguments

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use random_sounds::Policy;

#[derive(Parser, Debug)]
#[command(name = "random-sounds", version, about = "Play a random sound on a schedule")]
pub struct Cli {
    /// Start directly in background mode (used by the autostart entry)
    #[arg(long, global = true)]
    pub autostart: bool,

    /// Directory scanned for .wav files [default: working directory]
    #[arg(short, long, global = true)]
    pub dir: Option<PathBuf>,

    /// Settings file [default: <config dir>/random-sounds/settings.toml]
    #[arg(short, long, global = true)]
    pub settings: Option<PathBuf>,

    /// Playback volume in percent
    #[arg(long, default_value_t = 80, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub volume: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the scheduler (the default)
    Run,
    /// Switch scheduling on
    On,
    /// Switch scheduling off
    Off,
    /// Select the policy, optionally changing its interval in minutes
    Policy {
        /// from-the-hour, every or random
        policy: Policy,
        /// Interval in minutes for this policy
        minutes: Option<u32>,
    },
    /// List the sound files in the directory (send SIGUSR2 to make a running daemon rescan)
    Scan,
    /// Show when the stored policy would play next
    Next,
    /// Manage starting at login
    Autostart {
        #[arg(value_enum)]
        action: AutostartAction,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutostartAction {
    Enable,
    Disable,
    Status,
}
