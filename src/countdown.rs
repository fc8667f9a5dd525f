//! Friendly countdown text
//!
//! Turns the time remaining until the next trigger into sentences such as
//! "2 minutes, 1 second." for the status line.

use std::fmt;

use chrono::Duration;

/// Text shown when the remaining time rounds down to zero
pub const NOW_PLAYING: &str = "Now playing...";

/// Remaining time split into display units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    /// Whole hours, not wrapped at a day
    pub hours: i64,
    /// Minutes past the hours
    pub minutes: i64,
    /// Seconds past the minutes
    pub seconds: i64,
}

impl Countdown {
    /// Split a duration into whole units; negative durations count as zero
    ///
    /// Hours are not wrapped into days so long random windows stay readable.
    pub fn from_duration(remaining: Duration) -> Self {
        let total_seconds = remaining.num_seconds().max(0);
        Self {
            hours: total_seconds / 3600,
            minutes: (total_seconds % 3600) / 60,
            seconds: total_seconds % 60,
        }
    }

    /// Countdown from explicit units
    pub fn new(hours: i64, minutes: i64, seconds: i64) -> Self {
        Self {
            hours,
            minutes,
            seconds,
        }
    }

    /// Whether nothing remains
    pub fn is_zero(&self) -> bool {
        self.hours <= 0 && self.minutes <= 0 && self.seconds <= 0
    }

    /// Status line for this countdown
    pub fn status_line(&self) -> String {
        if self.is_zero() {
            NOW_PLAYING.to_string()
        } else {
            format!("Next play in {}", self)
        }
    }
}

fn unit(value: i64, name: &str) -> Option<String> {
    if value <= 0 {
        return None;
    }
    let plural = if value > 1 { "s" } else { "" };
    Some(format!("{} {}{}", value, name, plural))
}

impl fmt::Display for Countdown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = [
            unit(self.hours, "hour"),
            unit(self.minutes, "minute"),
            unit(self.seconds, "second"),
        ]
        .into_iter()
        .flatten()
        .collect();

        if parts.is_empty() {
            f.write_str(NOW_PLAYING)
        } else {
            write!(f, "{}.", parts.join(", "))
        }
    }
}

/// Friendly rendering of a remaining duration
pub fn friendly_remaining(remaining: Duration) -> String {
    Countdown::from_duration(remaining).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_units() {
        assert_eq!(Countdown::new(0, 0, 5).to_string(), "5 seconds.");
        assert_eq!(Countdown::new(1, 0, 0).to_string(), "1 hour.");
        assert_eq!(Countdown::new(0, 1, 0).to_string(), "1 minute.");
    }

    #[test]
    fn test_joined_units() {
        assert_eq!(Countdown::new(0, 2, 1).to_string(), "2 minutes, 1 second.");
        assert_eq!(Countdown::new(1, 0, 5).to_string(), "1 hour, 5 seconds.");
        assert_eq!(
            Countdown::new(3, 10, 59).to_string(),
            "3 hours, 10 minutes, 59 seconds."
        );
    }

    #[test]
    fn test_zero_is_now_playing() {
        assert_eq!(Countdown::new(0, 0, 0).to_string(), "Now playing...");
        assert_eq!(friendly_remaining(Duration::zero()), "Now playing...");
        assert_eq!(friendly_remaining(Duration::milliseconds(900)), "Now playing...");
        assert_eq!(friendly_remaining(Duration::seconds(-4)), "Now playing...");
    }

    #[test]
    fn test_from_duration() {
        let countdown = Countdown::from_duration(Duration::seconds(26 * 3600 + 61));
        assert_eq!(countdown, Countdown::new(26, 1, 1));
    }

    #[test]
    fn test_status_line() {
        assert_eq!(
            Countdown::new(0, 14, 0).status_line(),
            "Next play in 14 minutes."
        );
        assert_eq!(Countdown::default().status_line(), "Now playing...");
    }
}
