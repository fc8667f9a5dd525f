//! Schedule policies and next-trigger evaluation
//!
//! Three mutually exclusive policies decide when the next sound plays:
//! aligned to minutes past the hour, a fixed interval from now, or a random
//! point inside a sliding window. Evaluation works on local wall-clock time
//! (`NaiveDateTime`) so it is deterministic under test.

use std::fmt;
use std::str::FromStr;

use chrono::{Duration, NaiveDateTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Scheduling policy, persisted as 1, 2 or 3
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Policy {
    /// Play when the minute of the hour is a multiple of the interval
    #[default]
    FromTheHour,
    /// Play every interval from now
    EveryInterval,
    /// Play at a random point inside a window of the interval width
    RandomInterval,
}

impl Policy {
    /// All policies in persisted order
    pub const ALL: [Policy; 3] = [
        Policy::FromTheHour,
        Policy::EveryInterval,
        Policy::RandomInterval,
    ];

    /// Persisted code of the policy
    pub fn code(self) -> u8 {
        match self {
            Policy::FromTheHour => 1,
            Policy::EveryInterval => 2,
            Policy::RandomInterval => 3,
        }
    }

    /// Command-line name of the policy
    pub fn as_str(self) -> &'static str {
        match self {
            Policy::FromTheHour => "from-the-hour",
            Policy::EveryInterval => "every",
            Policy::RandomInterval => "random",
        }
    }

    /// Human-readable description for a configured interval
    pub fn describe(self, interval: Interval) -> String {
        match self {
            Policy::FromTheHour => format!("every {} minutes from the hour", interval),
            Policy::EveryInterval => format!("every {} minutes from now", interval),
            Policy::RandomInterval => format!("at random in every {} minute interval", interval),
        }
    }
}

impl TryFrom<u8> for Policy {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Policy::FromTheHour),
            2 => Ok(Policy::EveryInterval),
            3 => Ok(Policy::RandomInterval),
            other => Err(format!("policy must be 1, 2 or 3, got {}", other)),
        }
    }
}

impl From<Policy> for u8 {
    fn from(policy: Policy) -> Self {
        policy.code()
    }
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Policy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "from-the-hour" | "hour" | "1" => Ok(Policy::FromTheHour),
            "every" | "every-interval" | "2" => Ok(Policy::EveryInterval),
            "random" | "random-interval" | "3" => Ok(Policy::RandomInterval),
            other => Err(format!(
                "unknown policy '{}', expected from-the-hour, every or random",
                other
            )),
        }
    }
}

/// A validated interval in minutes, never zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval(u32);

impl Interval {
    /// Largest alignment period for the from-the-hour policy
    pub const MAX_FROM_THE_HOUR: u32 = 60;

    /// Interval of `minutes`; zero is treated as one minute
    pub fn new(minutes: u32) -> Self {
        Self(minutes.max(1))
    }

    /// Interval normalized for a policy (from-the-hour is capped at 60)
    pub fn for_policy(policy: Policy, minutes: u32) -> Self {
        match policy {
            Policy::FromTheHour => Self::new(minutes.min(Self::MAX_FROM_THE_HOUR)),
            Policy::EveryInterval | Policy::RandomInterval => Self::new(minutes),
        }
    }

    /// Length in minutes
    pub fn minutes(self) -> u32 {
        self.0
    }

    fn as_duration(self) -> Duration {
        Duration::minutes(i64::from(self.0))
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutable schedule bookkeeping of an armed engine
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScheduleState {
    /// When the next sound plays
    pub next_trigger: Option<NaiveDateTime>,
    /// Sliding anchor of the random policy
    pub random_anchor: Option<NaiveDateTime>,
    /// Last whole second the poll loop acted on
    pub last_tick_second: Option<NaiveDateTime>,
}

impl ScheduleState {
    /// Empty bookkeeping
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything, as when the policy changes or scheduling restarts
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Compute the next trigger instant for `policy` after `now`
///
/// Only the random policy touches `state` (its anchor).
pub fn next_trigger<R: Rng>(
    now: NaiveDateTime,
    policy: Policy,
    interval: Interval,
    state: &mut ScheduleState,
    rng: &mut R,
) -> NaiveDateTime {
    let next = match policy {
        Policy::FromTheHour => from_the_hour(now, interval),
        Policy::EveryInterval => every_interval(now, interval),
        Policy::RandomInterval => random_interval(now, interval, &mut state.random_anchor, rng),
    };
    trace!(%now, %next, %policy, minutes = interval.minutes(), "Next trigger computed");
    next
}

/// Next instant whose minute is a multiple of the interval, seconds zeroed
pub fn from_the_hour(now: NaiveDateTime, interval: Interval) -> NaiveDateTime {
    let period = interval.minutes().min(Interval::MAX_FROM_THE_HOUR);
    let mut next = now;
    // Terminates within 60 steps since the minute wraps to 0 every hour.
    loop {
        next += Duration::minutes(1);
        if next.minute() % period == 0 {
            break;
        }
    }
    next.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(next)
}

/// `now` plus the interval
pub fn every_interval(now: NaiveDateTime, interval: Interval) -> NaiveDateTime {
    now + interval.as_duration()
}

/// Random instant inside the window ending at the advanced anchor
pub fn random_interval<R: Rng>(
    now: NaiveDateTime,
    interval: Interval,
    anchor: &mut Option<NaiveDateTime>,
    rng: &mut R,
) -> NaiveDateTime {
    let window_secs = i64::from(interval.minutes()) * 60;
    let jitter = rng.gen_range(1..window_secs);

    let advanced = match *anchor {
        Some(previous) if previous > now => previous + interval.as_duration(),
        _ => now + interval.as_duration(),
    };
    *anchor = Some(advanced);

    advanced - Duration::seconds(jitter)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(h: u32, m: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 14)
            .unwrap()
            .and_hms_opt(h, m, s)
            .unwrap()
    }

    #[test]
    fn test_policy_codes() {
        for policy in Policy::ALL {
            assert_eq!(Policy::try_from(policy.code()).unwrap(), policy);
        }
        assert!(Policy::try_from(0).is_err());
        assert!(Policy::try_from(4).is_err());
    }

    #[test]
    fn test_policy_from_str() {
        assert_eq!("every".parse::<Policy>().unwrap(), Policy::EveryInterval);
        assert_eq!("Random".parse::<Policy>().unwrap(), Policy::RandomInterval);
        assert_eq!("from-the-hour".parse::<Policy>().unwrap(), Policy::FromTheHour);
        assert!("weekly".parse::<Policy>().is_err());
    }

    #[test]
    fn test_zero_interval_is_one_minute() {
        assert_eq!(Interval::new(0).minutes(), 1);
        assert_eq!(Interval::for_policy(Policy::FromTheHour, 0).minutes(), 1);
        assert_eq!(Interval::for_policy(Policy::FromTheHour, 120).minutes(), 60);
        assert_eq!(Interval::for_policy(Policy::RandomInterval, 120).minutes(), 120);
    }

    #[test]
    fn test_from_the_hour_basic() {
        assert_eq!(from_the_hour(at(12, 7, 33), Interval::new(15)), at(12, 15, 0));
        assert_eq!(from_the_hour(at(12, 15, 0), Interval::new(15)), at(12, 30, 0));
        assert_eq!(from_the_hour(at(12, 59, 59), Interval::new(15)), at(13, 0, 0));
        assert_eq!(from_the_hour(at(23, 50, 10), Interval::new(60)), at(0, 0, 0) + Duration::days(1));
    }

    #[test]
    fn test_from_the_hour_truncates_subseconds() {
        let now = at(8, 1, 2) + Duration::milliseconds(400);
        let next = from_the_hour(now, Interval::new(5));
        assert_eq!(next, at(8, 5, 0));
        assert_eq!(next.nanosecond(), 0);
    }

    #[test]
    fn test_from_the_hour_uneven_divisor() {
        // 7 does not divide 60: alignment restarts at the top of the hour
        assert_eq!(from_the_hour(at(10, 56, 0), Interval::new(7)), at(11, 0, 0));
        assert_eq!(from_the_hour(at(11, 0, 0), Interval::new(7)), at(11, 7, 0));
    }

    #[test]
    fn test_from_the_hour_property() {
        let starts = [at(0, 0, 0), at(6, 13, 59), at(12, 30, 30), at(23, 59, 1)];
        for n in 1..=60 {
            for &now in &starts {
                let next = from_the_hour(now, Interval::new(n));
                assert_eq!(next.minute() % n, 0, "n={} now={}", n, now);
                assert_eq!(next.second(), 0);
                assert!(next > now, "n={} now={} next={}", n, now, next);
            }
        }
    }

    #[test]
    fn test_every_interval() {
        for n in [1, 15, 59, 60, 90, 1440] {
            let now = at(12, 0, 0);
            assert_eq!(
                every_interval(now, Interval::new(n)),
                now + Duration::minutes(i64::from(n))
            );
        }
    }

    #[test]
    fn test_random_interval_within_window() {
        let mut rng = StdRng::seed_from_u64(7);
        for max in [1, 2, 15, 60] {
            for _ in 0..200 {
                let now = at(9, 30, 0);
                let mut anchor = None;
                let next = random_interval(now, Interval::new(max), &mut anchor, &mut rng);
                let window = Duration::minutes(i64::from(max));
                assert!(next > now - window && next < now + window);
                assert!(next >= now, "fresh anchor always lands after now");
                assert_eq!(anchor, Some(now + window));
            }
        }
    }

    #[test]
    fn test_random_anchor_never_regresses() {
        let mut rng = StdRng::seed_from_u64(11);
        let interval = Interval::new(10);
        let mut anchor = None;
        let mut now = at(14, 0, 0);
        let mut previous_anchor = None;

        for step in 0..100 {
            let next = random_interval(now, interval, &mut anchor, &mut rng);
            if let Some(prev) = previous_anchor {
                assert!(anchor.unwrap() > prev, "anchor regressed at step {}", step);
            }
            previous_anchor = anchor;
            // The poll loop evaluates again once the trigger has passed.
            now = next.max(now) + Duration::seconds(1);
        }
    }

    #[test]
    fn test_random_anchor_advances_from_itself() {
        let mut rng = StdRng::seed_from_u64(3);
        let interval = Interval::new(10);
        let now = at(14, 0, 0);
        let mut anchor = Some(at(14, 4, 0));

        let next = random_interval(now, interval, &mut anchor, &mut rng);
        assert_eq!(anchor, Some(at(14, 14, 0)));
        assert!(next < at(14, 14, 0) && next > at(14, 4, 0));
    }

    #[test]
    fn test_random_anchor_reset_when_stale() {
        let mut rng = StdRng::seed_from_u64(5);
        let now = at(14, 0, 0);
        let mut anchor = Some(at(14, 0, 0));

        random_interval(now, Interval::new(10), &mut anchor, &mut rng);
        assert_eq!(anchor, Some(at(14, 10, 0)));
    }

    #[test]
    fn test_next_trigger_dispatch() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = ScheduleState::new();
        let now = at(12, 0, 0);

        let every = next_trigger(now, Policy::EveryInterval, Interval::new(15), &mut state, &mut rng);
        assert_eq!(every, at(12, 15, 0));
        assert!(state.random_anchor.is_none());

        let hour = next_trigger(now, Policy::FromTheHour, Interval::new(20), &mut state, &mut rng);
        assert_eq!(hour, at(12, 20, 0));

        next_trigger(now, Policy::RandomInterval, Interval::new(5), &mut state, &mut rng);
        assert_eq!(state.random_anchor, Some(at(12, 5, 0)));

        state.reset();
        assert_eq!(state, ScheduleState::default());
    }
}
