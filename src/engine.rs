//! Scheduling engine: the poll loop behind the status line
//!
//! [`Scheduler`] owns every piece of mutable state (settings, catalog,
//! schedule bookkeeping and the playback driver). It is meant to live on a
//! single event-loop thread: the tick timer, settings reloads and user
//! commands all reach it through `&mut self`, so no locking is involved.

use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

use crate::audio::{PlaybackDriver, SoundOutput};
use crate::catalog::SoundCatalog;
use crate::countdown::Countdown;
use crate::error::{Result, SoundsError};
use crate::schedule::{self, Policy, ScheduleState};
use crate::settings::{Settings, SettingsStore, SwitchState};

/// Status text between arming and the first tick
pub const INITIALIZING: &str = "Initializing...";

/// Whether the poll loop acts on trigger times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    /// Scheduling off
    Idle,
    /// Counting down to the next trigger
    Armed,
}

/// What a tick that did some work produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TickReport {
    /// Status line to display
    pub status: String,
    /// Sound started by this tick, if the trigger was crossed
    pub played: Option<PathBuf>,
}

/// Current local wall-clock time
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn whole_second(now: NaiveDateTime) -> NaiveDateTime {
    now.with_nanosecond(0).unwrap_or(now)
}

/// Owned scheduler confined to the event-loop thread
pub struct Scheduler<O: SoundOutput> {
    settings: Settings,
    store: SettingsStore,
    catalog: SoundCatalog,
    driver: PlaybackDriver<O>,
    schedule: ScheduleState,
    state: EngineState,
    rng: StdRng,
    status: String,
}

impl<O: SoundOutput> Scheduler<O> {
    /// Idle scheduler over loaded settings and a scanned catalog
    pub fn new(store: SettingsStore, settings: Settings, catalog: SoundCatalog, output: O) -> Self {
        Self::build(
            store,
            settings,
            catalog,
            PlaybackDriver::new(output),
            StdRng::from_entropy(),
        )
    }

    /// Deterministic scheduler for reproducible runs
    pub fn with_seed(
        store: SettingsStore,
        settings: Settings,
        catalog: SoundCatalog,
        output: O,
        seed: u64,
    ) -> Self {
        Self::build(
            store,
            settings,
            catalog,
            PlaybackDriver::with_rng(output, StdRng::seed_from_u64(seed)),
            StdRng::seed_from_u64(seed.wrapping_add(1)),
        )
    }

    fn build(
        store: SettingsStore,
        settings: Settings,
        catalog: SoundCatalog,
        driver: PlaybackDriver<O>,
        rng: StdRng,
    ) -> Self {
        let status = catalog.summary();
        Self {
            settings: settings.normalized(),
            store,
            catalog,
            driver,
            schedule: ScheduleState::new(),
            state: EngineState::Idle,
            rng,
            status,
        }
    }

    /// Re-arm the schedule saved by the previous session
    pub fn restore(&mut self, now: NaiveDateTime) -> Result<()> {
        if self.settings.on_state.is_on() {
            info!(policy = %self.settings.policy, "Restoring armed schedule");
            self.switch_on(now)
        } else {
            Ok(())
        }
    }

    /// Arm scheduling with the selected policy
    ///
    /// Fails with [`SoundsError::EmptyCatalog`] when there is nothing to
    /// play; the switch is then reverted to off.
    pub fn switch_on(&mut self, now: NaiveDateTime) -> Result<()> {
        if self.catalog.is_empty() {
            warn!("Refusing to arm scheduling over an empty catalog");
            self.settings.on_state = SwitchState::Off;
            self.state = EngineState::Idle;
            self.status = self.catalog.summary();
            // The file may still say on after an external edit.
            if let Err(e) = self.persist() {
                warn!(error = %e, "Failed to persist reverted switch");
            }
            return Err(SoundsError::EmptyCatalog);
        }

        self.settings.on_state = SwitchState::On;
        self.arm(now);
        info!(
            policy = %self.settings.policy,
            minutes = self.settings.active_interval().minutes(),
            "Scheduling armed"
        );
        self.persist()
    }

    /// Disarm scheduling and silence any playing sound
    pub fn switch_off(&mut self) -> Result<()> {
        self.state = EngineState::Idle;
        self.driver.stop();
        self.schedule.reset();
        self.settings.on_state = SwitchState::Off;
        self.status = self.catalog.summary();
        info!("Scheduling disarmed");
        self.persist()
    }

    /// Select the active policy, re-arming if scheduling is on
    pub fn select_policy(&mut self, policy: Policy, now: NaiveDateTime) -> Result<()> {
        self.settings.policy = policy;
        self.driver.stop();
        if self.is_armed() {
            self.arm(now);
        }
        debug!(%policy, "Policy selected");
        self.persist()
    }

    /// Change a policy's interval; editing an interval also selects its policy
    pub fn set_interval(&mut self, policy: Policy, minutes: u32, now: NaiveDateTime) -> Result<()> {
        self.settings.set_interval(policy, minutes);
        self.select_policy(policy, now)
    }

    /// Reconcile with a settings record edited outside the engine
    ///
    /// Only differing fields cause transitions; an identical record is a
    /// no-op, which keeps the engine's own saves from echoing back.
    pub fn apply_settings(&mut self, incoming: Settings, now: NaiveDateTime) -> Result<()> {
        let incoming = incoming.normalized();
        if incoming == self.settings {
            return Ok(());
        }

        let schedule_changed = incoming.policy != self.settings.policy
            || incoming.active_interval() != self.settings.active_interval();
        let was_on = self.settings.on_state.is_on();

        self.settings = Settings {
            on_state: self.settings.on_state,
            ..incoming
        };
        info!(?incoming, "Applying edited settings");

        match (was_on, incoming.on_state.is_on()) {
            (false, true) => self.switch_on(now),
            (true, false) => self.switch_off(),
            _ => {
                if schedule_changed && self.is_armed() {
                    self.driver.stop();
                    self.arm(now);
                }
                Ok(())
            }
        }
    }

    /// Rebuild the catalog from `dir`; only allowed while idle
    pub fn rescan(&mut self, dir: &Path) -> Result<usize> {
        if self.is_armed() {
            return Err(SoundsError::RescanWhileArmed);
        }
        let count = self.catalog.rescan(dir)?;
        self.status = self.catalog.summary();
        Ok(count)
    }

    /// One poll of the loop
    ///
    /// Returns `Ok(None)` when idle or when this second was already handled.
    /// A playback failure is reported as [`SoundsError::TickFailure`] after
    /// the next trigger has been re-armed, so the schedule carries on.
    pub fn tick(&mut self, now: NaiveDateTime) -> Result<Option<TickReport>> {
        if !self.is_armed() {
            return Ok(None);
        }

        let second = whole_second(now);
        if self.schedule.last_tick_second == Some(second) {
            return Ok(None);
        }
        self.schedule.last_tick_second = Some(second);

        let next = match self.schedule.next_trigger {
            Some(next) => next,
            None => self.rearm_trigger(second),
        };

        let mut remaining = next - second;
        let mut played = None;
        let mut failure = None;

        if remaining < chrono::Duration::seconds(1) {
            let next = self.rearm_trigger(second);
            remaining = next - second;

            match self.driver.play_random(&self.catalog) {
                Ok(path) => played = Some(path),
                Err(e) => {
                    warn!(error = %e, "Playback failed during tick");
                    failure = Some(e);
                }
            }
        }

        self.status = Countdown::from_duration(remaining).status_line();

        if let Some(e) = failure {
            return Err(SoundsError::tick(e));
        }

        Ok(Some(TickReport {
            status: self.status.clone(),
            played,
        }))
    }

    /// Stop any playing sound without changing the schedule
    pub fn stop_playback(&mut self) {
        self.driver.stop();
    }

    /// Current state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether scheduling is armed
    pub fn is_armed(&self) -> bool {
        self.state == EngineState::Armed
    }

    /// In-memory settings, authoritative over the file
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Sound files available to play
    pub fn catalog(&self) -> &SoundCatalog {
        &self.catalog
    }

    /// When the next sound plays, if armed
    pub fn next_trigger(&self) -> Option<NaiveDateTime> {
        self.schedule.next_trigger
    }

    /// Sliding anchor of the random policy, if one is in use
    pub fn random_anchor(&self) -> Option<NaiveDateTime> {
        self.schedule.random_anchor
    }

    /// Latest status text
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Backing settings file
    pub fn store(&self) -> &SettingsStore {
        &self.store
    }

    /// Whether a started sound is still held
    pub fn is_playing(&self) -> bool {
        self.driver.is_playing()
    }

    fn arm(&mut self, now: NaiveDateTime) {
        self.schedule.reset();
        self.rearm_trigger(whole_second(now));
        self.state = EngineState::Armed;
        self.status = INITIALIZING.to_string();
    }

    fn rearm_trigger(&mut self, now: NaiveDateTime) -> NaiveDateTime {
        let next = schedule::next_trigger(
            now,
            self.settings.policy,
            self.settings.active_interval(),
            &mut self.schedule,
            &mut self.rng,
        );
        self.schedule.next_trigger = Some(next);
        debug!(%next, "Next trigger armed");
        next
    }

    fn persist(&self) -> Result<()> {
        self.store.save(&self.settings)?;
        Ok(())
    }
}
