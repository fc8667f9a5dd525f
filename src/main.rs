// Random Sounds - plays a random sound file on a schedule
// The daemon runs a calloop event loop; subcommands edit the settings file it watches.

mod cli;

use anyhow::{Context, Result};
use calloop::signals::{Signal, Signals};
use calloop::timer::{TimeoutAction, Timer};
use calloop::{EventLoop, LoopSignal};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use random_sounds::{
    audio::volume_from_percent,
    autostart::{autostart_command_line, set_autostart, Autostart, XdgAutostart},
    local_now, next_trigger, AudioPlayer, Notice, NullOutput, Presentation, ScheduleState,
    Scheduler, Settings, SettingsStore, SettingsWatcher, SoundCatalog, SoundOutput, StatusLine,
};

use cli::{AutostartAction, Cli, Command};

/// Period of the poll loop
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Daemon state shared by every event-loop source
struct App<O: SoundOutput = AudioPlayer, W: Write = std::io::Stdout> {
    scheduler: Scheduler<O>,
    sound_dir: PathBuf,
    watcher: Option<SettingsWatcher>,
    status_line: StatusLine<W>,
    loop_signal: LoopSignal,
}

impl<O: SoundOutput, W: Write> App<O, W> {
    fn on_tick(&mut self) {
        if self
            .watcher
            .as_ref()
            .map(SettingsWatcher::reload_pending)
            .unwrap_or(false)
        {
            self.reload_settings();
        }

        match self.scheduler.tick(local_now()) {
            Ok(Some(report)) => {
                if let Some(path) = &report.played {
                    tracing::info!(path = %path.display(), "Scheduled sound started");
                }
                self.show(&report.status);
            }
            Ok(None) => {}
            Err(e) => self.notify(Notice::from(&e)),
        }
    }

    fn reload_settings(&mut self) {
        match self.scheduler.store().load() {
            Ok(settings) => {
                if let Err(e) = self.scheduler.apply_settings(settings, local_now()) {
                    self.notify(Notice::from(&e));
                }
                let status = self.scheduler.status().to_string();
                self.show(&status);
            }
            Err(e) => {
                tracing::warn!(error = %e, "Ignoring unreadable settings edit");
                self.notify(Notice::from(&random_sounds::SoundsError::from(e)));
            }
        }
    }

    fn on_signal(&mut self, signal: Signal) {
        match signal {
            Signal::SIGUSR1 => self.toggle_presentation(),
            Signal::SIGUSR2 => self.rescan(),
            signal => {
                tracing::info!(?signal, "Received signal, exiting gracefully");
                self.shutdown();
            }
        }
    }

    /// Rebuild the catalog of the running daemon
    fn rescan(&mut self) {
        match self.scheduler.rescan(&self.sound_dir) {
            Ok(count) => {
                tracing::info!(dir = %self.sound_dir.display(), count, "Sound directory rescanned");
                let status = self.scheduler.status().to_string();
                self.show(&status);
            }
            Err(e) => self.notify(Notice::from(&e)),
        }
    }

    fn toggle_presentation(&mut self) {
        let next = self.status_line.presentation().toggled();
        if let Err(e) = self.status_line.set_presentation(next) {
            tracing::error!(error = %e, "Failed to switch presentation");
        }
    }

    fn shutdown(&mut self) {
        self.scheduler.stop_playback();
        if self.status_line.presentation() == Presentation::Foreground {
            println!();
        }
        self.loop_signal.stop();
    }

    fn show(&mut self, status: &str) {
        if let Err(e) = self.status_line.show(status) {
            tracing::error!(error = %e, "Failed to render status line");
        }
    }

    fn notify(&mut self, notice: Notice) {
        if let Err(e) = self.status_line.notice(&notice) {
            tracing::error!(error = %e, "Failed to render notice");
        }
    }
}

fn settings_store(cli: &Cli) -> Result<SettingsStore> {
    match &cli.settings {
        Some(path) => Ok(SettingsStore::new(path)),
        None => SettingsStore::default_location().context("Failed to locate settings file"),
    }
}

fn sound_dir(cli: &Cli) -> Result<PathBuf> {
    match &cli.dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("Failed to read working directory"),
    }
}

/// Load settings, falling back to defaults with a notice when unreadable
fn load_settings(store: &SettingsStore, status_line: &mut StatusLine<std::io::Stdout>) -> Settings {
    match store.load() {
        Ok(settings) => settings,
        Err(e) => {
            let _ = status_line.notice(&Notice::from(&random_sounds::SoundsError::from(e)));
            Settings::default()
        }
    }
}

/// Scan the sound directory, falling back to an empty catalog with a notice
fn scan_catalog(dir: &std::path::Path, status_line: &mut StatusLine<std::io::Stdout>) -> SoundCatalog {
    match SoundCatalog::scan(dir) {
        Ok(catalog) => catalog,
        Err(e) => {
            let _ = status_line.notice(&Notice::from(&random_sounds::SoundsError::from(e)));
            SoundCatalog::new()
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let presentation = if cli.autostart {
        Presentation::Background
    } else {
        Presentation::Foreground
    };
    let mut status_line = StatusLine::stdout(presentation);

    let store = settings_store(cli)?;
    let settings = load_settings(&store, &mut status_line);
    if !store.exists() {
        store
            .save(&settings)
            .context("Failed to create default settings file")?;
    }
    tracing::info!(path = %store.path().display(), ?settings, "Settings loaded");

    let dir = sound_dir(cli)?;
    let catalog = scan_catalog(&dir, &mut status_line);
    tracing::info!(dir = %dir.display(), count = catalog.len(), "Sound directory scanned");

    let mut player = AudioPlayer::new().context("Failed to open audio output")?;
    player.set_volume(volume_from_percent(cli.volume));

    let watcher = match SettingsWatcher::new(store.path()) {
        Ok(watcher) => Some(watcher),
        Err(e) => {
            tracing::warn!(error = %e, "Settings edits will not be picked up live");
            None
        }
    };

    let mut scheduler = Scheduler::new(store, settings, catalog, player);
    if let Err(e) = scheduler.restore(local_now()) {
        let _ = status_line.notice(&Notice::from(&e));
    }
    let _ = status_line.show(scheduler.status());

    let mut event_loop: EventLoop<App> =
        EventLoop::try_new().context("Failed to create event loop")?;

    let mut app = App {
        scheduler,
        sound_dir: dir,
        watcher,
        status_line,
        loop_signal: event_loop.get_signal(),
    };

    // The tick runs for the whole process lifetime; the engine ignores it while idle.
    event_loop
        .handle()
        .insert_source(Timer::from_duration(TICK_INTERVAL), |_deadline, _metadata, app| {
            app.on_tick();
            TimeoutAction::ToDuration(TICK_INTERVAL)
        })
        .map_err(|e| anyhow::anyhow!("Failed to insert timer source: {:?}", e))?;

    let signals = Signals::new(&[
        Signal::SIGINT,
        Signal::SIGTERM,
        Signal::SIGUSR1,
        Signal::SIGUSR2,
    ])
    .context("Failed to create signal handler")?;
    event_loop
        .handle()
        .insert_source(signals, |event, _metadata, app| app.on_signal(event.signal()))
        .map_err(|e| anyhow::anyhow!("Failed to insert signal handler: {:?}", e))?;

    tracing::info!("Event loop starting");
    event_loop
        .run(None::<Duration>, &mut app, |_app| {})
        .context("Event loop dispatch error")?;

    tracing::info!("Event loop stopped");
    Ok(())
}

/// Scheduler for one-shot commands that edit settings without playing
fn offline_scheduler(cli: &Cli) -> Result<Scheduler<NullOutput>> {
    let store = settings_store(cli)?;
    let settings = store.load().context("Failed to load settings")?;
    let dir = sound_dir(cli)?;
    let catalog = SoundCatalog::scan(&dir)
        .with_context(|| format!("Failed to scan {}", dir.display()))?;
    Ok(Scheduler::new(store, settings, catalog, NullOutput))
}

fn report_schedule<O: SoundOutput>(scheduler: &Scheduler<O>) {
    let settings = scheduler.settings();
    let state = if settings.on_state.is_on() { "on" } else { "off" };
    println!(
        "Scheduling {}: play {}",
        state,
        settings.policy.describe(settings.active_interval())
    );
}

fn run_command(cli: &Cli, command: &Command) -> Result<()> {
    match command {
        Command::Run => run(cli),
        Command::On => {
            let mut scheduler = offline_scheduler(cli)?;
            scheduler
                .switch_on(local_now())
                .context("Failed to switch scheduling on")?;
            report_schedule(&scheduler);
            Ok(())
        }
        Command::Off => {
            let mut scheduler = offline_scheduler(cli)?;
            scheduler
                .switch_off()
                .context("Failed to switch scheduling off")?;
            report_schedule(&scheduler);
            Ok(())
        }
        Command::Policy { policy, minutes } => {
            let mut scheduler = offline_scheduler(cli)?;
            let now = local_now();
            let updated = match minutes {
                Some(minutes) => scheduler.set_interval(*policy, *minutes, now),
                None => scheduler.select_policy(*policy, now),
            };
            updated.context("Failed to update policy")?;
            report_schedule(&scheduler);
            Ok(())
        }
        Command::Scan => {
            let dir = sound_dir(cli)?;
            let catalog = SoundCatalog::scan(&dir)
                .with_context(|| format!("Failed to scan {}", dir.display()))?;
            for path in catalog.iter() {
                println!("{}", path.display());
            }
            println!("{}", catalog.summary());
            Ok(())
        }
        Command::Next => {
            let store = settings_store(cli)?;
            let settings = store.load().context("Failed to load settings")?;
            let now = local_now();
            let next = next_trigger(
                now,
                settings.policy,
                settings.active_interval(),
                &mut ScheduleState::new(),
                &mut rand::thread_rng(),
            );
            println!(
                "Next play at {} ({})",
                next.format("%Y-%m-%d %H:%M:%S"),
                random_sounds::friendly_remaining(next - now)
            );
            Ok(())
        }
        Command::Autostart { action } => {
            let mut registry = XdgAutostart::new().context("Failed to locate autostart directory")?;
            match action {
                AutostartAction::Status => {}
                AutostartAction::Enable | AutostartAction::Disable => {
                    let command_line = autostart_command_line()?;
                    let enabled = *action == AutostartAction::Enable;
                    let outcome = set_autostart(&mut registry, enabled, &command_line);
                    if let Some(error) = outcome.error {
                        eprintln!("{}: {}", error.notice_title(), error);
                    }
                }
            }
            println!(
                "Autostart is {}",
                if registry.is_registered() { "enabled" } else { "disabled" }
            );
            Ok(())
        }
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    tracing::debug!(?cli, "Arguments parsed");

    match &cli.command {
        Some(command) => run_command(&cli, command),
        None => run(&cli),
    }
}
