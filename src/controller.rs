//! Presentation controller.
//!
//! Owns everything the window shows and sequences the two long-running
//! operations (model load, synthesis) on worker threads. Workers never touch
//! this state: they send [`Event`]s over a channel that the main thread
//! drains in [`Controller::poll_events`].

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::Local;
use log::Level;

use crate::config::AppConfig;
use crate::console::Console;
use crate::output::output_path_avoiding;
use crate::player::AudioPlayer;
use crate::presets::{PollOutcome, PresetWatcher};
use crate::service::SynthesisService;
use crate::SynthesisEngine;

pub const STATUS_TITLE: &str = "Voice101 - Text-to-Speech Interface";
pub const STATUS_LOADING: &str = "Loading XTTS...";
pub const STATUS_READY: &str = "XTTS ready";
pub const STATUS_GENERATING: &str = "Generating speech...";
pub const STATUS_ERROR: &str = "Error";

/// Called from worker threads after they post an event, so the UI can wake up.
pub type Notifier = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineStatus {
    /// Initial state, until the startup load reports back.
    Loading,
    Ready,
    Failed(String),
}

/// User-facing validation warnings. Each aborts the action before any
/// background work starts.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    #[error("Please enter text to synthesize.")]
    InputRequired,
    #[error("Please choose a voice preset.")]
    NoPresetSelected,
    #[error("Selected preset not found: {}", .0.display())]
    PresetNotFound(PathBuf),
    #[error("Generate audio before playing.")]
    NoOutput,
}

impl Warning {
    pub fn title(&self) -> &'static str {
        match self {
            Warning::InputRequired => "Input required",
            Warning::NoPresetSelected => "No preset selected",
            Warning::PresetNotFound(_) => "File not found",
            Warning::NoOutput => "No file",
        }
    }
}

/// Messages from worker threads to the main thread.
#[derive(Debug)]
pub enum Event {
    Log(Level, String),
    EngineLoaded(Result<Duration, String>),
    SynthesisFinished {
        output: PathBuf,
        result: Result<f64, String>,
    },
}

pub struct Controller<E, P>
where
    E: SynthesisEngine,
{
    service: Arc<SynthesisService<E>>,
    player: P,
    console: Console,
    preset_dir: PathBuf,
    output_dir: PathBuf,
    watcher: PresetWatcher,
    next_poll: Option<Instant>,
    presets: Vec<String>,
    selected: Option<String>,
    engine: EngineStatus,
    load_in_flight: bool,
    status: String,
    pending: HashSet<PathBuf>,
    current_output: Option<PathBuf>,
    tx: Sender<Event>,
    rx: Receiver<Event>,
    notify: Notifier,
}

impl<E, P> Controller<E, P>
where
    E: SynthesisEngine + Send + 'static,
    E::ModelParams: Clone + Send + Sync + 'static,
    P: AudioPlayer,
{
    pub fn new(config: &AppConfig, service: SynthesisService<E>, player: P) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            service: Arc::new(service),
            player,
            console: Console::new(),
            preset_dir: config.preset_dir.clone(),
            output_dir: config.output_dir.clone(),
            watcher: PresetWatcher::new(config.poll_interval()),
            next_poll: None,
            presets: Vec::new(),
            selected: None,
            engine: EngineStatus::Loading,
            load_in_flight: false,
            status: STATUS_TITLE.to_string(),
            pending: HashSet::new(),
            current_output: None,
            tx,
            rx,
            notify: Arc::new(|| {}),
        }
    }

    /// Install the callback workers use to wake the UI.
    pub fn with_notifier(mut self, notify: Notifier) -> Self {
        self.notify = notify;
        self
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn engine_status(&self) -> &EngineStatus {
        &self.engine
    }

    pub fn console(&self) -> &Console {
        &self.console
    }

    pub fn presets(&self) -> &[String] {
        &self.presets
    }

    pub fn selected_preset(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select_preset(&mut self, preset: Option<String>) {
        self.selected = preset;
    }

    pub fn current_output(&self) -> Option<&Path> {
        self.current_output.as_deref()
    }

    /// Speak stays disabled while a synthesis is in flight.
    pub fn speak_enabled(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_busy(&self) -> bool {
        !self.pending.is_empty() || self.load_in_flight
    }

    /// Start loading the model on a worker thread.
    pub fn start_engine(&mut self) {
        self.engine = EngineStatus::Loading;
        self.load_in_flight = true;
        self.status = STATUS_LOADING.to_string();

        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let notify = Arc::clone(&self.notify);
        let spawned = thread::Builder::new()
            .name("engine-load".to_string())
            .spawn(move || {
                let _ = tx.send(Event::Log(Level::Info, "Loading XTTS model...".to_string()));
                let start = Instant::now();
                let result = service
                    .load()
                    .map(|()| start.elapsed())
                    .map_err(|e| e.to_string());
                let _ = tx.send(Event::EngineLoaded(result));
                notify();
            });

        if let Err(e) = spawned {
            self.apply(Event::EngineLoaded(Err(format!(
                "could not start loader thread: {e}"
            ))));
        }
    }

    /// Validate the request and start synthesis on a worker thread.
    ///
    /// Returns the path the output will be written to.
    pub fn speak(&mut self, text: &str) -> Result<PathBuf, Warning> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Warning::InputRequired);
        }
        let preset = self
            .selected
            .clone()
            .filter(|p| !p.is_empty())
            .ok_or(Warning::NoPresetSelected)?;
        let preset_path = self.preset_dir.join(&preset);
        if !preset_path.is_file() {
            return Err(Warning::PresetNotFound(preset_path));
        }

        let output = output_path_avoiding(&self.output_dir, &preset, &Local::now(), |p| {
            self.pending.contains(p)
        });
        self.pending.insert(output.clone());
        self.status = STATUS_GENERATING.to_string();

        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        let notify = Arc::clone(&self.notify);
        let text = text.to_string();
        let worker_output = output.clone();
        let spawned = thread::Builder::new()
            .name("synthesis".to_string())
            .spawn(move || {
                let _ = tx.send(Event::Log(Level::Info, format!("Voicing: '{text}'...")));
                let result = service
                    .synthesize(&text, &preset_path, &worker_output)
                    .map(|r| r.duration_secs())
                    .map_err(|e| e.to_string());
                let _ = tx.send(Event::SynthesisFinished {
                    output: worker_output,
                    result,
                });
                notify();
            });

        if let Err(e) = spawned {
            self.apply(Event::SynthesisFinished {
                output: output.clone(),
                result: Err(format!("could not start synthesis thread: {e}")),
            });
        }
        Ok(output)
    }

    /// Play the most recent output on the calling thread.
    ///
    /// Playback failures are logged; only a missing output is a warning.
    pub fn play(&mut self) -> Result<(), Warning> {
        let path = self
            .current_output
            .clone()
            .filter(|p| p.exists())
            .ok_or(Warning::NoOutput)?;

        if let Err(e) = self.player.play_blocking(&path) {
            self.console.error(format!("Playback error: {e}"));
        }
        Ok(())
    }

    pub fn clear_log(&mut self) {
        self.console.clear();
    }

    /// Drain worker events. Returns how many were applied.
    pub fn poll_events(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.apply(event);
            applied += 1;
        }
        applied
    }

    fn apply(&mut self, event: Event) {
        match event {
            Event::Log(level, message) => self.console.push(level, message),
            Event::EngineLoaded(Ok(elapsed)) => {
                self.load_in_flight = false;
                self.engine = EngineStatus::Ready;
                self.status = STATUS_READY.to_string();
                self.console.info(format!(
                    "XTTS init done in {:.2} sec",
                    elapsed.as_secs_f64()
                ));
            }
            Event::EngineLoaded(Err(e)) => {
                self.load_in_flight = false;
                self.engine = EngineStatus::Failed(e.clone());
                self.status = STATUS_ERROR.to_string();
                self.console.error(format!("Error: {e}"));
            }
            Event::SynthesisFinished { output, result } => {
                self.pending.remove(&output);
                match result {
                    Ok(secs) => {
                        let name = output
                            .file_name()
                            .map(|n| n.to_string_lossy().into_owned())
                            .unwrap_or_default();
                        self.console
                            .info(format!("File saved: {} ({secs:.2}s)", output.display()));
                        self.status = format!("Saved: {name}");
                        self.current_output = Some(output);
                    }
                    Err(e) => {
                        self.console.error(format!("Error during synthesis: {e}"));
                        self.status = STATUS_ERROR.to_string();
                    }
                }
            }
        }
    }

    /// Rescan the preset directory. Returns true when the list changed.
    pub fn refresh_presets(&mut self) -> bool {
        match self.watcher.poll(&self.preset_dir) {
            PollOutcome::Unchanged => false,
            PollOutcome::Changed(presets) => {
                let keep = self
                    .selected
                    .as_ref()
                    .is_some_and(|s| presets.contains(s));
                if !keep {
                    self.selected = presets.first().cloned();
                }
                self.presets = presets;
                self.console.info("Preset list updated.");
                true
            }
            PollOutcome::Failed { error, first } => {
                if first {
                    self.console.warn(format!(
                        "Cannot read preset directory {}: {error}",
                        self.preset_dir.display()
                    ));
                }
                false
            }
        }
    }

    /// Main-thread heartbeat: apply worker events and run the preset poll
    /// when it is due.
    pub fn tick(&mut self, now: Instant) {
        self.poll_events();
        if self.next_poll.map_or(true, |at| now >= at) {
            self.refresh_presets();
            self.next_poll = Some(now + self.watcher.next_delay());
        }
    }

    /// Time until the next preset poll is due.
    pub fn until_next_poll(&self, now: Instant) -> Duration {
        self.next_poll
            .map(|at| at.saturating_duration_since(now))
            .unwrap_or_default()
    }
}
