use crate::error::PlaybackError;
use crate::hotkey::{self, KeySource, StopKey};
use crate::input::{Clicker, EnigoClicker};
use crate::model::Config;
use crate::runner::{CancelToken, RunReport, SequenceRunner, Timing};
use crate::settings::Settings;
use crate::window::{self, WindowHandle, WindowTarget};
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Builds a clicker on the playback thread.
pub type ClickerFactory = Arc<dyn Fn() -> Box<dyn Clicker> + Send + Sync>;

/// The OS-facing pieces playback depends on.
#[derive(Clone)]
pub struct Backend {
    pub windows: Arc<dyn WindowTarget>,
    pub keys: Arc<dyn KeySource>,
    pub clicker: ClickerFactory,
}

impl Backend {
    pub fn platform(settings: &Settings) -> Self {
        let glide = settings.glide;
        Self {
            windows: window::platform_windows(),
            keys: hotkey::platform_keys(),
            clicker: Arc::new(move || Box::new(EnigoClicker::new(glide)) as Box<dyn Clicker>),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RunOptions {
    pub timing: Timing,
    pub stop_key: StopKey,
    pub poll_interval: Duration,
}

impl From<&Settings> for RunOptions {
    fn from(s: &Settings) -> Self {
        Self { timing: s.timing(), stop_key: s.stop_key(), poll_interval: s.poll_interval() }
    }
}

/// Marks the run finished even if the runner unwinds, so the listener exits.
struct DoneGuard(Arc<AtomicBool>);

impl Drop for DoneGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Release);
    }
}

struct ActiveRun {
    config: String,
    token: CancelToken,
    runner: JoinHandle<RunReport>,
    listener: JoinHandle<()>,
}

/// Owns at most one playback run plus the stop-key listener that watches it.
pub struct PlaybackSession {
    backend: Backend,
    options: RunOptions,
    active: Option<ActiveRun>,
}

impl PlaybackSession {
    pub fn new(backend: Backend, options: RunOptions) -> Self {
        Self { backend, options, active: None }
    }

    pub fn windows(&self) -> &dyn WindowTarget {
        self.backend.windows.as_ref()
    }

    pub fn options(&self) -> RunOptions {
        self.options
    }

    pub fn is_running(&self) -> bool {
        self.active.as_ref().is_some_and(|run| !run.runner.is_finished())
    }

    /// Name of the config currently playing.
    pub fn running_config(&self) -> Option<&str> {
        self.active.as_ref().filter(|_| self.is_running()).map(|run| run.config.as_str())
    }

    /// Start playing `config` against `target` on a worker thread.
    ///
    /// The config is copied, so edits made while the run is active apply to
    /// the next run.
    pub fn start(
        &mut self,
        config: &Config,
        repeats: NonZeroU32,
        target: Option<&WindowHandle>,
    ) -> Result<(), PlaybackError> {
        if self.is_running() {
            return Err(PlaybackError::AlreadyRunning);
        }
        let target = target.cloned().ok_or(PlaybackError::NoTargetWindow)?;
        if let Some(outcome) = self.poll() {
            tracing::debug!(?outcome, "reaped previous run");
        }

        let token = CancelToken::new();
        let done = Arc::new(AtomicBool::new(false));

        let runner = {
            let config = config.clone();
            let token = token.clone();
            let guard = DoneGuard(Arc::clone(&done));
            let windows = Arc::clone(&self.backend.windows);
            let factory = Arc::clone(&self.backend.clicker);
            let timing = self.options.timing;
            thread::spawn(move || {
                let _guard = guard;
                let mut clicker = factory();
                let mut runner =
                    SequenceRunner::new(clicker.as_mut(), windows.as_ref(), target, timing, rand::thread_rng());
                runner.run(&config, repeats, &token)
            })
        };

        let listener = {
            let token = token.clone();
            let keys = Arc::clone(&self.backend.keys);
            let key = self.options.stop_key;
            let poll = self.options.poll_interval;
            thread::spawn(move || {
                keys.clear();
                while !done.load(Ordering::Acquire) {
                    if keys.is_pressed(key) {
                        tracing::info!(%key, "stop key pressed");
                        token.cancel();
                        break;
                    }
                    thread::sleep(poll);
                }
            })
        };

        self.active = Some(ActiveRun { config: config.name.clone(), token, runner, listener });
        Ok(())
    }

    /// Resolve `title` and start playback against it.
    pub fn start_by_title(
        &mut self,
        config: &Config,
        repeats: NonZeroU32,
        title: &str,
    ) -> Result<WindowHandle, PlaybackError> {
        let handle = self
            .backend
            .windows
            .resolve(title)
            .ok_or_else(|| PlaybackError::WindowNotFound(title.to_string()))?;
        self.start(config, repeats, Some(&handle))?;
        Ok(handle)
    }

    /// Ask the active run to stop at its next step boundary. Returns `false`
    /// when nothing is running.
    pub fn stop(&self) -> bool {
        match &self.active {
            Some(run) if !run.runner.is_finished() => {
                tracing::info!(config = %run.config, "stop requested");
                run.token.cancel();
                true
            }
            _ => false,
        }
    }

    /// Collect the outcome of a finished run, once. A run whose thread
    /// panicked yields `PlaybackError::Aborted`.
    pub fn poll(&mut self) -> Option<Result<RunReport, PlaybackError>> {
        if self.is_running() {
            return None;
        }
        self.active.take().and_then(Self::join)
    }

    /// Block until the active run finishes.
    pub fn wait(&mut self) -> Option<Result<RunReport, PlaybackError>> {
        self.active.take().and_then(Self::join)
    }

    fn join(run: ActiveRun) -> Option<Result<RunReport, PlaybackError>> {
        let report = run.runner.join();
        if run.listener.join().is_err() {
            tracing::error!("stop listener panicked");
        }
        Some(report.map_err(|_| {
            tracing::error!(config = %run.config, "playback thread panicked");
            PlaybackError::Aborted(run.config)
        }))
    }
}

impl Drop for PlaybackSession {
    fn drop(&mut self) {
        self.stop();
    }
}
