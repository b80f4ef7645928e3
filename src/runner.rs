use crate::input::Clicker;
use crate::model::Config;
use crate::sampler;
use crate::window::{WindowHandle, WindowTarget};
use rand::Rng;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cooperative stop signal shared by the runner and whoever wants to stop it.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Fixed pauses around each click.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Timing {
    /// Wait after activating the window, before clicking.
    pub settle: Duration,
    /// Wait after every full pass over the steps.
    pub repeat_pause: Duration,
    pub hold_min: Duration,
    pub hold_max: Duration,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(1),
            repeat_pause: Duration::from_secs(1),
            hold_min: Duration::from_millis(50),
            hold_max: Duration::from_millis(100),
        }
    }
}

impl Timing {
    /// No pauses at all.
    pub fn instant() -> Self {
        Self {
            settle: Duration::ZERO,
            repeat_pause: Duration::ZERO,
            hold_min: Duration::ZERO,
            hold_max: Duration::ZERO,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunReport {
    pub clicks: usize,
    /// Steps whose click was dropped because the window could not be activated.
    pub skipped: usize,
    pub repeats_completed: u32,
    pub cancelled: bool,
}

fn uniform_secs<R: Rng + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> Duration {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    Duration::try_from_secs_f64(rng.gen_range(lo..=hi)).unwrap_or_else(|e| {
        tracing::warn!(error = %e, lo, hi, "unusable delay, not waiting");
        Duration::ZERO
    })
}

fn pause(d: Duration) {
    if !d.is_zero() {
        std::thread::sleep(d);
    }
}

/// Plays a config's steps against one target window. Blocks for the whole
/// run, so it belongs on a worker thread.
pub struct SequenceRunner<'a, R: Rng> {
    clicker: &'a mut dyn Clicker,
    windows: &'a dyn WindowTarget,
    target: WindowHandle,
    timing: Timing,
    rng: R,
}

impl<'a, R: Rng> SequenceRunner<'a, R> {
    pub fn new(
        clicker: &'a mut dyn Clicker,
        windows: &'a dyn WindowTarget,
        target: WindowHandle,
        timing: Timing,
        rng: R,
    ) -> Self {
        Self { clicker, windows, target, timing, rng }
    }

    /// Run every step `repeats` times. The token is checked before each
    /// step, so a stop request lands within one click-and-delay cycle.
    /// When the run stops on the token, the token is reset.
    pub fn run(&mut self, config: &Config, repeats: NonZeroU32, cancel: &CancelToken) -> RunReport {
        let mut report = RunReport::default();
        tracing::info!(config = %config.name, steps = config.steps.len(), repeats = repeats.get(), window = %self.target.title, "starting run");

        'repeats: for repeat in 1..=repeats.get() {
            for (i, step) in config.steps.iter().enumerate() {
                if cancel.is_cancelled() {
                    tracing::info!(repeat, step = i + 1, "run cancelled");
                    cancel.reset();
                    report.cancelled = true;
                    break 'repeats;
                }

                if !self.windows.activate(&self.target) {
                    tracing::warn!(repeat, step = i + 1, window = %self.target.title, "target window unavailable, skipping click");
                    report.skipped += 1;
                    continue;
                }
                pause(self.timing.settle);

                let (x, y) = sampler::sample(&mut self.rng, step.x, step.y, step.radius);
                let hold = uniform_secs(
                    &mut self.rng,
                    self.timing.hold_min.as_secs_f64(),
                    self.timing.hold_max.as_secs_f64(),
                );
                tracing::debug!(repeat, step = i + 1, name = %step.name, x, y, "click");
                self.clicker.click(x, y, hold);
                report.clicks += 1;

                let (lo, hi) = step.delay_range();
                pause(uniform_secs(&mut self.rng, lo, hi));
            }
            report.repeats_completed = repeat;
            if !cancel.is_cancelled() {
                pause(self.timing.repeat_pause);
            }
        }

        tracing::info!(clicks = report.clicks, skipped = report.skipped, cancelled = report.cancelled, "run finished");
        report
    }
}
