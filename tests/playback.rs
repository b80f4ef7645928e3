use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use step_clicker::error::PlaybackError;
use step_clicker::hotkey::{KeySource, StopKey};
use step_clicker::input::Clicker;
use step_clicker::model::{Config, Step};
use step_clicker::runner::{CancelToken, SequenceRunner, Timing};
use step_clicker::session::{Backend, PlaybackSession, RunOptions};
use step_clicker::window::{WindowHandle, WindowRect, WindowTarget};

struct Desk;

impl WindowTarget for Desk {
    fn titles(&self) -> Vec<String> {
        vec!["Desk".into()]
    }
    fn resolve(&self, title: &str) -> Option<WindowHandle> {
        (title == "Desk").then(|| WindowHandle { id: 7, title: title.into() })
    }
    fn activate(&self, _handle: &WindowHandle) -> bool {
        true
    }
    fn rect(&self, _handle: &WindowHandle) -> Option<WindowRect> {
        None
    }
}

fn steps(n: i32) -> Config {
    Config {
        name: "Seq".into(),
        steps: (0..n)
            .map(|i| Step { name: format!("s{i}"), x: i, y: i, radius: 0, delay_min: 0.0, delay_max: 0.0 })
            .collect(),
    }
}

fn nz(n: u32) -> NonZeroU32 {
    NonZeroU32::new(n).unwrap()
}

/// Cancels the token from inside the k-th click, like a stop key pressed
/// while that step is running.
struct CancelOnClick {
    at: usize,
    token: CancelToken,
    seen: Vec<i32>,
}

impl Clicker for CancelOnClick {
    fn click(&mut self, x: i32, _y: i32, _hold: Duration) {
        self.seen.push(x);
        if self.seen.len() == self.at {
            self.token.cancel();
        }
    }
}

#[test]
fn full_run_clicks_n_times_r() {
    let token = CancelToken::new();
    let mut clicker = CancelOnClick { at: usize::MAX, token: token.clone(), seen: Vec::new() };
    let mut runner = SequenceRunner::new(&mut clicker, &Desk, Desk.resolve("Desk").unwrap(), Timing::instant(), StdRng::seed_from_u64(1));
    let report = runner.run(&steps(4), nz(3), &token);

    assert_eq!(report.clicks, 12);
    assert_eq!(report.repeats_completed, 3);
    assert_eq!(clicker.seen, [0, 1, 2, 3, 0, 1, 2, 3, 0, 1, 2, 3]);
}

#[test]
fn cancel_during_step_stops_before_next_click() {
    // The 7th click is the second step of the second repeat.
    let token = CancelToken::new();
    let mut clicker = CancelOnClick { at: 7, token: token.clone(), seen: Vec::new() };
    let mut runner = SequenceRunner::new(&mut clicker, &Desk, Desk.resolve("Desk").unwrap(), Timing::instant(), StdRng::seed_from_u64(1));
    let report = runner.run(&steps(5), nz(4), &token);

    assert!(report.cancelled);
    assert_eq!(report.clicks, 7);
    assert_eq!(report.repeats_completed, 1);
    assert_eq!(clicker.seen, [0, 1, 2, 3, 4, 0, 1]);
    assert!(!token.is_cancelled(), "token is reset for the next run");
}

#[derive(Default)]
struct Latch(AtomicBool);

impl KeySource for Latch {
    fn is_pressed(&self, key: StopKey) -> bool {
        key == StopKey::F(9) && self.0.load(Ordering::Acquire)
    }
}

/// Presses the stop key on the k-th click and holds long enough for the
/// listener to notice.
struct PressOnClick {
    at: usize,
    keys: Arc<Latch>,
    seen: Arc<Mutex<Vec<i32>>>,
    hold: Duration,
}

impl Clicker for PressOnClick {
    fn click(&mut self, x: i32, _y: i32, _hold: Duration) {
        let mut seen = self.seen.lock();
        seen.push(x);
        if seen.len() == self.at {
            self.keys.0.store(true, Ordering::Release);
        }
        drop(seen);
        std::thread::sleep(self.hold);
    }
}

fn session(at: usize, hold: Duration) -> (PlaybackSession, Arc<Mutex<Vec<i32>>>) {
    let keys = Arc::new(Latch::default());
    let seen = Arc::new(Mutex::new(Vec::new()));
    let (k, s) = (Arc::clone(&keys), Arc::clone(&seen));
    let backend = Backend {
        windows: Arc::new(Desk),
        keys,
        clicker: Arc::new(move || {
            Box::new(PressOnClick { at, keys: Arc::clone(&k), seen: Arc::clone(&s), hold }) as Box<dyn Clicker>
        }),
    };
    let options = RunOptions {
        timing: Timing::instant(),
        stop_key: StopKey::F(9),
        poll_interval: Duration::from_millis(1),
    };
    (PlaybackSession::new(backend, options), seen)
}

#[test]
fn stop_key_cancels_session_run() {
    let (mut session, seen) = session(3, Duration::from_millis(100));
    session.start_by_title(&steps(10), nz(1), "Desk").unwrap();
    let report = session.wait().unwrap().unwrap();

    assert!(report.cancelled);
    assert_eq!(report.clicks, 3);
    assert_eq!(*seen.lock(), [0, 1, 2]);
}

#[test]
fn second_start_is_rejected_while_running() {
    let (mut session, _) = session(usize::MAX, Duration::from_millis(20));
    let config = steps(50);
    let target = session.windows().resolve("Desk");
    session.start(&config, nz(1), target.as_ref()).unwrap();

    assert!(session.is_running());
    assert_eq!(session.running_config(), Some("Seq"));
    assert_eq!(session.start(&config, nz(1), target.as_ref()), Err(PlaybackError::AlreadyRunning));

    assert!(session.stop());
    let report = session.wait().unwrap().unwrap();
    assert!(report.cancelled);
    assert!(report.clicks < 50);
    assert!(!session.is_running());
    assert!(!session.stop());
}

#[test]
fn start_requires_a_target() {
    let (mut session, seen) = session(usize::MAX, Duration::ZERO);
    assert_eq!(session.start(&steps(1), nz(1), None), Err(PlaybackError::NoTargetWindow));
    assert_eq!(
        session.start_by_title(&steps(1), nz(1), "Elsewhere").unwrap_err(),
        PlaybackError::WindowNotFound("Elsewhere".into())
    );
    assert!(!session.is_running());
    assert!(seen.lock().is_empty());
}

#[test]
fn session_can_run_again_after_finishing() {
    let (mut session, seen) = session(usize::MAX, Duration::ZERO);
    session.start_by_title(&steps(2), nz(2), "Desk").unwrap();
    assert_eq!(session.wait().unwrap().unwrap().clicks, 4);
    session.start_by_title(&steps(1), nz(1), "Desk").unwrap();
    assert_eq!(session.wait().unwrap().unwrap().clicks, 1);
    assert_eq!(*seen.lock(), [0, 1, 0, 1, 0]);
}
