use std::fmt;
use std::sync::Arc;

/// Key that aborts a running playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopKey {
    #[default]
    Escape,
    F(u8),
    Pause,
    End,
    Home,
    Insert,
    Delete,
}

impl StopKey {
    /// Parse names like "Esc", "F9" or "pause", ignoring case.
    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        match upper.as_str() {
            "ESC" | "ESCAPE" => Some(Self::Escape),
            "PAUSE" | "BREAK" => Some(Self::Pause),
            "END" => Some(Self::End),
            "HOME" => Some(Self::Home),
            "INSERT" | "INS" => Some(Self::Insert),
            "DELETE" | "DEL" => Some(Self::Delete),
            _ => match upper.strip_prefix('F').and_then(|n| n.parse::<u8>().ok()) {
                Some(n @ 1..=12) => Some(Self::F(n)),
                _ => None,
            },
        }
    }

    /// Like [`StopKey::parse`] but falls back to Escape.
    pub fn parse_or_default(s: &str) -> Self {
        Self::parse(s).unwrap_or_else(|| {
            tracing::warn!("stop key '{}' is invalid; using Esc", s);
            Self::default()
        })
    }

    /// Win32 virtual-key code.
    pub fn virtual_key(self) -> u16 {
        match self {
            Self::Escape => 0x1B,
            Self::F(n) => 0x70 + (n as u16 - 1),
            Self::Pause => 0x13,
            Self::End => 0x23,
            Self::Home => 0x24,
            Self::Insert => 0x2D,
            Self::Delete => 0x2E,
        }
    }

    #[cfg(feature = "hooks")]
    fn rdev_key(self) -> rdev::Key {
        use rdev::Key;
        match self {
            Self::Escape => Key::Escape,
            Self::F(1) => Key::F1,
            Self::F(2) => Key::F2,
            Self::F(3) => Key::F3,
            Self::F(4) => Key::F4,
            Self::F(5) => Key::F5,
            Self::F(6) => Key::F6,
            Self::F(7) => Key::F7,
            Self::F(8) => Key::F8,
            Self::F(9) => Key::F9,
            Self::F(10) => Key::F10,
            Self::F(11) => Key::F11,
            Self::F(_) => Key::F12,
            Self::Pause => Key::Pause,
            Self::End => Key::End,
            Self::Home => Key::Home,
            Self::Insert => Key::Insert,
            Self::Delete => Key::Delete,
        }
    }
}

impl fmt::Display for StopKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Escape => write!(f, "Esc"),
            Self::F(n) => write!(f, "F{n}"),
            Self::Pause => write!(f, "Pause"),
            Self::End => write!(f, "End"),
            Self::Home => write!(f, "Home"),
            Self::Insert => write!(f, "Insert"),
            Self::Delete => write!(f, "Delete"),
        }
    }
}

/// Polled by the stop listener.
pub trait KeySource: Send + Sync {
    fn is_pressed(&self, key: StopKey) -> bool;

    /// Forget presses seen before a run starts.
    fn clear(&self) {}
}

/// Never reports a press. Playback can still be stopped from the UI.
pub struct NoKeys;

impl KeySource for NoKeys {
    fn is_pressed(&self, _key: StopKey) -> bool {
        false
    }
}

#[cfg(target_os = "windows")]
pub struct AsyncKeyState;

#[cfg(target_os = "windows")]
impl KeySource for AsyncKeyState {
    fn is_pressed(&self, key: StopKey) -> bool {
        use windows::Win32::UI::Input::KeyboardAndMouse::GetAsyncKeyState;
        (unsafe { GetAsyncKeyState(key.virtual_key() as i32) } as u16 & 0x8000) != 0
    }
}

#[cfg(feature = "hooks")]
mod hook {
    use super::{KeySource, StopKey};
    use once_cell::sync::{Lazy, OnceCell};
    use parking_lot::Mutex;
    use rdev::{listen, EventType, Key};

    static PRESSED: Lazy<Mutex<Vec<Key>>> = Lazy::new(|| Mutex::new(Vec::new()));
    static LISTENER: OnceCell<()> = OnceCell::new();

    /// Global keyboard hook. `rdev::listen` never returns, so one listener
    /// thread is shared by every run and presses are latched until polled.
    pub struct HookKeySource;

    impl HookKeySource {
        pub fn new() -> Self {
            LISTENER.get_or_init(|| {
                std::thread::spawn(|| {
                    tracing::debug!("starting stop key hook");
                    let result = listen(|event| {
                        if let EventType::KeyPress(k) = event.event_type {
                            PRESSED.lock().push(k);
                        }
                    });
                    if let Err(e) = result {
                        tracing::error!(error = ?e, "stop key hook failed");
                    }
                });
            });
            Self
        }
    }

    impl KeySource for HookKeySource {
        fn is_pressed(&self, key: StopKey) -> bool {
            let mut pressed = PRESSED.lock();
            let hit = pressed.contains(&key.rdev_key());
            pressed.clear();
            hit
        }

        fn clear(&self) {
            PRESSED.lock().clear();
        }
    }
}

#[cfg(feature = "hooks")]
pub use hook::HookKeySource;

/// The key source for the current platform and feature set.
pub fn platform_keys() -> Arc<dyn KeySource> {
    #[cfg(feature = "hooks")]
    {
        Arc::new(HookKeySource::new())
    }
    #[cfg(all(not(feature = "hooks"), target_os = "windows"))]
    {
        Arc::new(AsyncKeyState)
    }
    #[cfg(all(not(feature = "hooks"), not(target_os = "windows")))]
    {
        Arc::new(NoKeys)
    }
}
