use std::sync::Arc;

/// Opaque reference to a window the runner clicks into.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WindowHandle {
    pub id: isize,
    pub title: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowRect {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// What playback needs from the window manager.
pub trait WindowTarget: Send + Sync {
    /// Titles of windows that can be targeted, in enumeration order.
    fn titles(&self) -> Vec<String>;
    fn resolve(&self, title: &str) -> Option<WindowHandle>;
    /// Bring the window to the foreground. Returns `false` if it is gone.
    fn activate(&self, handle: &WindowHandle) -> bool;
    fn rect(&self, handle: &WindowHandle) -> Option<WindowRect>;
}

/// Pick an exact title match first, then the first title containing `wanted`.
pub(crate) fn match_title(titles: &[(isize, String)], wanted: &str) -> Option<WindowHandle> {
    let wanted = wanted.trim();
    if wanted.is_empty() {
        return None;
    }
    titles
        .iter()
        .find(|(_, t)| t == wanted)
        .or_else(|| titles.iter().find(|(_, t)| t.contains(wanted)))
        .map(|(id, title)| WindowHandle { id: *id, title: title.clone() })
}

/// The window backend for the current platform.
pub fn platform_windows() -> Arc<dyn WindowTarget> {
    #[cfg(target_os = "windows")]
    {
        Arc::new(win32::Win32Windows)
    }
    #[cfg(not(target_os = "windows"))]
    {
        Arc::new(DisplayTargets)
    }
}

/// Treats every attached display as a target. Used where no window manager
/// binding is available.
pub struct DisplayTargets;

impl DisplayTargets {
    fn displays() -> Vec<(isize, String, WindowRect)> {
        let displays = match display_info::DisplayInfo::all() {
            Ok(d) => d,
            Err(e) => {
                tracing::warn!(error = %e, "failed to enumerate displays");
                return Vec::new();
            }
        };
        displays
            .into_iter()
            .enumerate()
            .map(|(i, d)| {
                let title = format!("Display {} ({}x{})", i + 1, d.width, d.height);
                let rect = WindowRect { left: d.x, top: d.y, width: d.width as i32, height: d.height as i32 };
                (i as isize, title, rect)
            })
            .collect()
    }
}

impl WindowTarget for DisplayTargets {
    fn titles(&self) -> Vec<String> {
        Self::displays().into_iter().map(|(_, t, _)| t).collect()
    }

    fn resolve(&self, title: &str) -> Option<WindowHandle> {
        let list: Vec<(isize, String)> = Self::displays().into_iter().map(|(id, t, _)| (id, t)).collect();
        match_title(&list, title)
    }

    fn activate(&self, handle: &WindowHandle) -> bool {
        Self::displays().iter().any(|(id, _, _)| *id == handle.id)
    }

    fn rect(&self, handle: &WindowHandle) -> Option<WindowRect> {
        Self::displays().into_iter().find(|(id, _, _)| *id == handle.id).map(|(_, _, r)| r)
    }
}

#[cfg(target_os = "windows")]
mod win32 {
    use super::{match_title, WindowHandle, WindowRect, WindowTarget};
    use windows::Win32::Foundation::{BOOL, HWND, LPARAM, RECT};
    use windows::Win32::UI::WindowsAndMessaging::{
        EnumWindows, GetWindow, GetWindowRect, GetWindowTextLengthW, GetWindowTextW, IsIconic, IsWindow,
        IsWindowVisible, SetForegroundWindow, ShowWindow, GW_OWNER, SW_RESTORE,
    };

    pub struct Win32Windows;

    fn hwnd(handle: &WindowHandle) -> HWND {
        HWND(handle.id as *mut core::ffi::c_void)
    }

    fn enumerate() -> Vec<(isize, String)> {
        unsafe extern "system" fn enum_cb(hwnd: HWND, lparam: LPARAM) -> BOOL {
            let out = &mut *(lparam.0 as *mut Vec<(isize, String)>);
            if IsWindowVisible(hwnd).as_bool() && GetWindow(hwnd, GW_OWNER).unwrap_or_default().0.is_null() {
                let len = GetWindowTextLengthW(hwnd);
                if len > 0 {
                    let mut buf = vec![0u16; len as usize + 1];
                    let read = GetWindowTextW(hwnd, &mut buf);
                    let title = String::from_utf16_lossy(&buf[..read as usize]);
                    if !title.trim().is_empty() {
                        out.push((hwnd.0 as isize, title));
                    }
                }
            }
            BOOL(1)
        }
        let mut out: Vec<(isize, String)> = Vec::new();
        unsafe {
            let ptr = &mut out as *mut Vec<(isize, String)>;
            let _ = EnumWindows(Some(enum_cb), LPARAM(ptr as isize));
        }
        out
    }

    impl WindowTarget for Win32Windows {
        fn titles(&self) -> Vec<String> {
            enumerate().into_iter().map(|(_, t)| t).collect()
        }

        fn resolve(&self, title: &str) -> Option<WindowHandle> {
            match_title(&enumerate(), title)
        }

        fn activate(&self, handle: &WindowHandle) -> bool {
            let hwnd = hwnd(handle);
            unsafe {
                if !IsWindow(hwnd).as_bool() {
                    return false;
                }
                if IsIconic(hwnd).as_bool() {
                    let _ = ShowWindow(hwnd, SW_RESTORE);
                }
                SetForegroundWindow(hwnd).as_bool()
            }
        }

        fn rect(&self, handle: &WindowHandle) -> Option<WindowRect> {
            let mut rect = RECT::default();
            unsafe { GetWindowRect(hwnd(handle), &mut rect) }.ok()?;
            Some(WindowRect {
                left: rect.left,
                top: rect.top,
                width: rect.right - rect.left,
                height: rect.bottom - rect.top,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_title_prefers_exact() {
        let list = vec![
            (1, "Notepad - notes.txt".to_string()),
            (2, "Notepad".to_string()),
        ];
        assert_eq!(match_title(&list, "Notepad").map(|h| h.id), Some(2));
        assert_eq!(match_title(&list, "notes.txt").map(|h| h.id), Some(1));
        assert!(match_title(&list, "Paint").is_none());
        assert!(match_title(&list, "  ").is_none());
    }
}
