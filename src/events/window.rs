use crate::services::window_system::WindowResolver;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Непрозрачный идентификатор окна (X11 window id и т.п.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowHandle(u64);

impl WindowHandle {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Существует ли ещё окно с этим идентификатором
    pub fn is_valid<R: WindowResolver + ?Sized>(&self, resolver: &R) -> bool {
        self.0 != 0 && resolver.is_window_still_valid(*self)
    }
}

impl fmt::Display for WindowHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08x}", self.0)
    }
}

/// Информация об окне
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WindowInfo {
    pub handle: WindowHandle,
    pub title: String,
    pub process_name: String,
    pub pid: Option<u32>,
}

impl WindowInfo {
    pub fn new(handle: WindowHandle, title: impl Into<String>) -> Self {
        Self {
            handle,
            title: title.into(),
            process_name: String::new(),
            pid: None,
        }
    }

    pub fn with_process(mut self, process_name: impl Into<String>) -> Self {
        self.process_name = process_name.into();
        self
    }

    pub fn with_pid(mut self, pid: u32) -> Self {
        self.pid = Some(pid);
        self
    }

    /// Проверить, соответствует ли окно паттерну (регистронезависимо)
    pub fn matches_pattern(&self, pattern: &str) -> bool {
        if pattern.is_empty() {
            return false;
        }
        let pattern_lower = pattern.to_lowercase();
        self.title.to_lowercase().contains(&pattern_lower)
            || self.process_name.to_lowercase().contains(&pattern_lower)
    }

    /// Проверить, соответствует ли окно любому из паттернов
    pub fn matches_any_pattern(&self, patterns: &[String]) -> bool {
        patterns.iter().any(|pattern| self.matches_pattern(pattern))
    }
}

impl fmt::Display for WindowInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.process_name.is_empty() {
            write!(f, "{} \"{}\"", self.handle, self.title)
        } else {
            write!(f, "{} \"{}\" ({})", self.handle, self.title, self.process_name)
        }
    }
}

/// Снимок всех окон на момент опроса
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowSnapshot {
    pub windows: Vec<WindowInfo>,
    pub foreground: Option<WindowHandle>,
}

impl WindowSnapshot {
    pub fn new(windows: Vec<WindowInfo>, foreground: Option<WindowHandle>) -> Self {
        Self { windows, foreground }
    }
}
