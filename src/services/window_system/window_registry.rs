use crate::config::{Config, WindowConfig};
use crate::debug_if_enabled;
use crate::events::{WindowHandle, WindowInfo, WindowSnapshot};
use std::collections::{HashMap, HashSet};

use super::r#trait::{ForegroundQuery, WindowResolver};

/// Разбор окон на клиентов с персонажем, клиентов без персонажа и сторонние окна
#[derive(Debug, Clone)]
pub struct WindowClassifier {
    client_processes_lower: HashSet<String>,
    character_title_prefix: String,
    other_window_patterns: Vec<String>,
}

impl Default for WindowClassifier {
    fn default() -> Self {
        Self::from_config(&Config::default().window)
    }
}

impl WindowClassifier {
    pub fn from_config(config: &WindowConfig) -> Self {
        Self {
            client_processes_lower: config.client_processes.iter().map(|p| p.to_lowercase()).collect(),
            character_title_prefix: config.character_title_prefix.clone(),
            other_window_patterns: config.other_window_patterns.clone(),
        }
    }

    pub fn is_client(&self, window: &WindowInfo) -> bool {
        self.client_processes_lower.contains(&window.process_name.to_lowercase())
    }

    /// Имя персонажа из заголовка окна клиента (`EVE - Alice` -> `Alice`)
    pub fn character_name<'w>(&self, window: &'w WindowInfo) -> Option<&'w str> {
        if !self.is_client(window) {
            return None;
        }
        window
            .title
            .strip_prefix(&self.character_title_prefix)
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn is_not_logged_in(&self, window: &WindowInfo) -> bool {
        self.is_client(window) && self.character_name(window).is_none()
    }

    pub fn is_other(&self, window: &WindowInfo) -> bool {
        !self.is_client(window) && window.matches_any_pattern(&self.other_window_patterns)
    }
}

/// Последний снимок окон с индексами для быстрых ответов при диспетчеризации
#[derive(Debug, Clone)]
pub struct WindowRegistry {
    classifier: WindowClassifier,
    snapshot: WindowSnapshot,
    by_character: HashMap<String, WindowHandle>,
    alive: HashSet<WindowHandle>,
}

impl WindowRegistry {
    pub fn new(classifier: WindowClassifier) -> Self {
        Self {
            classifier,
            snapshot: WindowSnapshot::default(),
            by_character: HashMap::new(),
            alive: HashSet::new(),
        }
    }

    /// Заменить снимок. Возвращает true, если набор окон изменился.
    pub fn update(&mut self, snapshot: WindowSnapshot) -> bool {
        if snapshot == self.snapshot {
            return false;
        }

        let mut by_character = HashMap::new();
        for window in &snapshot.windows {
            if let Some(name) = self.classifier.character_name(window) {
                // При дубликатах побеждает первое окно
                by_character.entry(name.to_string()).or_insert(window.handle);
            }
        }

        self.alive = snapshot.windows.iter().map(|w| w.handle).collect();
        self.by_character = by_character;

        debug_if_enabled!(
            "Снимок окон обновлён: {} окон, {} персонажей, активное: {:?}",
            snapshot.windows.len(),
            self.by_character.len(),
            snapshot.foreground
        );

        self.snapshot = snapshot;
        true
    }

    pub fn window(&self, handle: WindowHandle) -> Option<&WindowInfo> {
        self.snapshot.windows.iter().find(|w| w.handle == handle)
    }

    /// Все окна клиента (для «закрыть всё»)
    pub fn client_windows(&self) -> Vec<WindowHandle> {
        self.snapshot
            .windows
            .iter()
            .filter(|w| self.classifier.is_client(w))
            .map(|w| w.handle)
            .collect()
    }
}

impl WindowResolver for WindowRegistry {
    fn resolve_window_for_character(&self, name: &str) -> Option<WindowHandle> {
        self.by_character.get(name).copied()
    }

    fn is_window_still_valid(&self, handle: WindowHandle) -> bool {
        self.alive.contains(&handle)
    }

    fn not_logged_in_windows(&self) -> Vec<WindowHandle> {
        self.snapshot
            .windows
            .iter()
            .filter(|w| self.classifier.is_not_logged_in(w))
            .map(|w| w.handle)
            .collect()
    }

    fn other_windows(&self) -> Vec<WindowHandle> {
        self.snapshot
            .windows
            .iter()
            .filter(|w| self.classifier.is_other(w))
            .map(|w| w.handle)
            .collect()
    }
}

impl ForegroundQuery for WindowRegistry {
    fn foreground_process_name(&self) -> Option<String> {
        self.snapshot
            .foreground
            .and_then(|handle| self.window(handle))
            .map(|w| w.process_name.clone())
            .filter(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WindowConfig {
        let mut config = Config::default().window;
        config.other_window_patterns = vec!["discord".to_string()];
        config
    }

    fn snapshot() -> WindowSnapshot {
        WindowSnapshot::new(
            vec![
                WindowInfo::new(WindowHandle::new(1), "EVE - Alice").with_process("exefile.exe"),
                WindowInfo::new(WindowHandle::new(2), "EVE").with_process("ExeFile.exe"),
                WindowInfo::new(WindowHandle::new(3), "Discord").with_process("discord"),
                WindowInfo::new(WindowHandle::new(4), "Firefox").with_process("firefox"),
                WindowInfo::new(WindowHandle::new(5), "EVE - Alice").with_process("exefile.exe"),
            ],
            Some(WindowHandle::new(3)),
        )
    }

    #[test]
    fn test_classification() {
        let classifier = WindowClassifier::from_config(&config());
        let windows = snapshot().windows;

        assert_eq!(classifier.character_name(&windows[0]), Some("Alice"));
        assert!(classifier.is_not_logged_in(&windows[1]));
        assert!(classifier.is_other(&windows[2]));
        assert!(!classifier.is_other(&windows[3]));
        assert!(!classifier.is_client(&windows[3]));
    }

    #[test]
    fn test_registry_resolves_from_snapshot() {
        let mut registry = WindowRegistry::new(WindowClassifier::from_config(&config()));
        assert!(registry.update(snapshot()));
        assert!(!registry.update(snapshot()));

        assert_eq!(registry.resolve_window_for_character("Alice"), Some(WindowHandle::new(1)));
        assert_eq!(registry.resolve_window_for_character("Bob"), None);
        assert_eq!(registry.not_logged_in_windows(), vec![WindowHandle::new(2)]);
        assert_eq!(registry.other_windows(), vec![WindowHandle::new(3)]);
        assert_eq!(registry.client_windows().len(), 3);
        assert_eq!(registry.foreground_process_name().as_deref(), Some("discord"));

        assert!(WindowHandle::new(4).is_valid(&registry));
        assert!(!WindowHandle::new(42).is_valid(&registry));
        assert!(!WindowHandle::new(0).is_valid(&registry));
    }

    #[test]
    fn test_closed_window_becomes_invalid() {
        let mut registry = WindowRegistry::new(WindowClassifier::from_config(&config()));
        registry.update(snapshot());

        let mut next = snapshot();
        next.windows.retain(|w| w.handle != WindowHandle::new(1));
        next.foreground = None;
        registry.update(next);

        assert!(!registry.is_window_still_valid(WindowHandle::new(1)));
        assert_eq!(registry.resolve_window_for_character("Alice"), Some(WindowHandle::new(5)));
        assert_eq!(registry.foreground_process_name(), None);
    }
}
