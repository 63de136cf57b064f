use crate::error::Result;
use crate::events::{DispatchOutcome, HotkeyAction, RawInput, WindowHandle};
use crate::services::binding_store::BindingStore;
use crate::services::hotkey::HotkeyManager;
use crate::services::window_system::{WindowActivator, WindowRegistry, WindowResolver};
use crate::debug_if_enabled;
use tracing::{info, warn};

/// Главный цикл: сырые события -> менеджер горячих клавиш -> действия над окнами.
/// Все поля принадлежат одной задаче, блокировок нет.
pub struct App {
    manager: HotkeyManager,
    windows: WindowRegistry,
    activator: Box<dyn WindowActivator>,
    store: Box<dyn BindingStore>,
}

impl App {
    pub fn new(
        manager: HotkeyManager,
        windows: WindowRegistry,
        activator: Box<dyn WindowActivator>,
        store: Box<dyn BindingStore>,
    ) -> Self {
        Self {
            manager,
            windows,
            activator,
            store,
        }
    }

    pub async fn handle_input(&mut self, input: RawInput) -> Result<()> {
        match input {
            RawInput::Hotkey(id) => {
                let outcome = self.manager.handle_hotkey(id, &self.windows);
                self.apply(outcome).await
            }
            RawInput::Mouse { button, modifiers } => {
                let outcome = self.manager.handle_mouse(button, modifiers, &self.windows);
                self.apply(outcome).await
            }
            RawInput::Windows(snapshot) => {
                self.windows.update(snapshot);
                Ok(())
            }
            RawInput::WindowActivated(handle) => {
                self.manager.notify_window_activated(handle, &self.windows);
                Ok(())
            }
        }
    }

    async fn apply(&mut self, outcome: DispatchOutcome) -> Result<()> {
        for action in outcome.actions {
            debug_if_enabled!("Действие: {} (поглощено: {})", action, outcome.consumed);

            match action {
                HotkeyAction::ActivateCharacter(name) => match self.windows.resolve_window_for_character(&name) {
                    Some(handle) => self.activate(handle).await?,
                    None => debug_if_enabled!("Окно персонажа '{}' не найдено", name),
                },
                HotkeyAction::ActivateWindow(handle) => self.activate(handle).await?,
                // Выбранное окно приходит следующим действием ActivateWindow
                HotkeyAction::CycleGroup { .. } | HotkeyAction::CycleNotLoggedIn(_) | HotkeyAction::CycleOther(_) => {}
                HotkeyAction::SuspendChanged(suspended) => {
                    info!("Приостановка: {}", if suspended { "вкл." } else { "выкл." });
                }
                HotkeyAction::SwitchProfile(name) => self.switch_profile(&name)?,
                HotkeyAction::CloseAll => self.close_all().await,
            }
        }
        Ok(())
    }

    async fn activate(&mut self, handle: WindowHandle) -> Result<()> {
        self.activator.activate(handle).await?;
        self.manager.notify_window_activated(handle, &self.windows);
        Ok(())
    }

    async fn close_all(&mut self) {
        let clients = self.windows.client_windows();
        info!("Закрываем все клиенты: {}", clients.len());

        for handle in clients {
            if let Err(e) = self.activator.close(handle).await {
                warn!("Не удалось закрыть окно {}: {}", handle, e);
            }
        }
    }

    fn switch_profile(&mut self, name: &str) -> Result<()> {
        if name == self.manager.profile_name() {
            debug_if_enabled!("Профиль '{}' уже активен", name);
            return Ok(());
        }

        info!("Переключение профиля: '{}' -> '{}'", self.manager.profile_name(), name);
        self.manager.load(self.store.as_ref(), name)?;
        Ok(())
    }

    pub fn manager(&self) -> &HotkeyManager {
        &self.manager
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::HotkeyPolicy;
    use crate::events::{Chord, KeyCode, Modifiers};
    use crate::services::binding_store::{MemoryBindingStore, StoredProfile};
    use crate::services::hotkey_backend::DryRunHotkeyBackend;
    use crate::services::window_system::{DryRunWindowSystem, WindowClassifier, WindowSource};
    use std::collections::BTreeMap;

    fn store() -> MemoryBindingStore {
        let mut default = StoredProfile {
            close_all: "1,88,1,0,0".to_string(),
            ..StoredProfile::default()
        };
        default.characters.insert("Carol".to_string(), "1,4,0,0,0".to_string());
        default
            .cycle_groups
            .insert("Main".to_string(), "Alice,Bob,Carol|1,15,0,0,0||0|0".to_string());

        let mut pvp = StoredProfile::default();
        pvp.characters.insert("Bob".to_string(), "1,2,0,0,0".to_string());

        let mut store = MemoryBindingStore::new();
        store.save("Default", &default).unwrap();
        store.save("PvP", &pvp).unwrap();
        let mut hotkeys = BTreeMap::new();
        hotkeys.insert("PvP".to_string(), "1,59,0,0,0".to_string());
        store.save_profile_hotkeys(&hotkeys).unwrap();
        store
    }

    async fn app() -> (App, DryRunHotkeyBackend, DryRunWindowSystem) {
        let backend = DryRunHotkeyBackend::new();
        let mut system = DryRunWindowSystem::new();
        let store = store();

        let mut manager = HotkeyManager::new(Box::new(backend.clone()), HotkeyPolicy::default());
        manager.load(&store, "Default").unwrap();

        let mut app = App::new(
            manager,
            WindowRegistry::new(WindowClassifier::default()),
            Box::new(system.clone()),
            Box::new(store),
        );
        let snapshot = system.snapshot().await.unwrap();
        app.handle_input(RawInput::Windows(snapshot)).await.unwrap();
        (app, backend, system)
    }

    fn hotkey(backend: &DryRunHotkeyBackend, code: u16, modifiers: Modifiers) -> RawInput {
        RawInput::Hotkey(backend.id_for(Chord::new(KeyCode(code), modifiers)).unwrap())
    }

    #[tokio::test]
    async fn test_character_hotkey_activates_window() {
        let (mut app, backend, mut system) = app().await;

        app.handle_input(hotkey(&backend, 4, Modifiers::new())).await.unwrap();
        assert_eq!(system.snapshot().await.unwrap().foreground, Some(WindowHandle::new(0x300)));

        // Цикл продолжает с активированного окна Carol и переходит на Alice
        app.handle_input(hotkey(&backend, 15, Modifiers::new())).await.unwrap();
        assert_eq!(system.snapshot().await.unwrap().foreground, Some(WindowHandle::new(0x100)));
    }

    #[tokio::test]
    async fn test_profile_switch_reloads_bindings() {
        let (mut app, backend, _system) = app().await;

        app.handle_input(hotkey(&backend, 59, Modifiers::new())).await.unwrap();
        assert_eq!(app.manager().profile_name(), "PvP");
        assert!(backend.is_registered(Chord::new(KeyCode(2), Modifiers::new())));
        assert!(!backend.is_registered(Chord::new(KeyCode(4), Modifiers::new())));
    }

    #[tokio::test]
    async fn test_close_all_closes_only_clients() {
        let (mut app, backend, mut system) = app().await;

        app.handle_input(hotkey(&backend, 88, Modifiers::new().with_ctrl(true)))
            .await
            .unwrap();

        let snapshot = system.snapshot().await.unwrap();
        assert_eq!(snapshot.windows.len(), 1);
        assert_eq!(snapshot.windows[0].process_name, "discord");
    }
}
