use crate::config::HotkeyPolicy;
use crate::debug_if_enabled;
use crate::error::Result;
use crate::events::{
    Binding, BindingList, DispatchOutcome, HotkeyAction, HotkeyId, Modifiers, MouseButton, PoolKind, TargetId,
    WindowHandle,
};
use crate::services::binding_store::BindingStore;
use crate::services::hotkey_backend::HotkeyBackend;
use crate::services::window_system::{ForegroundQuery, WindowResolver};
use tracing::info;

use super::binding_registry::{BindingRegistry, RegistrationResult};
use super::conflict_resolver::ConflictResolver;
use super::cycle_engine::CycleEngine;
use super::dispatch_router::{DispatchRouter, Route};
use super::profile::{CycleGroup, HotkeyProfile};

/// Точка входа ядра горячих клавиш.
///
/// Владеет реестром, состоянием циклов и конфигурацией привязок. Живёт в одной задаче
/// главного цикла: все вызовы идут последовательно, разделяемого состояния нет.
pub struct HotkeyManager {
    registry: BindingRegistry,
    router: DispatchRouter,
    cycles: CycleEngine,
    profile: HotkeyProfile,
    profile_name: String,
    last_registration: RegistrationResult,
}

impl HotkeyManager {
    pub fn new(backend: Box<dyn HotkeyBackend>, policy: HotkeyPolicy) -> Self {
        Self {
            registry: BindingRegistry::new(backend),
            router: DispatchRouter::new(policy),
            cycles: CycleEngine::new(),
            profile: HotkeyProfile::default(),
            profile_name: String::new(),
            last_registration: RegistrationResult::default(),
        }
    }

    // ---- Загрузка и сохранение ----

    /// Загрузить профиль из хранилища и перерегистрировать всё.
    /// Профиль, которого нет в хранилище, начинается пустым.
    pub fn load(&mut self, store: &dyn BindingStore, profile_name: &str) -> Result<&RegistrationResult> {
        let profile_hotkeys = store.profile_hotkeys()?;
        let profile = match store.load(profile_name)? {
            Some(stored) => HotkeyProfile::from_stored(&stored, &profile_hotkeys),
            None => {
                info!("Профиль '{}' не найден в хранилище, начинаем с пустого", profile_name);
                HotkeyProfile::from_stored(&Default::default(), &profile_hotkeys)
            }
        };

        info!(
            "Загружен профиль '{}': персонажей {}, групп {}, профилей {}",
            profile_name,
            profile.characters.len(),
            profile.groups.len(),
            profile.profiles.len()
        );

        Ok(self.apply_profile(profile_name, profile))
    }

    /// Заменить конфигурацию целиком. Состояние циклов сбрасывается.
    pub fn apply_profile(&mut self, profile_name: &str, profile: HotkeyProfile) -> &RegistrationResult {
        self.profile = profile;
        self.profile_name = profile_name.to_string();
        self.cycles.reset();
        self.reregister()
    }

    pub fn save(&self, store: &mut dyn BindingStore) -> Result<()> {
        let (stored, profile_hotkeys) = self.profile.to_stored();
        store.save(&self.profile_name, &stored)?;
        store.save_profile_hotkeys(&profile_hotkeys)
    }

    /// Снять всё и зарегистрировать заново с текущими политиками и приостановкой
    pub fn reregister(&mut self) -> &RegistrationResult {
        self.last_registration = self.registry.register_all(
            &self.profile,
            self.router.policy().wildcard_modifiers,
            self.router.is_suspended(),
        );
        &self.last_registration
    }

    // ---- Изменение привязок ----

    pub fn bindings(&self, target: &TargetId) -> Option<&BindingList> {
        self.profile.bindings_for(target)
    }

    /// Заменить привязки цели. Для несуществующей группы ничего не делает и возвращает false.
    pub fn set_bindings(&mut self, target: &TargetId, bindings: BindingList) -> bool {
        if !self.profile.set_bindings(target, bindings) {
            return false;
        }
        debug_if_enabled!("Привязки '{}' изменены", target);
        self.reregister();
        true
    }

    /// Добавить привязку к цели (дубликаты и пустые привязки игнорируются)
    pub fn add_binding(&mut self, target: &TargetId, binding: Binding) -> bool {
        let mut bindings = self.profile.bindings_for(target).cloned().unwrap_or_default();
        if !bindings.push(binding) {
            return false;
        }
        self.set_bindings(target, bindings)
    }

    pub fn clear_bindings(&mut self, target: &TargetId) -> bool {
        self.set_bindings(target, BindingList::new())
    }

    /// Добавить или заменить группу. Если изменился состав, её цикл начинается заново.
    pub fn upsert_group(&mut self, group: CycleGroup) {
        let members_changed = self
            .profile
            .groups
            .get(&group.name)
            .map_or(true, |existing| existing.members != group.members);

        if members_changed {
            self.cycles.reset_group(&group.name);
        }

        info!("Группа '{}': {} персонажей", group.name, group.members.len());
        self.profile.groups.insert(group.name.clone(), group);
        self.reregister();
    }

    pub fn remove_group(&mut self, name: &str) -> bool {
        if self.profile.groups.remove(name).is_none() {
            return false;
        }
        self.cycles.reset_group(name);
        info!("Группа '{}' удалена", name);
        self.reregister();
        true
    }

    /// Владелец основной привязки `candidate`, кроме `exclude`
    pub fn find_conflict(&self, candidate: &Binding, exclude: Option<&TargetId>) -> Option<TargetId> {
        ConflictResolver::new(&self.profile).find_conflict(candidate, exclude)
    }

    pub fn describe_conflict(&self, candidate: &Binding, exclude: Option<&TargetId>) -> String {
        ConflictResolver::new(&self.profile).describe_conflict(candidate, exclude)
    }

    /// Сменить политики. Смена режима wildcard требует перерегистрации.
    pub fn set_policy(&mut self, policy: HotkeyPolicy) {
        let wildcard_changed = policy.wildcard_modifiers != self.router.policy().wildcard_modifiers;
        self.router.set_policy(policy);
        if wildcard_changed {
            self.reregister();
        }
    }

    // ---- Приостановка ----

    pub fn is_suspended(&self) -> bool {
        self.router.is_suspended()
    }

    /// Включить или выключить приостановку. Возвращает true, если состояние изменилось.
    pub fn set_suspended(&mut self, suspended: bool) -> bool {
        if self.router.is_suspended() == suspended {
            return false;
        }

        self.router.set_suspended(suspended);
        info!(
            "Горячие клавиши {}",
            if suspended { "приостановлены" } else { "возобновлены" }
        );
        self.reregister();
        true
    }

    fn toggle_suspend(&mut self) -> DispatchOutcome {
        let suspended = !self.router.is_suspended();
        self.set_suspended(suspended);
        DispatchOutcome::with_action(true, HotkeyAction::SuspendChanged(suspended))
    }

    // ---- Диспетчеризация ----

    /// Обработать сработавший идентификатор горячей клавиши
    pub fn handle_hotkey<W>(&mut self, id: HotkeyId, windows: &W) -> DispatchOutcome
    where
        W: WindowResolver + ForegroundQuery + ?Sized,
    {
        let route = self.router.route(id, &self.registry, windows);
        debug_if_enabled!("Горячая клавиша {} -> {:?}", id, route);

        match route {
            Route::ToggleSuspend => self.toggle_suspend(),
            Route::Target(target) => self.perform(target, windows),
            Route::Suspended | Route::PassThrough | Route::Unmapped => DispatchOutcome::ignored(),
        }
    }

    /// Обработать нажатие кнопки мыши с зажатыми модификаторами
    pub fn handle_mouse<W>(&mut self, button: MouseButton, held: Modifiers, windows: &W) -> DispatchOutcome
    where
        W: WindowResolver + ForegroundQuery + ?Sized,
    {
        match self.registry.resolve_mouse(button, held) {
            Some(id) => self.handle_hotkey(id, windows),
            None => DispatchOutcome::ignored(),
        }
    }

    fn perform<W>(&mut self, target: TargetId, windows: &W) -> DispatchOutcome
    where
        W: WindowResolver + ?Sized,
    {
        let consumed = target.is_consuming();

        match target {
            TargetId::Suspend => self.toggle_suspend(),
            TargetId::Character(name) => DispatchOutcome::with_action(consumed, HotkeyAction::ActivateCharacter(name)),
            TargetId::Group(group, direction) => {
                let selected = self
                    .profile
                    .groups
                    .get(&group)
                    .and_then(|g| self.cycles.cycle_group(g, direction, windows));

                let mut outcome = DispatchOutcome::with_action(consumed, HotkeyAction::CycleGroup { group, direction });
                if let Some(handle) = selected {
                    outcome.push(HotkeyAction::ActivateWindow(handle));
                }
                outcome
            }
            TargetId::Pool(kind, direction) => {
                let action = match kind {
                    PoolKind::NotLoggedIn => HotkeyAction::CycleNotLoggedIn(direction),
                    PoolKind::Other => HotkeyAction::CycleOther(direction),
                };

                let mut outcome = DispatchOutcome::with_action(consumed, action);
                if let Some(handle) = self.cycles.cycle_pool(kind, direction, windows) {
                    outcome.push(HotkeyAction::ActivateWindow(handle));
                }
                outcome
            }
            TargetId::CloseAll => DispatchOutcome::with_action(consumed, HotkeyAction::CloseAll),
            TargetId::Profile(name) => DispatchOutcome::with_action(consumed, HotkeyAction::SwitchProfile(name)),
        }
    }

    /// Окно активировали в обход цикла: выровнять все циклы, где оно есть
    pub fn notify_window_activated<R: WindowResolver + ?Sized>(&mut self, handle: WindowHandle, windows: &R) {
        self.cycles.notify_activated(handle, self.profile.groups.values(), windows);
    }

    // ---- Состояние ----

    pub fn profile(&self) -> &HotkeyProfile {
        &self.profile
    }

    pub fn profile_name(&self) -> &str {
        &self.profile_name
    }

    pub fn last_registration(&self) -> &RegistrationResult {
        &self.last_registration
    }

    pub fn cycles(&self) -> &CycleEngine {
        &self.cycles
    }
}
