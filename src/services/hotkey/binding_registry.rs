use crate::debug_if_enabled;
use crate::events::{Binding, Chord, HotkeyId, Modifiers, MouseButton, TargetId};
use crate::services::hotkey_backend::HotkeyBackend;
use std::collections::HashMap;
use tracing::{info, warn};

use super::profile::HotkeyProfile;

// Диапазон идентификаторов приложения, как у RegisterHotKey
const MAX_HOTKEY_ID: u32 = 0xBFFF;

/// Итог одного прохода регистрации
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationResult {
    /// Канонические идентификаторы, принятые ОС
    pub registered: usize,
    /// Привязки мыши (в ОС не регистрируются)
    pub mouse: usize,
    pub alias_attempts: usize,
    pub aliases: usize,
    /// Привязки, которые ОС отклонила
    pub refused: Vec<(TargetId, Binding)>,
}

impl RegistrationResult {
    pub fn is_complete(&self) -> bool {
        self.refused.is_empty()
    }
}

/// Владелец таблицы идентификаторов горячих клавиш.
///
/// Только реестр выдаёт и освобождает идентификаторы. Каждая успешная привязка
/// владеет ровно одним каноническим id; в режиме wildcard к нему добавляются
/// псевдонимы для надмножеств модификаторов.
pub struct BindingRegistry {
    backend: Box<dyn HotkeyBackend>,
    next_id: u32,
    targets: HashMap<HotkeyId, TargetId>,
    aliases: HashMap<HotkeyId, HotkeyId>,
    // Привязки мыши в порядке регистрации
    mouse: Vec<(Binding, HotkeyId)>,
    wildcard: bool,
}

impl BindingRegistry {
    pub fn new(backend: Box<dyn HotkeyBackend>) -> Self {
        info!("Инициализация BindingRegistry (бэкенд: {})", backend.name());
        Self {
            backend,
            next_id: 1,
            targets: HashMap::new(),
            aliases: HashMap::new(),
            mouse: Vec::new(),
            wildcard: false,
        }
    }

    /// Перерегистрировать все привязки профиля.
    ///
    /// Сначала безусловно снимает всё, что было зарегистрировано раньше.
    /// В режиме приостановки регистрируются только привязки приостановки.
    pub fn register_all(&mut self, profile: &HotkeyProfile, wildcard: bool, suspended: bool) -> RegistrationResult {
        self.unregister_all();
        self.wildcard = wildcard;

        let mut result = RegistrationResult::default();

        for (target, bindings) in profile.targets_in_priority_order() {
            if suspended && target != TargetId::Suspend {
                continue;
            }

            for binding in bindings.iter().filter(|b| b.enabled && !b.is_unset()) {
                self.register_binding(&target, *binding, &mut result);
            }
        }

        info!(
            "Зарегистрировано горячих клавиш: {} (псевдонимов: {}/{}, мышь: {}, отклонено: {}){}",
            result.registered,
            result.aliases,
            result.alias_attempts,
            result.mouse,
            result.refused.len(),
            if suspended { " [приостановлено]" } else { "" }
        );

        result
    }

    fn register_binding(&mut self, target: &TargetId, binding: Binding, result: &mut RegistrationResult) {
        let id = self.allocate_id();

        if binding.is_mouse() {
            self.mouse.push((binding, id));
            self.targets.insert(id, target.clone());
            result.mouse += 1;
            debug_if_enabled!("Привязка мыши {} -> {} ({})", binding, target, id);
            return;
        }

        let chord = binding.chord();
        if let Err(e) = self.backend.register(id, chord) {
            warn!("Не удалось зарегистрировать {} для '{}': {}", chord, target, e);
            result.refused.push((target.clone(), binding));
            return;
        }

        self.targets.insert(id, target.clone());
        result.registered += 1;
        debug_if_enabled!("{} -> {} ({})", chord, target, id);

        if self.wildcard {
            self.register_aliases(id, chord, result);
        }
    }

    /// Для каждого непустого подмножества незадействованных модификаторов
    /// пытается занять то же сочетание с расширенным набором. Отказы пропускаются.
    fn register_aliases(&mut self, canonical: HotkeyId, chord: Chord, result: &mut RegistrationResult) {
        for modifiers in chord.modifiers.strict_supersets() {
            let alias_chord = Chord::new(chord.key_code, modifiers);
            let alias_id = self.allocate_id();
            result.alias_attempts += 1;

            match self.backend.register(alias_id, alias_chord) {
                Ok(()) => {
                    self.aliases.insert(alias_id, canonical);
                    result.aliases += 1;
                }
                Err(e) => {
                    debug_if_enabled!("Псевдоним {} для {} пропущен: {}", alias_chord, canonical, e);
                }
            }
        }
    }

    /// Освободить все идентификаторы (канонические и псевдонимы) и очистить таблицы
    pub fn unregister_all(&mut self) {
        let mouse_ids: Vec<HotkeyId> = self.mouse.iter().map(|(_, id)| *id).collect();

        let os_ids: Vec<HotkeyId> = self
            .aliases
            .keys()
            .chain(self.targets.keys().filter(|id| !mouse_ids.contains(id)))
            .copied()
            .collect();

        let count = os_ids.len();
        for id in os_ids {
            if let Err(e) = self.backend.unregister(id) {
                warn!("Не удалось снять горячую клавишу {}: {}", id, e);
            }
        }

        self.targets.clear();
        self.aliases.clear();
        self.mouse.clear();

        if count > 0 {
            debug_if_enabled!("Снято горячих клавиш: {}", count);
        }
    }

    fn allocate_id(&mut self) -> HotkeyId {
        let id = HotkeyId(self.next_id);
        self.next_id = if self.next_id >= MAX_HOTKEY_ID { 1 } else { self.next_id + 1 };
        id
    }

    /// Заменить псевдоним каноническим идентификатором
    pub fn canonical(&self, id: HotkeyId) -> HotkeyId {
        self.aliases.get(&id).copied().unwrap_or(id)
    }

    pub fn is_alias(&self, id: HotkeyId) -> bool {
        self.aliases.contains_key(&id)
    }

    /// Цель канонического идентификатора
    pub fn target_of(&self, id: HotkeyId) -> Option<&TargetId> {
        self.targets.get(&id)
    }

    /// Сопоставить нажатие кнопки мыши с привязкой: сначала точное совпадение,
    /// затем (в режиме wildcard) самая конкретная привязка, чьи модификаторы зажаты.
    pub fn resolve_mouse(&self, button: MouseButton, held: Modifiers) -> Option<HotkeyId> {
        let key_code = button.key_code();
        let candidates = self.mouse.iter().filter(|(b, _)| b.key_code == key_code);

        if let Some((_, id)) = candidates.clone().find(|(b, _)| b.modifiers() == held) {
            return Some(*id);
        }

        if !self.wildcard {
            return None;
        }

        candidates
            .filter(|(b, _)| b.modifiers().is_subset_of(held))
            .fold(None, |best: Option<(u32, HotkeyId)>, (b, id)| {
                let weight = b.modifiers().bits().count_ones();
                match best {
                    Some((w, _)) if w >= weight => best,
                    _ => Some((weight, *id)),
                }
            })
            .map(|(_, id)| id)
    }

    /// Канонические идентификаторы цели
    pub fn ids_for_target(&self, target: &TargetId) -> Vec<HotkeyId> {
        let mut ids: Vec<HotkeyId> = self
            .targets
            .iter()
            .filter(|(_, t)| *t == target)
            .map(|(id, _)| *id)
            .collect();
        ids.sort();
        ids
    }

    pub fn aliases_of(&self, canonical: HotkeyId) -> Vec<HotkeyId> {
        let mut ids: Vec<HotkeyId> = self
            .aliases
            .iter()
            .filter(|(_, c)| **c == canonical)
            .map(|(alias, _)| *alias)
            .collect();
        ids.sort();
        ids
    }

    pub fn registered_count(&self) -> usize {
        self.targets.len()
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }
}

impl Drop for BindingRegistry {
    fn drop(&mut self) {
        self.unregister_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{BindingList, Direction, KeyCode, PoolKind};
    use crate::services::hotkey::profile::CycleGroup;
    use crate::services::hotkey_backend::DryRunHotkeyBackend;

    fn registry() -> (BindingRegistry, DryRunHotkeyBackend) {
        let backend = DryRunHotkeyBackend::new();
        (BindingRegistry::new(Box::new(backend.clone())), backend)
    }

    fn key(code: u16, modifiers: Modifiers) -> Binding {
        Binding::new(code, modifiers)
    }

    fn sample_profile() -> HotkeyProfile {
        let mut profile = HotkeyProfile::default();
        profile.suspend = BindingList::single(key(70, Modifiers::new()));
        profile.characters.insert(
            "Alice".into(),
            [key(2, Modifiers::new()), key(79, Modifiers::new())].into_iter().collect(),
        );
        profile.characters.insert("Bob".into(), BindingList::single(key(3, Modifiers::new())));
        let mut group = CycleGroup::new("Main", vec!["Alice".into(), "Bob".into()]);
        group.forward = BindingList::single(key(15, Modifiers::new()));
        group.backward = BindingList::single(key(15, Modifiers::new().with_shift(true)));
        profile.groups.insert("Main".into(), group);
        profile
    }

    #[test]
    fn test_register_all_maps_every_enabled_binding() {
        let (mut registry, backend) = registry();
        let result = registry.register_all(&sample_profile(), false, false);

        assert_eq!(result.registered, 6);
        assert!(result.is_complete());
        assert_eq!(backend.registered_count(), 6);
        assert_eq!(registry.ids_for_target(&TargetId::Character("Alice".into())).len(), 2);

        let id = backend.id_for(Chord::new(KeyCode(15), Modifiers::new().with_shift(true))).unwrap();
        assert_eq!(registry.target_of(id), Some(&TargetId::Group("Main".into(), Direction::Backward)));
    }

    #[test]
    fn test_disabled_and_empty_bindings_are_skipped() {
        let (mut registry, backend) = registry();
        let mut profile = HotkeyProfile::default();
        profile.characters.insert("Alice".into(), BindingList::single(key(2, Modifiers::new()).disabled()));
        profile.other.forward = BindingList::new();

        let result = registry.register_all(&profile, false, false);
        assert_eq!(result.registered, 0);
        assert_eq!(backend.attempts(), 0);
    }

    #[test]
    fn test_refusal_only_disables_that_binding() {
        let (mut registry, backend) = registry();
        backend.occupy(Chord::new(KeyCode(2), Modifiers::new()));

        let result = registry.register_all(&sample_profile(), false, false);

        assert_eq!(result.refused, vec![(TargetId::Character("Alice".into()), key(2, Modifiers::new()))]);
        assert_eq!(result.registered, 5);
        // Вторая привязка того же персонажа работает
        let ids = registry.ids_for_target(&TargetId::Character("Alice".into()));
        assert_eq!(ids.len(), 1);
        assert_eq!(backend.id_for(Chord::new(KeyCode(79), Modifiers::new())), Some(ids[0]));
    }

    #[test]
    fn test_wildcard_alias_count_per_modifier_count() {
        let cases = [
            (Modifiers::new(), 7),
            (Modifiers::new().with_ctrl(true), 3),
            (Modifiers::new().with_alt(true).with_shift(true), 1),
            (Modifiers::new().with_ctrl(true).with_alt(true).with_shift(true), 0),
        ];

        for (modifiers, expected) in cases {
            let (mut registry, backend) = registry();
            let mut profile = HotkeyProfile::default();
            profile.close_all = BindingList::single(key(88, modifiers));

            let result = registry.register_all(&profile, true, false);
            assert_eq!(result.alias_attempts, expected, "modifiers: {modifiers}");
            assert_eq!(result.aliases, expected);
            assert_eq!(backend.attempts(), expected + 1);

            let canonical = registry.ids_for_target(&TargetId::CloseAll)[0];
            for alias in registry.aliases_of(canonical) {
                assert_eq!(registry.canonical(alias), canonical);
            }
        }
    }

    #[test]
    fn test_wildcard_alias_refusal_is_skipped() {
        let (mut registry, backend) = registry();
        backend.occupy(Chord::new(KeyCode(2), Modifiers::new().with_ctrl(true)));
        backend.occupy(Chord::new(KeyCode(2), Modifiers::new().with_alt(true)));

        let mut profile = HotkeyProfile::default();
        profile.characters.insert("Alice".into(), BindingList::single(key(2, Modifiers::new())));

        let result = registry.register_all(&profile, true, false);
        assert_eq!(result.alias_attempts, 7);
        assert_eq!(result.aliases, 5);
        assert!(result.is_complete());
    }

    #[test]
    fn test_suspended_registers_only_suspend() {
        let (mut registry, backend) = registry();
        let result = registry.register_all(&sample_profile(), true, true);

        assert_eq!(result.registered, 1);
        assert_eq!(backend.registered_count(), 1 + 7);
        assert!(backend.is_registered(Chord::new(KeyCode(70), Modifiers::new())));
        assert!(!backend.is_registered(Chord::new(KeyCode(2), Modifiers::new())));
    }

    #[test]
    fn test_unregister_all_releases_everything() {
        let (mut registry, backend) = registry();
        registry.register_all(&sample_profile(), true, false);
        assert!(backend.registered_count() > 0);

        registry.unregister_all();
        assert_eq!(backend.registered_count(), 0);
        assert_eq!(registry.registered_count(), 0);
        assert_eq!(registry.alias_count(), 0);

        // Повторная регистрация не оставляет старых id
        registry.register_all(&sample_profile(), false, false);
        registry.register_all(&sample_profile(), false, false);
        assert_eq!(backend.registered_count(), 6);
    }

    #[test]
    fn test_mouse_bindings_resolve_without_os_registration() {
        let (mut registry, backend) = registry();
        let mut profile = HotkeyProfile::default();
        profile.not_logged_in.forward = BindingList::single(key(MouseButton::BTN_SIDE, Modifiers::new()));
        profile.not_logged_in.backward =
            BindingList::single(key(MouseButton::BTN_SIDE, Modifiers::new().with_shift(true)));

        let result = registry.register_all(&profile, false, false);
        assert_eq!(result.mouse, 2);
        assert_eq!(backend.attempts(), 0);

        let plain = registry.resolve_mouse(MouseButton::Side, Modifiers::new()).unwrap();
        assert_eq!(registry.target_of(plain), Some(&TargetId::Pool(PoolKind::NotLoggedIn, Direction::Forward)));

        let shifted = registry.resolve_mouse(MouseButton::Side, Modifiers::new().with_shift(true)).unwrap();
        assert_eq!(registry.target_of(shifted), Some(&TargetId::Pool(PoolKind::NotLoggedIn, Direction::Backward)));

        // Без wildcard лишние модификаторы не совпадают
        assert_eq!(registry.resolve_mouse(MouseButton::Side, Modifiers::new().with_ctrl(true)), None);
        assert_eq!(registry.resolve_mouse(MouseButton::Middle, Modifiers::new()), None);
    }

    #[test]
    fn test_mouse_wildcard_prefers_most_specific() {
        let (mut registry, _backend) = registry();
        let mut profile = HotkeyProfile::default();
        profile.other.forward = BindingList::single(key(MouseButton::BTN_EXTRA, Modifiers::new()));
        profile.other.backward =
            BindingList::single(key(MouseButton::BTN_EXTRA, Modifiers::new().with_shift(true)));
        registry.register_all(&profile, true, false);

        let held = Modifiers::new().with_shift(true).with_ctrl(true);
        let id = registry.resolve_mouse(MouseButton::Extra, held).unwrap();
        assert_eq!(registry.target_of(id), Some(&TargetId::Pool(PoolKind::Other, Direction::Backward)));

        let id = registry.resolve_mouse(MouseButton::Extra, Modifiers::new().with_alt(true)).unwrap();
        assert_eq!(registry.target_of(id), Some(&TargetId::Pool(PoolKind::Other, Direction::Forward)));
    }
}
