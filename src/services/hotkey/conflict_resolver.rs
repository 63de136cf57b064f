use crate::events::{Binding, BindingList, Direction, PoolKind, TargetId};

use super::profile::HotkeyProfile;

/// Поиск владельца привязки среди всех настроенных целей.
///
/// Результат только подсказка для интерфейса настройки: регистрацию он не блокирует.
pub struct ConflictResolver<'a> {
    profile: &'a HotkeyProfile,
}

impl<'a> ConflictResolver<'a> {
    pub fn new(profile: &'a HotkeyProfile) -> Self {
        Self { profile }
    }

    /// Первая цель (кроме `exclude`), чья основная привязка равна `candidate`.
    /// Порядок просмотра: приостановка, персонажи, группы (вперёд, назад),
    /// неавторизованные окна, сторонние окна, профили, «закрыть всё».
    pub fn find_conflict(&self, candidate: &Binding, exclude: Option<&TargetId>) -> Option<TargetId> {
        if candidate.is_unset() {
            return None;
        }

        self.scan_order()
            .into_iter()
            .filter(|(target, _)| Some(target) != exclude)
            .find(|(_, bindings)| bindings.primary() == Some(candidate))
            .map(|(target, _)| target)
    }

    /// Человекочитаемое описание владельца, пустая строка если конфликта нет
    pub fn describe_conflict(&self, candidate: &Binding, exclude: Option<&TargetId>) -> String {
        self.find_conflict(candidate, exclude)
            .map(|target| target.to_string())
            .unwrap_or_default()
    }

    fn scan_order(&self) -> Vec<(TargetId, &'a BindingList)> {
        let profile = self.profile;
        let mut order = Vec::new();

        order.push((TargetId::Suspend, &profile.suspend));

        for (name, bindings) in &profile.characters {
            order.push((TargetId::Character(name.clone()), bindings));
        }

        for (name, group) in &profile.groups {
            order.push((TargetId::Group(name.clone(), Direction::Forward), &group.forward));
            order.push((TargetId::Group(name.clone(), Direction::Backward), &group.backward));
        }

        for kind in [PoolKind::NotLoggedIn, PoolKind::Other] {
            let pool = profile.pool(kind);
            order.push((TargetId::Pool(kind, Direction::Forward), &pool.forward));
            order.push((TargetId::Pool(kind, Direction::Backward), &pool.backward));
        }

        for (name, bindings) in &profile.profiles {
            order.push((TargetId::Profile(name.clone()), bindings));
        }

        order.push((TargetId::CloseAll, &profile.close_all));

        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Modifiers;
    use crate::services::hotkey::profile::CycleGroup;

    fn key(code: u16) -> Binding {
        Binding::new(code, Modifiers::new())
    }

    fn profile() -> HotkeyProfile {
        let mut profile = HotkeyProfile::default();
        profile.suspend = BindingList::single(key(70));
        profile.characters.insert("Alice".into(), [key(2), key(79)].into_iter().collect());
        profile.characters.insert("Bob".into(), BindingList::single(key(3)));
        let mut group = CycleGroup::new("Main", vec![]);
        group.backward = BindingList::single(Binding::new(15, Modifiers::new().with_shift(true)));
        profile.groups.insert("Main".into(), group);
        profile.other.forward = BindingList::single(key(88));
        profile.profiles.insert("PvP".into(), BindingList::single(key(59)));
        profile
    }

    #[test]
    fn test_finds_owner_of_primary_binding() {
        let profile = profile();
        let resolver = ConflictResolver::new(&profile);

        assert_eq!(resolver.find_conflict(&key(70), None), Some(TargetId::Suspend));
        assert_eq!(resolver.find_conflict(&key(3), None), Some(TargetId::Character("Bob".into())));
        assert_eq!(
            resolver.find_conflict(&Binding::new(15, Modifiers::new().with_shift(true)), None),
            Some(TargetId::Group("Main".into(), Direction::Backward))
        );
        assert_eq!(resolver.find_conflict(&key(88), None), Some(TargetId::Pool(PoolKind::Other, Direction::Forward)));
        assert_eq!(resolver.describe_conflict(&key(59), None), "Профиль 'PvP'");
    }

    #[test]
    fn test_only_primary_bindings_are_scanned() {
        let profile = profile();
        let resolver = ConflictResolver::new(&profile);
        assert_eq!(resolver.find_conflict(&key(79), None), None);
        assert_eq!(resolver.describe_conflict(&key(79), None), "");
    }

    #[test]
    fn test_full_equality_is_required() {
        let profile = profile();
        let resolver = ConflictResolver::new(&profile);
        assert_eq!(resolver.find_conflict(&Binding::new(3, Modifiers::new().with_ctrl(true)), None), None);
        assert_eq!(resolver.find_conflict(&key(3).disabled(), None), None);
        assert_eq!(resolver.find_conflict(&Binding::default(), None), None);
    }

    #[test]
    fn test_excluded_target_is_skipped() {
        let mut profile = profile();
        profile.profiles.insert("Farm".into(), BindingList::single(key(3)));
        let resolver = ConflictResolver::new(&profile);

        let bob = TargetId::Character("Bob".into());
        assert_eq!(resolver.find_conflict(&key(3), Some(&bob)), Some(TargetId::Profile("Farm".into())));
        assert_eq!(resolver.find_conflict(&key(59), Some(&TargetId::Profile("PvP".into()))), None);
    }
}
