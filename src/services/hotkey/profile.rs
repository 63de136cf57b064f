use crate::events::{BindingList, Direction, PoolKind, TargetId};
use crate::services::binding_store::StoredProfile;
use std::collections::BTreeMap;

/// Именованная группа персонажей со своими привязками и состоянием цикла
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleGroup {
    pub name: String,
    pub members: Vec<String>,
    pub forward: BindingList,
    pub backward: BindingList,
    /// Добавлять в конец цикла окна без выбранного персонажа
    pub include_not_logged_in: bool,
    /// Останавливаться на границе списка вместо перехода по кругу
    pub no_loop: bool,
}

impl CycleGroup {
    pub fn new(name: impl Into<String>, members: Vec<String>) -> Self {
        Self {
            name: name.into(),
            members,
            ..Self::default()
        }
    }

    pub fn bindings(&self, direction: Direction) -> &BindingList {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    pub fn bindings_mut(&mut self, direction: Direction) -> &mut BindingList {
        match direction {
            Direction::Forward => &mut self.forward,
            Direction::Backward => &mut self.backward,
        }
    }

    /// `members|forward(;)|backward(;)|includeNotLoggedIn|noLoop`
    pub fn encode_record(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.members.join(","),
            self.forward.encode_with(';'),
            self.backward.encode_with(';'),
            self.include_not_logged_in as u8,
            self.no_loop as u8
        )
    }

    /// Разбор записи группы. Старые записи из 4 полей читаются с no_loop = 0,
    /// недостающие поля считаются пустыми.
    pub fn decode_record(name: impl Into<String>, raw: &str) -> Self {
        let fields: Vec<&str> = raw.split('|').collect();
        let field = |i: usize| fields.get(i).map(|s| s.trim()).unwrap_or("");

        let members = field(0)
            .split(',')
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            name: name.into(),
            members,
            forward: BindingList::decode_with(field(1), ';'),
            backward: BindingList::decode_with(field(2), ';'),
            include_not_logged_in: field(3) == "1",
            no_loop: field(4) == "1",
        }
    }
}

/// Привязки пула для обоих направлений
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PoolBindings {
    pub forward: BindingList,
    pub backward: BindingList,
}

impl PoolBindings {
    pub fn get(&self, direction: Direction) -> &BindingList {
        match direction {
            Direction::Forward => &self.forward,
            Direction::Backward => &self.backward,
        }
    }

    pub fn get_mut(&mut self, direction: Direction) -> &mut BindingList {
        match direction {
            Direction::Forward => &mut self.forward,
            Direction::Backward => &mut self.backward,
        }
    }
}

/// Полная конфигурация привязок активного профиля плюс глобальные привязки профилей
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeyProfile {
    pub suspend: BindingList,
    pub characters: BTreeMap<String, BindingList>,
    pub groups: BTreeMap<String, CycleGroup>,
    pub not_logged_in: PoolBindings,
    pub other: PoolBindings,
    pub close_all: BindingList,
    pub profiles: BTreeMap<String, BindingList>,
}

impl HotkeyProfile {
    pub fn pool(&self, kind: PoolKind) -> &PoolBindings {
        match kind {
            PoolKind::NotLoggedIn => &self.not_logged_in,
            PoolKind::Other => &self.other,
        }
    }

    fn pool_mut(&mut self, kind: PoolKind) -> &mut PoolBindings {
        match kind {
            PoolKind::NotLoggedIn => &mut self.not_logged_in,
            PoolKind::Other => &mut self.other,
        }
    }

    pub fn bindings_for(&self, target: &TargetId) -> Option<&BindingList> {
        match target {
            TargetId::Suspend => Some(&self.suspend),
            TargetId::Character(name) => self.characters.get(name),
            TargetId::Group(name, direction) => self.groups.get(name).map(|g| g.bindings(*direction)),
            TargetId::Pool(kind, direction) => Some(self.pool(*kind).get(*direction)),
            TargetId::CloseAll => Some(&self.close_all),
            TargetId::Profile(name) => self.profiles.get(name),
        }
    }

    /// Заменить привязки цели. Для несуществующей группы возвращает false.
    /// Пустой список у персонажа или профиля удаляет запись.
    pub fn set_bindings(&mut self, target: &TargetId, bindings: BindingList) -> bool {
        match target {
            TargetId::Suspend => self.suspend = bindings,
            TargetId::Character(name) => {
                if bindings.is_empty() {
                    self.characters.remove(name);
                } else {
                    self.characters.insert(name.clone(), bindings);
                }
            }
            TargetId::Group(name, direction) => match self.groups.get_mut(name) {
                Some(group) => *group.bindings_mut(*direction) = bindings,
                None => return false,
            },
            TargetId::Pool(kind, direction) => *self.pool_mut(*kind).get_mut(*direction) = bindings,
            TargetId::CloseAll => self.close_all = bindings,
            TargetId::Profile(name) => {
                if bindings.is_empty() {
                    self.profiles.remove(name);
                } else {
                    self.profiles.insert(name.clone(), bindings);
                }
            }
        }
        true
    }

    /// Все цели в фиксированном порядке регистрации:
    /// приостановка → персонажи → группы → пулы и «закрыть всё» → профили.
    pub fn targets_in_priority_order(&self) -> Vec<(TargetId, &BindingList)> {
        let mut targets = Vec::with_capacity(
            self.characters.len() + self.groups.len() * 2 + self.profiles.len() + 6,
        );

        targets.push((TargetId::Suspend, &self.suspend));

        for (name, bindings) in &self.characters {
            targets.push((TargetId::Character(name.clone()), bindings));
        }

        for (name, group) in &self.groups {
            for direction in [Direction::Forward, Direction::Backward] {
                targets.push((TargetId::Group(name.clone(), direction), group.bindings(direction)));
            }
        }

        for kind in [PoolKind::NotLoggedIn, PoolKind::Other] {
            for direction in [Direction::Forward, Direction::Backward] {
                targets.push((TargetId::Pool(kind, direction), self.pool(kind).get(direction)));
            }
        }
        targets.push((TargetId::CloseAll, &self.close_all));

        for (name, bindings) in &self.profiles {
            targets.push((TargetId::Profile(name.clone()), bindings));
        }

        targets
    }

    /// Собрать конфигурацию из сохранённых строк профиля и глобальных привязок профилей
    pub fn from_stored(stored: &StoredProfile, profile_hotkeys: &BTreeMap<String, String>) -> Self {
        Self {
            suspend: BindingList::decode(&stored.suspend),
            characters: stored
                .characters
                .iter()
                .map(|(name, raw)| (name.clone(), BindingList::decode(raw)))
                .filter(|(_, bindings)| !bindings.is_empty())
                .collect(),
            groups: stored
                .cycle_groups
                .iter()
                .map(|(name, raw)| (name.clone(), CycleGroup::decode_record(name.clone(), raw)))
                .collect(),
            not_logged_in: PoolBindings {
                forward: BindingList::decode(&stored.not_logged_in_forward),
                backward: BindingList::decode(&stored.not_logged_in_backward),
            },
            other: PoolBindings {
                forward: BindingList::decode(&stored.other_forward),
                backward: BindingList::decode(&stored.other_backward),
            },
            close_all: BindingList::decode(&stored.close_all),
            profiles: profile_hotkeys
                .iter()
                .map(|(name, raw)| (name.clone(), BindingList::decode(raw)))
                .filter(|(_, bindings)| !bindings.is_empty())
                .collect(),
        }
    }

    pub fn to_stored(&self) -> (StoredProfile, BTreeMap<String, String>) {
        let stored = StoredProfile {
            suspend: self.suspend.encode(),
            close_all: self.close_all.encode(),
            not_logged_in_forward: self.not_logged_in.forward.encode(),
            not_logged_in_backward: self.not_logged_in.backward.encode(),
            other_forward: self.other.forward.encode(),
            other_backward: self.other.backward.encode(),
            characters: self
                .characters
                .iter()
                .map(|(name, bindings)| (name.clone(), bindings.encode()))
                .collect(),
            cycle_groups: self
                .groups
                .iter()
                .map(|(name, group)| (name.clone(), group.encode_record()))
                .collect(),
        };

        let profile_hotkeys = self
            .profiles
            .iter()
            .map(|(name, bindings)| (name.clone(), bindings.encode()))
            .collect();

        (stored, profile_hotkeys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Binding, Modifiers};

    fn key(code: u16) -> Binding {
        Binding::new(code, Modifiers::new())
    }

    #[test]
    fn test_group_record_roundtrip() {
        let mut group = CycleGroup::new("Main", vec!["Alice".into(), "Bob".into(), "Carol".into()]);
        group.forward = [key(15), Binding::new(15, Modifiers::new().with_ctrl(true))].into_iter().collect();
        group.backward = BindingList::single(Binding::new(15, Modifiers::new().with_shift(true)));
        group.no_loop = true;

        let record = group.encode_record();
        assert_eq!(record, "Alice,Bob,Carol|1,15,0,0,0;1,15,1,0,0|1,15,0,0,1|0|1");
        assert_eq!(CycleGroup::decode_record("Main", &record), group);
    }

    #[test]
    fn test_group_record_four_fields_defaults_no_loop() {
        let group = CycleGroup::decode_record("Old", "Alice, Bob|1,15,0,0,0||1");
        assert_eq!(group.members, vec!["Alice".to_string(), "Bob".to_string()]);
        assert_eq!(group.forward.len(), 1);
        assert!(group.backward.is_empty());
        assert!(group.include_not_logged_in);
        assert!(!group.no_loop);
    }

    #[test]
    fn test_group_record_malformed_never_panics() {
        let group = CycleGroup::decode_record("Broken", "garbage");
        assert_eq!(group.members, vec!["garbage".to_string()]);
        assert!(group.forward.is_empty());
        assert!(!group.no_loop);

        let empty = CycleGroup::decode_record("Empty", "");
        assert!(empty.members.is_empty());
    }

    #[test]
    fn test_priority_order() {
        let mut profile = HotkeyProfile::default();
        profile.characters.insert("Bob".into(), BindingList::single(key(3)));
        profile.characters.insert("Alice".into(), BindingList::single(key(2)));
        profile.groups.insert("Main".into(), CycleGroup::new("Main", vec![]));
        profile.profiles.insert("PvP".into(), BindingList::single(key(59)));

        let order: Vec<TargetId> = profile
            .targets_in_priority_order()
            .into_iter()
            .map(|(target, _)| target)
            .collect();

        assert_eq!(order[0], TargetId::Suspend);
        assert_eq!(order[1], TargetId::Character("Alice".into()));
        assert_eq!(order[2], TargetId::Character("Bob".into()));
        assert_eq!(order[3], TargetId::Group("Main".into(), Direction::Forward));
        assert_eq!(order[4], TargetId::Group("Main".into(), Direction::Backward));
        assert_eq!(order[5], TargetId::Pool(PoolKind::NotLoggedIn, Direction::Forward));
        assert_eq!(order[9], TargetId::CloseAll);
        assert_eq!(order[10], TargetId::Profile("PvP".into()));
        assert_eq!(order.len(), 11);
    }

    #[test]
    fn test_set_bindings() {
        let mut profile = HotkeyProfile::default();
        let target = TargetId::Character("Alice".into());

        assert!(profile.set_bindings(&target, BindingList::single(key(2))));
        assert_eq!(profile.bindings_for(&target).map(|b| b.len()), Some(1));

        assert!(profile.set_bindings(&target, BindingList::new()));
        assert!(profile.bindings_for(&target).is_none());

        assert!(!profile.set_bindings(&TargetId::Group("Missing".into(), Direction::Forward), BindingList::single(key(2))));
    }

    #[test]
    fn test_stored_roundtrip() {
        let mut profile = HotkeyProfile::default();
        profile.suspend = BindingList::single(key(70));
        profile.characters.insert("Alice".into(), [key(2), key(79)].into_iter().collect());
        profile.groups.insert("Main".into(), CycleGroup::new("Main", vec!["Alice".into()]));
        profile.other.backward = BindingList::single(key(88));
        profile.profiles.insert("PvP".into(), BindingList::single(key(59)));

        let (stored, profile_hotkeys) = profile.to_stored();
        assert_eq!(stored.characters["Alice"], "1,2,0,0,0|1,79,0,0,0");
        assert_eq!(HotkeyProfile::from_stored(&stored, &profile_hotkeys), profile);
    }
}
