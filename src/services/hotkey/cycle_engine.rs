use crate::debug_if_enabled;
use crate::events::{Direction, PoolKind, WindowHandle};
use crate::services::window_system::WindowResolver;
use std::collections::HashMap;

use super::profile::CycleGroup;

/// Позиция цикла: сохранённый индекс и последнее реально активированное окно
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleState {
    pub index: Option<usize>,
    pub last_activated: Option<WindowHandle>,
}

impl CycleState {
    /// Выбрать следующее окно и запомнить его. `None`, если список пуст
    /// или no_loop не даёт перейти через границу; состояние при этом не меняется.
    pub fn advance(&mut self, members: &[WindowHandle], direction: Direction, no_loop: bool) -> Option<WindowHandle> {
        if members.is_empty() {
            return None;
        }
        let len = members.len() as isize;

        // Последнее активированное окно надёжнее индекса: список пересобирается каждый раз
        let anchored = self
            .last_activated
            .and_then(|handle| members.iter().position(|m| *m == handle));

        let start = match (anchored, self.index) {
            (Some(pos), _) => pos as isize,
            (None, Some(index)) => index as isize,
            (None, None) => match direction {
                Direction::Forward => -1,
                Direction::Backward => len,
            },
        };

        let next = match direction {
            Direction::Forward => start + 1,
            Direction::Backward => start - 1,
        };

        if no_loop && (next < 0 || next >= len) {
            return None;
        }

        let index = next.rem_euclid(len) as usize;
        let handle = members[index];
        self.index = Some(index);
        self.last_activated = Some(handle);
        Some(handle)
    }
}

/// Состояние циклов по группам и двум неявным пулам
#[derive(Debug, Default)]
pub struct CycleEngine {
    groups: HashMap<String, CycleState>,
    pools: HashMap<PoolKind, CycleState>,
}

impl CycleEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Живой упорядоченный список окон группы: персонажи без окна и мёртвые окна
    /// отбрасываются, при include_not_logged_in в конец добавляются окна без персонажа.
    pub fn group_members<R: WindowResolver + ?Sized>(group: &CycleGroup, resolver: &R) -> Vec<WindowHandle> {
        let mut members: Vec<WindowHandle> = Vec::with_capacity(group.members.len());

        for name in &group.members {
            if let Some(handle) = resolver.resolve_window_for_character(name) {
                if handle.is_valid(resolver) && !members.contains(&handle) {
                    members.push(handle);
                }
            }
        }

        if group.include_not_logged_in {
            for handle in Self::pool_members(PoolKind::NotLoggedIn, resolver) {
                if !members.contains(&handle) {
                    members.push(handle);
                }
            }
        }

        members
    }

    pub fn pool_members<R: WindowResolver + ?Sized>(kind: PoolKind, resolver: &R) -> Vec<WindowHandle> {
        let mut members = resolver.pool_windows(kind);
        members.retain(|handle| handle.is_valid(resolver));
        members.dedup();
        members
    }

    pub fn cycle_group<R: WindowResolver + ?Sized>(
        &mut self,
        group: &CycleGroup,
        direction: Direction,
        resolver: &R,
    ) -> Option<WindowHandle> {
        let members = Self::group_members(group, resolver);
        if members.is_empty() {
            debug_if_enabled!("Группа '{}': нет живых окон", group.name);
            return None;
        }

        let state = self.groups.entry(group.name.clone()).or_default();
        let selected = state.advance(&members, direction, group.no_loop);

        debug_if_enabled!(
            "Группа '{}' ({}): {:?} из {} окон",
            group.name,
            direction,
            selected,
            members.len()
        );
        selected
    }

    pub fn cycle_pool<R: WindowResolver + ?Sized>(
        &mut self,
        kind: PoolKind,
        direction: Direction,
        resolver: &R,
    ) -> Option<WindowHandle> {
        let members = Self::pool_members(kind, resolver);
        if members.is_empty() {
            debug_if_enabled!("{}: нет живых окон", kind);
            return None;
        }

        self.pools.entry(kind).or_default().advance(&members, direction, false)
    }

    /// Окно активировали напрямую: все циклы, где оно есть, продолжают с него
    pub fn notify_activated<'g, R, I>(&mut self, handle: WindowHandle, groups: I, resolver: &R)
    where
        R: WindowResolver + ?Sized,
        I: IntoIterator<Item = &'g CycleGroup>,
    {
        for group in groups {
            let members = Self::group_members(group, resolver);
            if let Some(pos) = members.iter().position(|m| *m == handle) {
                let state = self.groups.entry(group.name.clone()).or_default();
                state.index = Some(pos);
                state.last_activated = Some(handle);
            }
        }

        for kind in [PoolKind::NotLoggedIn, PoolKind::Other] {
            let members = Self::pool_members(kind, resolver);
            if let Some(pos) = members.iter().position(|m| *m == handle) {
                let state = self.pools.entry(kind).or_default();
                state.index = Some(pos);
                state.last_activated = Some(handle);
            }
        }
    }

    pub fn group_state(&self, name: &str) -> Option<&CycleState> {
        self.groups.get(name)
    }

    pub fn reset_group(&mut self, name: &str) {
        self.groups.remove(name);
    }

    /// Сбросить всё (перезагрузка привязок или профиля)
    pub fn reset(&mut self) {
        self.groups.clear();
        self.pools.clear();
    }
}
