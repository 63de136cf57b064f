use crate::config::HotkeyPolicy;
use crate::events::{HotkeyId, TargetId};
use crate::services::window_system::ForegroundQuery;
use crate::trace_if_enabled;

use super::binding_registry::BindingRegistry;

/// Куда направить одно сырое событие
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Переключить глобальную приостановку (подавить нельзя)
    ToggleSuspend,
    /// Горячие клавиши приостановлены
    Suspended,
    /// Активно чужое приложение: нажатие уходит дальше нетронутым
    PassThrough,
    /// Идентификатор ни на что не отображается
    Unmapped,
    Target(TargetId),
}

/// Классификация идентификатора горячей клавиши с учётом приостановки и фокус-фильтра
#[derive(Debug, Clone, Default)]
pub struct DispatchRouter {
    policy: HotkeyPolicy,
    suspended: bool,
}

impl DispatchRouter {
    pub fn new(policy: HotkeyPolicy) -> Self {
        Self {
            policy,
            suspended: false,
        }
    }

    pub fn route<F: ForegroundQuery + ?Sized>(
        &self,
        id: HotkeyId,
        registry: &BindingRegistry,
        foreground: &F,
    ) -> Route {
        // 1. Псевдоним -> канонический id
        let canonical = registry.canonical(id);
        if canonical != id {
            trace_if_enabled!("Псевдоним {} -> {}", id, canonical);
        }

        let target = registry.target_of(canonical);

        // 2. Приостановка переключается всегда
        if target == Some(&TargetId::Suspend) {
            return Route::ToggleSuspend;
        }

        // 3. Вторая линия защиты: в приостановке зарегистрирована только она сама
        if self.suspended {
            return Route::Suspended;
        }

        // 4. Фокус-фильтр
        if self.policy.require_client_focus && !self.foreground_allowed(foreground) {
            return Route::PassThrough;
        }

        // 5. Классификация
        match target {
            Some(target) => Route::Target(target.clone()),
            None => Route::Unmapped,
        }
    }

    fn foreground_allowed<F: ForegroundQuery + ?Sized>(&self, foreground: &F) -> bool {
        match foreground.foreground_process_name() {
            Some(process) => self.policy.allows_process(&process),
            None => false,
        }
    }

    pub fn is_suspended(&self) -> bool {
        self.suspended
    }

    pub fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    pub fn policy(&self) -> &HotkeyPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: HotkeyPolicy) {
        self.policy = policy;
    }
}
