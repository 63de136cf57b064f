use crate::error::Result;
use crate::events::{PoolKind, WindowHandle, WindowSnapshot};

/// Read-only view of the live window set used while cycling.
///
/// Implementations must answer from memory: these calls run inline with input delivery.
pub trait WindowResolver {
    fn resolve_window_for_character(&self, name: &str) -> Option<WindowHandle>;

    fn is_window_still_valid(&self, handle: WindowHandle) -> bool;

    /// Окна клиента, в которых персонаж ещё не выбран
    fn not_logged_in_windows(&self) -> Vec<WindowHandle>;

    /// Окна сторонних приложений, участвующие в цикле
    fn other_windows(&self) -> Vec<WindowHandle>;

    fn pool_windows(&self, kind: PoolKind) -> Vec<WindowHandle> {
        match kind {
            PoolKind::NotLoggedIn => self.not_logged_in_windows(),
            PoolKind::Other => self.other_windows(),
        }
    }
}

/// Процесс, которому принадлежит активное окно
pub trait ForegroundQuery {
    fn foreground_process_name(&self) -> Option<String>;
}

/// Применение действий к окнам (активация, закрытие)
#[async_trait::async_trait]
pub trait WindowActivator: Send {
    async fn activate(&mut self, handle: WindowHandle) -> Result<()>;

    async fn close(&mut self, handle: WindowHandle) -> Result<()>;
}

/// Источник снимков окон для опроса
#[async_trait::async_trait]
pub trait WindowSource: Send {
    fn name(&self) -> &'static str;

    async fn snapshot(&mut self) -> Result<WindowSnapshot>;
}

/// Источник снимков и исполнитель действий для выбранного режима
pub fn create_window_system(dry_run: bool) -> (Box<dyn WindowSource>, Box<dyn WindowActivator>) {
    if dry_run {
        let system = super::dry_window_system::DryRunWindowSystem::new();
        (Box::new(system.clone()), Box::new(system))
    } else {
        (
            Box::new(super::xdotool::XdotoolWindowSource::new()),
            Box::new(super::xdotool::XdotoolActivator),
        )
    }
}
