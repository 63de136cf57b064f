use crate::error::Result;
use crate::events::{WindowHandle, WindowInfo, WindowSnapshot};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::info;

use super::r#trait::{WindowActivator, WindowSource};

/// Эмуляция окон для режима dry-run: три клиента с персонажами,
/// один клиент без персонажа и одно стороннее окно.
/// Активация и закрытие меняют эмулируемый снимок.
#[derive(Clone)]
pub struct DryRunWindowSystem {
    snapshot: Arc<Mutex<WindowSnapshot>>,
}

impl DryRunWindowSystem {
    pub fn new() -> Self {
        let windows = vec![
            WindowInfo::new(WindowHandle::new(0x100), "EVE - Alice").with_process("exefile.exe"),
            WindowInfo::new(WindowHandle::new(0x200), "EVE - Bob").with_process("exefile.exe"),
            WindowInfo::new(WindowHandle::new(0x300), "EVE - Carol").with_process("exefile.exe"),
            WindowInfo::new(WindowHandle::new(0x400), "EVE").with_process("exefile.exe"),
            WindowInfo::new(WindowHandle::new(0x500), "Discord").with_process("discord"),
        ];
        let foreground = Some(WindowHandle::new(0x100));

        Self {
            snapshot: Arc::new(Mutex::new(WindowSnapshot::new(windows, foreground))),
        }
    }
}

impl Default for DryRunWindowSystem {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WindowSource for DryRunWindowSystem {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn snapshot(&mut self) -> Result<WindowSnapshot> {
        Ok(self.snapshot.lock().clone())
    }
}

#[async_trait::async_trait]
impl WindowActivator for DryRunWindowSystem {
    async fn activate(&mut self, handle: WindowHandle) -> Result<()> {
        let mut snapshot = self.snapshot.lock();
        if snapshot.windows.iter().any(|w| w.handle == handle) {
            info!("Dry-run: активируем окно {}", handle);
            snapshot.foreground = Some(handle);
        }
        Ok(())
    }

    async fn close(&mut self, handle: WindowHandle) -> Result<()> {
        info!("Dry-run: закрываем окно {}", handle);
        let mut snapshot = self.snapshot.lock();
        snapshot.windows.retain(|w| w.handle != handle);
        if snapshot.foreground == Some(handle) {
            snapshot.foreground = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_activation_and_close_update_snapshot() {
        let mut system = DryRunWindowSystem::new();
        let target = WindowHandle::new(0x300);

        system.activate(target).await.unwrap();
        assert_eq!(system.snapshot().await.unwrap().foreground, Some(target));

        system.close(target).await.unwrap();
        let snapshot = system.snapshot().await.unwrap();
        assert_eq!(snapshot.foreground, None);
        assert_eq!(snapshot.windows.len(), 4);

        // Несуществующее окно не становится активным
        system.activate(WindowHandle::new(0xdead)).await.unwrap();
        assert_eq!(system.snapshot().await.unwrap().foreground, None);
    }
}
