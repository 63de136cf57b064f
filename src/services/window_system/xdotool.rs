use crate::error::Result;
use crate::events::{WindowHandle, WindowInfo, WindowSnapshot};
use crate::hotkey_error;
use crate::trace_if_enabled;
use std::collections::HashMap;
use tokio::process::Command;
use tracing::debug;

use super::r#trait::{WindowActivator, WindowSource};

async fn xdotool(args: &[&str]) -> Result<String> {
    let output = Command::new("xdotool").args(args).output().await.map_err(|e| {
        debug!("xdotool не найден или не работает: {}", e);
        hotkey_error!(service_unavailable, "xdotool не найден: {}", e)
    })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(hotkey_error!(internal, "xdotool {:?} вернул ошибку: {}", args, stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

/// Снимки видимых окон через xdotool и /proc
pub struct XdotoolWindowSource {
    // pid и имя процесса окна не меняются, заголовок перечитывается каждый раз
    processes: HashMap<WindowHandle, (Option<u32>, String)>,
}

impl XdotoolWindowSource {
    pub fn new() -> Self {
        Self {
            processes: HashMap::new(),
        }
    }

    async fn visible_windows() -> Result<Vec<WindowHandle>> {
        let output = Command::new("xdotool")
            .args(["search", "--onlyvisible", "--name", "."])
            .output()
            .await
            .map_err(|e| hotkey_error!(service_unavailable, "xdotool не найден: {}", e))?;

        // Пустой результат поиска xdotool считает ошибкой
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout
            .lines()
            .filter_map(|line| line.trim().parse::<u64>().ok())
            .map(WindowHandle::new)
            .collect())
    }

    async fn process_of(&mut self, handle: WindowHandle) -> (Option<u32>, String) {
        if let Some(cached) = self.processes.get(&handle) {
            return cached.clone();
        }

        let id = handle.raw().to_string();
        let pid = xdotool(&["getwindowpid", &id])
            .await
            .ok()
            .and_then(|raw| raw.parse::<u32>().ok());

        let process_name = match pid {
            Some(pid) => tokio::fs::read_to_string(format!("/proc/{}/comm", pid))
                .await
                .map(|comm| comm.trim().to_string())
                .unwrap_or_default(),
            None => String::new(),
        };

        let entry = (pid, process_name);
        self.processes.insert(handle, entry.clone());
        entry
    }
}

impl Default for XdotoolWindowSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl WindowSource for XdotoolWindowSource {
    fn name(&self) -> &'static str {
        "xdotool"
    }

    async fn snapshot(&mut self) -> Result<WindowSnapshot> {
        let handles = Self::visible_windows().await?;
        self.processes.retain(|handle, _| handles.contains(handle));

        let mut windows = Vec::with_capacity(handles.len());
        for handle in handles {
            let id = handle.raw().to_string();
            // Окно могло закрыться между search и getwindowname
            let Ok(title) = xdotool(&["getwindowname", &id]).await else {
                continue;
            };

            let (pid, process_name) = self.process_of(handle).await;
            let mut window = WindowInfo::new(handle, title).with_process(process_name);
            if let Some(pid) = pid {
                window = window.with_pid(pid);
            }
            windows.push(window);
        }

        let foreground = xdotool(&["getactivewindow"])
            .await
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
            .map(WindowHandle::new);

        trace_if_enabled!("xdotool: {} окон, активное {:?}", windows.len(), foreground);
        Ok(WindowSnapshot::new(windows, foreground))
    }
}

/// Активация и закрытие окон через xdotool
pub struct XdotoolActivator;

#[async_trait::async_trait]
impl WindowActivator for XdotoolActivator {
    async fn activate(&mut self, handle: WindowHandle) -> Result<()> {
        xdotool(&["windowactivate", &handle.raw().to_string()]).await?;
        Ok(())
    }

    async fn close(&mut self, handle: WindowHandle) -> Result<()> {
        xdotool(&["windowclose", &handle.raw().to_string()]).await?;
        Ok(())
    }
}
