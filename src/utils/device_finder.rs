use crate::error::{HotkeyError, Result};
use evdev::KeyCode;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Какое устройство ищем
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceKind {
    Keyboard,
    Mouse,
}

impl DeviceKind {
    fn label(&self) -> &'static str {
        match self {
            DeviceKind::Keyboard => "клавиатурное",
            DeviceKind::Mouse => "мышь",
        }
    }

    /// Приоритет устройства по имени в /dev/input/by-id (0 - не подходит)
    fn by_id_priority(&self, name: &str) -> u32 {
        if !name.contains("event") {
            return 0;
        }
        match self {
            DeviceKind::Keyboard if name.ends_with("event-kbd") => 100,
            DeviceKind::Keyboard if name.contains("kbd") || name.to_lowercase().contains("keyboard") => 50,
            DeviceKind::Mouse if name.ends_with("event-mouse") => 100,
            DeviceKind::Mouse if name.to_lowercase().contains("mouse") => 50,
            _ => 0,
        }
    }
}

pub struct DeviceFinder;

impl DeviceFinder {
    /// Найти клавиатуру: явный путь или `auto`
    pub fn find_keyboard_device(device_path: &str) -> Result<PathBuf> {
        Self::find_device(device_path, DeviceKind::Keyboard)
    }

    /// Найти мышь с дополнительными кнопками: явный путь или `auto`
    pub fn find_mouse_device(device_path: &str) -> Result<PathBuf> {
        Self::find_device(device_path, DeviceKind::Mouse)
    }

    fn find_device(device_path: &str, kind: DeviceKind) -> Result<PathBuf> {
        if device_path != "auto" {
            let path = PathBuf::from(device_path);
            return if path.exists() {
                info!("Используется указанное устройство: {:?}", path);
                Ok(path)
            } else {
                HotkeyError::device_not_found(format!("Указанное устройство не найдено: {:?}", path))
            };
        }

        info!("Начинаем автопоиск устройства ({})...", kind.label());

        if let Ok(device) = Self::find_by_id(kind) {
            info!("Найдено устройство по ID: {:?}", device);
            return Ok(device);
        }

        if let Ok(device) = Self::find_by_event_devices(kind) {
            info!("Найдено устройство среди event устройств: {:?}", device);
            return Ok(device);
        }

        HotkeyError::device_not_found(format!(
            "Не удалось найти подходящее устройство ({}). \
             Убедитесь, что пользователь добавлен в группу 'input'",
            kind.label()
        ))
    }

    fn find_by_id(kind: DeviceKind) -> Result<PathBuf> {
        let by_id_dir = Path::new("/dev/input/by-id");

        if !by_id_dir.exists() {
            debug!("Директория /dev/input/by-id не существует");
            return HotkeyError::device_not_found("Директория by-id не найдена");
        }

        let entries = fs::read_dir(by_id_dir)
            .map_err(|e| HotkeyError::Permission(format!("Нет доступа к /dev/input/by-id: {}", e)))?;

        let mut candidates = Vec::new();

        for entry in entries {
            let path = entry?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("").to_string();

            let priority = kind.by_id_priority(&name);
            if priority == 0 {
                continue;
            }

            if !Self::is_device_accessible(&path) {
                warn!("Устройство {:?} недоступно", path);
                continue;
            }

            if Self::matches_kind(&path, kind) {
                debug!("Кандидат: {} (приоритет: {})", name, priority);
                candidates.push((path, priority));
            }
        }

        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        match candidates.into_iter().next() {
            Some((path, _)) => Ok(path),
            None => HotkeyError::device_not_found(format!("Устройство ({}) не найдено в by-id", kind.label())),
        }
    }

    fn find_by_event_devices(kind: DeviceKind) -> Result<PathBuf> {
        let entries = fs::read_dir("/dev/input")
            .map_err(|e| HotkeyError::Permission(format!("Нет доступа к /dev/input: {}", e)))?;

        let mut event_devices = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|name| name.starts_with("event"))
            {
                event_devices.push(path);
            }
        }

        event_devices.sort();

        for device_path in event_devices {
            debug!("Проверяем устройство: {:?}", device_path);
            if Self::is_device_accessible(&device_path) && Self::matches_kind(&device_path, kind) {
                return Ok(device_path);
            }
        }

        HotkeyError::device_not_found(format!("Не найдено доступное устройство ({}) среди event устройств", kind.label()))
    }

    /// Проверка возможностей устройства через evdev
    fn matches_kind(device_path: &Path, kind: DeviceKind) -> bool {
        let device = match evdev::Device::open(device_path) {
            Ok(device) => device,
            Err(e) => {
                debug!("Не удалось открыть устройство {:?}: {}", device_path, e);
                return false;
            }
        };

        let device_name = device.name().unwrap_or("Unknown").to_lowercase();
        let Some(keys) = device.supported_keys() else {
            return false;
        };

        match kind {
            DeviceKind::Keyboard => {
                if device_name.contains("mouse") || device_name.contains("touchpad") {
                    return false;
                }
                keys.contains(KeyCode::KEY_A)
                    && keys.contains(KeyCode::KEY_SPACE)
                    && keys.contains(KeyCode::KEY_ENTER)
                    && keys.iter().count() > 20
            }
            DeviceKind::Mouse => {
                keys.contains(KeyCode::BTN_LEFT)
                    && (keys.contains(KeyCode::BTN_SIDE)
                        || keys.contains(KeyCode::BTN_EXTRA)
                        || keys.contains(KeyCode::BTN_MIDDLE))
            }
        }
    }

    fn is_device_accessible(device_path: &Path) -> bool {
        match fs::File::open(device_path) {
            Ok(_) => true,
            Err(e) => {
                debug!("Устройство {:?} недоступно: {}", device_path, e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_device_with_missing_path() {
        assert!(matches!(
            DeviceFinder::find_keyboard_device("/non/existent/path"),
            Err(HotkeyError::DeviceNotFound(_))
        ));
        assert!(DeviceFinder::find_mouse_device("/non/existent/mouse").is_err());
    }

    #[test]
    fn test_by_id_priority() {
        assert_eq!(DeviceKind::Keyboard.by_id_priority("usb-Logitech-event-kbd"), 100);
        assert_eq!(DeviceKind::Keyboard.by_id_priority("usb-Logitech-event-mouse"), 0);
        assert_eq!(DeviceKind::Mouse.by_id_priority("usb-Razer_DeathAdder-event-mouse"), 100);
        assert_eq!(DeviceKind::Mouse.by_id_priority("usb-Razer_Mouse-if01"), 0);
    }
}
