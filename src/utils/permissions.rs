use crate::error::{HotkeyError, Result};
use std::fs;
use std::path::Path;
use tracing::{info, warn};

const INPUT_DIR: &str = "/dev/input";

/// Проверить доступ к устройствам ввода
pub fn check_permissions() -> Result<()> {
    info!("Проверка прав доступа...");

    check_input_devices_access(Path::new(INPUT_DIR))?;
    check_not_root();

    info!("Проверка прав доступа завершена успешно");
    Ok(())
}

fn check_input_devices_access(input_dir: &Path) -> Result<()> {
    if !input_dir.exists() {
        return Err(HotkeyError::Permission(format!("Директория {:?} не существует", input_dir)));
    }

    match fs::read_dir(input_dir) {
        Ok(_) => {
            info!("Доступ к {:?} подтвержден", input_dir);
            Ok(())
        }
        Err(e) => Err(HotkeyError::Permission(format!(
            "Нет доступа к {:?}: {}. Добавьте пользователя в группу 'input'",
            input_dir, e
        ))),
    }
}

fn check_not_root() {
    match std::env::var("USER") {
        Ok(user) if user == "root" => {
            warn!("Приложение запущено от имени root!");
            warn!("   Достаточно добавить пользователя в группу 'input':");
            warn!("   sudo usermod -a -G input $USER");
            warn!("   (затем перезайдите в систему)");
        }
        Ok(user) => info!("Приложение запущено от имени пользователя: {}", user),
        Err(_) => warn!("Не удалось определить пользователя"),
    }
}
