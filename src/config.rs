use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub input: InputConfig,
    pub hotkeys: HotkeyConfig,
    pub window: WindowConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    pub keyboard_device: String,
    pub mouse_device: String,
    /// Слушать кнопки мыши (mouse3/mouse4/mouse5)
    pub enable_mouse: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HotkeyConfig {
    /// Срабатывать даже при зажатых лишних модификаторах
    pub wildcard_modifiers: bool,
    /// Реагировать только пока активно окно клиента
    pub require_client_focus: bool,
    pub allowed_processes: Vec<String>,
    pub store_path: String,
    pub profile: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct WindowConfig {
    pub client_processes: Vec<String>,
    pub character_title_prefix: String,
    pub other_window_patterns: Vec<String>,
    pub polling_interval_ms: u64,
}

/// Политики диспетчеризации, которые менеджер получает из конфигурации
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HotkeyPolicy {
    pub wildcard_modifiers: bool,
    pub require_client_focus: bool,
    // Предварительно нормализованные имена процессов
    allowed_processes_lower: HashSet<String>,
}

impl HotkeyPolicy {
    pub fn new(wildcard_modifiers: bool, require_client_focus: bool, allowed_processes: &[String]) -> Self {
        Self {
            wildcard_modifiers,
            require_client_focus,
            allowed_processes_lower: allowed_processes.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    /// Разрешён ли процесс активного окна фокус-фильтром
    pub fn allows_process(&self, process_name: &str) -> bool {
        let name = process_name.rsplit(['/', '\\']).next().unwrap_or(process_name);
        self.allowed_processes_lower.contains(&name.to_lowercase())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
            input: InputConfig {
                keyboard_device: "auto".to_string(),
                mouse_device: "auto".to_string(),
                enable_mouse: true,
            },
            hotkeys: HotkeyConfig {
                wildcard_modifiers: false,
                require_client_focus: false,
                allowed_processes: vec!["exefile.exe".to_string()],
                store_path: "hotkeys.toml".to_string(),
                profile: "Default".to_string(),
            },
            window: WindowConfig {
                client_processes: vec!["exefile.exe".to_string()],
                character_title_prefix: "EVE - ".to_string(),
                other_window_patterns: Vec::new(),
                polling_interval_ms: 500,
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("MBX_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        config.validate()?;

        Ok(config)
    }

    pub fn policy(&self) -> HotkeyPolicy {
        HotkeyPolicy::new(
            self.hotkeys.wildcard_modifiers,
            self.hotkeys.require_client_focus,
            &self.hotkeys.allowed_processes,
        )
    }

    pub fn validate(&self) -> Result<()> {
        // Валидация настроек логирования
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        // Валидация горячих клавиш
        if self.hotkeys.require_client_focus && self.hotkeys.allowed_processes.is_empty() {
            anyhow::bail!("require_client_focus включён, но allowed_processes пуст");
        }

        if self.hotkeys.store_path.trim().is_empty() {
            anyhow::bail!("store_path не может быть пустым");
        }

        if self.hotkeys.profile.trim().is_empty() {
            anyhow::bail!("Имя профиля не может быть пустым");
        }

        // Валидация настроек окон
        if self.window.polling_interval_ms < 100 {
            anyhow::bail!("polling_interval_ms должно быть минимум 100");
        }

        if self.window.client_processes.is_empty() {
            anyhow::bail!("Список client_processes пуст");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.window.polling_interval_ms = 10;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.hotkeys.require_client_focus = true;
        config.hotkeys.allowed_processes.clear();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.level = "verbose".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_policy_process_matching() {
        let mut config = Config::default();
        config.hotkeys.allowed_processes = vec!["ExeFile.exe".to_string(), "wine64-preloader".to_string()];
        let policy = config.policy();

        assert!(policy.allows_process("exefile.exe"));
        assert!(policy.allows_process("/usr/bin/wine64-preloader"));
        assert!(policy.allows_process("C:\\EVE\\bin\\EXEFILE.EXE"));
        assert!(!policy.allows_process("firefox"));
    }

    #[test]
    fn test_load_merges_file_over_defaults() {
        let path = std::env::temp_dir().join(format!("mbx-config-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[hotkeys]\nwildcard_modifiers = true\nprofile = \"PvP\"\n\n[window]\npolling_interval_ms = 250\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(config.hotkeys.wildcard_modifiers);
        assert_eq!(config.hotkeys.profile, "PvP");
        assert_eq!(config.window.polling_interval_ms, 250);
        // Не указанные в файле значения берутся из умолчаний
        assert_eq!(config.hotkeys.store_path, "hotkeys.toml");
        assert_eq!(config.window.character_title_prefix, "EVE - ");
    }
}
