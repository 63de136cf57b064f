use thiserror::Error;

#[derive(Error, Debug)]
pub enum HotkeyError {
    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Сочетание {chord} уже занято другим процессом")]
    Refused { chord: String },

    #[error("Ошибка хранилища привязок: {0}")]
    Store(String),

    #[error("Устройство не найдено: {0}")]
    DeviceNotFound(String),

    #[error("Недостаточно прав доступа: {0}")]
    Permission(String),

    #[error("Сервис недоступен: {0}")]
    ServiceUnavailable(String),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl HotkeyError {
    pub fn device_not_found<T>(msg: impl Into<String>) -> Result<T> {
        Err(HotkeyError::DeviceNotFound(msg.into()))
    }

    pub fn refused(chord: impl ToString) -> Self {
        HotkeyError::Refused { chord: chord.to_string() }
    }
}

impl From<toml::de::Error> for HotkeyError {
    fn from(e: toml::de::Error) -> Self {
        HotkeyError::Store(format!("не удалось разобрать файл привязок: {}", e))
    }
}

impl From<toml::ser::Error> for HotkeyError {
    fn from(e: toml::ser::Error) -> Self {
        HotkeyError::Store(format!("не удалось сериализовать привязки: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, HotkeyError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! hotkey_error {
    (store, $($arg:tt)*) => {
        $crate::error::HotkeyError::Store(format!($($arg)*))
    };
    (device_not_found, $($arg:tt)*) => {
        $crate::error::HotkeyError::DeviceNotFound(format!($($arg)*))
    };
    (permission, $($arg:tt)*) => {
        $crate::error::HotkeyError::Permission(format!($($arg)*))
    };
    (service_unavailable, $($arg:tt)*) => {
        $crate::error::HotkeyError::ServiceUnavailable(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::HotkeyError::Internal(format!($($arg)*))
    };
}
