use super::{KeyCode, Modifiers, WindowHandle, WindowSnapshot};
use std::fmt;

/// Идентификатор горячей клавиши уровня ОС
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HotkeyId(pub u32);

impl fmt::Display for HotkeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Дополнительные кнопки мыши, которые можно назначать как горячие клавиши
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Middle,
    Side,
    Extra,
}

impl MouseButton {
    pub const BTN_MIDDLE: u16 = 0x112;
    pub const BTN_SIDE: u16 = 0x113;
    pub const BTN_EXTRA: u16 = 0x114;

    pub fn from_key_code(code: KeyCode) -> Option<Self> {
        match code.value() {
            Self::BTN_MIDDLE => Some(MouseButton::Middle),
            Self::BTN_SIDE => Some(MouseButton::Side),
            Self::BTN_EXTRA => Some(MouseButton::Extra),
            _ => None,
        }
    }

    pub fn key_code(&self) -> KeyCode {
        match self {
            MouseButton::Middle => KeyCode(Self::BTN_MIDDLE),
            MouseButton::Side => KeyCode(Self::BTN_SIDE),
            MouseButton::Extra => KeyCode(Self::BTN_EXTRA),
        }
    }
}

/// Сырые события, которые слушатели передают в главный цикл
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawInput {
    Hotkey(HotkeyId),
    Mouse { button: MouseButton, modifiers: Modifiers },
    Windows(WindowSnapshot),
    /// Пользователь сам переключился на окно (клик и т.п.)
    WindowActivated(WindowHandle),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mouse_button_codes() {
        for button in [MouseButton::Middle, MouseButton::Side, MouseButton::Extra] {
            assert_eq!(MouseButton::from_key_code(button.key_code()), Some(button));
        }
        assert_eq!(MouseButton::from_key_code(KeyCode(30)), None);
    }
}
