use crate::events::Modifiers;
use evdev::KeyCode;

/// Зажатые модификаторы. Левая и правая клавиши учитываются отдельно:
/// отпускание одной не сбрасывает модификатор, пока зажата другая.
/// Meta в сочетания не входит, но отслеживается: с ней привязки не срабатывают.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ModifierState {
    left_ctrl: bool,
    right_ctrl: bool,
    left_alt: bool,
    right_alt: bool,
    left_shift: bool,
    right_shift: bool,
    left_meta: bool,
    right_meta: bool,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_modifiers(&self) -> Modifiers {
        Modifiers::new()
            .with_ctrl(self.left_ctrl || self.right_ctrl)
            .with_alt(self.left_alt || self.right_alt)
            .with_shift(self.left_shift || self.right_shift)
    }

    pub fn meta_held(&self) -> bool {
        self.left_meta || self.right_meta
    }

    /// Обновить состояние. Возвращает true, если клавиша была модификатором.
    pub fn update_key(&mut self, key: KeyCode, pressed: bool) -> bool {
        let slot = match key {
            KeyCode::KEY_LEFTCTRL => &mut self.left_ctrl,
            KeyCode::KEY_RIGHTCTRL => &mut self.right_ctrl,
            KeyCode::KEY_LEFTALT => &mut self.left_alt,
            KeyCode::KEY_RIGHTALT => &mut self.right_alt,
            KeyCode::KEY_LEFTSHIFT => &mut self.left_shift,
            KeyCode::KEY_RIGHTSHIFT => &mut self.right_shift,
            KeyCode::KEY_LEFTMETA => &mut self.left_meta,
            KeyCode::KEY_RIGHTMETA => &mut self.right_meta,
            _ => return false,
        };
        *slot = pressed;
        true
    }

    pub fn is_modifier(key: KeyCode) -> bool {
        matches!(
            key,
            KeyCode::KEY_LEFTCTRL
                | KeyCode::KEY_RIGHTCTRL
                | KeyCode::KEY_LEFTALT
                | KeyCode::KEY_RIGHTALT
                | KeyCode::KEY_LEFTSHIFT
                | KeyCode::KEY_RIGHTSHIFT
                | KeyCode::KEY_LEFTMETA
                | KeyCode::KEY_RIGHTMETA
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modifier_tracking() {
        let mut state = ModifierState::new();
        assert!(state.to_modifiers().is_empty());

        assert!(state.update_key(KeyCode::KEY_LEFTCTRL, true));
        assert!(state.update_key(KeyCode::KEY_RIGHTSHIFT, true));
        assert_eq!(state.to_modifiers(), Modifiers::new().with_ctrl(true).with_shift(true));

        assert!(!state.update_key(KeyCode::KEY_A, true));
        assert!(!ModifierState::is_modifier(KeyCode::KEY_CAPSLOCK));
    }

    #[test]
    fn test_meta_tracked_outside_modifiers() {
        let mut state = ModifierState::new();
        assert!(state.update_key(KeyCode::KEY_RIGHTMETA, true));
        assert!(state.meta_held());
        assert!(state.to_modifiers().is_empty());

        state.update_key(KeyCode::KEY_RIGHTMETA, false);
        assert!(!state.meta_held());
    }

    #[test]
    fn test_both_sides_held() {
        let mut state = ModifierState::new();
        state.update_key(KeyCode::KEY_LEFTALT, true);
        state.update_key(KeyCode::KEY_RIGHTALT, true);
        state.update_key(KeyCode::KEY_LEFTALT, false);
        assert!(state.to_modifiers().alt);

        state.update_key(KeyCode::KEY_RIGHTALT, false);
        assert!(!state.to_modifiers().alt);
    }
}
