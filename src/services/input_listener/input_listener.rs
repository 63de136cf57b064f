use crate::error::Result;
use crate::events::{Chord, KeyCode, MouseButton, RawInput};
use crate::hotkey_error;
use crate::services::hotkey_backend::ChordTable;
use crate::trace_if_enabled;
use evdev::{Device, EventType, InputEvent};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info};

use super::modifier_state::ModifierState;

const KEY_RELEASED: i32 = 0;
const KEY_PRESSED: i32 = 1;

/// Чтение одного устройства evdev в отдельном потоке.
///
/// Устройство не захватывается: нажатия доходят до приложений как обычно,
/// слушатель только сопоставляет их с зарегистрированными сочетаниями.
/// Состояние модификаторов общее для клавиатуры и мыши.
pub struct InputListener {
    device_name: String,
    chords: ChordTable,
    modifiers: Arc<RwLock<ModifierState>>,
    sender: UnboundedSender<RawInput>,
}

impl InputListener {
    pub fn new(
        device_name: impl Into<String>,
        chords: ChordTable,
        modifiers: Arc<RwLock<ModifierState>>,
        sender: UnboundedSender<RawInput>,
    ) -> Self {
        Self {
            device_name: device_name.into(),
            chords,
            modifiers,
            sender,
        }
    }

    /// Открыть устройство и запустить поток чтения
    pub fn spawn(
        device_path: &Path,
        chords: ChordTable,
        modifiers: Arc<RwLock<ModifierState>>,
        sender: UnboundedSender<RawInput>,
    ) -> Result<JoinHandle<()>> {
        let device = Device::open(device_path).map_err(|e| {
            hotkey_error!(device_not_found, "Не удалось открыть устройство {:?}: {}", device_path, e)
        })?;

        let device_name = device.name().unwrap_or("Unknown").to_string();
        info!("Слушаем устройство {:?} ({})", device_path, device_name);

        let listener = Self::new(device_name.clone(), chords, modifiers, sender);

        std::thread::Builder::new()
            .name(format!("input-{}", device_name))
            .spawn(move || listener.run(device))
            .map_err(|e| hotkey_error!(internal, "Не удалось запустить поток слушателя: {}", e))
    }

    fn run(self, mut device: Device) {
        loop {
            let events: Vec<InputEvent> = match device.fetch_events() {
                Ok(events) => events.collect(),
                Err(e) => {
                    error!("Ошибка чтения событий {}: {}", self.device_name, e);
                    std::thread::sleep(Duration::from_millis(100));
                    continue;
                }
            };

            for event in events {
                if event.event_type() != EventType::KEY {
                    continue;
                }

                let Some(input) = self.process_key(event.code(), event.value()) else {
                    continue;
                };

                if self.sender.send(input).is_err() {
                    info!("Главный цикл завершён, слушатель {} остановлен", self.device_name);
                    return;
                }
            }
        }
    }

    /// Одно событие клавиши -> сырое событие для главного цикла.
    /// Автоповтор не порождает повторных срабатываний.
    pub fn process_key(&self, code: u16, value: i32) -> Option<RawInput> {
        let key = evdev::KeyCode::new(code);

        if ModifierState::is_modifier(key) {
            if value == KEY_PRESSED || value == KEY_RELEASED {
                self.modifiers.write().update_key(key, value == KEY_PRESSED);
            }
            return None;
        }

        if value != KEY_PRESSED {
            return None;
        }

        let modifiers = {
            let state = self.modifiers.read();
            if state.meta_held() {
                trace_if_enabled!("Зажата Meta, код {} пропущен", code);
                return None;
            }
            state.to_modifiers()
        };

        if let Some(button) = MouseButton::from_key_code(KeyCode(code)) {
            trace_if_enabled!("Кнопка мыши {:?} ({})", button, modifiers);
            return Some(RawInput::Mouse { button, modifiers });
        }

        let chord = Chord::new(KeyCode(code), modifiers);
        let id = self.chords.lookup(&chord)?;
        debug!("Сочетание {} -> {}", chord, id);
        Some(RawInput::Hotkey(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{HotkeyId, Modifiers};
    use crate::services::hotkey_backend::{EvdevHotkeyBackend, HotkeyBackend};
    use tokio::sync::mpsc;

    const KEY_1: u16 = 2;

    fn listener() -> (InputListener, EvdevHotkeyBackend) {
        let chords = ChordTable::new();
        let backend = EvdevHotkeyBackend::new(chords.clone());
        let (tx, _rx) = mpsc::unbounded_channel();
        let listener = InputListener::new("test", chords, Arc::new(RwLock::new(ModifierState::new())), tx);
        (listener, backend)
    }

    #[test]
    fn test_exact_chord_match() {
        let (listener, mut backend) = listener();
        backend
            .register(HotkeyId(7), Chord::new(KeyCode(KEY_1), Modifiers::new().with_ctrl(true)))
            .unwrap();

        assert_eq!(listener.process_key(KEY_1, KEY_PRESSED), None);

        listener.process_key(evdev::KeyCode::KEY_LEFTCTRL.code(), KEY_PRESSED);
        assert_eq!(listener.process_key(KEY_1, KEY_PRESSED), Some(RawInput::Hotkey(HotkeyId(7))));
        // Автоповтор и отпускание игнорируются
        assert_eq!(listener.process_key(KEY_1, 2), None);
        assert_eq!(listener.process_key(KEY_1, KEY_RELEASED), None);

        listener.process_key(evdev::KeyCode::KEY_LEFTSHIFT.code(), KEY_PRESSED);
        assert_eq!(listener.process_key(KEY_1, KEY_PRESSED), None);
    }

    #[test]
    fn test_mouse_buttons_carry_modifiers() {
        let (listener, _backend) = listener();
        listener.process_key(evdev::KeyCode::KEY_RIGHTALT.code(), KEY_PRESSED);

        assert_eq!(
            listener.process_key(MouseButton::BTN_SIDE, KEY_PRESSED),
            Some(RawInput::Mouse {
                button: MouseButton::Side,
                modifiers: Modifiers::new().with_alt(true)
            })
        );
        assert_eq!(listener.process_key(MouseButton::BTN_SIDE, KEY_RELEASED), None);
        // Левая кнопка не назначается
        assert_eq!(listener.process_key(0x110, KEY_PRESSED), None);
    }

    #[test]
    fn test_meta_suppresses_plain_binding() {
        let (listener, mut backend) = listener();
        let f1 = evdev::KeyCode::KEY_F1.code();
        backend.register(HotkeyId(3), Chord::new(KeyCode(f1), Modifiers::new())).unwrap();

        listener.process_key(evdev::KeyCode::KEY_LEFTMETA.code(), KEY_PRESSED);
        assert_eq!(listener.process_key(f1, KEY_PRESSED), None);
        assert_eq!(listener.process_key(MouseButton::BTN_SIDE, KEY_PRESSED), None);

        listener.process_key(evdev::KeyCode::KEY_LEFTMETA.code(), KEY_RELEASED);
        assert_eq!(listener.process_key(f1, KEY_PRESSED), Some(RawInput::Hotkey(HotkeyId(3))));
    }
}
