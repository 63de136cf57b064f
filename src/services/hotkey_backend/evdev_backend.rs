use crate::error::{HotkeyError, Result};
use crate::events::{Chord, HotkeyId};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::r#trait::HotkeyBackend;

/// Таблица точных сочетаний, общая для бэкенда (главный поток) и слушателя клавиатуры.
/// Пишет в неё только бэкенд.
#[derive(Debug, Clone, Default)]
pub struct ChordTable {
    chords: Arc<DashMap<Chord, HotkeyId>>,
}

impl ChordTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Точное совпадение сочетания, как у RegisterHotKey
    pub fn lookup(&self, chord: &Chord) -> Option<HotkeyId> {
        self.chords.get(chord).map(|entry| *entry.value())
    }

    pub fn len(&self) -> usize {
        self.chords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chords.is_empty()
    }
}

/// Бэкенд поверх evdev: сочетания сопоставляет поток `KeyboardListener`.
pub struct EvdevHotkeyBackend {
    table: ChordTable,
    owned: HashMap<HotkeyId, Chord>,
}

impl EvdevHotkeyBackend {
    pub fn new(table: ChordTable) -> Self {
        Self {
            table,
            owned: HashMap::new(),
        }
    }
}

impl HotkeyBackend for EvdevHotkeyBackend {
    fn name(&self) -> &'static str {
        "evdev"
    }

    fn register(&mut self, id: HotkeyId, chord: Chord) -> Result<()> {
        use dashmap::mapref::entry::Entry;

        match self.table.chords.entry(chord) {
            Entry::Occupied(_) => Err(HotkeyError::refused(chord)),
            Entry::Vacant(slot) => {
                slot.insert(id);
                self.owned.insert(id, chord);
                debug!("evdev: {} зарегистрировано как {}", chord, id);
                Ok(())
            }
        }
    }

    fn unregister(&mut self, id: HotkeyId) -> Result<()> {
        match self.owned.remove(&id) {
            Some(chord) => {
                self.table.chords.remove(&chord);
                Ok(())
            }
            None => Err(HotkeyError::Internal(format!("Горячая клавиша {} не зарегистрирована", id))),
        }
    }
}

impl Drop for EvdevHotkeyBackend {
    fn drop(&mut self) {
        for chord in self.owned.values() {
            self.table.chords.remove(chord);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{KeyCode, Modifiers};

    #[test]
    fn test_register_refuses_taken_chord() {
        let table = ChordTable::new();
        let mut backend = EvdevHotkeyBackend::new(table.clone());
        let chord = Chord::new(KeyCode(59), Modifiers::new().with_ctrl(true));

        assert!(backend.register(HotkeyId(1), chord).is_ok());
        assert!(matches!(backend.register(HotkeyId(2), chord), Err(HotkeyError::Refused { .. })));
        assert_eq!(table.lookup(&chord), Some(HotkeyId(1)));

        backend.unregister(HotkeyId(1)).unwrap();
        assert!(table.is_empty());
        assert!(backend.unregister(HotkeyId(1)).is_err());
    }

    #[test]
    fn test_drop_releases_chords() {
        let table = ChordTable::new();
        {
            let mut backend = EvdevHotkeyBackend::new(table.clone());
            backend.register(HotkeyId(7), Chord::new(KeyCode(2), Modifiers::new())).unwrap();
            assert_eq!(table.len(), 1);
        }
        assert!(table.is_empty());
    }
}
