use crate::error::Result;
use crate::events::{Chord, HotkeyId};

use super::{ChordTable, DryRunHotkeyBackend, EvdevHotkeyBackend};

/// Граница с ОС: единое пространство идентификаторов глобальных горячих клавиш.
///
/// Регистрация может быть отклонена, если сочетание уже занято (`HotkeyError::Refused`).
pub trait HotkeyBackend: Send {
    fn name(&self) -> &'static str;

    fn register(&mut self, id: HotkeyId, chord: Chord) -> Result<()>;

    fn unregister(&mut self, id: HotkeyId) -> Result<()>;
}

/// Factory function to create an appropriate hotkey backend based on the dry_run flag
pub fn create_hotkey_backend(chord_table: &ChordTable, dry_run: bool) -> Box<dyn HotkeyBackend> {
    if dry_run {
        Box::new(DryRunHotkeyBackend::new())
    } else {
        Box::new(EvdevHotkeyBackend::new(chord_table.clone()))
    }
}
