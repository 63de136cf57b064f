use crate::error::{HotkeyError, Result};
use crate::events::{Chord, HotkeyId};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::info;

use super::r#trait::HotkeyBackend;

#[derive(Debug, Default)]
struct DryRunState {
    registered: BTreeMap<HotkeyId, Chord>,
    // Сочетания, которые якобы принадлежат другому процессу
    occupied: HashSet<Chord>,
    attempts: usize,
}

/// Бэкенд без реальной регистрации. Клоны разделяют состояние, так что тест
/// может держать у себя копию и смотреть, что зарегистрировал реестр.
#[derive(Debug, Clone, Default)]
pub struct DryRunHotkeyBackend {
    state: Arc<Mutex<DryRunState>>,
}

impl DryRunHotkeyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Пометить сочетание как занятое чужим процессом
    pub fn occupy(&self, chord: Chord) {
        self.state.lock().occupied.insert(chord);
    }

    pub fn attempts(&self) -> usize {
        self.state.lock().attempts
    }

    pub fn registered_count(&self) -> usize {
        self.state.lock().registered.len()
    }

    pub fn is_registered(&self, chord: Chord) -> bool {
        self.state.lock().registered.values().any(|c| *c == chord)
    }

    /// Идентификаторы, под которыми зарегистрировано сочетание (по возрастанию)
    pub fn ids_for(&self, chord: Chord) -> Vec<HotkeyId> {
        self.state
            .lock()
            .registered
            .iter()
            .filter(|(_, c)| **c == chord)
            .map(|(id, _)| *id)
            .collect()
    }

    /// Первый идентификатор сочетания, как будто ОС доставила нажатие
    pub fn id_for(&self, chord: Chord) -> Option<HotkeyId> {
        self.ids_for(chord).into_iter().next()
    }
}

impl HotkeyBackend for DryRunHotkeyBackend {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    fn register(&mut self, id: HotkeyId, chord: Chord) -> Result<()> {
        let mut state = self.state.lock();
        state.attempts += 1;

        if state.occupied.contains(&chord) {
            return Err(HotkeyError::refused(chord));
        }

        state.registered.insert(id, chord);
        info!("[DRY RUN] Регистрация {} как {}", chord, id);
        Ok(())
    }

    fn unregister(&mut self, id: HotkeyId) -> Result<()> {
        match self.state.lock().registered.remove(&id) {
            Some(_) => Ok(()),
            None => Err(HotkeyError::Internal(format!("Горячая клавиша {} не зарегистрирована", id))),
        }
    }
}
