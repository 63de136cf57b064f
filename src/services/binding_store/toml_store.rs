use crate::error::Result;
use crate::hotkey_error;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::r#trait::{BindingStore, StoreDocument, StoredProfile};

/// Файл привязок в формате TOML:
///
/// ```toml
/// [profile_hotkeys]
/// PvP = "1,59,0,0,0"
///
/// [profiles.Default]
/// suspend = "1,70,0,0,0"
///
/// [profiles.Default.characters]
/// Alice = "1,2,0,0,0|1,79,0,0,0"
///
/// [profiles.Default.cycle_groups]
/// Main = "Alice,Bob|1,15,0,0,0|1,15,0,0,1|0|0"
/// ```
pub struct TomlBindingStore {
    path: PathBuf,
}

impl TomlBindingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Прочитать файл целиком. Отсутствующий файл читается как пустой.
    pub fn read_document(&self) -> Result<StoreDocument> {
        if !self.path.exists() {
            debug!("Файл привязок {:?} не найден, используем пустой", self.path);
            return Ok(StoreDocument::default());
        }

        let raw = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&raw)?)
    }

    fn write_document(&self, document: &StoreDocument) -> Result<()> {
        let raw = toml::to_string_pretty(document)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Запись через временный файл, чтобы не оставить файл наполовину записанным
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, raw)?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| hotkey_error!(store, "не удалось заменить {:?}: {}", self.path, e))?;

        debug!("Файл привязок {:?} записан", self.path);
        Ok(())
    }

    fn update(&self, change: impl FnOnce(&mut StoreDocument)) -> Result<()> {
        let mut document = self.read_document()?;
        change(&mut document);
        self.write_document(&document)
    }
}

impl BindingStore for TomlBindingStore {
    fn load(&self, profile: &str) -> Result<Option<StoredProfile>> {
        Ok(self.read_document()?.profiles.remove(profile))
    }

    fn save(&mut self, profile: &str, stored: &StoredProfile) -> Result<()> {
        self.update(|document| {
            document.profiles.insert(profile.to_string(), stored.clone());
        })?;
        info!("Профиль '{}' сохранён в {:?}", profile, self.path);
        Ok(())
    }

    fn profile_hotkeys(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.read_document()?.profile_hotkeys)
    }

    fn save_profile_hotkeys(&mut self, hotkeys: &BTreeMap<String, String>) -> Result<()> {
        self.update(|document| document.profile_hotkeys = hotkeys.clone())
    }

    fn profile_names(&self) -> Result<Vec<String>> {
        Ok(self.read_document()?.profiles.into_keys().collect())
    }
}
