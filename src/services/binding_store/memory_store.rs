use crate::error::Result;
use std::collections::BTreeMap;

use super::r#trait::{BindingStore, StoreDocument, StoredProfile};

/// Хранилище в памяти: dry-run и тесты
#[derive(Debug, Clone, Default)]
pub struct MemoryBindingStore {
    document: StoreDocument,
}

impl MemoryBindingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_document(document: StoreDocument) -> Self {
        Self { document }
    }
}

impl BindingStore for MemoryBindingStore {
    fn load(&self, profile: &str) -> Result<Option<StoredProfile>> {
        Ok(self.document.profiles.get(profile).cloned())
    }

    fn save(&mut self, profile: &str, stored: &StoredProfile) -> Result<()> {
        self.document.profiles.insert(profile.to_string(), stored.clone());
        Ok(())
    }

    fn profile_hotkeys(&self) -> Result<BTreeMap<String, String>> {
        Ok(self.document.profile_hotkeys.clone())
    }

    fn save_profile_hotkeys(&mut self, hotkeys: &BTreeMap<String, String>) -> Result<()> {
        self.document.profile_hotkeys = hotkeys.clone();
        Ok(())
    }

    fn profile_names(&self) -> Result<Vec<String>> {
        Ok(self.document.profiles.keys().cloned().collect())
    }
}
