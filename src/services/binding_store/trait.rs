use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Сохранённые привязки одного профиля в строковом виде.
///
/// Списки привязок: `enabled,key,ctrl,alt,shift` через `|`.
/// Группа: `members|forward|backward|includeNotLoggedIn|noLoop`, привязки направлений через `;`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoredProfile {
    pub suspend: String,
    pub close_all: String,
    pub not_logged_in_forward: String,
    pub not_logged_in_backward: String,
    pub other_forward: String,
    pub other_backward: String,
    pub characters: BTreeMap<String, String>,
    pub cycle_groups: BTreeMap<String, String>,
}

/// Содержимое хранилища целиком: профили и общие для всех профилей привязки переключения
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreDocument {
    pub profile_hotkeys: BTreeMap<String, String>,
    pub profiles: BTreeMap<String, StoredProfile>,
}

/// Постоянное хранилище привязок
pub trait BindingStore: Send {
    /// `None`, если профиль ещё ни разу не сохранялся
    fn load(&self, profile: &str) -> Result<Option<StoredProfile>>;

    fn save(&mut self, profile: &str, stored: &StoredProfile) -> Result<()>;

    /// Привязки переключения профилей (общие)
    fn profile_hotkeys(&self) -> Result<BTreeMap<String, String>>;

    fn save_profile_hotkeys(&mut self, hotkeys: &BTreeMap<String, String>) -> Result<()>;

    fn profile_names(&self) -> Result<Vec<String>>;
}
