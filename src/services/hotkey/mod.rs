//! Ядро горячих клавиш: реестр идентификаторов, маршрутизация событий,
//! циклы по окнам и поиск конфликтов привязок.

pub mod binding_registry;
pub mod conflict_resolver;
pub mod cycle_engine;
pub mod dispatch_router;
pub mod hotkey_manager;
pub mod profile;

pub use hotkey_manager::HotkeyManager;
