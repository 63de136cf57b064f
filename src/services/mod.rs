pub mod binding_store;
pub mod hotkey;
pub mod hotkey_backend;
pub mod input_listener;
pub mod window_system;

pub use binding_store::{BindingStore, MemoryBindingStore, TomlBindingStore};
pub use hotkey::HotkeyManager;
pub use hotkey_backend::{create_hotkey_backend, ChordTable};
pub use input_listener::{InputListener, ModifierState};
pub use window_system::{create_window_system, WindowPoller, WindowRegistry};
