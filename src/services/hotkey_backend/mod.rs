//! Hotkey backends: the only place that talks to the platform's global hotkey namespace.
//!
//! Backends know nothing about characters, groups or profiles. They accept an id and a
//! chord, and either own that chord or refuse it.

mod dry_backend;
mod evdev_backend;
mod r#trait;

pub use self::dry_backend::DryRunHotkeyBackend;
pub use self::evdev_backend::{ChordTable, EvdevHotkeyBackend};
pub use self::r#trait::{create_hotkey_backend, HotkeyBackend};
