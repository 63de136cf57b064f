pub mod action;
pub mod binding;
pub mod input;
pub mod window;

pub use action::{Direction, DispatchOutcome, HotkeyAction, PoolKind, TargetId};
pub use binding::{Binding, BindingList, Chord, KeyCode, Modifiers};
pub use input::{HotkeyId, MouseButton, RawInput};
pub use window::{WindowHandle, WindowInfo, WindowSnapshot};
