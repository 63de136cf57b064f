mod input_listener;
mod modifier_state;

pub use self::input_listener::InputListener;
pub use self::modifier_state::ModifierState;
