pub mod dry_window_system;
pub mod r#trait;
pub mod window_poller;
pub mod window_registry;
pub mod xdotool;

pub use dry_window_system::DryRunWindowSystem;
pub use r#trait::{create_window_system, ForegroundQuery, WindowActivator, WindowResolver, WindowSource};
pub use window_poller::WindowPoller;
pub use window_registry::{WindowClassifier, WindowRegistry};
