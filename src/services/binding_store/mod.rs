pub mod memory_store;
pub mod r#trait;
pub mod toml_store;

pub use memory_store::MemoryBindingStore;
pub use r#trait::{BindingStore, StoreDocument, StoredProfile};
pub use toml_store::TomlBindingStore;
