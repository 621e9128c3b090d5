pub mod manager;
pub mod retention;
pub mod store;
pub mod types;

pub use manager::MemoryManager;
pub use retention::RetentionPolicy;
pub use store::{DurableStore, FileStore, InMemoryStore, MemoryError};
pub use types::*;
