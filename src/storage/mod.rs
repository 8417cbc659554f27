// src/storage/mod.rs

pub mod entry;
pub mod file;
pub mod memory;
pub mod traits;

pub use entry::StoredEntry;
pub use file::FileStore;
pub use memory::InMemoryStore;
pub use traits::KeyValueStore;
