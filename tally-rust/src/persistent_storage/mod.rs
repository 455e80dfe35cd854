pub mod durable_slot;
pub mod durable_storage_trait;
pub mod in_memory_storage;

// depends on file locking, which is unavailable on any wasm target:
#[cfg(not(target_family = "wasm"))]
pub mod local_file_storage;

pub use durable_slot::DurableSlot;
pub use durable_storage_trait::DurableStorage;
pub use in_memory_storage::InMemoryStorage;
#[cfg(not(target_family = "wasm"))]
pub use local_file_storage::LocalFileStorage;
