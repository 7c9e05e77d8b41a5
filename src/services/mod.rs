// Service exports
pub mod backend;
pub mod cache;
pub mod feedback;
pub mod storage;

pub use backend::{BackendError, BackendSync, HttpBackend};
pub use cache::RedisStore;
pub use feedback::{Haptics, LogNotifier, NoopHaptics, Notifier};
pub use storage::{load_json, save_json, KeyValueStore, MemoryStore, StorageError, StorageKey};
