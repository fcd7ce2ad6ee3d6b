//! # Storage Module
//!
//! Key-value persistence for client state that must survive restarts: the
//! token pair and the notification history. Callers only see the
//! [`KeyValueStore`] trait, so the same logic runs against an in-memory map in
//! tests and a JSON file on disk in the CLI.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

/// String key-value persistence.
///
/// Operations never fail from the caller's point of view. Backends log their
/// own I/O problems and degrade to "value absent".
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}
