//! Persistent key-value slots.
//!
//! A slot holds one UTF-8 string under a key, the way browser local storage
//! does. The record store only ever reads, writes and removes whole values.

mod file;
mod memory;

pub use file::FileSlots;
pub use memory::MemorySlots;

use crate::error::Result;

/// Backend for string slots addressed by key.
pub trait SlotBackend: Send + Sync {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
