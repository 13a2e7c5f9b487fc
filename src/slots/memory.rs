//! In-memory slots with an optional byte quota.

use crate::error::{InventoryError, Result};
use parking_lot::Mutex;
use std::collections::HashMap;

use super::SlotBackend;

/// Slots kept in process memory.
///
/// With a quota, a write that would push the total size of keys and values
/// past the limit fails with `QuotaExceeded` and leaves the old value in place.
#[derive(Default)]
pub struct MemorySlots {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemorySlots {
    /// Create unbounded in-memory slots.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create in-memory slots limited to `quota` bytes.
    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }

    /// Whether `key` currently holds a value.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.lock().contains_key(key)
    }

    /// Total bytes used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl SlotBackend for MemorySlots {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock();

        if let Some(quota) = self.quota {
            let others: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = others + key.len() + value.len();
            if needed > quota {
                return Err(InventoryError::QuotaExceeded { needed, quota });
            }
        }

        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let slots = MemorySlots::new();
        assert_eq!(slots.get("k").unwrap(), None);

        slots.set("k", "v1").unwrap();
        slots.set("k", "v2").unwrap();
        assert_eq!(slots.get("k").unwrap().as_deref(), Some("v2"));

        slots.remove("k").unwrap();
        assert!(!slots.contains("k"));
        slots.remove("k").unwrap();
    }

    #[test]
    fn test_quota_rejects_and_keeps_old_value() {
        let slots = MemorySlots::with_quota(8);
        slots.set("k", "small").unwrap();

        let result = slots.set("k", "much too large");
        assert!(matches!(
            result,
            Err(InventoryError::QuotaExceeded { quota: 8, .. })
        ));
        assert_eq!(slots.get("k").unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn test_quota_counts_replaced_value_once() {
        let slots = MemorySlots::with_quota(6);
        slots.set("k", "abcde").unwrap();
        slots.set("k", "vwxyz").unwrap();
        assert_eq!(slots.used_bytes(), 6);
    }
}
