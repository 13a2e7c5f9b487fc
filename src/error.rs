//! Error types for the inventory.

use thiserror::Error;

/// Main error type for inventory and storage operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage quota exceeded: needed {needed} bytes, quota is {quota}")]
    QuotaExceeded { needed: usize, quota: usize },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    #[error("Slot directory is locked by another process")]
    Locked,

    #[error("Seed source unavailable: {0}")]
    SeedUnavailable(String),
}

impl InventoryError {
    /// Whether this error came from the underlying storage (write/read or quota).
    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            InventoryError::Io(_)
                | InventoryError::QuotaExceeded { .. }
                | InventoryError::Serialization(_)
                | InventoryError::Locked
        )
    }
}

impl From<serde_json::Error> for InventoryError {
    fn from(e: serde_json::Error) -> Self {
        InventoryError::Serialization(e.to_string())
    }
}

/// Result type for inventory operations.
pub type Result<T> = std::result::Result<T, InventoryError>;
