//! # Parts Inventory
//!
//! A small parts inventory backed by a single persistent key-value slot.
//!
//! ## Core Concepts
//!
//! - **Records**: inventory items with name, quantity, price and an opaque id
//! - **Envelope**: the stored form of the whole collection, either a bare
//!   array (legacy) or `{ parts, timestamp }` (current)
//! - **Record store**: reconciles whatever is in the slot on load (format
//!   detection, expiry, validation filtering) and surfaces save failures
//! - **Inventory**: the in-memory collection plus sort and page state, with a
//!   derived view (sort, paginate, aggregate)
//!
//! ## Example
//!
//! ```ignore
//! use parts_inventory::{
//!     FileSlots, Inventory, InventoryConfig, MockSeedSource, RecordInput, RecordStore,
//!     SortKey, StoreConfig,
//! };
//! use std::sync::Arc;
//!
//! let slots = Arc::new(FileSlots::open("./inventory")?);
//! let store = RecordStore::new(slots, StoreConfig::default());
//! let mut inventory =
//!     Inventory::bootstrap(store, &MockSeedSource::default(), InventoryConfig::default()).await;
//!
//! inventory.add(RecordInput::new("Spark Plug", 10.0, 3.00))?;
//! inventory.set_sort(SortKey::Price);
//!
//! let view = inventory.derive_view();
//! println!("page {} of {}, total {}", view.current_page, view.total_pages,
//!     parts_inventory::format_usd(view.total_value));
//!
//! inventory.persist_now().await?;
//! ```

pub mod error;
pub mod inventory;
pub mod notices;
pub mod seed;
pub mod slots;
pub mod store;
pub mod types;

// Re-exports
pub use error::{InventoryError, Result};
pub use inventory::{
    derive_view, format_usd, Inventory, InventoryConfig, InventoryView, Mutation, PersistPolicy,
    Startup, StartupSource, ViewParams,
};
pub use notices::{Notice, NoticeBoard, NoticeHandle, NoticeLevel, SubscriberId};
pub use seed::{initial_records, MockSeedSource, SeedSource};
pub use slots::{FileSlots, MemorySlots, SlotBackend};
pub use store::{EnvelopeFormat, LoadOutcome, LoadReport, RecordStore, StoreConfig};
pub use types::*;
