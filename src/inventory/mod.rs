//! In-memory inventory state and its derived view.
//!
//! `Inventory` owns the record collection for a session and applies user
//! intents (add, remove, sort, page, save). `view` turns the collection into
//! the sorted, paginated, aggregated projection the presentation layer shows.

mod state;
pub mod view;

pub use state::{
    Inventory, InventoryConfig, Mutation, PersistPolicy, Startup, StartupSource,
    DEFAULT_SAVE_LATENCY,
};
pub use view::{derive_view, format_usd, InventoryView, ViewParams, DEFAULT_PAGE_SIZE};
