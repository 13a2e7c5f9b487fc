//! User-facing notices about inventory changes.
//!
//! The presentation layer subscribes to a feed of notices (record added,
//! record deleted, save succeeded or failed, load failed) and renders them
//! however it likes. Feeds are bounded; a subscriber that stops draining its
//! buffer is dropped rather than blocking the inventory.
//!
//! # Example
//!
//! ```ignore
//! let handle = inventory.subscribe();
//! inventory.add(RecordInput::new("Spark Plug", 10.0, 3.0))?;
//!
//! while let Ok(notice) = handle.try_recv() {
//!     println!("[{:?}] {}", notice.level(), notice.message());
//! }
//! ```

mod board;
mod types;

pub use board::NoticeBoard;
pub use types::{Notice, NoticeHandle, NoticeLevel, SubscriberId};
