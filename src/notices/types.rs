//! Notice types.

use serde::{Deserialize, Serialize};

/// Something the user should be told about.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notice {
    /// A record was added to the in-memory inventory.
    Added { name: String },

    /// A record was deleted.
    Deleted { id: String },

    /// The inventory was persisted.
    Saved { count: usize },

    /// Persisting failed; in-memory data is unchanged.
    SaveFailed { reason: String },

    /// Startup could not load data; the inventory starts empty.
    LoadFailed { reason: String },
}

/// How a notice should be presented.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

impl Notice {
    pub fn level(&self) -> NoticeLevel {
        match self {
            Notice::Added { .. } | Notice::Saved { .. } => NoticeLevel::Success,
            Notice::Deleted { .. } => NoticeLevel::Info,
            Notice::SaveFailed { .. } | Notice::LoadFailed { .. } => NoticeLevel::Error,
        }
    }

    /// Short human-readable text.
    pub fn message(&self) -> String {
        match self {
            Notice::Added { name } => format!("Added \"{}\" to inventory", name),
            Notice::Deleted { .. } => "Part deleted".to_string(),
            Notice::Saved { .. } => "Save successful!".to_string(),
            Notice::SaveFailed { .. } => "Failed to save parts data".to_string(),
            Notice::LoadFailed { .. } => "Failed to load parts data".to_string(),
        }
    }
}

/// Unique identifier for a notice subscriber.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriberId(pub u64);

/// Receiving end of a notice feed.
pub struct NoticeHandle {
    pub id: SubscriberId,
    /// Channel to receive notices.
    pub receiver: crossbeam_channel::Receiver<Notice>,
}

impl NoticeHandle {
    /// Receive the next notice (blocking).
    pub fn recv(&self) -> Result<Notice, crossbeam_channel::RecvError> {
        self.receiver.recv()
    }

    /// Try to receive a notice (non-blocking).
    pub fn try_recv(&self) -> Result<Notice, crossbeam_channel::TryRecvError> {
        self.receiver.try_recv()
    }

    /// Take every notice currently buffered.
    pub fn drain(&self) -> Vec<Notice> {
        self.receiver.try_iter().collect()
    }
}
