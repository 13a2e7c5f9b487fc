//! Fan-out of notices to subscribers.

use crossbeam_channel::{bounded, Sender, TrySendError};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

use super::types::{Notice, NoticeHandle, SubscriberId};

/// Default per-subscriber buffer.
pub const DEFAULT_NOTICE_BUFFER: usize = 64;

/// Broadcasts notices to every live subscriber.
pub struct NoticeBoard {
    subscribers: RwLock<HashMap<SubscriberId, Sender<Notice>>>,
    next_id: AtomicU64,
    buffer_size: usize,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_NOTICE_BUFFER)
    }

    /// Create a board whose subscribers buffer at most `buffer_size` notices.
    pub fn with_buffer_size(buffer_size: usize) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Open a new feed.
    pub fn subscribe(&self) -> NoticeHandle {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let (sender, receiver) = bounded(self.buffer_size);
        self.subscribers.write().insert(id, sender);
        NoticeHandle { id, receiver }
    }

    /// Close a feed.
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.subscribers.write().remove(&id);
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Send `notice` to every subscriber. Subscribers with a full buffer or a
    /// dropped receiver are removed.
    pub fn publish(&self, notice: Notice) {
        let mut to_remove = Vec::new();

        {
            let subs = self.subscribers.read();
            for (id, sender) in subs.iter() {
                match sender.try_send(notice.clone()) {
                    Ok(()) => {}
                    Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                        to_remove.push(*id);
                    }
                }
            }
        }

        if !to_remove.is_empty() {
            let mut subs = self.subscribers.write();
            for id in to_remove {
                debug!(subscriber = id.0, "dropping notice subscriber");
                subs.remove(&id);
            }
        }
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscribe_unsubscribe() {
        let board = NoticeBoard::new();

        let handle = board.subscribe();
        assert_eq!(board.subscriber_count(), 1);

        board.unsubscribe(handle.id);
        assert_eq!(board.subscriber_count(), 0);
    }

    #[test]
    fn test_publish_reaches_all() {
        let board = NoticeBoard::new();
        let a = board.subscribe();
        let b = board.subscribe();

        board.publish(Notice::Saved { count: 2 });

        assert_eq!(a.try_recv().unwrap(), Notice::Saved { count: 2 });
        assert_eq!(b.try_recv().unwrap(), Notice::Saved { count: 2 });
    }

    #[test]
    fn test_drop_slow_subscriber() {
        let board = NoticeBoard::with_buffer_size(2);
        let slow = board.subscribe();

        for i in 0..3 {
            board.publish(Notice::Deleted { id: i.to_string() });
        }

        assert_eq!(board.subscriber_count(), 0);
        // Buffered notices are still readable, then the feed is closed
        assert_eq!(slow.drain().len(), 2);
        assert!(slow.recv().is_err());
    }

    #[test]
    fn test_drop_disconnected_subscriber() {
        let board = NoticeBoard::new();
        let handle = board.subscribe();
        drop(handle);

        board.publish(Notice::Saved { count: 0 });
        assert_eq!(board.subscriber_count(), 0);
    }
}
