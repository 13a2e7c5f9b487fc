//! Seed data used when nothing usable is stored.

use crate::error::Result;
use crate::types::Record;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Simulated latency of the mock remote source.
pub const DEFAULT_SEED_DELAY: Duration = Duration::from_millis(500);

/// Source of the initial record set.
#[async_trait]
pub trait SeedSource: Send + Sync {
    /// Fetch the initial records. Not cancelable once started.
    async fn fetch_initial(&self) -> Result<Vec<Record>>;
}

/// The two records every fresh inventory starts with.
pub fn initial_records() -> Vec<Record> {
    vec![
        Record::new("1", "Engine Oil Filter", 50.0, 12.99),
        Record::new("2", "Brake Pads", 25.0, 45.50),
    ]
}

/// Stand-in for a remote API: returns `initial_records()` after a fixed delay.
#[derive(Clone, Debug)]
pub struct MockSeedSource {
    delay: Duration,
}

impl MockSeedSource {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

impl Default for MockSeedSource {
    fn default() -> Self {
        Self::new(DEFAULT_SEED_DELAY)
    }
}

#[async_trait]
impl SeedSource for MockSeedSource {
    async fn fetch_initial(&self) -> Result<Vec<Record>> {
        tokio::time::sleep(self.delay).await;
        let records = initial_records();
        debug!(count = records.len(), "fetched seed records");
        Ok(records)
    }
}
