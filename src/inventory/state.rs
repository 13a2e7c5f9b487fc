//! The in-memory inventory and the intents that change it.

use crate::error::Result;
use crate::notices::{Notice, NoticeBoard, NoticeHandle};
use crate::seed::SeedSource;
use crate::store::{LoadOutcome, RecordStore};
use crate::types::{Record, RecordInput, SortKey, SortOrder, Timestamp};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

use super::view::{self, InventoryView, ViewParams, DEFAULT_PAGE_SIZE};

/// Simulated latency of an explicit save.
pub const DEFAULT_SAVE_LATENCY: Duration = Duration::from_millis(300);

/// In-memory mutations that may trigger persistence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutation {
    Add,
    Remove,
}

/// Which mutations persist the collection without an explicit save.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PersistPolicy {
    /// Only deletes persist immediately; adds wait for an explicit save.
    #[default]
    OnDelete,
    /// Every mutation persists immediately.
    OnEveryMutation,
    /// Nothing persists until an explicit save.
    ExplicitOnly,
}

impl PersistPolicy {
    pub fn persists_after(self, mutation: Mutation) -> bool {
        match self {
            PersistPolicy::OnDelete => mutation == Mutation::Remove,
            PersistPolicy::OnEveryMutation => true,
            PersistPolicy::ExplicitOnly => false,
        }
    }
}

/// Inventory configuration.
#[derive(Clone, Debug)]
pub struct InventoryConfig {
    /// Records per page.
    pub page_size: usize,

    /// Which mutations persist on their own.
    pub persist_policy: PersistPolicy,

    /// Delay before an explicit save reports success.
    pub save_latency: Duration,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            persist_policy: PersistPolicy::default(),
            save_latency: DEFAULT_SAVE_LATENCY,
        }
    }
}

/// Where the startup collection came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StartupSource {
    /// Non-empty collection loaded from the slot.
    Storage,
    /// Slot was empty; seed data was fetched.
    Seed,
    /// Slot was empty and the seed source failed.
    Empty,
}

/// How startup went.
#[derive(Clone, Debug)]
pub struct Startup {
    pub source: StartupSource,
    /// What the record store found in the slot.
    pub load_outcome: LoadOutcome,
    /// Seed failure, if the seed was needed and failed.
    pub seed_error: Option<String>,
}

/// Authoritative in-memory inventory plus view state.
///
/// An `Inventory` only exists once startup has finished, so no intent can
/// race the initial load.
pub struct Inventory {
    store: RecordStore,
    records: Vec<Record>,
    sort_key: SortKey,
    sort_order: SortOrder,
    current_page: usize,
    config: InventoryConfig,
    notices: Arc<NoticeBoard>,
    startup: Startup,
}

impl Inventory {
    /// Run the startup sequence with a fresh notice board.
    pub async fn bootstrap(
        store: RecordStore,
        seed: &dyn SeedSource,
        config: InventoryConfig,
    ) -> Self {
        Self::bootstrap_with(store, seed, config, Arc::new(NoticeBoard::new())).await
    }

    /// Run the startup sequence, publishing to an existing notice board.
    ///
    /// Stored records win; an empty load falls back to the seed source; a
    /// failing seed source leaves the inventory empty. Never fails.
    pub async fn bootstrap_with(
        store: RecordStore,
        seed: &dyn SeedSource,
        config: InventoryConfig,
        notices: Arc<NoticeBoard>,
    ) -> Self {
        let report = store.load_report();

        let (records, startup) = if !report.records.is_empty() {
            info!(count = report.records.len(), "starting from stored records");
            let startup = Startup {
                source: StartupSource::Storage,
                load_outcome: report.outcome,
                seed_error: None,
            };
            (report.records, startup)
        } else {
            match seed.fetch_initial().await {
                Ok(records) => {
                    info!(count = records.len(), outcome = ?report.outcome, "starting from seed records");
                    let startup = Startup {
                        source: StartupSource::Seed,
                        load_outcome: report.outcome,
                        seed_error: None,
                    };
                    (records, startup)
                }
                Err(e) => {
                    error!(error = %e, "failed to load initial records");
                    notices.publish(Notice::LoadFailed {
                        reason: e.to_string(),
                    });
                    let startup = Startup {
                        source: StartupSource::Empty,
                        load_outcome: report.outcome,
                        seed_error: Some(e.to_string()),
                    };
                    (Vec::new(), startup)
                }
            }
        };

        Self {
            store,
            records,
            sort_key: SortKey::default(),
            sort_order: SortOrder::default(),
            current_page: 1,
            config,
            notices,
            startup,
        }
    }

    // --- Accessors ---

    /// Records in collection (insertion) order.
    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn startup(&self) -> &Startup {
        &self.startup
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn config(&self) -> &InventoryConfig {
        &self.config
    }

    /// Open a notice feed.
    pub fn subscribe(&self) -> NoticeHandle {
        self.notices.subscribe()
    }

    pub fn notices(&self) -> &Arc<NoticeBoard> {
        &self.notices
    }

    // --- Record intents ---

    /// Add a record built from `input`, returning its new id.
    ///
    /// Pagination is left alone. Persists only if the policy says so.
    pub fn add(&mut self, input: RecordInput) -> Result<String> {
        input.validate()?;

        let record = input.into_record(Timestamp::now());
        let id = record.id.clone();
        let name = record.name.clone();
        self.records.push(record);
        debug!(id = %id, count = self.records.len(), "added record");

        self.notices.publish(Notice::Added { name });

        if self.config.persist_policy.persists_after(Mutation::Add) {
            self.persist_after_mutation()?;
        }
        Ok(id)
    }

    /// Remove every record with `id`, returning how many were removed.
    ///
    /// A missing id is not an error. Under the default policy the resulting
    /// collection is persisted right away, even when nothing matched. If that
    /// write fails the in-memory removal stands and the error is returned.
    pub fn remove(&mut self, id: &str) -> Result<usize> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        let removed = before - self.records.len();

        if removed > 0 {
            debug!(id, removed, "removed record");
            self.notices.publish(Notice::Deleted { id: id.to_string() });
        }
        self.current_page = view::clamp_page(self.current_page, self.records.len(), self.page_size());

        if self.config.persist_policy.persists_after(Mutation::Remove) {
            self.persist_after_mutation()?;
        }
        Ok(removed)
    }

    fn persist_after_mutation(&self) -> Result<()> {
        if let Err(e) = self.store.save(&self.records) {
            warn!(error = %e, "automatic save failed");
            self.notices.publish(Notice::SaveFailed {
                reason: e.to_string(),
            });
            return Err(e);
        }
        Ok(())
    }

    /// Explicit save: write the whole collection, then wait out the
    /// simulated latency. Not cancelable once started.
    ///
    /// On failure the in-memory collection is untouched and the error is
    /// returned (and published as a notice).
    pub async fn persist_now(&self) -> Result<()> {
        if let Err(e) = self.store.save(&self.records) {
            error!(error = %e, "save failed");
            self.notices.publish(Notice::SaveFailed {
                reason: e.to_string(),
            });
            return Err(e);
        }

        tokio::time::sleep(self.config.save_latency).await;

        info!(count = self.records.len(), "inventory saved");
        self.notices.publish(Notice::Saved {
            count: self.records.len(),
        });
        Ok(())
    }

    // --- View intents ---

    pub fn sort_key(&self) -> SortKey {
        self.sort_key
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    /// Select a sort column. Selecting the active column flips the order;
    /// selecting another one sorts it ascending.
    pub fn set_sort(&mut self, key: SortKey) {
        if key == self.sort_key {
            self.sort_order = self.sort_order.toggled();
        } else {
            self.sort_key = key;
            self.sort_order = SortOrder::Asc;
        }
    }

    pub fn set_sort_order(&mut self, order: SortOrder) {
        self.sort_order = order;
    }

    pub fn toggle_sort_order(&mut self) {
        self.sort_order = self.sort_order.toggled();
    }

    pub fn page_size(&self) -> usize {
        self.config.page_size.max(1)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn total_pages(&self) -> usize {
        view::total_pages(self.records.len(), self.page_size())
    }

    /// Go to page `n`, clamped into `1..=total_pages`. Returns the page set.
    pub fn set_page(&mut self, n: usize) -> usize {
        self.current_page = view::clamp_page(n, self.records.len(), self.page_size());
        self.current_page
    }

    pub fn next_page(&mut self) -> usize {
        self.set_page(self.current_page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> usize {
        self.set_page(self.current_page.saturating_sub(1))
    }

    /// Sum of `quantity * price` over the whole collection.
    pub fn total_value(&self) -> f64 {
        view::total_value(&self.records)
    }

    /// Sorted, paginated, aggregated view of the current state.
    pub fn derive_view(&self) -> InventoryView {
        view::derive_view(
            &self.records,
            ViewParams {
                sort_key: self.sort_key,
                sort_order: self.sort_order,
                current_page: self.current_page,
                page_size: self.page_size(),
            },
        )
    }
}
