//! Record store: the only component that touches the persistent slot.
//!
//! The slot holds one envelope in one of two shapes:
//!
//! - legacy: a bare JSON array of records
//! - current: `{ "parts": [records], "timestamp": <epoch millis> }`
//!
//! Loading understands both. Saving writes whichever shape the config names
//! (bare array by default). Load never fails: corrupt envelopes are deleted,
//! expired ones are deleted, and invalid entries of a current envelope are
//! dropped. Save failures always reach the caller.

use crate::error::{InventoryError, Result};
use crate::slots::SlotBackend;
use crate::types::{Record, Timestamp};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Slot key used when none is configured.
pub const DEFAULT_SLOT_KEY: &str = "parts-inventory";

/// Age after which a current-format envelope is discarded.
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

/// Envelope shape written by `save`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum EnvelopeFormat {
    /// Bare array of records. Never expires, never filtered on load.
    #[default]
    Legacy,
    /// Object with `parts` and `timestamp`.
    Current,
}

/// Store configuration.
#[derive(Clone, Debug)]
pub struct StoreConfig {
    /// Slot key holding the envelope.
    pub key: String,

    /// Maximum age of a current-format envelope.
    pub expiry: Duration,

    /// Shape written by `save`.
    pub save_format: EnvelopeFormat,

    /// Run legacy arrays through the same validation as current envelopes.
    pub filter_legacy: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            key: DEFAULT_SLOT_KEY.to_string(),
            expiry: DEFAULT_EXPIRY,
            save_format: EnvelopeFormat::Legacy,
            filter_legacy: false,
        }
    }
}

/// What `load` found in the slot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing stored.
    Missing,
    /// Bare array. `dropped` counts entries with no record shape, plus
    /// invariant failures with `filter_legacy`.
    Legacy { dropped: usize },
    /// Current envelope within its age limit.
    Current { dropped: usize },
    /// Current envelope past its age limit; slot cleared.
    Expired,
    /// Unreadable or unparseable; slot cleared.
    Corrupt,
    /// Valid JSON of an unknown shape; slot left as is.
    Unrecognized,
}

/// Records recovered by `load`, with how they were found.
#[derive(Clone, Debug)]
pub struct LoadReport {
    pub records: Vec<Record>,
    pub outcome: LoadOutcome,
}

impl LoadReport {
    fn empty(outcome: LoadOutcome) -> Self {
        Self {
            records: Vec::new(),
            outcome,
        }
    }
}

#[derive(Serialize)]
struct CurrentEnvelope<'a> {
    parts: &'a [Record],
    timestamp: i64,
}

/// Reads and writes the inventory envelope in a single slot.
pub struct RecordStore {
    backend: Arc<dyn SlotBackend>,
    config: StoreConfig,
}

impl RecordStore {
    /// Create a store over `backend`.
    pub fn new(backend: Arc<dyn SlotBackend>, config: StoreConfig) -> Self {
        Self { backend, config }
    }

    /// Store configuration.
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // --- Load ---

    /// Load the stored records. Never fails; see `load_report`.
    pub fn load(&self) -> Vec<Record> {
        self.load_report().records
    }

    /// Load the stored records along with what was found.
    pub fn load_report(&self) -> LoadReport {
        self.load_at(Timestamp::now())
    }

    /// Load as if the current time were `now`.
    pub fn load_at(&self, now: Timestamp) -> LoadReport {
        let key = self.config.key.as_str();

        let raw = match self.backend.get(key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                debug!(key, "no stored envelope");
                return LoadReport::empty(LoadOutcome::Missing);
            }
            Err(e) => {
                warn!(key, error = %e, "failed to read stored envelope");
                return self.discard(LoadOutcome::Corrupt);
            }
        };

        let value: Value = match serde_json::from_str(&raw) {
            Ok(value) => value,
            Err(e) => {
                warn!(key, error = %e, "stored envelope is not valid JSON");
                return self.discard(LoadOutcome::Corrupt);
            }
        };

        match value {
            Value::Array(entries) => self.reconcile_legacy(&entries),
            Value::Object(obj) => match obj.get("parts") {
                Some(Value::Array(entries)) => {
                    self.reconcile_current(entries, obj.get("timestamp"), now)
                }
                _ => {
                    warn!(key, "stored object has no records array; ignoring");
                    LoadReport::empty(LoadOutcome::Unrecognized)
                }
            },
            _ => {
                warn!(key, "stored envelope has an unknown shape; ignoring");
                LoadReport::empty(LoadOutcome::Unrecognized)
            }
        }
    }

    fn reconcile_legacy(&self, entries: &[Value]) -> LoadReport {
        if self.config.filter_legacy {
            let (records, dropped) = filter_valid(entries);
            if dropped > 0 {
                warn!(key = %self.config.key, dropped, "dropped invalid legacy records");
            }
            return LoadReport {
                records,
                outcome: LoadOutcome::Legacy { dropped },
            };
        }

        // Legacy arrays are trusted as-is; only entries with no record shape are skipped.
        let records: Vec<Record> = entries.iter().filter_map(Record::from_json).collect();
        let dropped = entries.len() - records.len();
        if dropped > 0 {
            warn!(key = %self.config.key, dropped, "skipped non-record legacy entries");
        }
        debug!(key = %self.config.key, count = records.len(), "loaded legacy envelope");
        LoadReport {
            records,
            outcome: LoadOutcome::Legacy { dropped },
        }
    }

    fn reconcile_current(
        &self,
        entries: &[Value],
        timestamp: Option<&Value>,
        now: Timestamp,
    ) -> LoadReport {
        if self.is_expired(timestamp, now) {
            info!(key = %self.config.key, "stored envelope expired; clearing");
            return self.discard(LoadOutcome::Expired);
        }

        let (records, dropped) = filter_valid(entries);
        if dropped > 0 {
            warn!(key = %self.config.key, dropped, "dropped invalid records");
        }
        debug!(key = %self.config.key, count = records.len(), "loaded envelope");

        LoadReport {
            records,
            outcome: LoadOutcome::Current { dropped },
        }
    }

    /// A missing, zero or non-numeric timestamp never expires. Numeric
    /// strings count as numbers.
    fn is_expired(&self, timestamp: Option<&Value>, now: Timestamp) -> bool {
        let written = match timestamp {
            Some(Value::Number(n)) => n.as_f64(),
            Some(Value::String(s)) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            _ => None,
        };
        let Some(written) = written else {
            return false;
        };
        if written == 0.0 {
            return false;
        }
        let age_ms = now.0 as f64 - written;
        age_ms > self.config.expiry.as_millis() as f64
    }

    /// Delete the envelope and report an empty load.
    fn discard(&self, outcome: LoadOutcome) -> LoadReport {
        if let Err(e) = self.backend.remove(&self.config.key) {
            error!(key = %self.config.key, error = %e, "failed to clear stored envelope");
        }
        LoadReport::empty(outcome)
    }

    // --- Save ---

    /// Persist `records`, replacing the stored envelope.
    pub fn save(&self, records: &[Record]) -> Result<()> {
        self.save_at(records, Timestamp::now())
    }

    /// Persist `records` stamped with `now` (used by the current format only).
    pub fn save_at(&self, records: &[Record], now: Timestamp) -> Result<()> {
        let encoded = match self.config.save_format {
            EnvelopeFormat::Legacy => serde_json::to_string(records)?,
            EnvelopeFormat::Current => serde_json::to_string(&CurrentEnvelope {
                parts: records,
                timestamp: now.0,
            })?,
        };

        if let Err(e) = self.backend.set(&self.config.key, &encoded) {
            error!(key = %self.config.key, error = %e, "failed to save records");
            return Err(e);
        }

        debug!(key = %self.config.key, count = records.len(), bytes = encoded.len(), "saved records");
        Ok(())
    }

    /// Persist loosely typed input. Anything but an array of records is
    /// rejected before the slot is touched.
    pub fn save_value(&self, value: &Value) -> Result<()> {
        let Value::Array(entries) = value else {
            return Err(InventoryError::Validation("records must be an array".into()));
        };

        let records = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                Record::from_json(entry).ok_or_else(|| {
                    InventoryError::Validation(format!("entry {} is not a record", i))
                })
            })
            .collect::<Result<Vec<_>>>()?;

        self.save(&records)
    }

    /// Remove the stored envelope.
    pub fn clear(&self) -> Result<()> {
        self.backend.remove(&self.config.key)
    }
}

/// Keep entries that are well-formed records with non-negative values.
fn filter_valid(entries: &[Value]) -> (Vec<Record>, usize) {
    let records: Vec<Record> = entries
        .iter()
        .filter_map(Record::from_json)
        .filter(Record::satisfies_invariants)
        .collect();
    let dropped = entries.len() - records.len();
    (records, dropped)
}
