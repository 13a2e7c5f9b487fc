//! Core types for the inventory.

use chrono::{DateTime, SecondsFormat, Utc};
use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::InventoryError;

/// Alphabet for the random part of generated ids.
const ID_SUFFIX_ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Length of the random part of generated ids.
const ID_SUFFIX_LEN: usize = 9;

/// Milliseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current wall-clock time.
    pub fn now() -> Self {
        let duration = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        Timestamp(duration.as_millis() as i64)
    }

    /// Milliseconds elapsed since `earlier` (negative if `earlier` is in the future).
    pub fn millis_since(self, earlier: Timestamp) -> i64 {
        self.0.saturating_sub(earlier.0)
    }

    /// This timestamp shifted back by `duration`.
    pub fn minus(self, duration: Duration) -> Self {
        Timestamp(self.0.saturating_sub(duration.as_millis() as i64))
    }

    /// ISO-8601 rendering with millisecond precision and a `Z` suffix.
    pub fn to_iso8601(self) -> String {
        DateTime::<Utc>::from_timestamp_millis(self.0)
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// A single inventory item.
///
/// Field names on the wire follow the stored JSON layout (`addedAt`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// Opaque identifier, assigned at creation and never changed.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Units in stock. Never negative.
    pub quantity: f64,

    /// Unit price. Never negative.
    pub price: f64,

    /// Creation time (ISO-8601). Absent on seed data.
    #[serde(rename = "addedAt", default, skip_serializing_if = "Option::is_none")]
    pub added_at: Option<String>,
}

impl Record {
    /// Create a record without a creation time (the shape used by seed data).
    pub fn new(id: impl Into<String>, name: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            quantity,
            price,
            added_at: None,
        }
    }

    /// Build a record from a loosely typed JSON entry.
    ///
    /// Requires an object with string `id`/`name` and numeric `quantity`/`price`.
    /// A non-string `addedAt` is treated as absent. Value invariants are not checked.
    pub fn from_json(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        Some(Self {
            id: obj.get("id")?.as_str()?.to_string(),
            name: obj.get("name")?.as_str()?.to_string(),
            quantity: obj.get("quantity")?.as_f64()?,
            price: obj.get("price")?.as_f64()?,
            added_at: obj
                .get("addedAt")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }

    /// Whether quantity and price are non-negative finite numbers.
    pub fn satisfies_invariants(&self) -> bool {
        is_non_negative(self.quantity) && is_non_negative(self.price)
    }

    /// Value of this line: `quantity * price`.
    pub fn line_value(&self) -> f64 {
        self.quantity * self.price
    }
}

fn is_non_negative(n: f64) -> bool {
    n.is_finite() && n >= 0.0
}

/// User input for a new record (before id/creation time are assigned).
#[derive(Clone, Debug, PartialEq)]
pub struct RecordInput {
    pub name: String,
    pub quantity: f64,
    pub price: f64,
}

impl RecordInput {
    pub fn new(name: impl Into<String>, quantity: f64, price: f64) -> Self {
        Self {
            name: name.into(),
            quantity,
            price,
        }
    }

    /// Check the input against the record invariants.
    pub fn validate(&self) -> Result<(), InventoryError> {
        if self.name.trim().is_empty() {
            return Err(InventoryError::Validation("name must not be empty".into()));
        }
        if !is_non_negative(self.quantity) {
            return Err(InventoryError::Validation(format!(
                "quantity must be a non-negative number, got {}",
                self.quantity
            )));
        }
        if !is_non_negative(self.price) {
            return Err(InventoryError::Validation(format!(
                "price must be a non-negative number, got {}",
                self.price
            )));
        }
        Ok(())
    }

    /// Turn the input into a record created at `now`.
    pub fn into_record(self, now: Timestamp) -> Record {
        Record {
            id: generate_id(now),
            name: self.name,
            quantity: self.quantity,
            price: self.price,
            added_at: Some(now.to_iso8601()),
        }
    }
}

/// Generate a record id: creation millis followed by a random base-36 suffix.
///
/// Collisions are improbable, not impossible.
pub fn generate_id(now: Timestamp) -> String {
    let mut rng = thread_rng();
    let suffix: String = (0..ID_SUFFIX_LEN)
        .map(|_| ID_SUFFIX_ALPHABET[rng.gen_range(0..ID_SUFFIX_ALPHABET.len())] as char)
        .collect();
    format!("{}{}", now.0, suffix)
}

/// Column a view is sorted by.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Name,
    Quantity,
    Price,
}

impl SortKey {
    pub const ALL: [SortKey; 3] = [SortKey::Name, SortKey::Quantity, SortKey::Price];

    pub fn as_str(self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Quantity => "quantity",
            SortKey::Price => "price",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = InventoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "name" => Ok(SortKey::Name),
            "quantity" => Ok(SortKey::Quantity),
            "price" => Ok(SortKey::Price),
            other => Err(InventoryError::Validation(format!(
                "unknown sort key: {}",
                other
            ))),
        }
    }
}

/// Sort direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn toggled(self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }

    /// Arrow shown next to the active column header.
    pub fn indicator(self) -> &'static str {
        match self {
            SortOrder::Asc => "↑",
            SortOrder::Desc => "↓",
        }
    }
}
