//! Derived view: sort, paginate, aggregate.
//!
//! Everything here is a pure function of the record collection and the view
//! parameters, so the inventory can rebuild the view after every intent.

use crate::types::{Record, SortKey, SortOrder};
use serde::Serialize;
use std::cmp::Ordering;

/// Records shown per page unless configured otherwise.
pub const DEFAULT_PAGE_SIZE: usize = 5;

/// Sorting and paging parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewParams {
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
    /// 1-based.
    pub current_page: usize,
    pub page_size: usize,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            sort_key: SortKey::Name,
            sort_order: SortOrder::Asc,
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of the sorted collection plus collection-wide figures.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InventoryView {
    /// Records on the current page, in sorted order.
    pub page_records: Vec<Record>,
    /// Page actually shown (clamped into `1..=total_pages`).
    pub current_page: usize,
    /// Never less than 1.
    pub total_pages: usize,
    /// Sum of `quantity * price` over the whole collection.
    pub total_value: f64,
    /// Records in the whole collection.
    pub total_count: usize,
    pub sort_key: SortKey,
    pub sort_order: SortOrder,
}

impl InventoryView {
    /// Sort arrow for a column header; `None` unless `key` is the active key.
    pub fn indicator(&self, key: SortKey) -> Option<&'static str> {
        (key == self.sort_key).then(|| self.sort_order.indicator())
    }

    pub fn has_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }
}

/// Number of pages needed for `count` records. An empty collection still has one page.
pub fn total_pages(count: usize, page_size: usize) -> usize {
    count.div_ceil(page_size.max(1)).max(1)
}

/// Clamp a requested page into `1..=total_pages`.
pub fn clamp_page(page: usize, count: usize, page_size: usize) -> usize {
    page.clamp(1, total_pages(count, page_size))
}

/// Sum of line values across `records`.
pub fn total_value(records: &[Record]) -> f64 {
    records.iter().map(Record::line_value).sum()
}

/// Name comparison approximating a locale collation: case-insensitive first,
/// then lowercase before uppercase at the first differing character.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let folded_a = a.chars().flat_map(char::to_lowercase);
    let folded_b = b.chars().flat_map(char::to_lowercase);

    folded_a.cmp(folded_b).then_with(|| {
        for (x, y) in a.chars().zip(b.chars()) {
            if x != y {
                return match (x.is_lowercase(), y.is_lowercase()) {
                    (true, false) => Ordering::Less,
                    (false, true) => Ordering::Greater,
                    _ => x.cmp(&y),
                };
            }
        }
        a.len().cmp(&b.len())
    })
}

fn compare_by(key: SortKey, a: &Record, b: &Record) -> Ordering {
    match key {
        SortKey::Name => compare_names(&a.name, &b.name),
        // Loaded and added values are finite, and -0.0 ties with 0.0.
        SortKey::Quantity => a.quantity.partial_cmp(&b.quantity).unwrap_or(Ordering::Equal),
        SortKey::Price => a.price.partial_cmp(&b.price).unwrap_or(Ordering::Equal),
    }
}

/// Stable sort: records with equal keys keep their collection order in
/// both directions.
pub fn sort_records<'a>(records: &'a [Record], key: SortKey, order: SortOrder) -> Vec<&'a Record> {
    let mut sorted: Vec<&Record> = records.iter().collect();
    sorted.sort_by(|a, b| {
        let ord = compare_by(key, a, b);
        match order {
            SortOrder::Asc => ord,
            SortOrder::Desc => ord.reverse(),
        }
    });
    sorted
}

/// Build the view for `records` under `params`.
pub fn derive_view(records: &[Record], params: ViewParams) -> InventoryView {
    let page_size = params.page_size.max(1);
    let total_count = records.len();
    let current_page = clamp_page(params.current_page, total_count, page_size);

    let start = (current_page - 1) * page_size;
    let page_records = sort_records(records, params.sort_key, params.sort_order)
        .into_iter()
        .skip(start)
        .take(page_size)
        .cloned()
        .collect();

    InventoryView {
        page_records,
        current_page,
        total_pages: total_pages(total_count, page_size),
        total_value: total_value(records),
        total_count,
        sort_key: params.sort_key,
        sort_order: params.sort_order,
    }
}

/// Format an amount as US dollars, e.g. `$1,817.00` or `-$3.50`.
/// Non-finite amounts render as `-`.
pub fn format_usd(amount: f64) -> String {
    if !amount.is_finite() {
        return "-".to_string();
    }
    let cents = format!("{:.2}", amount.abs());
    let (whole, frac) = cents.split_once('.').unwrap_or((cents.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    let sign = if amount < 0.0 && cents != "0.00" { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, frac)
}
