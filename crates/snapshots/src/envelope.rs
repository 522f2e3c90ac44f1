//! List responses.
//!
//! The service answers list requests either with a bare array or with an object carrying the
//! items and paging metadata under one of several spellings. [`WireList::sniff`] folds both into
//! one shape before any snapshot normaliser runs, so callers never branch on the wire shape.

use crate::record::{flag, integer, nested, Record};
use serde::{Deserialize, Serialize};
use serde_json::Value;

const ITEM_KEYS: &[&str] = &["items", "results", "data"];
const PAGINATION_KEYS: &[&str] = &["pagination", "meta"];

/// Normalised list result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ListEnvelope<T> {
    pub items: Vec<T>,
    /// `None` when the service sent no paging metadata.
    pub pagination: Option<Pagination>,
}

impl<T> Default for ListEnvelope<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
        }
    }
}

/// Paging metadata, normalised from the spellings the service uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub total_pages: u64,
    pub has_next: bool,
}

impl Pagination {
    /// Reads paging metadata from a raw record. Missing counts default to zero, `page` to 1.
    pub fn from_record(record: &Record) -> Self {
        let count = |keys: &[&str]| integer(record, keys).and_then(|n| u64::try_from(n).ok());

        let page = count(&["page", "current_page"]).unwrap_or(1).max(1);
        let limit = count(&["limit", "per_page", "page_size"]).unwrap_or(0);
        let total = count(&["total", "total_count", "count"]).unwrap_or(0);
        let total_pages = count(&["total_pages", "pages", "last_page"])
            .unwrap_or_else(|| if limit == 0 { 0 } else { total.div_ceil(limit) });
        let has_next = flag(record, &["has_next", "has_more"]).unwrap_or(page < total_pages);

        Self {
            page,
            limit,
            total,
            total_pages,
            has_next,
        }
    }
}

/// The two wire shapes of a list response.
#[derive(Debug)]
pub enum WireList<'a> {
    /// A bare JSON array.
    Bare(&'a [Value]),
    /// An object with items and optional paging metadata.
    Wrapped {
        items: &'a [Value],
        pagination: Option<&'a Record>,
    },
}

impl<'a> WireList<'a> {
    /// Classifies a raw list response. Anything that is neither shape reads as an empty list.
    pub fn sniff(raw: &'a Value) -> Self {
        match raw {
            Value::Array(items) => WireList::Bare(items),
            Value::Object(record) => WireList::Wrapped {
                items: ITEM_KEYS
                    .iter()
                    .find_map(|key| record.get(*key).and_then(Value::as_array))
                    .map(Vec::as_slice)
                    .unwrap_or(&[]),
                pagination: nested(record, PAGINATION_KEYS),
            },
            other => {
                tracing::trace!(?other, "list response is neither an array nor an object");
                WireList::Bare(&[])
            }
        }
    }

    /// Normalises each item with `normalize`, dropping items it rejects.
    pub fn normalize<T>(self, normalize: impl Fn(&Value) -> Option<T>) -> ListEnvelope<T> {
        let (items, pagination) = match self {
            WireList::Bare(items) => (items, None),
            WireList::Wrapped { items, pagination } => (items, pagination),
        };

        ListEnvelope {
            items: crate::record::normalize_each(items, normalize),
            pagination: pagination.map(Pagination::from_record),
        }
    }
}

/// Shorthand for `WireList::sniff(raw).normalize(normalize)`.
pub fn normalize_list<T>(raw: &Value, normalize: impl Fn(&Value) -> Option<T>) -> ListEnvelope<T> {
    WireList::sniff(raw).normalize(normalize)
}
