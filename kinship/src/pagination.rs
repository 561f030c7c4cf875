//! Cursor pagination: fetch one row more than asked for, then trim it and
//! report where the next page starts.

use kinship_core::Row;
use serde::Serialize;
use serde_json::Value as JsonValue;

const DEFAULT_CURSOR_COLUMN: &str = "id";

/// Pagination settings of a composed query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub cursor_column: String,
}

impl Pagination {
    pub fn new(cursor_column: &str) -> Self {
        Self {
            cursor_column: cursor_column.to_string(),
        }
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self::new(DEFAULT_CURSOR_COLUMN)
    }
}

/// A row from which a cursor value can be read
pub trait CursorSource {
    fn cursor_value(&self, column: &str) -> Option<&JsonValue>;
}

impl CursorSource for Row {
    fn cursor_value(&self, column: &str) -> Option<&JsonValue> {
        self.get(column)
    }
}

impl CursorSource for JsonValue {
    fn cursor_value(&self, column: &str) -> Option<&JsonValue> {
        self.get(column)
    }
}

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub rows: Vec<T>,
    /// Cursor value of the last row kept, when more rows follow
    pub next_cursor: Option<JsonValue>,
}

impl<T> Page<T> {
    pub fn has_more(&self) -> bool {
        self.next_cursor.is_some()
    }
}

/// Limit bookkeeping for a possibly paginated query.
///
/// Unpaginated windows pass rows through untouched. Once paginated, a
/// requested limit `n` is sent to the database as `n + 1`; the extra row
/// only signals that another page exists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationWindow {
    pagination: Option<Pagination>,
    requested_limit: Option<u64>,
    effective_limit: Option<u64>,
}

impl PaginationWindow {
    pub fn unpaginated() -> Self {
        Self::default()
    }

    pub fn paginated(pagination: Pagination) -> Self {
        Self {
            pagination: Some(pagination),
            ..Self::default()
        }
    }

    pub fn is_paginated(&self) -> bool {
        self.pagination.is_some()
    }

    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    pub fn requested_limit(&self) -> Option<u64> {
        self.requested_limit
    }

    pub fn effective_limit(&self) -> Option<u64> {
        self.effective_limit
    }

    pub(crate) fn enable(&mut self, pagination: Pagination) {
        self.pagination = Some(pagination);
    }

    /// Record a requested limit; returns the limit to put on the statement
    pub(crate) fn request_limit(&mut self, limit: u64) -> u64 {
        self.requested_limit = Some(limit);
        let sent = if self.is_paginated() {
            limit.saturating_add(1)
        } else {
            limit
        };
        self.effective_limit = Some(sent);
        sent
    }

    /// Record a limit already placed on the statement by someone else
    pub(crate) fn set_effective_limit(&mut self, limit: u64) {
        self.effective_limit = Some(limit);
    }

    /// Trim an over-fetched result and derive the next cursor.
    ///
    /// With `limit` the effective limit: fewer rows pass through with no
    /// cursor; otherwise the first `limit - 1` rows are kept and the cursor
    /// is read from the last of them. A missing or null cursor value means
    /// no cursor. A requested limit of 0 keeps no rows, so its page never
    /// has a cursor even when more rows exist.
    pub fn apply<T: CursorSource>(&self, mut rows: Vec<T>) -> Page<T> {
        let (Some(pagination), Some(limit)) = (&self.pagination, self.effective_limit) else {
            return Page {
                rows,
                next_cursor: None,
            };
        };

        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        if rows.len() < limit {
            return Page {
                rows,
                next_cursor: None,
            };
        }

        let next_cursor = limit
            .checked_sub(2)
            .and_then(|index| rows.get(index))
            .and_then(|row| row.cursor_value(&pagination.cursor_column))
            .filter(|value| !value.is_null())
            .cloned();
        rows.truncate(limit.saturating_sub(1));

        tracing::debug!(
            kept = rows.len(),
            has_more = next_cursor.is_some(),
            "kinship.paginate"
        );
        Page { rows, next_cursor }
    }
}
