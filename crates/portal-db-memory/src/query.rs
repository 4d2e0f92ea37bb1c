use portal_storage::{EntityQuery, QueryPage, StorageError};
use serde::Serialize;
use time::OffsetDateTime;

/// A stored row with its insertion sequence.
#[derive(Debug, Clone)]
pub struct Sequenced<T> {
    pub seq: u64,
    pub record: T,
}

impl<T> Sequenced<T> {
    pub fn new(seq: u64, record: T) -> Self {
        Self { seq, record }
    }
}

/// Filters, orders (newest first) and paginates rows.
///
/// Records are matched on their serialized JSON form, so the query sees the
/// same camelCase field names as API clients.
pub fn run_query<T, F>(
    rows: Vec<Sequenced<T>>,
    query: &EntityQuery,
    created_at: F,
) -> Result<QueryPage<T>, StorageError>
where
    T: Serialize,
    F: Fn(&T) -> OffsetDateTime,
{
    let mut matched: Vec<(i128, u64, T)> = Vec::new();
    for row in rows {
        let json = serde_json::to_value(&row.record)?;
        if query.matches(&json) {
            let at = created_at(&row.record).unix_timestamp_nanos();
            matched.push((at, row.seq, row.record));
        }
    }

    matched.sort_by(|a, b| (b.0, b.1).cmp(&(a.0, a.1)));

    let total = matched.len() as u64;
    let limit = query.limit.unwrap_or(usize::MAX);
    let items = matched
        .into_iter()
        .skip(query.offset)
        .take(limit)
        .map(|(_, _, record)| record)
        .collect();

    Ok(QueryPage { items, total })
}
