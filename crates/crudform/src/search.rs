//! Name search over a loaded collection.

use crate::record::Record;

/// Records whose name starts with `query`, ignoring case.
///
/// An empty query keeps every record. Order is preserved and the source is
/// not touched.
#[must_use]
pub fn filter_by_name<'a>(records: &'a [Record], query: &str) -> Vec<&'a Record> {
    let needle = query.to_lowercase();
    records
        .iter()
        .filter(|record| record.nome.to_lowercase().starts_with(&needle))
        .collect()
}
