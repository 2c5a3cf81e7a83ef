//! Exact k-nearest-neighbour search by cosine similarity.
//!
//! Every query scans every record (O(n·d)); there is no index. The engine
//! only reads the store through [`VecDB::get_all`], so a query ranks one
//! consistent snapshot even while writers are active.

use crate::db::VecDB;
use crate::error::{DbError, Result};
use crate::record::{validate_values, SearchResult, VectorRecord};
use crate::vector::cosine_similarity;
use tracing::{debug, warn};

/// Ranks the current contents of `store` against `query`.
pub fn search(store: &VecDB, query: &[f64], top_k: usize) -> Result<Vec<SearchResult>> {
    validate_values(query)?;
    if top_k == 0 {
        return Ok(Vec::new());
    }

    rank(store.get_all()?, query, top_k)
}

/// Scores `records` against `query` and keeps the best `top_k`.
///
/// - A record whose dimension differs from the query's is skipped and
///   logged; it never fails the whole query and never gets a score.
/// - A zero-norm record (or query) scores `0.0`.
/// - Equal scores keep the order of `records` (the sort is stable).
/// - `top_k == 0` yields an empty list; a `top_k` above the record count
///   yields every comparable record.
///
/// # Examples
///
/// ```
/// use lvdb::VectorRecord;
/// use lvdb::search::rank;
///
/// let records = vec![
///     VectorRecord { id: 1, values: vec![1.0, 0.0] },
///     VectorRecord { id: 2, values: vec![0.0, 1.0] },
///     VectorRecord { id: 3, values: vec![1.0, 1.0] },
/// ];
///
/// let results = rank(records, &[1.0, 0.0], 2).unwrap();
/// assert_eq!(results[0].record.id, 1);
/// assert_eq!(results[1].record.id, 3);
/// ```
pub fn rank(records: Vec<VectorRecord>, query: &[f64], top_k: usize) -> Result<Vec<SearchResult>> {
    validate_values(query)?;
    if top_k == 0 {
        return Ok(Vec::new());
    }

    let scanned = records.len();
    let mut scored = Vec::with_capacity(scanned);

    for record in records {
        match cosine_similarity(query, &record.values) {
            Ok(score) => scored.push(SearchResult { record, score }),
            Err(DbError::DimensionMismatch { expected, got }) => {
                warn!(id = record.id, expected, got, "skipping record with mismatched dimension");
            }
            Err(err) => return Err(err),
        }
    }

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    scored.truncate(top_k);

    debug!(scanned, returned = scored.len(), top_k, "ranked records");
    Ok(scored)
}
