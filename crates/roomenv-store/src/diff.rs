//! Differential series relative to a reference room.
//!
//! Every room's buckets are re-expressed as the difference with the reference
//! room's bucket covering the same instant. Buckets are matched by their start
//! truncated to the requested granularity; a bucket with no reference
//! counterpart is dropped rather than zero-filled.
//!
//! # Example
//!
//! ```
//! use roomenv_store::diff;
//! use roomenv_types::{Bucket, Granularity, Series};
//!
//! let bucket = |t, avg| Bucket {
//!     timestamp: t,
//!     temp_min: avg,
//!     temp_avg: avg,
//!     temp_max: avg,
//!     hum_min: 50.0,
//!     hum_avg: 50.0,
//!     hum_max: 50.0,
//! };
//!
//! let mut series = Series::new();
//! series.insert("outside".into(), vec![bucket(0, 5.0)]);
//! series.insert("kitchen".into(), vec![bucket(0, 20.0), bucket(3600, 21.0)]);
//!
//! let relative = diff("outside", Granularity::Hour, &series)?;
//! assert!(!relative.contains_key("outside"));
//! assert_eq!(relative["kitchen"].len(), 1);
//! assert_eq!(relative["kitchen"][0].temp_avg, 15.0);
//! # Ok::<(), roomenv_store::Error>(())
//! ```

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use tracing::debug;

use roomenv_types::{Bucket, Granularity, Series};

use crate::error::{Error, Result};

/// Express every room of `series` relative to the `reference` room.
///
/// # Errors
///
/// Returns [`Error::ReferenceNotFound`] when `reference` has no entry in
/// `series`. Mismatched lengths between rooms are not an error.
pub fn diff(reference: &str, by: Granularity, series: &Series) -> Result<Series> {
    let reference_buckets = series
        .get(reference)
        .ok_or_else(|| Error::ReferenceNotFound(reference.to_string()))?;

    let index = index_by_bucket(reference_buckets, by);

    let mut relative = Series::new();
    let mut dropped = 0usize;
    for (room, buckets) in series {
        if room == reference {
            continue;
        }

        let mut deltas = Vec::with_capacity(buckets.len());
        for bucket in buckets {
            let matched = by
                .truncate(bucket.timestamp)
                .and_then(|t| index.get(&t).map(|r| bucket.delta(r, t)));
            match matched {
                Some(delta) => deltas.push(delta),
                None => dropped += 1,
            }
        }
        relative.insert(room.clone(), deltas);
    }

    debug!(
        "Computed differential against {} for {} room(s), {} unmatched bucket(s) dropped",
        reference,
        relative.len(),
        dropped
    );
    Ok(relative)
}

/// Index reference buckets by truncated start; the first bucket seen wins.
fn index_by_bucket(buckets: &[Bucket], by: Granularity) -> HashMap<i64, Bucket> {
    let mut index = HashMap::with_capacity(buckets.len());
    for bucket in buckets {
        let Some(t) = by.truncate(bucket.timestamp) else {
            continue;
        };
        if let Entry::Vacant(slot) = index.entry(t) {
            slot.insert(*bucket);
        }
    }
    index
}
