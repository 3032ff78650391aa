//! Duplicate resolution for pick-best metrics.

use keyratios_core::{AggregationPolicy, CanonicalMetric};
use std::collections::HashMap;
use tracing::debug;

use crate::record::CandidateRecord;

/// Output of [`deduplicate`].
#[derive(Clone, Debug, Default)]
pub struct Deduplicated {
    /// One record per (metric, fiscal year, segment) for pick-best metrics.
    pub picked: Vec<CandidateRecord>,
    /// Untouched records of sum-segments metrics, left for consolidation.
    pub deferred: Vec<CandidateRecord>,
}

/// Collapses candidates sharing (metric, fiscal year, segment) to one record.
///
/// The first record seen wins, except that a zero is replaced by the first
/// later non-zero value. Records of [`AggregationPolicy::SumSegments`]
/// metrics are passed through in `deferred`.
pub fn deduplicate(candidates: Vec<CandidateRecord>) -> Deduplicated {
    let mut out = Deduplicated::default();
    let mut index: HashMap<(CanonicalMetric, i32, String), usize> = HashMap::new();
    let total = candidates.len();

    for record in candidates {
        if record.metric.aggregation() == AggregationPolicy::SumSegments {
            out.deferred.push(record);
            continue;
        }

        let key = (record.metric, record.fiscal_year, record.segment.clone());
        match index.get(&key) {
            None => {
                index.insert(key, out.picked.len());
                out.picked.push(record);
            }
            Some(&i) => {
                if out.picked[i].value == 0.0 && record.value != 0.0 {
                    out.picked[i] = record;
                }
            }
        }
    }

    debug!(
        candidates = total,
        picked = out.picked.len(),
        deferred = out.deferred.len(),
        "Deduplicated candidate records"
    );
    out
}
