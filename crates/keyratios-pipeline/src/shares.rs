//! Share consolidation for sum-segments metrics.
//!
//! Some registrants, typically financial conglomerates, disclose diluted
//! shares only per business segment. A company-wide figure is rebuilt here:
//! a disclosed total wins, otherwise every positive segment record is summed.

use keyratios_core::{CanonicalMetric, TOTAL_SEGMENT};
use std::collections::BTreeMap;
use tracing::debug;

use crate::record::CandidateRecord;

/// Produces at most one unsegmented record per (metric, fiscal year).
///
/// For each group, the first unsegmented record with a positive value is
/// authoritative. Failing that, the positive values of all segment records
/// are summed and labelled [`TOTAL_SEGMENT`]. A group with no positive value
/// yields nothing.
pub fn consolidate(deferred: Vec<CandidateRecord>) -> Vec<CandidateRecord> {
    let mut groups: BTreeMap<(CanonicalMetric, i32), Vec<CandidateRecord>> = BTreeMap::new();
    for record in deferred {
        groups
            .entry((record.metric, record.fiscal_year))
            .or_default()
            .push(record);
    }

    let mut out = Vec::with_capacity(groups.len());
    for ((metric, fiscal_year), group) in groups {
        if let Some(total) = group
            .iter()
            .find(|r| r.is_unsegmented() && r.value > 0.0)
        {
            let mut total = total.clone();
            total.segment = TOTAL_SEGMENT.to_string();
            out.push(total);
            continue;
        }

        let fragments: Vec<&CandidateRecord> = group
            .iter()
            .filter(|r| !r.is_unsegmented() && r.value > 0.0)
            .collect();
        let sum: f64 = fragments.iter().map(|f| f.value).sum();
        if let Some(first) = fragments.first() {
            debug!(
                metric = %metric,
                fiscal_year,
                records = fragments.len(),
                sum,
                "Reconstructed total from segments"
            );
            let mut total = (*first).clone();
            total.value = sum;
            total.segment = TOTAL_SEGMENT.to_string();
            out.push(total);
        }
    }
    out
}
