//! Candidate records flowing between pipeline stages.

use keyratios_core::{CanonicalMetric, TOTAL_SEGMENT};
use serde::{Deserialize, Serialize};

/// A raw disclosure resolved to its canonical metric.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Canonical metric the source tag maps to.
    pub metric: CanonicalMetric,
    /// Source tag the value was filed under.
    pub tag: String,
    /// Reporting unit (`USD`, `shares`, ...).
    pub unit: String,
    /// Fiscal year of the filing, 0 when unknown.
    pub fiscal_year: i32,
    /// Period end as reported, if any.
    pub period_end: Option<String>,
    /// Reported value.
    pub value: f64,
    /// Segment label, [`TOTAL_SEGMENT`] when unsegmented.
    pub segment: String,
}

impl CandidateRecord {
    /// Creates an unsegmented record. Mostly useful in tests.
    #[must_use]
    pub fn total(metric: CanonicalMetric, fiscal_year: i32, value: f64) -> Self {
        Self {
            metric,
            tag: metric.standard_tags().first().copied().unwrap_or_default().to_string(),
            unit: String::new(),
            fiscal_year,
            period_end: None,
            value,
            segment: TOTAL_SEGMENT.to_string(),
        }
    }

    /// Returns a copy attributed to a segment.
    #[must_use]
    pub fn in_segment(mut self, segment: impl Into<String>) -> Self {
        self.segment = segment.into();
        self
    }

    /// Returns true if the record is not broken out by segment.
    #[must_use]
    pub fn is_unsegmented(&self) -> bool {
        self.segment.is_empty() || self.segment == TOTAL_SEGMENT
    }
}

/// Counters describing what the extractor kept and dropped.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Records found under accepted tags.
    pub records_seen: usize,
    /// Records that could not be decoded.
    pub malformed: usize,
    /// Records from non-annual filing forms.
    pub non_annual_form: usize,
    /// Segmented records for metrics that do not admit segments.
    pub segment_rejected: usize,
    /// Records covering less than a year.
    pub sub_annual: usize,
    /// Records passed on as candidates.
    pub candidates: usize,
}
