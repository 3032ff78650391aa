//! Annual period filter.
//!
//! Quarterly figures are sometimes filed under tags that also carry annual
//! values, even inside a 10-K. A record whose start-to-end span is shorter
//! than [`ANNUAL_MIN_DAYS`] is not an annual figure.

use keyratios_core::RawFact;

/// Shortest span, in days, accepted as a full fiscal year.
pub const ANNUAL_MIN_DAYS: i64 = 360;

/// Outcome of checking a record's covered period.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SpanCheck {
    /// Duration of at least the minimum span.
    Annual,
    /// Duration shorter than the minimum span.
    SubAnnual(i64),
    /// No start/end pair, e.g. a balance-sheet snapshot.
    Instant,
    /// A date was present but unparsable. Treated as instant.
    Malformed(String),
}

impl SpanCheck {
    /// Returns true if the record may be used as an annual figure.
    #[must_use]
    pub const fn passes(&self) -> bool {
        !matches!(self, Self::SubAnnual(_))
    }
}

/// Classifies a record's covered period.
#[must_use]
pub fn check_span(fact: &RawFact, min_days: i64) -> SpanCheck {
    match fact.span_days() {
        Ok(Some(days)) if days < min_days => SpanCheck::SubAnnual(days),
        Ok(Some(_)) => SpanCheck::Annual,
        Ok(None) => SpanCheck::Instant,
        Err(reason) => SpanCheck::Malformed(reason),
    }
}
