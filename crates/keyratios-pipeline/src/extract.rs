//! Fact extraction.
//!
//! Walks the raw facts document once per canonical metric and collects every
//! record filed under an accepted tag, in any unit, that survives the form,
//! segment and annual-span rules.

use keyratios_core::{CompanyFacts, Issue, RawFact, TagDictionary};
use std::cmp::Ordering;
use tracing::debug;

use crate::annual::{SpanCheck, check_span};
use crate::record::{CandidateRecord, ExtractionStats};

/// Candidate records produced by one extraction pass.
#[derive(Clone, Debug, Default)]
pub struct Extraction {
    /// Surviving records, in extraction order.
    pub candidates: Vec<CandidateRecord>,
    /// What was kept and dropped.
    pub stats: ExtractionStats,
    /// Recoverable problems noticed on the way.
    pub issues: Vec<Issue>,
}

/// Orders records most recent first: fiscal year, then period end, descending.
///
/// Missing fiscal years sort as 0 and missing end dates as `0000-00-00`, so
/// undated records always come last.
fn recency(a: &RawFact, b: &RawFact) -> Ordering {
    let end = |f: &RawFact| f.end.clone().unwrap_or_else(|| "0000-00-00".to_string());
    (b.fiscal_year(), end(b)).cmp(&(a.fiscal_year(), end(a)))
}

/// Extracts candidate records for every metric in the dictionary.
///
/// Within one tag and unit, records are sorted by [`recency`]; that order is
/// the tie-break later stages rely on when choosing among duplicates.
pub fn extract(facts: &CompanyFacts, dictionary: &TagDictionary, min_days: i64) -> Extraction {
    let mut out = Extraction::default();

    for entry in dictionary.iter() {
        let metric = entry.metric;
        let mut found = false;

        for tag in &entry.tags {
            let Some(tag_facts) = facts.tag(tag) else {
                continue;
            };
            found = true;

            for (unit, values) in &tag_facts.units {
                let mut records = Vec::with_capacity(values.len());
                for value in values {
                    match RawFact::from_value(value) {
                        Ok(record) => records.push(record),
                        Err(reason) => {
                            out.stats.malformed += 1;
                            out.issues.push(Issue::MalformedRecord {
                                tag: tag.clone(),
                                reason,
                            });
                        }
                    }
                }
                out.stats.records_seen += values.len();
                records.sort_by(recency);

                for record in records {
                    if !record.is_annual_form() {
                        out.stats.non_annual_form += 1;
                        continue;
                    }
                    if !record.is_unsegmented() && !metric.admits_segments() {
                        out.stats.segment_rejected += 1;
                        continue;
                    }
                    match check_span(&record, min_days) {
                        SpanCheck::SubAnnual(_) => {
                            out.stats.sub_annual += 1;
                            continue;
                        }
                        SpanCheck::Malformed(reason) => {
                            out.issues.push(Issue::MalformedRecord {
                                tag: tag.clone(),
                                reason,
                            });
                        }
                        SpanCheck::Annual | SpanCheck::Instant => {}
                    }

                    out.candidates.push(CandidateRecord {
                        metric,
                        tag: tag.clone(),
                        unit: unit.clone(),
                        fiscal_year: record.fiscal_year(),
                        segment: record.segment_label().to_string(),
                        period_end: record.end,
                        value: record.val,
                    });
                }
            }
        }

        if !found {
            out.issues.push(Issue::MissingData {
                metric: metric.label().to_string(),
            });
        }
    }

    out.stats.candidates = out.candidates.len();
    debug!(
        seen = out.stats.records_seen,
        kept = out.stats.candidates,
        non_annual = out.stats.non_annual_form,
        sub_annual = out.stats.sub_annual,
        segment_rejected = out.stats.segment_rejected,
        "Extracted candidate records"
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annual::ANNUAL_MIN_DAYS;
    use keyratios_core::CanonicalMetric;
    use serde_json::{Value, json};

    fn doc(us_gaap: Value) -> CompanyFacts {
        CompanyFacts::from_value(&json!({"facts": {"us-gaap": us_gaap}}))
    }

    fn run(facts: &CompanyFacts) -> Extraction {
        extract(facts, &TagDictionary::standard(), ANNUAL_MIN_DAYS)
    }

    #[test]
    fn test_empty_document_yields_no_candidates() {
        let out = run(&CompanyFacts::from_value(&json!({"cik": 1})));
        assert!(out.candidates.is_empty());
        assert_eq!(out.issues.len(), TagDictionary::standard().len());
        assert!(out
            .issues
            .iter()
            .all(|i| matches!(i, Issue::MissingData { .. })));
    }

    #[test]
    fn test_only_annual_forms_are_kept() {
        let facts = doc(json!({
            "NetIncomeLoss": {"units": {"USD": [
                {"start": "2023-01-01", "end": "2023-12-31", "val": 10.0, "fy": 2023, "form": "10-K"},
                {"start": "2023-01-01", "end": "2023-12-31", "val": 11.0, "fy": 2023, "form": "10-K/A"},
                {"start": "2023-01-01", "end": "2023-12-31", "val": 12.0, "fy": 2023, "form": "8-K"},
                {"start": "2023-01-01", "end": "2023-12-31", "val": 13.0, "fy": 2023}
            ]}}
        }));

        let out = run(&facts);
        let values: Vec<f64> = out.candidates.iter().map(|c| c.value).collect();
        assert_eq!(values, vec![10.0, 11.0]);
        assert_eq!(out.stats.non_annual_form, 2);
    }

    #[test]
    fn test_quarterly_records_under_annual_form_are_dropped() {
        let facts = doc(json!({
            "Revenues": {"units": {"USD": [
                {"start": "2023-10-01", "end": "2023-12-31", "val": 25.0, "fy": 2023, "form": "10-K"},
                {"start": "2023-01-01", "end": "2023-12-31", "val": 100.0, "fy": 2023, "form": "10-K"}
            ]}}
        }));

        let out = run(&facts);
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.candidates[0].value, 100.0);
        assert_eq!(out.stats.sub_annual, 1);
    }

    #[test]
    fn test_segment_admission() {
        let facts = doc(json!({
            "Assets": {"units": {"USD": [
                {"end": "2023-12-31", "val": 500.0, "fy": 2023, "form": "10-K"},
                {"end": "2023-12-31", "val": 200.0, "fy": 2023, "form": "10-K", "segment": "Banking"}
            ]}},
            "Revenues": {"units": {"USD": [
                {"start": "2023-01-01", "end": "2023-12-31", "val": 40.0, "fy": 2023, "form": "10-K", "segment": "Banking"}
            ]}}
        }));

        let out = run(&facts);
        assert_eq!(out.stats.segment_rejected, 1);
        let assets: Vec<_> = out
            .candidates
            .iter()
            .filter(|c| c.metric == CanonicalMetric::TotalAssets)
            .collect();
        assert_eq!(assets.len(), 1);
        assert_eq!(assets[0].segment, "Total");

        let revenue: Vec<_> = out
            .candidates
            .iter()
            .filter(|c| c.metric == CanonicalMetric::Revenue)
            .collect();
        assert_eq!(revenue.len(), 1);
        assert_eq!(revenue[0].segment, "Banking");
    }

    #[test]
    fn test_records_sorted_most_recent_first() {
        let facts = doc(json!({
            "Assets": {"units": {"USD": [
                {"end": "2021-12-31", "val": 1.0, "fy": 2022, "form": "10-K"},
                {"end": "2020-12-31", "val": 2.0, "fy": null, "form": "10-K"},
                {"end": "2022-12-31", "val": 3.0, "fy": 2022, "form": "10-K"},
                {"end": "2023-12-31", "val": 4.0, "fy": 2023, "form": "10-K"}
            ]}}
        }));

        let out = run(&facts);
        let order: Vec<(i32, f64)> = out
            .candidates
            .iter()
            .map(|c| (c.fiscal_year, c.value))
            .collect();
        assert_eq!(order, vec![(2023, 4.0), (2022, 3.0), (2022, 1.0), (0, 2.0)]);
    }

    #[test]
    fn test_malformed_records_are_reported_not_fatal() {
        let facts = doc(json!({
            "Assets": {"units": {"USD": [
                {"end": "2023-12-31", "val": "lots", "fy": 2023, "form": "10-K"},
                {"start": "garbage", "end": "2023-12-31", "val": 7.0, "fy": 2023, "form": "10-K"}
            ]}}
        }));

        let out = run(&facts);
        assert_eq!(out.stats.malformed, 1);
        assert_eq!(out.candidates.len(), 1);
        assert_eq!(out.candidates[0].value, 7.0);
        let malformed = out
            .issues
            .iter()
            .filter(|i| matches!(i, Issue::MalformedRecord { .. }))
            .count();
        assert_eq!(malformed, 2);
    }

    #[test]
    fn test_all_synonym_tags_and_units_are_collected() {
        let facts = doc(json!({
            "Revenues": {"units": {"USD": [
                {"start": "2023-01-01", "end": "2023-12-31", "val": 1.0, "fy": 2023, "form": "10-K"}
            ]}},
            "SalesRevenueNet": {"units": {
                "USD": [{"start": "2012-01-01", "end": "2012-12-31", "val": 2.0, "fy": 2012, "form": "10-K"}],
                "EUR": [{"start": "2012-01-01", "end": "2012-12-31", "val": 3.0, "fy": 2012, "form": "10-K"}]
            }}
        }));

        let out = run(&facts);
        let tags: Vec<&str> = out.candidates.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["Revenues", "SalesRevenueNet", "SalesRevenueNet"]);
        assert!(!out
            .issues
            .iter()
            .any(|i| *i == Issue::MissingData { metric: "Net Sales / Revenue".into() }));
    }
}
