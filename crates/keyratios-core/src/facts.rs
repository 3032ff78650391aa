//! The raw company facts document.
//!
//! The SEC companyfacts API returns a nested mapping
//! `facts -> us-gaap -> <Tag> -> units -> <unit> -> [record]`. Documents in the
//! wild are not always well formed, so [`CompanyFacts`] is built tolerantly:
//! a missing or mistyped container degrades to empty, and individual records
//! are decoded lazily so one bad record never poisons the rest.

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{DataError, Result};

/// Taxonomy holding the statement tags.
pub const US_GAAP: &str = "us-gaap";

/// Segment label given to records that carry no segment.
pub const TOTAL_SEGMENT: &str = "Total";

/// Filing forms that carry annual figures.
pub const ANNUAL_FORMS: [&str; 2] = ["10-K", "10-K/A"];

/// Date format used by the companyfacts API.
const DATE_FORMAT: &str = "%Y-%m-%d";

/// All disclosures filed under one tag.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TagFacts {
    /// Human-readable label of the tag.
    pub label: Option<String>,
    /// Undecoded records per reporting unit (`USD`, `shares`, `USD/shares`, ...).
    pub units: BTreeMap<String, Vec<Value>>,
}

impl TagFacts {
    fn from_value(value: &Value) -> Self {
        let label = value.get("label").and_then(Value::as_str).map(String::from);
        let units = value
            .get("units")
            .and_then(Value::as_object)
            .map(|units| {
                units
                    .iter()
                    .filter_map(|(unit, records)| {
                        records
                            .as_array()
                            .map(|records| (unit.clone(), records.clone()))
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self { label, units }
    }
}

/// A company's raw facts document, restricted to the US-GAAP taxonomy.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CompanyFacts {
    /// SEC CIK number, when the document carries one.
    pub cik: Option<u64>,
    /// Registrant name, when the document carries one.
    pub entity_name: Option<String>,
    tags: BTreeMap<String, TagFacts>,
}

impl CompanyFacts {
    /// Builds a document from parsed JSON. Never fails; missing pieces become empty.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let cik = value.get("cik").and_then(|c| {
            c.as_u64()
                .or_else(|| c.as_str().and_then(|s| s.parse().ok()))
        });
        let entity_name = value
            .get("entityName")
            .and_then(Value::as_str)
            .map(String::from);
        let tags = value
            .get("facts")
            .and_then(|facts| facts.get(US_GAAP))
            .and_then(Value::as_object)
            .map(|gaap| {
                gaap.iter()
                    .map(|(tag, facts)| (tag.clone(), TagFacts::from_value(facts)))
                    .collect()
            })
            .unwrap_or_default();

        Self {
            cik,
            entity_name,
            tags,
        }
    }

    /// Parses a JSON document. Fails only if the text is not JSON at all.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| DataError::Parse(format!("Failed to parse company facts: {}", e)))?;
        Ok(Self::from_value(&value))
    }

    /// Disclosures under a tag, if present.
    #[must_use]
    pub fn tag(&self, tag: &str) -> Option<&TagFacts> {
        self.tags.get(tag)
    }

    /// Number of tags in the document.
    #[must_use]
    pub fn tag_count(&self) -> usize {
        self.tags.len()
    }

    /// Returns true if the document holds no US-GAAP tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// A single disclosure record.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct RawFact {
    /// Fiscal year of the filing the record came from.
    #[serde(default)]
    pub fy: Option<i32>,
    /// Fiscal period (`FY`, `Q1`, ...).
    #[serde(default)]
    pub fp: Option<String>,
    /// Period start, for duration facts.
    #[serde(default)]
    pub start: Option<String>,
    /// Period end.
    #[serde(default)]
    pub end: Option<String>,
    /// Reported value.
    pub val: f64,
    /// Filing form type.
    #[serde(default)]
    pub form: Option<String>,
    /// Business segment the value is reported for.
    #[serde(default)]
    pub segment: Option<String>,
    /// Accession number of the filing.
    #[serde(default)]
    pub accn: Option<String>,
    /// Date the filing was made.
    #[serde(default)]
    pub filed: Option<String>,
    /// Calendar frame (`CY2023`, `CY2023Q4I`, ...).
    #[serde(default)]
    pub frame: Option<String>,
}

impl RawFact {
    /// Decodes one record, describing the problem on failure.
    pub fn from_value(value: &Value) -> std::result::Result<Self, String> {
        Self::deserialize(value).map_err(|e| e.to_string())
    }

    /// Fiscal year, with a missing value treated as 0 (unknown).
    #[must_use]
    pub fn fiscal_year(&self) -> i32 {
        self.fy.unwrap_or(0)
    }

    /// Segment label; absent or blank segments read as [`TOTAL_SEGMENT`].
    #[must_use]
    pub fn segment_label(&self) -> &str {
        match self.segment.as_deref().map(str::trim) {
            None | Some("") => TOTAL_SEGMENT,
            Some(s) => s,
        }
    }

    /// Returns true if the record is not broken out by segment.
    #[must_use]
    pub fn is_unsegmented(&self) -> bool {
        self.segment_label() == TOTAL_SEGMENT
    }

    /// Returns true if the record came from an annual filing.
    #[must_use]
    pub fn is_annual_form(&self) -> bool {
        self.form
            .as_deref()
            .is_some_and(|form| ANNUAL_FORMS.contains(&form))
    }

    /// Days between period start and end.
    ///
    /// `Ok(None)` when either date is absent (instant facts), `Err` when a date
    /// is present but cannot be parsed.
    pub fn span_days(&self) -> std::result::Result<Option<i64>, String> {
        let (Some(start), Some(end)) = (self.start.as_deref(), self.end.as_deref()) else {
            return Ok(None);
        };
        let start = NaiveDate::parse_from_str(start, DATE_FORMAT)
            .map_err(|e| format!("invalid start date {start:?}: {e}"))?;
        let end = NaiveDate::parse_from_str(end, DATE_FORMAT)
            .map_err(|e| format!("invalid end date {end:?}: {e}"))?;
        Ok(Some(end.signed_duration_since(start).num_days()))
    }
}
