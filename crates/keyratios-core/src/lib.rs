#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keyratios/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for normalizing XBRL annual facts.
//!
//! This crate provides the shared vocabulary of the workspace:
//!
//! - [`CanonicalMetric`](metric::CanonicalMetric) and [`TagDictionary`](metric::TagDictionary) - what to extract
//! - [`CompanyFacts`](facts::CompanyFacts) and [`RawFact`](facts::RawFact) - the raw disclosures
//! - [`PeriodTable`](table::PeriodTable) - the year-indexed output table
//! - [`SplitOverrides`](overrides::SplitOverrides) - manually supplied split ratios
//! - [`FactsProvider`](provider::FactsProvider) - where raw documents come from

/// Error types for fact normalization.
pub mod error;
/// The raw company facts document.
pub mod facts;
/// Canonical metrics and the tag dictionary.
pub mod metric;
/// Manually supplied stock split ratios.
pub mod overrides;
/// Provider traits for fetching raw facts.
pub mod provider;
/// The year-indexed period table.
pub mod table;
/// Identifier types.
pub mod types;

// Re-export commonly used items at crate root
pub use error::{DataError, Issue, Result};
pub use facts::{CompanyFacts, RawFact, TOTAL_SEGMENT, TagFacts};
pub use metric::{AggregationPolicy, CanonicalMetric, Measure, MetricTags, StatementGroup, TagDictionary};
pub use overrides::{SplitOverrides, SplitSpec};
pub use provider::{DataProvider, FactsProvider};
pub use table::{Column, PeriodRow, PeriodTable, Ratio, Scale};
pub use types::{Symbol, pad_cik};
