#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keyratios/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Normalization of annual XBRL facts into a split-adjusted ratio table.
//!
//! Stages run strictly in order, each over the output of the previous one:
//!
//! 1. [`extract`](extract::extract) - tagged records to candidate records
//! 2. [`check_span`](annual::check_span) - drop sub-annual periods
//! 3. [`deduplicate`](dedup::deduplicate) - one record per metric, year and segment
//! 4. [`consolidate`](shares::consolidate) - company-wide share counts
//! 5. [`build_table`](pivot::build_table) - the year-indexed table
//! 6. [`SplitPolicy::restate`](splits::SplitPolicy::restate) - stock split restatement
//! 7. [`compute_ratios`](ratios::compute_ratios) - derived ratios
//! 8. [`normalize_scale`](scale::normalize_scale) - presentation scale
//!
//! [`Pipeline`](pipeline::Pipeline) runs all of them for one company.

/// Annual period filter.
pub mod annual;
/// Duplicate resolution.
pub mod dedup;
/// Fact extraction.
pub mod extract;
/// Pipeline configuration and entry point.
pub mod pipeline;
/// Pivot into the period table.
pub mod pivot;
/// Ratio derivation.
pub mod ratios;
/// Records flowing between stages.
pub mod record;
/// Presentation scale.
pub mod scale;
/// Share consolidation.
pub mod shares;
/// Stock split detection and restatement.
pub mod splits;

pub use pipeline::{CompanyReport, Pipeline, PipelineConfig};
pub use record::{CandidateRecord, ExtractionStats};
pub use splits::{RatioRounding, SplitEvent, SplitPolicy, SplitSource};
