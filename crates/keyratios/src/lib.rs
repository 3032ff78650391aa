#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/keyratios/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Normalized annual key ratios from SEC XBRL company facts.
//!
//! This crate re-exports the core types, the normalization pipeline and the
//! provider implementations, and provides a [`KeyRatiosRunner`] that fetches
//! and normalizes many tickers concurrently.
//!
//! # Features
//!
//! - `edgar` - SEC EDGAR facts provider (default)
//!
//! # Example
//!
//! ```rust,ignore
//! use keyratios::{KeyRatiosRunner, PipelineConfig, SplitOverrides, Symbol};
//!
//! #[tokio::main]
//! async fn main() -> keyratios::Result<()> {
//!     let runner = KeyRatiosRunner::new(PipelineConfig::new(5))
//!         .with_overrides(SplitOverrides::builtin())
//!         .with_edgar("MyApp/1.0 (contact@example.com)")?;
//!
//!     let symbols = [Symbol::new("AAPL"), Symbol::new("TSLA")];
//!     for (symbol, result) in runner.run_batch(&symbols, 2).await {
//!         match result {
//!             Ok(report) => println!("{symbol}: {} years in {}", report.table.len(), report.scale),
//!             Err(e) => println!("{symbol}: {e}"),
//!         }
//!     }
//!
//!     Ok(())
//! }
//! ```

// Core types and traits
pub use keyratios_core::*;

// Pipeline
pub use keyratios_pipeline::{
    CandidateRecord, CompanyReport, ExtractionStats, Pipeline, PipelineConfig, RatioRounding,
    SplitEvent, SplitPolicy, SplitSource,
};

// Providers
#[cfg(feature = "edgar")]
pub use keyratios_edgar::EdgarProvider;

mod runner;
pub use runner::KeyRatiosRunner;
