//! Error types for fact normalization.
//!
//! This module defines two kinds of failure:
//!
//! - [`DataError`] is returned as `Err` and covers everything that stops a
//!   single ticker from being processed (identifier resolution, fetch, parse).
//! - [`Issue`] is never returned as `Err`. The pipeline records it on its
//!   report and carries on with a default (zero, pass-through or a blank cell).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort processing of one ticker.
#[derive(Error, Debug)]
pub enum DataError {
    /// Network-related errors (connection failures, timeouts, non-2xx responses).
    #[error("Network error: {0}")]
    Network(String),

    /// Rate limit exceeded by a provider.
    #[error("Rate limited by {provider}: retry after {retry_after:?}")]
    RateLimited {
        /// The provider that rate limited the request.
        provider: String,
        /// Suggested time to wait before retrying.
        retry_after: Option<std::time::Duration>,
    },

    /// The requested symbol could not be resolved to a company identifier.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// Error parsing a document returned by a provider.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The runner has no facts provider to fetch from.
    #[error("Provider not configured: {0}")]
    ProviderNotConfigured(String),

    /// An invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Writing a finished table failed.
    #[error("Export error: {0}")]
    Export(String),

    /// Any other error.
    #[error("{0}")]
    Other(String),
}

impl From<polars::prelude::PolarsError> for DataError {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Self::Export(err.to_string())
    }
}

/// Result type alias using [`DataError`].
pub type Result<T> = std::result::Result<T, DataError>;

/// A recoverable data problem noticed while normalizing one company.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Issue {
    /// No accepted tag for the metric exists in the document; the metric defaults to zero.
    #[error("No disclosure found for {metric}; defaulting to zero")]
    MissingData {
        /// Label of the canonical metric.
        metric: String,
    },

    /// A single record could not be decoded and was skipped or passed through.
    #[error("Malformed record under {tag}: {reason}")]
    MalformedRecord {
        /// Source tag the record was filed under.
        tag: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A ratio denominator was zero or missing; the cell is left undefined.
    #[error("{column} is undefined for FY{fiscal_year}")]
    DivisionUndefined {
        /// Fiscal year of the affected row.
        fiscal_year: i32,
        /// Label of the affected column.
        column: String,
    },
}
