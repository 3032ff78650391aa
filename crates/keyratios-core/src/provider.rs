//! Provider traits for the collaborators that precede the pipeline.
//!
//! - [`DataProvider`] - Base trait for all providers
//! - [`FactsProvider`] - Ticker resolution and raw facts retrieval

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::Result, facts::CompanyFacts, types::Symbol};

/// Base trait for all data providers.
pub trait DataProvider: Send + Sync + Debug {
    /// Returns the name of this provider (e.g., "SEC EDGAR").
    fn name(&self) -> &str;

    /// Returns a description of this provider.
    fn description(&self) -> &str;
}

/// Provider for raw company facts documents.
///
/// Failures here are fatal for one ticker only; callers are expected to
/// catch them and move on to the next ticker.
#[async_trait]
pub trait FactsProvider: DataProvider {
    /// Resolves a ticker to the company's zero-padded 10-digit CIK.
    async fn resolve_cik(&self, symbol: &Symbol) -> Result<String>;

    /// Fetches the raw facts document for a CIK.
    async fn fetch_company_facts(&self, cik: &str) -> Result<CompanyFacts>;

    /// Resolves a ticker and fetches its facts document.
    async fn fetch_for_symbol(&self, symbol: &Symbol) -> Result<CompanyFacts> {
        let cik = self.resolve_cik(symbol).await?;
        self.fetch_company_facts(&cik).await
    }
}
