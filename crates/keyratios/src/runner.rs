//! Per-ticker orchestration: resolve, fetch, normalize.

use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, instrument, warn};

use keyratios_core::{
    CompanyFacts, DataError, FactsProvider, Result, SplitOverrides, Symbol, TagDictionary,
};
use keyratios_pipeline::{CompanyReport, Pipeline, PipelineConfig};

/// Runs the normalization pipeline for tickers, fetching their facts from
/// registered providers.
///
/// Providers are tried in registration order until one returns a document.
/// A failure only ever affects the ticker it happened for.
///
/// # Example
///
/// ```rust,ignore
/// use keyratios::{KeyRatiosRunner, PipelineConfig, Symbol};
///
/// let runner = KeyRatiosRunner::new(PipelineConfig::new(5))
///     .with_edgar("MyApp/1.0 (contact@example.com)")?;
///
/// let report = runner.run(&Symbol::new("AAPL")).await?;
/// println!("{} years, scale {}", report.table.len(), report.scale);
/// ```
#[derive(Clone)]
pub struct KeyRatiosRunner {
    providers: Vec<Arc<dyn FactsProvider>>,
    pipeline: Pipeline,
}

impl std::fmt::Debug for KeyRatiosRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyRatiosRunner")
            .field(
                "providers",
                &self.providers.iter().map(|p| p.name()).collect::<Vec<_>>(),
            )
            .field("pipeline", &self.pipeline)
            .finish()
    }
}

impl KeyRatiosRunner {
    /// Creates a runner with the standard tag dictionary and no split overrides.
    #[must_use]
    pub fn new(config: PipelineConfig) -> Self {
        Self::with_pipeline(Pipeline::new(
            config,
            Arc::new(TagDictionary::standard()),
            Arc::new(SplitOverrides::new()),
        ))
    }

    /// Creates a runner around an existing pipeline.
    #[must_use]
    pub const fn with_pipeline(pipeline: Pipeline) -> Self {
        Self {
            providers: Vec::new(),
            pipeline,
        }
    }

    /// Replaces the split overrides, keeping the configuration and dictionary.
    #[must_use]
    pub fn with_overrides(self, overrides: SplitOverrides) -> Self {
        let pipeline = Pipeline::new(
            self.pipeline.config().clone(),
            Arc::new(self.pipeline.dictionary().clone()),
            Arc::new(overrides),
        );
        Self { pipeline, ..self }
    }

    /// Register a facts provider.
    pub fn register_provider(&mut self, provider: Arc<dyn FactsProvider>) {
        debug!(provider = provider.name(), "Registering facts provider");
        self.providers.push(provider);
    }

    /// Builder-style [`register_provider`](Self::register_provider).
    #[must_use]
    pub fn with_provider(mut self, provider: Arc<dyn FactsProvider>) -> Self {
        self.register_provider(provider);
        self
    }

    /// Add the SEC EDGAR provider.
    #[cfg(feature = "edgar")]
    pub fn with_edgar(self, user_agent: &str) -> Result<Self> {
        let provider = keyratios_edgar::EdgarProvider::new(user_agent)?;
        Ok(self.with_provider(Arc::new(provider)))
    }

    /// Pipeline run for every ticker.
    #[must_use]
    pub const fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Fetches the facts document, trying providers in order until one succeeds.
    async fn fetch(&self, symbol: &Symbol) -> Result<CompanyFacts> {
        if self.providers.is_empty() {
            return Err(DataError::ProviderNotConfigured(
                "No facts providers registered".to_string(),
            ));
        }

        let mut last_error = None;
        for provider in &self.providers {
            debug!(
                provider = provider.name(),
                symbol = %symbol,
                "Fetching company facts"
            );

            match provider.fetch_for_symbol(symbol).await {
                Ok(facts) => return Ok(facts),
                Err(e) => {
                    warn!(
                        provider = provider.name(),
                        error = %e,
                        "Provider failed, trying next"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| DataError::Other("All providers failed with no error".to_string())))
    }

    /// Resolves, fetches and normalizes one ticker.
    #[instrument(skip(self), fields(symbol = %symbol))]
    pub async fn run(&self, symbol: &Symbol) -> Result<CompanyReport> {
        if symbol.is_empty() {
            return Err(DataError::InvalidParameter("Empty ticker".to_string()));
        }

        let facts = self.fetch(symbol).await?;
        debug!(
            tags = facts.tag_count(),
            entity = facts.entity_name.as_deref().unwrap_or(""),
            "Fetched company facts"
        );
        Ok(self.pipeline.run(symbol, &facts))
    }

    /// Runs many tickers with at most `concurrency` in flight.
    ///
    /// Results come back in input order. A failed ticker is logged and kept
    /// as an `Err`; the rest of the batch carries on.
    pub async fn run_batch(
        &self,
        symbols: &[Symbol],
        concurrency: usize,
    ) -> Vec<(Symbol, Result<CompanyReport>)> {
        let results: Vec<(Symbol, Result<CompanyReport>)> = stream::iter(symbols.iter().cloned())
            .map(|symbol| async move {
                let result = self.run(&symbol).await;
                if let Err(e) = &result {
                    warn!(symbol = %symbol, error = %e, "Ticker failed");
                }
                (symbol, result)
            })
            .buffered(concurrency.max(1))
            .collect()
            .await;

        let failed = results.iter().filter(|(_, r)| r.is_err()).count();
        info!(
            tickers = results.len(),
            failed,
            "Batch complete"
        );
        results
    }
}
