//! Pipeline configuration and the end-to-end run for one company.

use chrono::{Datelike, Utc};
use keyratios_core::{
    CompanyFacts, DataError, Issue, PeriodTable, Result, Scale, SplitOverrides, Symbol,
    TagDictionary,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::annual::ANNUAL_MIN_DAYS;
use crate::dedup::deduplicate;
use crate::extract::extract;
use crate::pivot::build_table;
use crate::ratios::compute_ratios;
use crate::record::ExtractionStats;
use crate::scale::normalize_scale;
use crate::shares::consolidate;
use crate::splits::{
    DEFAULT_APPLY_THRESHOLD, DEFAULT_DETECTION_THRESHOLD, RatioRounding, SplitEvent, SplitPolicy,
};

/// Default number of fiscal years requested.
pub const DEFAULT_HORIZON_YEARS: u32 = 10;

/// Extra years kept before the horizon for split detection and averages.
pub const DEFAULT_LOOKBACK_BUFFER: u32 = 2;

/// Tunables of a [`Pipeline`].
///
/// Every field has a default, so a partial JSON or TOML document deserializes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of fiscal years requested.
    pub horizon_years: u32,
    /// Year the window is counted back from. Current UTC year when unset.
    pub as_of_year: Option<i32>,
    /// Years kept beyond the horizon.
    pub lookback_buffer: u32,
    /// Share ratio above which a split is suspected.
    pub split_detection_threshold: f64,
    /// Effective split ratio above which history is restated.
    pub split_apply_threshold: f64,
    /// Shortest duration period accepted as a fiscal year, in days.
    pub annual_min_days: i64,
    /// Rounding of detected split ratios.
    pub ratio_rounding: RatioRounding,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            horizon_years: DEFAULT_HORIZON_YEARS,
            as_of_year: None,
            lookback_buffer: DEFAULT_LOOKBACK_BUFFER,
            split_detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            split_apply_threshold: DEFAULT_APPLY_THRESHOLD,
            annual_min_days: ANNUAL_MIN_DAYS,
            ratio_rounding: RatioRounding::default(),
        }
    }
}

impl PipelineConfig {
    /// Default configuration for a horizon of `years`.
    #[must_use]
    pub fn new(horizon_years: u32) -> Self {
        Self::default().with_horizon_years(horizon_years)
    }

    /// Sets the number of fiscal years requested.
    #[must_use]
    pub const fn with_horizon_years(mut self, years: u32) -> Self {
        self.horizon_years = years;
        self
    }

    /// Pins the year the window is counted back from.
    #[must_use]
    pub const fn with_as_of_year(mut self, year: i32) -> Self {
        self.as_of_year = Some(year);
        self
    }

    /// Sets the years kept beyond the horizon.
    #[must_use]
    pub const fn with_lookback_buffer(mut self, years: u32) -> Self {
        self.lookback_buffer = years;
        self
    }

    /// Sets the split detection and apply thresholds.
    #[must_use]
    pub const fn with_split_thresholds(mut self, detection: f64, apply: f64) -> Self {
        self.split_detection_threshold = detection;
        self.split_apply_threshold = apply;
        self
    }

    /// Sets the shortest accepted annual span.
    #[must_use]
    pub const fn with_annual_min_days(mut self, days: i64) -> Self {
        self.annual_min_days = days;
        self
    }

    /// Sets the rounding of detected split ratios.
    #[must_use]
    pub const fn with_ratio_rounding(mut self, rounding: RatioRounding) -> Self {
        self.ratio_rounding = rounding;
        self
    }

    /// Checks the configuration for values the pipeline cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.horizon_years == 0 {
            return Err(DataError::InvalidParameter(
                "horizon_years must be positive".to_string(),
            ));
        }
        if !self.split_detection_threshold.is_finite() || self.split_detection_threshold < 1.0 {
            return Err(DataError::InvalidParameter(format!(
                "split_detection_threshold must be at least 1.0, got {}",
                self.split_detection_threshold
            )));
        }
        if !self.split_apply_threshold.is_finite() || self.split_apply_threshold < 1.0 {
            return Err(DataError::InvalidParameter(format!(
                "split_apply_threshold must be at least 1.0, got {}",
                self.split_apply_threshold
            )));
        }
        if self.annual_min_days <= 0 {
            return Err(DataError::InvalidParameter(format!(
                "annual_min_days must be positive, got {}",
                self.annual_min_days
            )));
        }
        Ok(())
    }

    /// Year the window is counted back from.
    #[must_use]
    pub fn as_of_year(&self) -> i32 {
        self.as_of_year.unwrap_or_else(|| Utc::now().year())
    }

    /// Oldest fiscal year kept in the table.
    #[must_use]
    pub fn min_fiscal_year(&self) -> i32 {
        let span = self.horizon_years.saturating_add(self.lookback_buffer);
        self.as_of_year()
            .saturating_sub(i32::try_from(span).unwrap_or(i32::MAX))
    }

    /// Split thresholds and rounding as a policy.
    #[must_use]
    pub const fn split_policy(&self) -> SplitPolicy {
        SplitPolicy {
            detection_threshold: self.split_detection_threshold,
            apply_threshold: self.split_apply_threshold,
            rounding: self.ratio_rounding,
        }
    }
}

/// Everything produced for one company.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompanyReport {
    /// Ticker the report is for.
    pub symbol: Symbol,
    /// Scaled, split-adjusted table with derived ratios, most recent year first.
    pub table: PeriodTable,
    /// Scale applied to currency and share columns.
    pub scale: Scale,
    /// Restatements applied, most recent first.
    pub splits: Vec<SplitEvent>,
    /// Recoverable problems, in the order they were noticed.
    pub issues: Vec<Issue>,
    /// Extraction counters.
    pub stats: ExtractionStats,
}

/// Normalization pipeline shared across companies.
///
/// Cheap to clone; the dictionary and overrides are shared.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    dictionary: Arc<TagDictionary>,
    overrides: Arc<SplitOverrides>,
}

impl Pipeline {
    /// Creates a pipeline.
    #[must_use]
    pub const fn new(
        config: PipelineConfig,
        dictionary: Arc<TagDictionary>,
        overrides: Arc<SplitOverrides>,
    ) -> Self {
        Self {
            config,
            dictionary,
            overrides,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Tag dictionary in use.
    #[must_use]
    pub fn dictionary(&self) -> &TagDictionary {
        &self.dictionary
    }

    /// Split overrides in use.
    #[must_use]
    pub fn overrides(&self) -> &SplitOverrides {
        &self.overrides
    }

    /// Runs every stage over one company's facts.
    ///
    /// Never fails: data problems end up in [`CompanyReport::issues`] and the
    /// affected cells default to zero or stay undefined.
    #[instrument(skip(self, facts), fields(symbol = %symbol))]
    pub fn run(&self, symbol: &Symbol, facts: &CompanyFacts) -> CompanyReport {
        let extraction = extract(facts, &self.dictionary, self.config.annual_min_days);
        let mut issues = extraction.issues;

        let deduplicated = deduplicate(extraction.candidates);
        let mut records = deduplicated.picked;
        records.extend(consolidate(deduplicated.deferred));

        let mut table = build_table(records, self.config.min_fiscal_year());
        let splits = self
            .config
            .split_policy()
            .restate(&mut table, symbol, &self.overrides);
        issues.extend(compute_ratios(&mut table));
        let scale = normalize_scale(&mut table);

        info!(
            years = table.len(),
            splits = splits.len(),
            issues = issues.len(),
            scale = %scale,
            "Normalized company facts"
        );

        CompanyReport {
            symbol: symbol.clone(),
            table,
            scale,
            splits,
            issues,
            stats: extraction.stats,
        }
    }
}
