//! Manually supplied stock split ratios.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::error::{DataError, Result};
use crate::types::Symbol;

/// Split ratios keyed by ticker and the fiscal year in which the split shows up.
///
/// An override for `(ticker, year)` takes precedence over automatic detection
/// for the pair `(year, year - 1)`.
///
/// Deserializes from JSON of the form `{"TSLA": {"2022": 3.0}}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SplitOverrides {
    splits: HashMap<Symbol, BTreeMap<i32, f64>>,
}

impl SplitOverrides {
    /// Creates an empty override table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Splits known to be missed by automatic detection.
    #[must_use]
    pub fn builtin() -> Self {
        Self::new().with("TSLA", 2022, 3.0).with("TSLA", 2020, 5.0)
    }

    /// Adds an override, replacing any existing one for the same ticker and year.
    pub fn insert(&mut self, symbol: impl Into<Symbol>, fiscal_year: i32, ratio: f64) {
        self.splits
            .entry(symbol.into())
            .or_default()
            .insert(fiscal_year, ratio);
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, symbol: impl Into<Symbol>, fiscal_year: i32, ratio: f64) -> Self {
        self.insert(symbol, fiscal_year, ratio);
        self
    }

    /// Merges another table into this one; entries in `other` win.
    pub fn merge(&mut self, other: Self) {
        for (symbol, years) in other.splits {
            self.splits.entry(symbol).or_default().extend(years);
        }
    }

    /// Override ratio for a ticker in a fiscal year.
    #[must_use]
    pub fn get(&self, symbol: &Symbol, fiscal_year: i32) -> Option<f64> {
        self.splits.get(symbol)?.get(&fiscal_year).copied()
    }

    /// Parses an override table from JSON.
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DataError::Parse(format!("Failed to parse split overrides: {}", e)))
    }

    /// Total number of (ticker, year) overrides.
    #[must_use]
    pub fn len(&self) -> usize {
        self.splits.values().map(BTreeMap::len).sum()
    }

    /// Returns true if there are no overrides.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One override in `TICKER:YEAR:RATIO` form, as typed on a command line.
#[derive(Clone, Debug, PartialEq)]
pub struct SplitSpec {
    /// Ticker the split applies to.
    pub symbol: Symbol,
    /// Fiscal year the split shows up in.
    pub fiscal_year: i32,
    /// Split ratio (2.0 for 2-for-1).
    pub ratio: f64,
}

impl FromStr for SplitSpec {
    type Err = DataError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || {
            DataError::InvalidParameter(format!("expected TICKER:YEAR:RATIO, got {s:?}"))
        };

        let mut parts = s.split(':');
        let (Some(ticker), Some(year), Some(ratio), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(invalid());
        };

        let symbol = Symbol::new(ticker);
        let fiscal_year = year.trim().parse().map_err(|_| invalid())?;
        let ratio: f64 = ratio.trim().parse().map_err(|_| invalid())?;
        if symbol.is_empty() || !ratio.is_finite() || ratio <= 0.0 {
            return Err(invalid());
        }

        Ok(Self {
            symbol,
            fiscal_year,
            ratio,
        })
    }
}

impl FromIterator<SplitSpec> for SplitOverrides {
    fn from_iter<I: IntoIterator<Item = SplitSpec>>(iter: I) -> Self {
        let mut overrides = Self::new();
        for spec in iter {
            overrides.insert(spec.symbol, spec.fiscal_year, spec.ratio);
        }
        overrides
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let overrides = SplitOverrides::builtin();
        assert_eq!(overrides.get(&Symbol::new("tsla"), 2022), Some(3.0));
        assert_eq!(overrides.get(&Symbol::new("TSLA"), 2021), None);
        assert_eq!(overrides.get(&Symbol::new("AAPL"), 2020), None);
        assert_eq!(overrides.len(), 2);
    }

    #[test]
    fn test_json_round_trip_shape() {
        let overrides = SplitOverrides::from_json_str(r#"{"AAPL": {"2020": 4.0}}"#).unwrap();
        assert_eq!(overrides.get(&Symbol::new("AAPL"), 2020), Some(4.0));
        assert!(SplitOverrides::from_json_str(r#"{"AAPL": 4}"#).is_err());
    }

    #[test]
    fn test_merge_prefers_other() {
        let mut base = SplitOverrides::builtin();
        base.merge(SplitOverrides::new().with("TSLA", 2022, 2.0).with("NVDA", 2024, 10.0));
        assert_eq!(base.get(&Symbol::new("TSLA"), 2022), Some(2.0));
        assert_eq!(base.get(&Symbol::new("TSLA"), 2020), Some(5.0));
        assert_eq!(base.get(&Symbol::new("NVDA"), 2024), Some(10.0));
    }

    #[test]
    fn test_split_spec_parsing() {
        let spec: SplitSpec = "nvda:2024:10".parse().unwrap();
        assert_eq!(spec.symbol.as_str(), "NVDA");
        assert_eq!(spec.fiscal_year, 2024);
        assert_eq!(spec.ratio, 10.0);

        for bad in ["NVDA", "NVDA:2024", "NVDA:year:2", "NVDA:2024:-1", ":2024:2", "A:1:2:3"] {
            assert!(bad.parse::<SplitSpec>().is_err(), "{bad}");
        }
    }
}
