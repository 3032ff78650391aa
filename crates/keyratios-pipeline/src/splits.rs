//! Stock split detection and retroactive restatement.
//!
//! A split multiplies the share count between two fiscal years without any
//! change in the underlying business. Left alone it makes every per-share
//! series before the split incomparable with the series after it, so older
//! share counts are rescaled and their diluted EPS recomputed.

use keyratios_core::{CanonicalMetric, PeriodTable, SplitOverrides, Symbol};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ratios::diluted_eps;

/// Year-over-year share ratio above which a split is suspected.
pub const DEFAULT_DETECTION_THRESHOLD: f64 = 1.4;

/// Effective ratio above which a restatement is applied.
pub const DEFAULT_APPLY_THRESHOLD: f64 = 1.1;

/// Rounding of a detected share ratio to a whole split ratio.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RatioRounding {
    /// Ties go to the even integer: 2.5 becomes 2.
    #[default]
    HalfToEven,
    /// Ties go away from zero: 2.5 becomes 3.
    HalfAwayFromZero,
}

impl RatioRounding {
    /// Rounds `ratio` to a whole number.
    #[must_use]
    pub fn round(self, ratio: f64) -> f64 {
        match self {
            Self::HalfToEven => ratio.round_ties_even(),
            Self::HalfAwayFromZero => ratio.round(),
        }
    }
}

/// Where an applied split ratio came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SplitSource {
    /// Supplied in the override table.
    Manual,
    /// Inferred from the share count jump.
    Detected,
}

/// A restatement applied to every year before `fiscal_year`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitEvent {
    /// First fiscal year reported on the post-split share basis.
    pub fiscal_year: i32,
    /// Factor applied to earlier share counts.
    pub ratio: f64,
    /// Origin of the ratio.
    pub source: SplitSource,
}

/// Thresholds and rounding used by [`SplitPolicy::restate`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SplitPolicy {
    /// A share ratio must exceed this, before and after rounding, to count as a split.
    pub detection_threshold: f64,
    /// The effective ratio must exceed this for anything to be rewritten.
    pub apply_threshold: f64,
    /// Rounding of detected ratios.
    pub rounding: RatioRounding,
}

impl Default for SplitPolicy {
    fn default() -> Self {
        Self {
            detection_threshold: DEFAULT_DETECTION_THRESHOLD,
            apply_threshold: DEFAULT_APPLY_THRESHOLD,
            rounding: RatioRounding::default(),
        }
    }
}

impl SplitPolicy {
    /// Split ratio implied by a share count moving from `prior` to `current`.
    ///
    /// `None` unless both counts are positive and the rounded ratio still
    /// exceeds the detection threshold.
    #[must_use]
    pub fn detect(&self, current: f64, prior: f64) -> Option<f64> {
        if current <= 0.0 || prior <= 0.0 {
            return None;
        }
        let raw = current / prior;
        if raw <= self.detection_threshold {
            return None;
        }
        Some(self.rounding.round(raw)).filter(|r| *r > self.detection_threshold)
    }

    /// Detects splits between consecutive fiscal years and restates the table.
    ///
    /// Pairs are visited most recent first and only across adjacent years.
    /// A non-zero override for `(symbol, current year)` replaces detection
    /// outright, so an override of 1.0 or below suppresses a detected split. Each
    /// applied ratio multiplies the share count of every year up to the prior
    /// year and recomputes its diluted EPS; successive splits compound.
    /// Finally, any year whose EPS is still zero or undefined gets it
    /// computed from net income, preferred dividends and shares.
    pub fn restate(
        &self,
        table: &mut PeriodTable,
        symbol: &Symbol,
        overrides: &SplitOverrides,
    ) -> Vec<SplitEvent> {
        for row in table.rows_mut() {
            row.fill_zero(CanonicalMetric::NetIncome);
            row.fill_zero(CanonicalMetric::PreferredDividends);
            row.fill_zero(CanonicalMetric::DilutedSharesOutstanding);
            row.fill_zero(CanonicalMetric::EpsDiluted);
        }

        let mut events = Vec::new();
        let years = table.years();
        for pair in years.windows(2) {
            let (current_year, prior_year) = (pair[0], pair[1]);
            if current_year - prior_year != 1 {
                debug!(current_year, prior_year, "Skipping non-adjacent years");
                continue;
            }

            let shares = |year: i32| {
                table
                    .get(year)
                    .map_or(0.0, |row| row.value_or_zero(CanonicalMetric::DilutedSharesOutstanding))
            };
            let manual = overrides
                .get(symbol, current_year)
                .filter(|ratio| *ratio != 0.0);
            let (ratio, source) = match manual {
                Some(ratio) => (ratio, SplitSource::Manual),
                None => match self.detect(shares(current_year), shares(prior_year)) {
                    Some(ratio) => (ratio, SplitSource::Detected),
                    None => continue,
                },
            };
            if ratio <= self.apply_threshold {
                continue;
            }

            for row in table.rows_mut() {
                if row.fiscal_year() > prior_year {
                    continue;
                }
                let restated = row.value_or_zero(CanonicalMetric::DilutedSharesOutstanding) * ratio;
                row.set(CanonicalMetric::DilutedSharesOutstanding, Some(restated));
                let eps = diluted_eps(row);
                row.set(CanonicalMetric::EpsDiluted, eps);
            }

            info!(
                symbol = %symbol,
                fiscal_year = current_year,
                ratio,
                source = ?source,
                "Restated share history for stock split"
            );
            events.push(SplitEvent {
                fiscal_year: current_year,
                ratio,
                source,
            });
        }

        for row in table.rows_mut() {
            if row
                .get(CanonicalMetric::EpsDiluted)
                .is_none_or(|eps| eps == 0.0)
            {
                let eps = diluted_eps(row);
                row.set(CanonicalMetric::EpsDiluted, eps);
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    const SHARES: CanonicalMetric = CanonicalMetric::DilutedSharesOutstanding;
    const EPS: CanonicalMetric = CanonicalMetric::EpsDiluted;

    fn table(rows: &[(i32, f64, f64)]) -> PeriodTable {
        let mut table = PeriodTable::new();
        for (year, shares, net_income) in rows {
            let row = table.row_mut(*year);
            row.set(SHARES, Some(*shares));
            row.set(CanonicalMetric::NetIncome, Some(*net_income));
        }
        table
    }

    fn shares(table: &PeriodTable, year: i32) -> f64 {
        table.get(year).unwrap().value_or_zero(SHARES)
    }

    #[rstest]
    #[case(RatioRounding::HalfToEven, 2.5, 2.0)]
    #[case(RatioRounding::HalfAwayFromZero, 2.5, 3.0)]
    #[case(RatioRounding::HalfToEven, 3.5, 4.0)]
    #[case(RatioRounding::HalfToEven, 2.6, 3.0)]
    #[case(RatioRounding::HalfAwayFromZero, 2.4, 2.0)]
    fn test_rounding(#[case] rounding: RatioRounding, #[case] raw: f64, #[case] expected: f64) {
        assert_eq!(rounding.round(raw), expected);
    }

    #[rstest]
    #[case(300.0, 100.0, Some(3.0))]
    #[case(130.0, 100.0, None)]
    #[case(145.0, 100.0, None)]
    #[case(100.0, 0.0, None)]
    #[case(0.0, 100.0, None)]
    #[case(50.0, 100.0, None)]
    fn test_detect(#[case] current: f64, #[case] prior: f64, #[case] expected: Option<f64>) {
        assert_eq!(SplitPolicy::default().detect(current, prior), expected);
    }

    #[test]
    fn test_detected_split_restates_earlier_years() {
        let mut t = table(&[
            (2023, 300.0, 600.0),
            (2022, 300.0, 300.0),
            (2021, 100.0, 200.0),
            (2020, 100.0, 100.0),
        ]);
        let events = SplitPolicy::default().restate(&mut t, &"ACME".into(), &SplitOverrides::new());

        assert_eq!(
            events,
            vec![SplitEvent {
                fiscal_year: 2022,
                ratio: 3.0,
                source: SplitSource::Detected
            }]
        );
        assert_eq!(shares(&t, 2023), 300.0);
        assert_eq!(shares(&t, 2022), 300.0);
        assert_eq!(shares(&t, 2021), 300.0);
        assert_eq!(shares(&t, 2020), 300.0);
        assert_relative_eq!(t.get(2021).unwrap().get(EPS).unwrap(), 200.0 / 300.0);
        assert_relative_eq!(t.get(2020).unwrap().get(EPS).unwrap(), 100.0 / 300.0);
    }

    #[test]
    fn test_manual_override_wins_without_visible_jump() {
        let mut t = table(&[(2023, 100.0, 100.0), (2022, 100.0, 100.0)]);
        t.row_mut(2023).set(EPS, Some(1.0));
        let overrides = SplitOverrides::new().with("ACME", 2023, 3.0);
        let events = SplitPolicy::default().restate(&mut t, &"ACME".into(), &overrides);

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, SplitSource::Manual);
        assert_eq!(shares(&t, 2023), 100.0);
        assert_eq!(shares(&t, 2022), 300.0);
        assert_relative_eq!(t.get(2022).unwrap().get(EPS).unwrap(), 100.0 / 300.0);
        assert_eq!(t.get(2023).unwrap().get(EPS), Some(1.0));
    }

    #[test]
    fn test_manual_one_suppresses_detection() {
        let mut t = table(&[(2023, 400.0, 1.0), (2022, 100.0, 1.0)]);
        let overrides = SplitOverrides::new().with("ACME", 2023, 1.0);
        let events = SplitPolicy::default().restate(&mut t, &"ACME".into(), &overrides);
        assert!(events.is_empty());
        assert_eq!(shares(&t, 2022), 100.0);
    }

    #[test]
    fn test_zero_override_falls_back_to_detection() {
        let mut t = table(&[(2023, 200.0, 1.0), (2022, 100.0, 1.0)]);
        let overrides = SplitOverrides::new().with("ACME", 2023, 0.0);
        let events = SplitPolicy::default().restate(&mut t, &"ACME".into(), &overrides);
        assert_eq!(events[0].source, SplitSource::Detected);
        assert_eq!(shares(&t, 2022), 200.0);
    }

    #[test]
    fn test_negative_override_suppresses_detection() {
        let mut t = table(&[(2023, 300.0, 1.0), (2022, 100.0, 1.0)]);
        let overrides = SplitOverrides::new().with("ACME", 2023, -2.0);
        let events = SplitPolicy::default().restate(&mut t, &"ACME".into(), &overrides);
        assert!(events.is_empty());
        assert_eq!(shares(&t, 2022), 100.0);
    }

    #[test]
    fn test_gap_years_are_not_compared() {
        let mut t = table(&[(2023, 300.0, 1.0), (2021, 100.0, 1.0)]);
        let events = SplitPolicy::default().restate(&mut t, &"ACME".into(), &SplitOverrides::new());
        assert!(events.is_empty());
        assert_eq!(shares(&t, 2021), 100.0);
    }

    #[test]
    fn test_successive_splits_compound() {
        let mut t = table(&[
            (2023, 600.0, 1.0),
            (2022, 300.0, 1.0),
            (2021, 100.0, 1.0),
        ]);
        let events = SplitPolicy::default().restate(&mut t, &"ACME".into(), &SplitOverrides::new());

        let ratios: Vec<(i32, f64)> = events.iter().map(|e| (e.fiscal_year, e.ratio)).collect();
        assert_eq!(ratios, vec![(2023, 2.0), (2022, 3.0)]);
        assert_eq!(shares(&t, 2022), 600.0);
        assert_eq!(shares(&t, 2021), 600.0);
    }

    #[test]
    fn test_final_pass_fills_missing_eps() {
        let mut t = table(&[(2023, 100.0, 250.0), (2022, 0.0, 10.0)]);
        t.row_mut(2023)
            .set(CanonicalMetric::PreferredDividends, Some(50.0));
        SplitPolicy::default().restate(&mut t, &"ACME".into(), &SplitOverrides::new());

        assert_relative_eq!(t.get(2023).unwrap().get(EPS).unwrap(), 2.0);
        assert_eq!(t.get(2022).unwrap().get(EPS), None);
    }
}
