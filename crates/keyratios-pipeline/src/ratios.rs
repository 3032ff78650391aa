//! Ratio derivation.
//!
//! Every metric the formulas read is zero-filled first, so a missing
//! disclosure reads as zero. Any zero or undefined denominator leaves the
//! ratio cell undefined and is reported as [`Issue::DivisionUndefined`].

use keyratios_core::{CanonicalMetric, Column, Issue, PeriodRow, PeriodTable, Ratio};
use std::collections::HashMap;
use tracing::debug;

use CanonicalMetric::{
    AccountsReceivable, CashDividendsPaid, CostOfGoodsSold, CurrentAssets, CurrentLiabilities,
    DilutedSharesOutstanding, EpsDiluted, NetIncome, OperatingCashFlow, OperatingIncome,
    PreferredDividends, Revenue, TotalAssets, TotalShareholdersEquity,
};

/// Days used to annualize the collection period.
const DAYS_PER_YEAR: f64 = 365.0;

/// `numerator / denominator`, undefined for a zero or undefined denominator.
#[must_use]
pub fn safe_div(numerator: f64, denominator: Option<f64>) -> Option<f64> {
    let denominator = denominator.filter(|d| *d != 0.0)?;
    Some(numerator / denominator).filter(|v| v.is_finite())
}

/// Diluted EPS as `(net income - preferred dividends) / diluted shares`.
#[must_use]
pub fn diluted_eps(row: &PeriodRow) -> Option<f64> {
    safe_div(
        row.value_or_zero(NetIncome) - row.value_or_zero(PreferredDividends),
        row.get(DilutedSharesOutstanding),
    )
}

/// Two-point average of a balance and its value one fiscal year earlier.
fn average(current: f64, prior: Option<f64>) -> Option<f64> {
    prior.map(|prior| (current + prior) / 2.0)
}

/// Derives total liabilities and every [`Ratio`] in place.
///
/// Safe to run repeatedly: a second run only rewrites the cells it derives.
pub fn compute_ratios(table: &mut PeriodTable) -> Vec<Issue> {
    let mut issues = Vec::new();

    for row in table.rows_mut() {
        for metric in CanonicalMetric::ALL {
            row.fill_zero(metric);
        }
    }

    let balances: HashMap<i32, (f64, f64)> = table
        .rows()
        .iter()
        .map(|row| {
            (
                row.fiscal_year(),
                (
                    row.value_or_zero(TotalAssets),
                    row.value_or_zero(TotalShareholdersEquity),
                ),
            )
        })
        .collect();

    for row in table.rows_mut() {
        let fiscal_year = row.fiscal_year();
        let v = |metric: CanonicalMetric| row.value_or_zero(metric);

        let total_liabilities = v(TotalAssets) - v(TotalShareholdersEquity);
        let prior = balances.get(&(fiscal_year - 1));
        let avg_assets = average(v(TotalAssets), prior.map(|p| p.0));
        let avg_equity = average(v(TotalShareholdersEquity), prior.map(|p| p.1));
        let revenue = Some(v(Revenue));
        let current_liabilities = Some(v(CurrentLiabilities));
        let net_income = v(NetIncome);

        let ratios = [
            (Ratio::CurrentRatio, safe_div(v(CurrentAssets), current_liabilities)),
            (Ratio::ReturnOnAssets, safe_div(net_income, avg_assets)),
            (Ratio::ReturnOnEquity, safe_div(net_income, avg_equity)),
            (Ratio::ReturnOnSales, safe_div(net_income, revenue)),
            (
                Ratio::AverageCollectionPeriod,
                safe_div(v(AccountsReceivable), revenue).map(|r| r * DAYS_PER_YEAR),
            ),
            (
                Ratio::DebtToEquity,
                safe_div(total_liabilities, Some(v(TotalShareholdersEquity))),
            ),
            (Ratio::AssetTurnover, safe_div(v(Revenue), avg_assets)),
            (Ratio::DividendPayout, safe_div(v(CashDividendsPaid), Some(net_income))),
            (Ratio::GrossMargin, safe_div(v(Revenue) - v(CostOfGoodsSold), revenue)),
            (Ratio::OperatingMargin, safe_div(v(OperatingIncome), revenue)),
            (
                Ratio::OperatingCashFlowRatio,
                safe_div(v(OperatingCashFlow), current_liabilities),
            ),
        ];

        row.set(Column::TotalLiabilities, Some(total_liabilities));
        if row.get(EpsDiluted).is_none_or(|eps| eps == 0.0) {
            let eps = diluted_eps(row);
            row.set(EpsDiluted, eps);
        }
        for (ratio, value) in ratios {
            if value.is_none() {
                issues.push(Issue::DivisionUndefined {
                    fiscal_year,
                    column: ratio.label().to_string(),
                });
            }
            row.set(ratio, value);
        }
    }

    debug!(
        rows = table.len(),
        undefined = issues.len(),
        "Computed ratios"
    );
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn row(table: &mut PeriodTable, year: i32, values: &[(CanonicalMetric, f64)]) {
        let row = table.row_mut(year);
        for (metric, value) in values {
            row.set(*metric, Some(*value));
        }
    }

    fn sample() -> PeriodTable {
        let mut table = PeriodTable::new();
        row(
            &mut table,
            2023,
            &[
                (Revenue, 1000.0),
                (CostOfGoodsSold, 600.0),
                (OperatingIncome, 200.0),
                (NetIncome, 150.0),
                (DilutedSharesOutstanding, 100.0),
                (EpsDiluted, 1.5),
                (CurrentAssets, 400.0),
                (CurrentLiabilities, 200.0),
                (AccountsReceivable, 100.0),
                (TotalAssets, 2200.0),
                (TotalShareholdersEquity, 1100.0),
                (CashDividendsPaid, 30.0),
                (OperatingCashFlow, 250.0),
            ],
        );
        row(
            &mut table,
            2022,
            &[
                (Revenue, 900.0),
                (NetIncome, 120.0),
                (TotalAssets, 1800.0),
                (TotalShareholdersEquity, 900.0),
            ],
        );
        table
    }

    #[test]
    fn test_ratio_formulas() {
        let mut table = sample();
        compute_ratios(&mut table);
        let latest = table.get(2023).unwrap();

        assert_relative_eq!(latest.get(Column::TotalLiabilities).unwrap(), 1100.0);
        assert_relative_eq!(latest.get(Ratio::CurrentRatio).unwrap(), 2.0);
        assert_relative_eq!(latest.get(Ratio::ReturnOnAssets).unwrap(), 150.0 / 2000.0);
        assert_relative_eq!(latest.get(Ratio::ReturnOnEquity).unwrap(), 150.0 / 1000.0);
        assert_relative_eq!(latest.get(Ratio::ReturnOnSales).unwrap(), 0.15);
        assert_relative_eq!(latest.get(Ratio::AverageCollectionPeriod).unwrap(), 36.5);
        assert_relative_eq!(latest.get(Ratio::DebtToEquity).unwrap(), 1.0);
        assert_relative_eq!(latest.get(Ratio::AssetTurnover).unwrap(), 0.5);
        assert_relative_eq!(latest.get(Ratio::DividendPayout).unwrap(), 0.2);
        assert_relative_eq!(latest.get(Ratio::GrossMargin).unwrap(), 0.4);
        assert_relative_eq!(latest.get(Ratio::OperatingMargin).unwrap(), 0.2);
        assert_relative_eq!(latest.get(Ratio::OperatingCashFlowRatio).unwrap(), 1.25);
        assert_relative_eq!(latest.get(EpsDiluted).unwrap(), 1.5);
    }

    #[test]
    fn test_zero_denominators_are_undefined() {
        let mut table = sample();
        let issues = compute_ratios(&mut table);
        let older = table.get(2022).unwrap();

        // No current liabilities disclosed and no earlier year to average with.
        assert!(older.contains(Ratio::CurrentRatio));
        assert_eq!(older.get(Ratio::CurrentRatio), None);
        assert_eq!(older.get(Ratio::ReturnOnAssets), None);
        assert_eq!(older.get(Ratio::OperatingCashFlowRatio), None);
        assert_relative_eq!(older.get(Ratio::ReturnOnSales).unwrap(), 120.0 / 900.0);

        assert!(issues.contains(&Issue::DivisionUndefined {
            fiscal_year: 2022,
            column: "Current Ratio".to_string(),
        }));
        assert!(!issues.iter().any(|i| matches!(
            i,
            Issue::DivisionUndefined { fiscal_year: 2023, .. }
        )));
    }

    #[test]
    fn test_missing_metrics_default_to_zero() {
        let mut table = sample();
        compute_ratios(&mut table);
        let older = table.get(2022).unwrap();
        for metric in CanonicalMetric::ALL {
            assert!(older.contains(metric), "{metric}");
        }
        // Recomputed from zero shares, so undefined rather than zero.
        assert_eq!(older.get(EpsDiluted), None);
        assert_eq!(older.get(CurrentAssets), Some(0.0));
    }

    #[test]
    fn test_zero_eps_is_filled_without_shares_it_stays_undefined() {
        let mut table = sample();
        table.row_mut(2023).set(EpsDiluted, Some(0.0));
        table.row_mut(2023).set(PreferredDividends, Some(50.0));
        compute_ratios(&mut table);

        assert_relative_eq!(table.get(2023).unwrap().get(EpsDiluted).unwrap(), 1.0);
        assert_eq!(table.get(2022).unwrap().get(EpsDiluted), None);
    }

    #[test]
    fn test_average_needs_the_adjacent_year() {
        let mut table = sample();
        row(&mut table, 2020, &[(NetIncome, 10.0), (TotalAssets, 100.0)]);
        compute_ratios(&mut table);
        assert_eq!(table.get(2020).unwrap().get(Ratio::ReturnOnAssets), None);
        assert!(table.get(2022).unwrap().get(Ratio::ReturnOnAssets).is_none());
    }

    #[test]
    fn test_idempotent() {
        let mut table = sample();
        compute_ratios(&mut table);
        let once = table.clone();
        let issues = compute_ratios(&mut table);
        assert_eq!(table, once);
        assert!(!issues.is_empty());
    }
}
