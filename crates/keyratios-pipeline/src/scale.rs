//! Presentation scale selection.

use keyratios_core::{CanonicalMetric, Column, PeriodTable, Scale};
use tracing::debug;

/// Picks one scale from the largest revenue and divides every currency and
/// share column by it. Per-share and pure columns are left untouched.
pub fn normalize_scale(table: &mut PeriodTable) -> Scale {
    let magnitude = table.column_max(CanonicalMetric::Revenue).unwrap_or(0.0);
    let scale = Scale::for_magnitude(magnitude);
    if scale != Scale::Units {
        let divisor = scale.divisor();
        for row in table.rows_mut() {
            row.map_values(|column: &Column| column.measure().is_scaled(), |v| v / divisor);
        }
    }
    debug!(magnitude, scale = %scale, "Selected presentation scale");
    scale
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyratios_core::Ratio;
    use rstest::rstest;

    fn table(revenue: f64) -> PeriodTable {
        let mut table = PeriodTable::new();
        let row = table.row_mut(2023);
        row.set(CanonicalMetric::Revenue, Some(revenue));
        row.set(CanonicalMetric::DilutedSharesOutstanding, Some(4_000_000.0));
        row.set(CanonicalMetric::EpsDiluted, Some(1.37));
        row.set(CanonicalMetric::StockSplitRatio, Some(2.0));
        row.set(Column::TotalLiabilities, Some(8_000_000.0));
        row.set(Ratio::GrossMargin, Some(0.4123));
        row.set(Ratio::CurrentRatio, None);
        table
    }

    #[rstest]
    #[case(2.5e9, Scale::Millions, 2_500.0)]
    #[case(5e6, Scale::Thousands, 5_000.0)]
    #[case(500.0, Scale::Units, 500.0)]
    fn test_scale_selection(#[case] revenue: f64, #[case] expected: Scale, #[case] scaled: f64) {
        let mut t = table(revenue);
        let scale = normalize_scale(&mut t);
        assert_eq!(scale, expected);

        let row = t.get(2023).unwrap();
        assert_eq!(row.get(CanonicalMetric::Revenue), Some(scaled));
        assert_eq!(
            row.get(Column::TotalLiabilities),
            Some(8_000_000.0 / expected.divisor())
        );
        assert_eq!(
            row.get(CanonicalMetric::DilutedSharesOutstanding),
            Some(4_000_000.0 / expected.divisor())
        );
    }

    #[rstest]
    #[case(2.5e9)]
    #[case(5e6)]
    fn test_per_share_and_pure_columns_are_bit_identical(#[case] revenue: f64) {
        let mut t = table(revenue);
        normalize_scale(&mut t);
        let row = t.get(2023).unwrap();
        assert_eq!(row.get(CanonicalMetric::EpsDiluted).map(f64::to_bits), Some(1.37f64.to_bits()));
        assert_eq!(row.get(CanonicalMetric::StockSplitRatio), Some(2.0));
        assert_eq!(row.get(Ratio::GrossMargin).map(f64::to_bits), Some(0.4123f64.to_bits()));
        assert!(row.contains(Ratio::CurrentRatio));
        assert_eq!(row.get(Ratio::CurrentRatio), None);
    }

    #[test]
    fn test_empty_table_is_units() {
        let mut t = PeriodTable::new();
        assert_eq!(normalize_scale(&mut t), Scale::Units);
    }
}
