//! Pivot of resolved records into the period table.

use keyratios_core::PeriodTable;
use tracing::debug;

use crate::record::CandidateRecord;

/// Builds the year-indexed table from resolved records.
///
/// Only fiscal years at or after `min_fiscal_year` are kept. When more than
/// one record still targets the same (year, metric) cell, which happens for
/// metrics admitted per segment, records are visited largest value first and
/// the first one wins, so a consolidated figure is never shadowed by one of
/// its own fragments.
pub fn build_table(
    records: impl IntoIterator<Item = CandidateRecord>,
    min_fiscal_year: i32,
) -> PeriodTable {
    let mut records: Vec<CandidateRecord> = records
        .into_iter()
        .filter(|r| r.fiscal_year >= min_fiscal_year)
        .collect();
    records.sort_by(|a, b| b.value.total_cmp(&a.value));

    let mut table = PeriodTable::new();
    for record in records {
        let row = table.row_mut(record.fiscal_year);
        if !row.contains(record.metric) {
            row.set(record.metric, Some(record.value));
        }
    }

    debug!(rows = table.len(), min_fiscal_year, "Built period table");
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use keyratios_core::CanonicalMetric;

    #[test]
    fn test_pivot_by_year_descending() {
        let table = build_table(
            vec![
                CandidateRecord::total(CanonicalMetric::NetIncome, 2021, 1.0),
                CandidateRecord::total(CanonicalMetric::NetIncome, 2023, 3.0),
                CandidateRecord::total(CanonicalMetric::TotalAssets, 2023, 30.0),
                CandidateRecord::total(CanonicalMetric::NetIncome, 2022, 2.0),
            ],
            0,
        );
        assert_eq!(table.years(), vec![2023, 2022, 2021]);
        let latest = table.get(2023).unwrap();
        assert_eq!(latest.get(CanonicalMetric::NetIncome), Some(3.0));
        assert_eq!(latest.get(CanonicalMetric::TotalAssets), Some(30.0));
        assert!(!table.get(2022).unwrap().contains(CanonicalMetric::TotalAssets));
    }

    #[test]
    fn test_window_excludes_old_and_unknown_years() {
        let table = build_table(
            vec![
                CandidateRecord::total(CanonicalMetric::NetIncome, 0, 9.0),
                CandidateRecord::total(CanonicalMetric::NetIncome, 2015, 1.0),
                CandidateRecord::total(CanonicalMetric::NetIncome, 2017, 2.0),
            ],
            2017,
        );
        assert_eq!(table.years(), vec![2017]);
    }

    #[test]
    fn test_collision_keeps_largest() {
        let table = build_table(
            vec![
                CandidateRecord::total(CanonicalMetric::Revenue, 2023, 40.0).in_segment("Cards"),
                CandidateRecord::total(CanonicalMetric::Revenue, 2023, 100.0),
                CandidateRecord::total(CanonicalMetric::Revenue, 2023, 60.0).in_segment("Loans"),
            ],
            0,
        );
        assert_eq!(
            table.get(2023).unwrap().get(CanonicalMetric::Revenue),
            Some(100.0)
        );
    }
}
