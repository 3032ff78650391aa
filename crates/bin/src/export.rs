//! CSV export of finished company reports.

use keyratios::{CanonicalMetric, Column, CompanyReport, Ratio, Result, Scale, Symbol};
use polars::prelude::{CsvWriter, SerWriter};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Columns written to a report, in order.
pub(crate) const PRESENTATION_COLUMNS: [Column; 15] = [
    Column::Metric(CanonicalMetric::Revenue),
    Column::Metric(CanonicalMetric::NetIncome),
    Column::Metric(CanonicalMetric::OperatingCashFlow),
    Column::Metric(CanonicalMetric::TotalAssets),
    Column::Metric(CanonicalMetric::EpsDiluted),
    Column::Ratio(Ratio::GrossMargin),
    Column::Ratio(Ratio::OperatingMargin),
    Column::Ratio(Ratio::ReturnOnSales),
    Column::Ratio(Ratio::ReturnOnAssets),
    Column::Ratio(Ratio::ReturnOnEquity),
    Column::Ratio(Ratio::DividendPayout),
    Column::Ratio(Ratio::CurrentRatio),
    Column::Ratio(Ratio::DebtToEquity),
    Column::Ratio(Ratio::AssetTurnover),
    Column::Ratio(Ratio::AverageCollectionPeriod),
];

/// Report file name. Path separators in the scale label are dropped.
pub(crate) fn file_name(symbol: &Symbol, scale: Scale, years: u32) -> String {
    let label = scale.label().replace('/', "");
    format!("{}_KeyRatios({})({}Y).csv", symbol, label, years)
}

/// Writes the presentation columns of a report as CSV. Undefined cells are blank.
pub(crate) fn write_report(report: &CompanyReport, dir: &Path, years: u32) -> Result<PathBuf> {
    let path = dir.join(file_name(&report.symbol, report.scale, years));
    let mut frame = report.table.select_dataframe(&PRESENTATION_COLUMNS)?;

    let mut file = File::create(&path).map_err(|e| {
        keyratios::DataError::Export(format!("Failed to create {}: {}", path.display(), e))
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut frame)?;

    debug!(path = %path.display(), rows = frame.height(), "Wrote report");
    Ok(path)
}
