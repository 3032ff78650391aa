//! The year-indexed period table.
//!
//! A [`PeriodTable`] holds one [`PeriodRow`] per fiscal year, most recent
//! first. Each row maps a [`Column`] to a cell. A cell is `Some(value)` when
//! defined and `None` when undefined (e.g. a ratio with a zero denominator);
//! a column that was never written is absent from the row.

use polars::prelude::{Column as FrameColumn, DataFrame, PlSmallStr};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::Result;
use crate::metric::{CanonicalMetric, Measure};

/// Ratios derived from the normalized table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Ratio {
    /// Current assets / current liabilities.
    CurrentRatio,
    /// Net income / average total assets.
    ReturnOnAssets,
    /// Net income / average shareholders' equity.
    ReturnOnEquity,
    /// Net income / revenue.
    ReturnOnSales,
    /// Accounts receivable / revenue, in days.
    AverageCollectionPeriod,
    /// Total liabilities / shareholders' equity.
    DebtToEquity,
    /// Revenue / average total assets.
    AssetTurnover,
    /// Cash dividends paid / net income.
    DividendPayout,
    /// (Revenue - COGS) / revenue.
    GrossMargin,
    /// Operating income / revenue.
    OperatingMargin,
    /// Operating cash flow / current liabilities.
    OperatingCashFlowRatio,
}

impl Ratio {
    /// All ratios in presentation order.
    pub const ALL: [Self; 11] = [
        Self::CurrentRatio,
        Self::ReturnOnAssets,
        Self::ReturnOnEquity,
        Self::ReturnOnSales,
        Self::AverageCollectionPeriod,
        Self::DebtToEquity,
        Self::AssetTurnover,
        Self::DividendPayout,
        Self::GrossMargin,
        Self::OperatingMargin,
        Self::OperatingCashFlowRatio,
    ];

    /// Display label used in output tables.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::CurrentRatio => "Current Ratio",
            Self::ReturnOnAssets => "Return on Assets (ROA)",
            Self::ReturnOnEquity => "Return on Equity (ROE)",
            Self::ReturnOnSales => "Return on Sales (ROS)",
            Self::AverageCollectionPeriod => "Average Collection Period (Days Sales Outstanding)",
            Self::DebtToEquity => "Debt-to-Equity Ratio",
            Self::AssetTurnover => "Asset Turnover",
            Self::DividendPayout => "Dividend Payout Ratio",
            Self::GrossMargin => "Gross Profit Margin",
            Self::OperatingMargin => "Operating Margin",
            Self::OperatingCashFlowRatio => "Operating Cash Flow Ratio",
        }
    }
}

/// A column of the period table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    /// A canonical metric taken from the disclosures.
    Metric(CanonicalMetric),
    /// Total assets minus total shareholders' equity.
    TotalLiabilities,
    /// A derived ratio.
    Ratio(Ratio),
}

impl Column {
    /// Display label used in output tables.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Metric(metric) => metric.label(),
            Self::TotalLiabilities => "Total Liabilities",
            Self::Ratio(ratio) => ratio.label(),
        }
    }

    /// What the column's values measure.
    #[must_use]
    pub const fn measure(&self) -> Measure {
        match self {
            Self::Metric(metric) => metric.measure(),
            Self::TotalLiabilities => Measure::Currency,
            Self::Ratio(_) => Measure::Pure,
        }
    }
}

impl From<CanonicalMetric> for Column {
    fn from(metric: CanonicalMetric) -> Self {
        Self::Metric(metric)
    }
}

impl From<Ratio> for Column {
    fn from(ratio: Ratio) -> Self {
        Self::Ratio(ratio)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One fiscal year's worth of values.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PeriodRow {
    fiscal_year: i32,
    #[serde(with = "cell_pairs")]
    cells: BTreeMap<Column, Option<f64>>,
}

/// Cells as a sequence of `[column, value]` pairs; JSON map keys must be strings.
mod cell_pairs {
    use super::{BTreeMap, Column, Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        cells: &BTreeMap<Column, Option<f64>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(cells.iter())
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<Column, Option<f64>>, D::Error> {
        let pairs = Vec::<(Column, Option<f64>)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}

impl PeriodRow {
    /// Creates an empty row.
    #[must_use]
    pub const fn new(fiscal_year: i32) -> Self {
        Self {
            fiscal_year,
            cells: BTreeMap::new(),
        }
    }

    /// Fiscal year keying this row.
    #[must_use]
    pub const fn fiscal_year(&self) -> i32 {
        self.fiscal_year
    }

    /// Defined value of a column. `None` if absent or undefined.
    #[must_use]
    pub fn get(&self, column: impl Into<Column>) -> Option<f64> {
        self.cells.get(&column.into()).copied().flatten()
    }

    /// Defined value of a column, reading absent or undefined cells as zero.
    #[must_use]
    pub fn value_or_zero(&self, column: impl Into<Column>) -> f64 {
        self.get(column).unwrap_or(0.0)
    }

    /// Returns true if the column has been written, defined or not.
    #[must_use]
    pub fn contains(&self, column: impl Into<Column>) -> bool {
        self.cells.contains_key(&column.into())
    }

    /// Writes a cell. Non-finite values are stored as undefined.
    pub fn set(&mut self, column: impl Into<Column>, value: Option<f64>) {
        self.cells
            .insert(column.into(), value.filter(|v| v.is_finite()));
    }

    /// Writes zero into an absent or undefined cell.
    pub fn fill_zero(&mut self, column: impl Into<Column>) {
        let cell = self.cells.entry(column.into()).or_insert(None);
        if cell.is_none() {
            *cell = Some(0.0);
        }
    }

    /// Iterates over written cells in column order.
    pub fn cells(&self) -> impl Iterator<Item = (Column, Option<f64>)> + '_ {
        self.cells.iter().map(|(column, value)| (*column, *value))
    }

    /// Applies `f` to every defined cell of the columns selected by `select`.
    pub fn map_values(&mut self, select: impl Fn(&Column) -> bool, f: impl Fn(f64) -> f64) {
        for (column, value) in &mut self.cells {
            if select(column) {
                if let Some(v) = value {
                    *v = f(*v);
                }
            }
        }
    }
}

/// Period rows keyed by unique fiscal year, most recent first.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodTable {
    rows: Vec<PeriodRow>,
}

impl PeriodTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Builds a table from rows. Sorts descending; the first row for a repeated year wins.
    #[must_use]
    pub fn from_rows(rows: impl IntoIterator<Item = PeriodRow>) -> Self {
        let mut table = Self::new();
        for row in rows {
            if table.get(row.fiscal_year).is_none() {
                table.rows.push(row);
            }
        }
        table.rows.sort_by(|a, b| b.fiscal_year.cmp(&a.fiscal_year));
        table
    }

    /// Row for a fiscal year, inserting an empty one in order if needed.
    pub fn row_mut(&mut self, fiscal_year: i32) -> &mut PeriodRow {
        let idx = match self
            .rows
            .binary_search_by(|row| fiscal_year.cmp(&row.fiscal_year))
        {
            Ok(idx) => idx,
            Err(idx) => {
                self.rows.insert(idx, PeriodRow::new(fiscal_year));
                idx
            }
        };
        &mut self.rows[idx]
    }

    /// Row for a fiscal year.
    #[must_use]
    pub fn get(&self, fiscal_year: i32) -> Option<&PeriodRow> {
        self.rows.iter().find(|row| row.fiscal_year == fiscal_year)
    }

    /// Rows, most recent first.
    #[must_use]
    pub fn rows(&self) -> &[PeriodRow] {
        &self.rows
    }

    /// Mutable rows, most recent first.
    pub fn rows_mut(&mut self) -> impl Iterator<Item = &mut PeriodRow> {
        self.rows.iter_mut()
    }

    /// Fiscal years, most recent first.
    #[must_use]
    pub fn years(&self) -> Vec<i32> {
        self.rows.iter().map(PeriodRow::fiscal_year).collect()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if the table has no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Largest defined value in a column.
    #[must_use]
    pub fn column_max(&self, column: impl Into<Column>) -> Option<f64> {
        let column = column.into();
        self.rows
            .iter()
            .filter_map(|row| row.get(column))
            .reduce(f64::max)
    }

    /// Columns written in at least one row, in column order.
    #[must_use]
    pub fn columns(&self) -> BTreeSet<Column> {
        self.rows
            .iter()
            .flat_map(|row| row.cells.keys().copied())
            .collect()
    }

    /// Converts every written column to a DataFrame.
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Column> = self.columns().into_iter().collect();
        self.select_dataframe(&columns)
    }

    /// Converts the selected columns to a DataFrame with a leading `fiscal_year` column.
    ///
    /// Undefined and absent cells become nulls.
    pub fn select_dataframe(&self, columns: &[Column]) -> Result<DataFrame> {
        let mut frame_columns = Vec::with_capacity(columns.len() + 1);
        frame_columns.push(FrameColumn::new(
            PlSmallStr::from("fiscal_year"),
            self.years(),
        ));
        for column in columns {
            let values: Vec<Option<f64>> = self.rows.iter().map(|row| row.get(*column)).collect();
            frame_columns.push(FrameColumn::new(PlSmallStr::from(column.label()), values));
        }

        Ok(DataFrame::new(frame_columns)?)
    }
}

/// Common order-of-magnitude divisor applied to monetary columns.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scale {
    /// Values as reported.
    #[default]
    Units,
    /// Values in thousands.
    Thousands,
    /// Values in millions.
    Millions,
}

impl Scale {
    /// Picks the scale for a table whose largest revenue is `magnitude`.
    #[must_use]
    pub fn for_magnitude(magnitude: f64) -> Self {
        if magnitude > 1_000_000_000.0 {
            Self::Millions
        } else if magnitude > 1_000_000.0 {
            Self::Thousands
        } else {
            Self::Units
        }
    }

    /// Divisor applied to scaled columns.
    #[must_use]
    pub const fn divisor(&self) -> f64 {
        match self {
            Self::Units => 1.0,
            Self::Thousands => 1_000.0,
            Self::Millions => 1_000_000.0,
        }
    }

    /// Label used in report names.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Units => "N/A",
            Self::Thousands => "Thousands",
            Self::Millions => "Millions",
        }
    }
}

impl fmt::Display for Scale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
