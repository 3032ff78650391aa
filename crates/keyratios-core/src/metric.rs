//! Canonical metrics and the tag dictionary.
//!
//! Companies disclose the same concept under different XBRL tags depending on
//! industry and year. Each [`CanonicalMetric`] owns an ordered list of
//! accepted tags; the [`TagDictionary`] maps between the two.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Financial statement a metric belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatementGroup {
    /// Income statement.
    IncomeStatement,
    /// Balance sheet.
    BalanceSheet,
    /// Cash flow statement.
    CashFlow,
}

/// What a metric's values measure. Drives scale normalization.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Measure {
    /// Monetary amount in reporting currency.
    Currency,
    /// Share count.
    Shares,
    /// Amount per share.
    PerShare,
    /// Dimensionless value (ratios, percentages, day counts).
    Pure,
}

impl Measure {
    /// Returns true for magnitudes that are divided by the table scale.
    #[must_use]
    pub const fn is_scaled(&self) -> bool {
        matches!(self, Self::Currency | Self::Shares)
    }
}

/// How competing records for the same (metric, fiscal year) are reduced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AggregationPolicy {
    /// Keep one record per segment, preferring non-zero values.
    PickBest,
    /// Reconstruct a company total by summing segment fragments when no total is disclosed.
    SumSegments,
}

/// A standardized financial-statement line item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CanonicalMetric {
    /// Net Sales / Revenue.
    Revenue,
    /// Cost of goods sold.
    CostOfGoodsSold,
    /// Operating income.
    OperatingIncome,
    /// Net income.
    NetIncome,
    /// Weighted average diluted shares outstanding.
    DilutedSharesOutstanding,
    /// Preferred dividends.
    PreferredDividends,
    /// Diluted earnings per share.
    EpsDiluted,
    /// Disclosed stock split conversion ratio.
    StockSplitRatio,
    /// Current assets.
    CurrentAssets,
    /// Accounts receivable.
    AccountsReceivable,
    /// Current liabilities.
    CurrentLiabilities,
    /// Total assets.
    TotalAssets,
    /// Total shareholders' equity.
    TotalShareholdersEquity,
    /// Cash dividends paid.
    CashDividendsPaid,
    /// Cash flow from operations.
    OperatingCashFlow,
}

impl CanonicalMetric {
    /// All metrics in dictionary order (income statement, balance sheet, cash flow).
    pub const ALL: [Self; 15] = [
        Self::Revenue,
        Self::CostOfGoodsSold,
        Self::OperatingIncome,
        Self::NetIncome,
        Self::DilutedSharesOutstanding,
        Self::PreferredDividends,
        Self::EpsDiluted,
        Self::StockSplitRatio,
        Self::CurrentAssets,
        Self::AccountsReceivable,
        Self::CurrentLiabilities,
        Self::TotalAssets,
        Self::TotalShareholdersEquity,
        Self::CashDividendsPaid,
        Self::OperatingCashFlow,
    ];

    /// Display label used in output tables.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Revenue => "Net Sales / Revenue",
            Self::CostOfGoodsSold => "COGS",
            Self::OperatingIncome => "Operating Income",
            Self::NetIncome => "Net Income",
            Self::DilutedSharesOutstanding => "Diluted Shares Outstanding",
            Self::PreferredDividends => "Preferred Dividends",
            Self::EpsDiluted => "Earnings Per Share (Diluted)",
            Self::StockSplitRatio => "Stock Split Ratio",
            Self::CurrentAssets => "Current Assets",
            Self::AccountsReceivable => "Accounts Receivable",
            Self::CurrentLiabilities => "Current Liabilities",
            Self::TotalAssets => "Total Assets",
            Self::TotalShareholdersEquity => "Total Shareholders Equity",
            Self::CashDividendsPaid => "Cash Dividends Paid",
            Self::OperatingCashFlow => "Cash Flow from Operations",
        }
    }

    /// Statement the metric is reported on.
    #[must_use]
    pub const fn group(&self) -> StatementGroup {
        match self {
            Self::Revenue
            | Self::CostOfGoodsSold
            | Self::OperatingIncome
            | Self::NetIncome
            | Self::DilutedSharesOutstanding
            | Self::PreferredDividends
            | Self::EpsDiluted
            | Self::StockSplitRatio => StatementGroup::IncomeStatement,
            Self::CurrentAssets
            | Self::AccountsReceivable
            | Self::CurrentLiabilities
            | Self::TotalAssets
            | Self::TotalShareholdersEquity => StatementGroup::BalanceSheet,
            Self::CashDividendsPaid | Self::OperatingCashFlow => StatementGroup::CashFlow,
        }
    }

    /// What the metric's values measure.
    #[must_use]
    pub const fn measure(&self) -> Measure {
        match self {
            Self::DilutedSharesOutstanding => Measure::Shares,
            Self::EpsDiluted => Measure::PerShare,
            Self::StockSplitRatio => Measure::Pure,
            _ => Measure::Currency,
        }
    }

    /// Whether segment-level records are admitted for this metric.
    ///
    /// Summing arbitrary segments of balance-sheet or income totals double
    /// counts, so only metrics that are legitimately split by segment qualify.
    #[must_use]
    pub const fn admits_segments(&self) -> bool {
        matches!(
            self,
            Self::DilutedSharesOutstanding | Self::AccountsReceivable | Self::Revenue
        )
    }

    /// How candidate records for this metric are reduced to one per year.
    #[must_use]
    pub const fn aggregation(&self) -> AggregationPolicy {
        match self {
            Self::DilutedSharesOutstanding => AggregationPolicy::SumSegments,
            _ => AggregationPolicy::PickBest,
        }
    }

    /// Accepted XBRL tags, in extraction order.
    #[must_use]
    pub const fn standard_tags(&self) -> &'static [&'static str] {
        match self {
            Self::Revenue => &[
                "RevenuesNetOfInterestExpense",
                "RevenueNetOfInterestExpense",
                "TotalRevenuesNetOfInterestExpense",
                "NetRevenues",
                "RevenueFromContractWithCustomerExcludingAssessedTax",
                "Revenues",
                "OperatingRevenue",
                "SalesRevenueNet",
                "SalesRevenueGoodsNet",
                "NonInterestIncome",
                "NonInterestRevenues",
                "InterestIncomeExpenseNet",
                "InterestAndDividendIncomeOperating",
            ],
            Self::CostOfGoodsSold => &[
                "CostOfGoodsAndServicesSold",
                "CostOfRevenue",
                "CostOfGoodsSold",
                "CostOfSales",
            ],
            Self::OperatingIncome => &[
                "OperatingIncomeLoss",
                "IncomeLossFromContinuingOperationsBeforeIncomeTaxesExtraordinaryItemsNoncontrollingInterest",
                "IncomeLossFromContinuingOperationsBeforeIncomeTaxes",
                "IncomeLossFromContinuingOperationsBeforeIncomeTaxesMinorityInterestAndIncomeLossFromEquityMethodInvestments",
            ],
            Self::NetIncome => &[
                "NetIncomeLoss",
                "ProfitLoss",
                "NetIncomeLossAvailableToCommonStockholdersBasic",
            ],
            Self::DilutedSharesOutstanding => &[
                "WeightedAverageNumberOfDilutedSharesOutstanding",
                "WeightedAverageNumberOfSharesOutstandingBasicAndDiluted",
                "WeightedAverageNumberOfDilutedSharesOutstandingContinuingOperations",
                "EntityCommonStockSharesOutstanding",
                "CommonStockSharesOutstanding",
            ],
            Self::PreferredDividends => &[
                "DividendsPreferredStock",
                "PreferredStockDividendsAndOtherAdjustments",
                "DividendsPreferredStockCash",
            ],
            Self::EpsDiluted => &[
                "EarningsPerShareDiluted",
                "EarningsPerShareBasicAndDiluted",
                "IncomeLossFromContinuingOperationsPerDilutedShare",
            ],
            Self::StockSplitRatio => &[
                "StockholdersEquityNoteStockSplitConversionRatio",
                "CommonStockStockSplit",
                "StockSplitConversionRatio",
                "StockDividendSplitRatio",
                "SplitRatio",
            ],
            Self::CurrentAssets => &["AssetsCurrent"],
            Self::AccountsReceivable => &[
                "FinancingReceivablesNet",
                "LoansAndLeasesReceivableNet",
                "LoansReceivableNet",
                "CardMemberLoansNet",
                "CardMemberReceivablesNet",
                "LoansAndCardMemberReceivablesNet",
                "CreditCardReceivables",
                "ReceivablesFromBrokerDealersAndClearingOrganizations",
                "AccountsReceivableNetCurrent",
                "ReceivablesNetCurrent",
                "TradeAndOtherReceivablesNet",
                "AccountsReceivableNet",
                "ReceivablesNet",
            ],
            Self::CurrentLiabilities => &["LiabilitiesCurrent"],
            Self::TotalAssets => &["Assets", "AssetsNet"],
            Self::TotalShareholdersEquity => &[
                "StockholdersEquity",
                "StockholdersEquityIncludingPortionAttributableToNoncontrollingInterest",
                "PartnersCapital",
                "PartnersCapitalIncludingPortionAttributableToNoncontrollingInterest",
                "PartnersCapitalAccount",
            ],
            Self::CashDividendsPaid => &["PaymentsOfDividendsCommonStock", "PaymentsOfDividends"],
            Self::OperatingCashFlow => &[
                "NetCashProvidedByUsedInOperatingActivities",
                "NetCashProvidedByUsedInOperatingActivitiesContinuingOperations",
            ],
        }
    }
}

impl fmt::Display for CanonicalMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Accepted tags for one canonical metric.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricTags {
    /// The canonical metric.
    pub metric: CanonicalMetric,
    /// Accepted source tags, in extraction order.
    pub tags: Vec<String>,
}

/// Mapping from canonical metric to its accepted tag synonyms.
///
/// The dictionary is plain configuration: build it once and share it
/// (typically behind an `Arc`) between pipeline runs.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagDictionary {
    entries: Vec<MetricTags>,
}

impl TagDictionary {
    /// Creates a dictionary from explicit entries.
    #[must_use]
    pub const fn new(entries: Vec<MetricTags>) -> Self {
        Self { entries }
    }

    /// The standard US-GAAP dictionary covering every [`CanonicalMetric`].
    #[must_use]
    pub fn standard() -> Self {
        let entries = CanonicalMetric::ALL
            .iter()
            .map(|metric| MetricTags {
                metric: *metric,
                tags: metric
                    .standard_tags()
                    .iter()
                    .map(|t| (*t).to_string())
                    .collect(),
            })
            .collect();
        Self { entries }
    }

    /// Entries in dictionary order.
    pub fn iter(&self) -> impl Iterator<Item = &MetricTags> {
        self.entries.iter()
    }

    /// Accepted tags for a metric, if the metric is in the dictionary.
    #[must_use]
    pub fn tags_for(&self, metric: CanonicalMetric) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.metric == metric)
            .map(|e| e.tags.as_slice())
    }

    /// Resolves a source tag to the first metric that accepts it.
    #[must_use]
    pub fn metric_for_tag(&self, tag: &str) -> Option<CanonicalMetric> {
        self.entries
            .iter()
            .find(|e| e.tags.iter().any(|t| t == tag))
            .map(|e| e.metric)
    }

    /// Number of metrics in the dictionary.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the dictionary has no metrics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TagDictionary {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_dictionary_covers_all_metrics() {
        let dict = TagDictionary::standard();
        assert_eq!(dict.len(), CanonicalMetric::ALL.len());
        for metric in CanonicalMetric::ALL {
            assert!(!dict.tags_for(metric).unwrap().is_empty(), "{metric}");
        }
    }

    #[test]
    fn test_tag_lookup() {
        let dict = TagDictionary::standard();
        assert_eq!(
            dict.metric_for_tag("NetIncomeLoss"),
            Some(CanonicalMetric::NetIncome)
        );
        assert_eq!(
            dict.metric_for_tag("AccountsReceivableNetCurrent"),
            Some(CanonicalMetric::AccountsReceivable)
        );
        assert_eq!(dict.metric_for_tag("NotARealTag"), None);
    }

    #[test]
    fn test_no_tag_belongs_to_two_metrics() {
        let dict = TagDictionary::standard();
        for entry in dict.iter() {
            for tag in &entry.tags {
                assert_eq!(dict.metric_for_tag(tag), Some(entry.metric), "{tag}");
            }
        }
    }

    #[test]
    fn test_segment_admission_and_policy() {
        assert!(CanonicalMetric::Revenue.admits_segments());
        assert!(CanonicalMetric::AccountsReceivable.admits_segments());
        assert!(CanonicalMetric::DilutedSharesOutstanding.admits_segments());
        assert!(!CanonicalMetric::TotalAssets.admits_segments());

        assert_eq!(
            CanonicalMetric::DilutedSharesOutstanding.aggregation(),
            AggregationPolicy::SumSegments
        );
        assert_eq!(
            CanonicalMetric::Revenue.aggregation(),
            AggregationPolicy::PickBest
        );
    }

    #[test]
    fn test_measures() {
        assert!(CanonicalMetric::Revenue.measure().is_scaled());
        assert!(CanonicalMetric::DilutedSharesOutstanding.measure().is_scaled());
        assert!(!CanonicalMetric::EpsDiluted.measure().is_scaled());
        assert!(!CanonicalMetric::StockSplitRatio.measure().is_scaled());
        assert_eq!(
            CanonicalMetric::OperatingCashFlow.group(),
            StatementGroup::CashFlow
        );
    }
}
