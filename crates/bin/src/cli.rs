use clap::{Parser, ValueEnum};
use keyratios::SplitSpec;
use std::path::PathBuf;

/// SEC asks automated clients to identify themselves with a contact address.
const DEFAULT_USER_AGENT: &str = "keyratios/0.1 (keyratios@example.com)";

/// Builds normalized, split-adjusted annual key ratio tables from SEC XBRL
/// company facts.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub(crate) struct Cli {
    /// Tickers to process.
    #[arg(required = true, value_name = "TICKER")]
    pub(crate) tickers: Vec<String>,

    /// Number of fiscal years to analyze.
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    pub(crate) years: u32,

    /// Manual stock split as TICKER:YEAR:RATIO, e.g. NVDA:2024:10. Repeatable.
    #[arg(long = "split", value_name = "TICKER:YEAR:RATIO")]
    pub(crate) splits: Vec<SplitSpec>,

    /// JSON file of split overrides, e.g. {"TSLA": {"2022": 3.0}}.
    #[arg(long, value_name = "FILE")]
    pub(crate) splits_file: Option<PathBuf>,

    /// Do not load the built-in split overrides.
    #[arg(long)]
    pub(crate) no_builtin_splits: bool,

    /// Directory the CSV reports are written to. Created if missing.
    #[arg(short, long, default_value = "Financial_Reports")]
    pub(crate) output_dir: PathBuf,

    /// User agent sent to SEC EDGAR.
    #[arg(long, env = "KEYRATIOS_USER_AGENT", default_value = DEFAULT_USER_AGENT)]
    pub(crate) user_agent: String,

    /// Tickers processed at the same time.
    #[arg(long, default_value_t = 4)]
    pub(crate) concurrency: usize,

    /// Fiscal year the window is counted back from. Defaults to the current year.
    #[arg(long)]
    pub(crate) as_of_year: Option<i32>,

    /// Tie-break for detected split ratios halfway between two integers.
    #[arg(long, value_enum, default_value_t = Rounding::HalfToEven)]
    pub(crate) rounding: Rounding,

    /// Sets the level of tracing; RUST_LOG takes precedence.
    #[arg(long, default_value = "info")]
    pub(crate) trace: TraceLevel,
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Rounding {
    /// 2.5 becomes 2.
    HalfToEven,
    /// 2.5 becomes 3.
    HalfAwayFromZero,
}

impl From<Rounding> for keyratios::RatioRounding {
    fn from(rounding: Rounding) -> Self {
        match rounding {
            Rounding::HalfToEven => Self::HalfToEven,
            Rounding::HalfAwayFromZero => Self::HalfAwayFromZero,
        }
    }
}

#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum TraceLevel {
    Debug,
    Info,
    Warn,
    Error,
}

impl TraceLevel {
    pub(crate) const fn directive(self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "keyratios",
            "aapl",
            "msft",
            "--years",
            "5",
            "--split",
            "NVDA:2024:10",
            "--split",
            "AAPL:2020:4",
            "--no-builtin-splits",
            "--concurrency",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.tickers, vec!["aapl", "msft"]);
        assert_eq!(cli.years, 5);
        assert_eq!(cli.splits.len(), 2);
        assert_eq!(cli.splits[0].ratio, 10.0);
        assert!(cli.no_builtin_splits);
        assert_eq!(cli.output_dir, PathBuf::from("Financial_Reports"));
        assert_eq!(cli.rounding, Rounding::HalfToEven);
    }

    #[test]
    fn test_rejects_bad_arguments() {
        assert!(Cli::try_parse_from(["keyratios", "--years", "5"]).is_err());
        assert!(Cli::try_parse_from(["keyratios", "AAPL", "--years", "0"]).is_err());
        assert!(Cli::try_parse_from(["keyratios", "AAPL"]).is_err());
        assert!(
            Cli::try_parse_from(["keyratios", "AAPL", "--years", "5", "--split", "AAPL:2020"])
                .is_err()
        );
    }
}
