//! `keyratios` command-line tool.

use clap::Parser;
use cli::Cli;
use keyratios::{
    DataError, KeyRatiosRunner, Pipeline, PipelineConfig, Result, SplitOverrides, Symbol,
    TagDictionary,
};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

mod cli;
mod export;

fn init_tracing(default_directive: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Builtin overrides, then the overrides file, then `--split` flags; later entries win.
fn load_overrides(cli: &Cli) -> Result<SplitOverrides> {
    let mut overrides = if cli.no_builtin_splits {
        SplitOverrides::new()
    } else {
        SplitOverrides::builtin()
    };

    if let Some(path) = &cli.splits_file {
        let json = std::fs::read_to_string(path).map_err(|e| {
            DataError::InvalidParameter(format!("Failed to read {}: {}", path.display(), e))
        })?;
        overrides.merge(SplitOverrides::from_json_str(&json)?);
    }

    overrides.merge(cli.splits.iter().cloned().collect());
    Ok(overrides)
}

fn build_runner(cli: &Cli) -> Result<KeyRatiosRunner> {
    let mut config = PipelineConfig::new(cli.years).with_ratio_rounding(cli.rounding.into());
    if let Some(year) = cli.as_of_year {
        config = config.with_as_of_year(year);
    }
    config.validate()?;

    let overrides = load_overrides(cli)?;
    debug!(overrides = overrides.len(), "Loaded split overrides");

    let pipeline = Pipeline::new(
        config,
        Arc::new(TagDictionary::standard()),
        Arc::new(overrides),
    );
    KeyRatiosRunner::with_pipeline(pipeline).with_edgar(&cli.user_agent)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.trace.directive());
    debug!("Command line input recorded: {cli:?}");

    let runner = match build_runner(&cli) {
        Ok(runner) => runner,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = std::fs::create_dir_all(&cli.output_dir) {
        error!("Failed to create {}: {e}", cli.output_dir.display());
        return ExitCode::FAILURE;
    }
    info!(dir = %cli.output_dir.display(), "Writing reports");

    let symbols: Vec<Symbol> = cli.tickers.iter().map(Symbol::new).collect();
    let results = runner.run_batch(&symbols, cli.concurrency).await;

    let mut written = 0;
    for (symbol, result) in results {
        let outcome = result.and_then(|report| {
            for split in &report.splits {
                info!(
                    symbol = %symbol,
                    fiscal_year = split.fiscal_year,
                    ratio = split.ratio,
                    "Applied {:?} split",
                    split.source
                );
            }
            export::write_report(&report, &cli.output_dir, cli.years)
        });
        match outcome {
            Ok(path) => {
                written += 1;
                println!("Success! Saved: {}", path.display());
            }
            Err(e) => {
                warn!(symbol = %symbol, error = %e, "Skipping ticker");
                println!("SKIP - Fatal Error for {symbol}: {e}");
            }
        }
    }

    if written == 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
