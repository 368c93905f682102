use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use oc_log_stats_core::{
    inputs,
    logging::init_logging,
    report,
    scan::scan_directory,
    AuthorizationSource, ScanOptions, TokenPattern,
};

#[derive(Parser)]
#[command(name = "OpenCitations Auth Token Stats")]
#[command(about = "Counts unique HTTP_AUTHORIZATION tokens and their calls per month and year across a directory of access logs.")]
#[command(version = "1.0.0")]
struct Cli {
    #[arg(
        help = "Directory containing oc-<YYYY>-<MM>.txt log files",
        value_parser = inputs::directory
    )]
    log_dir: PathBuf,

    #[arg(
        required = true,
        num_args = 1..,
        help = "Year(s) to include (e.g. 2024 or 2023 2024)",
        value_parser = inputs::year
    )]
    years: Vec<u16>,

    #[arg(
        short,
        long,
        default_value = ".",
        help = "Directory where monthly_stats.csv and yearly_stats.csv are written",
        value_parser = inputs::directory
    )]
    output_dir: PathBuf,

    #[arg(
        long,
        value_enum,
        default_value_t = TokenPattern::Strict,
        help = "Which authorization values count as user tokens"
    )]
    token_pattern: TokenPattern,

    #[arg(long, help = "Only count lines that parse as complete access log records")]
    full_records: bool,

    #[arg(long, help = "List every token with its calls in the log summary")]
    show_tokens: bool,

    #[arg(
        short,
        long,
        default_value = "INFO",
        help = "Logging level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    log_level: String,
}

fn main() -> Result<()> {
    let start_time = Instant::now();
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    info!("Starting OpenCitations Auth Token Stats v1.0.0");
    info!("Log directory: {}", cli.log_dir.display());
    info!("Years: {:?}", cli.years);

    let options = ScanOptions {
        years: cli.years.clone(),
        pattern: cli.token_pattern,
        source: if cli.full_records {
            AuthorizationSource::FullRecord
        } else {
            AuthorizationSource::HeaderScan
        },
    };

    let progress_bar = ProgressBar::new(0);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("Failed to create progress bar template")?
            .progress_chars("=> "),
    );

    let outcome = scan_directory(&cli.log_dir, &options, &progress_bar)
        .with_context(|| format!("Failed to scan {}", cli.log_dir.display()))?;
    progress_bar.finish_with_message("Scan finished.");

    outcome.log_summary();

    report::log_period_summary("Monthly stats", outcome.tracker.monthly(), cli.show_tokens);
    report::log_period_summary("Yearly stats", outcome.tracker.yearly(), cli.show_tokens);

    let monthly_path = cli.output_dir.join("monthly_stats.csv");
    report::write_period_csv(&monthly_path, "year_month", outcome.tracker.monthly())?;
    let yearly_path = cli.output_dir.join("yearly_stats.csv");
    report::write_period_csv(&yearly_path, "year", outcome.tracker.yearly())?;

    info!(
        "CSV files saved: {}, {}",
        monthly_path.display(),
        yearly_path.display()
    );
    info!("Finished in {:.2?}", start_time.elapsed());
    Ok(())
}
