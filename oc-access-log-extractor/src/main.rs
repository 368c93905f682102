use std::{
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use log::info;

use oc_log_stats_core::{
    inputs,
    logging::init_logging,
    report::{self, exposition_path, users_csv_path},
    AccessLogRun, Classifier, ExternalIndicators, LogPeriod, SuffixMatchMode, Taxonomy,
    TaxonomyGeneration, TokenPattern,
};

#[derive(Parser)]
#[command(name = "OpenCitations Access Log Extractor")]
#[command(about = "Extracts monthly endpoint statistics and API token usage from an OpenCitations access log.")]
#[command(version = "1.0.0")]
struct Cli {
    #[arg(
        help = "Input file (.txt) containing the monthly accesses, named oc-<YYYY>-<MM>.txt",
        value_parser = inputs::log_file
    )]
    logfile: PathBuf,

    #[arg(
        help = "Input file (.json) containing the external indicators",
        value_parser = inputs::indicators_file
    )]
    external_indicators: PathBuf,

    #[arg(
        short,
        long,
        default_value = ".",
        help = "Directory in which to save the output files",
        value_parser = inputs::directory
    )]
    output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = TaxonomyGeneration::Full, help = "Endpoint rule set")]
    taxonomy: TaxonomyGeneration,

    #[arg(
        long,
        value_enum,
        default_value_t = SuffixMatchMode::Prefix,
        help = "How SPARQL rules are matched against the request URI"
    )]
    suffix_match: SuffixMatchMode,

    #[arg(
        long,
        value_enum,
        default_value_t = TokenPattern::Strict,
        help = "Which authorization values count as user tokens"
    )]
    token_pattern: TokenPattern,

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

    info!("Starting OpenCitations Access Log Extractor v1.0.0");

    let period = LogPeriod::from_path(&cli.logfile)
        .with_context(|| format!("Cannot derive the period of {}", cli.logfile.display()))?;
    let indicators = ExternalIndicators::load(&cli.external_indicators)?;

    info!("Log file: {} (period {})", cli.logfile.display(), period);
    info!("Output directory: {}", cli.output_dir.display());
    info!(
        "Taxonomy: {:?}, suffix match: {:?}, token pattern: {:?}",
        cli.taxonomy, cli.suffix_match, cli.token_pattern
    );

    let classifier = Classifier::new(Taxonomy::from(cli.taxonomy), cli.suffix_match);
    let mut run = AccessLogRun::new(period, classifier, cli.token_pattern);

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("[{elapsed_precise}] {spinner} {msg}")
            .context("Failed to create progress spinner template")?,
    );
    spinner.enable_steady_tick(Duration::from_millis(200));
    spinner.set_message("Reading log...");

    run.ingest_file(&cli.logfile, &spinner)?;
    spinner.finish_with_message(format!("Read {} lines", run.stats().lines_read));

    run.apply_indicators(&indicators);

    let tokens = run.tracker().month(run.period());
    let registry = report::build_registry(run.aggregator(), run.period(), tokens)?;

    let users_path = users_csv_path(&cli.output_dir, &cli.logfile);
    report::write_users_csv(&users_path, tokens)?;

    let prom_path = exposition_path(&cli.output_dir, &cli.logfile);
    report::write_exposition(&prom_path, &registry)?;

    run.stats().log_summary(&period.to_string());
    info!("--- Requests per category ---");
    for (category, count) in run.aggregator().category_counts() {
        info!(" {}: {}", category.counter_key(), count);
    }
    info!(
        "Unique API users: {}, calls: {}",
        tokens.map_or(0, |t| t.unique_tokens()),
        tokens.map_or(0, |t| t.total_calls())
    );
    info!("Finished in {:.2?}", start_time.elapsed());

    Ok(())
}
