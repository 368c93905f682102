use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use prometheus::{Encoder, IntCounterVec, IntGauge, IntGaugeVec, Opts, Registry, TextEncoder};

use crate::aggregator::Aggregator;
use crate::error::{Result, StatsError};
use crate::indicators::{HARVESTED_DATA_SOURCES, INDEXED_RECORDS};
use crate::period::LogPeriod;
use crate::tokens::TokenCounts;

const METRIC_PREFIX: &str = "opencitations";

/// `<output_dir>/<log stem>.prom`
pub fn exposition_path(output_dir: &Path, log_file: &Path) -> PathBuf {
    output_dir.join(format!("{}.prom", log_stem(log_file)))
}

/// `<output_dir>/<log stem>-users.csv`
pub fn users_csv_path(output_dir: &Path, log_file: &Path) -> PathBuf {
    output_dir.join(format!("{}-users.csv", log_stem(log_file)))
}

fn log_stem(log_file: &Path) -> String {
    log_file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn indicator_help(name: &str) -> String {
    match name {
        INDEXED_RECORDS => "Indexed records".to_string(),
        HARVESTED_DATA_SOURCES => "Harvested data sources".to_string(),
        other => format!("External indicator {}", other),
    }
}

/// Builds the registry for one month: per-endpoint and per-category request
/// counters, the external indicator gauges, and the date and token info
/// series.
pub fn build_registry(
    aggregator: &Aggregator,
    period: &LogPeriod,
    tokens: Option<&TokenCounts>,
) -> Result<Registry> {
    let registry = Registry::new();

    let http_requests = IntCounterVec::new(
        Opts::new(
            format!("{}_http_requests_total", METRIC_PREFIX),
            "Counter for HTTP requests to opencitations endpoints",
        ),
        &["endpoint"],
    )?;
    for (label, count) in aggregator.endpoint_counts() {
        http_requests.with_label_values(&[label]).inc_by(count);
    }
    registry.register(Box::new(http_requests))?;

    let agg_counter = IntCounterVec::new(
        Opts::new(
            format!("{}_agg_counter_total", METRIC_PREFIX),
            "Aggregate HTTP requests counter to opencitations endpoints",
        ),
        &["category"],
    )?;
    for (category, count) in aggregator.category_counts() {
        agg_counter
            .with_label_values(&[category.counter_key()])
            .inc_by(count);
    }
    registry.register(Box::new(agg_counter))?;

    for (name, value) in aggregator.indicators() {
        let gauge = IntGauge::with_opts(Opts::new(
            format!("{}_{}", METRIC_PREFIX, name),
            indicator_help(name),
        ))?;
        gauge.set(value);
        registry.register(Box::new(gauge))?;
    }

    let date = IntGaugeVec::new(
        Opts::new(
            format!("{}_date_info", METRIC_PREFIX),
            "Date to which the statistics refers to",
        ),
        &["month", "year"],
    )?;
    let month = format!("{:02}", period.month);
    let year = period.year_key();
    date.with_label_values(&[month.as_str(), year.as_str()])
        .set(1);
    registry.register(Box::new(date))?;

    let (calls, unique) = tokens
        .map(|counts| (counts.total_calls(), counts.unique_tokens()))
        .unwrap_or((0, 0));
    let auth_tokens = IntGaugeVec::new(
        Opts::new(
            format!("{}_auth_tokens_info", METRIC_PREFIX),
            "Number of unique API users (authorization token)",
        ),
        &["count_calls_unique_users", "count_unique_users"],
    )?;
    let calls = calls.to_string();
    let unique = unique.to_string();
    auth_tokens
        .with_label_values(&[calls.as_str(), unique.as_str()])
        .set(1);
    registry.register(Box::new(auth_tokens))?;

    Ok(registry)
}

pub fn render_exposition(registry: &Registry) -> Result<String> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    encoder.encode(&registry.gather(), &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}

pub fn write_exposition(path: &Path, registry: &Registry) -> Result<()> {
    let body = render_exposition(registry)?;
    fs::write(path, body).map_err(|e| StatsError::io(path, e))?;
    info!("Wrote metrics to {}", path.display());
    Ok(())
}

/// `token,calls` rows without a header, busiest tokens first.
pub fn write_users_csv(path: &Path, tokens: Option<&TokenCounts>) -> Result<usize> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| StatsError::csv(path, e))?;

    let rows = tokens.map(|counts| counts.by_calls_desc()).unwrap_or_default();
    for (token, calls) in &rows {
        wtr.write_record([*token, calls.to_string().as_str()])
            .map_err(|e| StatsError::csv(path, e))?;
    }
    wtr.flush().map_err(|e| StatsError::io(path, e))?;

    info!("Wrote {} token rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

/// `<period_header>,token,calls` with a header row, periods in the order
/// given and busiest tokens first within each period.
pub fn write_period_csv<'a, I>(path: &Path, period_header: &str, periods: I) -> Result<usize>
where
    I: IntoIterator<Item = (&'a str, &'a TokenCounts)>,
{
    let mut wtr = csv::Writer::from_path(path).map_err(|e| StatsError::csv(path, e))?;
    wtr.write_record([period_header, "token", "calls"])
        .map_err(|e| StatsError::csv(path, e))?;

    let mut written = 0;
    for (period, counts) in periods {
        for (token, calls) in counts.by_calls_desc() {
            wtr.write_record([period, token, calls.to_string().as_str()])
                .map_err(|e| StatsError::csv(path, e))?;
            written += 1;
        }
    }
    wtr.flush().map_err(|e| StatsError::io(path, e))?;

    info!("Wrote {} rows to {}", written, path.display());
    Ok(written)
}

pub fn log_period_summary<'a, I>(title: &str, periods: I, show_tokens: bool)
where
    I: IntoIterator<Item = (&'a str, &'a TokenCounts)>,
{
    info!("--- {} ---", title);
    for (period, counts) in periods {
        info!(
            " {}: {} unique valid tokens, {} calls",
            period,
            counts.unique_tokens(),
            counts.total_calls()
        );
        if show_tokens {
            for (token, calls) in counts.by_calls_desc() {
                info!("    Token: {} -> {} calls", token, calls);
            }
        }
    }
}
