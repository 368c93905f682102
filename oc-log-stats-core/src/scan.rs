use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use glob::{glob, Pattern};
use indicatif::ProgressBar;
use log::{debug, info, warn};

use crate::error::{Result, StatsError};
use crate::period::{LogPeriod, LOG_FILE_PREFIX, LOG_FILE_SUFFIX};
use crate::record::{scan_authorization, LogRecord};
use crate::tokens::{TokenPattern, TokenTracker};

/// Where the directory scan takes the authorization value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizationSource {
    /// Any line mentioning `HTTP_AUTHORIZATION: <value>`.
    #[default]
    HeaderScan,
    /// Only lines that parse as complete records.
    FullRecord,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub years: Vec<u16>,
    pub pattern: TokenPattern,
    pub source: AuthorizationSource,
}

#[derive(Debug, Default)]
pub struct ScanOutcome {
    pub tracker: TokenTracker,
    pub files_processed: usize,
    pub files_out_of_range: usize,
    pub failures: Vec<(PathBuf, String)>,
}

impl ScanOutcome {
    pub fn log_summary(&self) {
        info!("--- Scan Summary ---");
        info!(" Files processed: {}", self.files_processed);
        info!(" Files outside requested years: {}", self.files_out_of_range);
        info!(" Files failed: {}", self.failures.len());
        info!("--------------------");
    }
}

/// Log files directly under `directory` whose names carry a valid period,
/// sorted by period. Files off the naming convention are skipped.
pub fn find_log_files(directory: &Path) -> Result<Vec<(PathBuf, LogPeriod)>> {
    let pattern = Path::new(&Pattern::escape(&directory.to_string_lossy()))
        .join(format!("{}*{}", LOG_FILE_PREFIX, LOG_FILE_SUFFIX));
    let pattern_str = pattern.to_string_lossy();
    debug!("Searching for files matching pattern: {}", pattern_str);

    let mut files = Vec::new();
    for entry in glob(&pattern_str)? {
        let path = match entry {
            Ok(path) => path,
            Err(e) => {
                warn!("Skipping unreadable entry: {}", e);
                continue;
            }
        };
        match LogPeriod::from_path(&path) {
            Ok(period) => files.push((path, period)),
            Err(e) => debug!("Skipping {}: {}", path.display(), e),
        }
    }

    files.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
    if files.is_empty() {
        warn!("No log files found matching the pattern: {}", pattern_str);
    }
    Ok(files)
}

/// Counts the tokens of one file into a fresh tracker. A read error discards
/// the whole file.
pub fn scan_file(path: &Path, period: &LogPeriod, options: &ScanOptions) -> Result<TokenTracker> {
    let file = File::open(path).map_err(|e| StatsError::io(path, e))?;
    let reader = BufReader::new(file);
    scan_reader(reader, period, options).map_err(|e| StatsError::io(path, e))
}

fn scan_reader<R: BufRead>(
    reader: R,
    period: &LogPeriod,
    options: &ScanOptions,
) -> std::io::Result<TokenTracker> {
    let mut tracker = TokenTracker::new(options.pattern);
    for line_result in reader.lines() {
        let line = line_result?;
        let authorization = match options.source {
            AuthorizationSource::HeaderScan => scan_authorization(&line),
            AuthorizationSource::FullRecord => {
                LogRecord::parse(&line).map(|record| record.authorization)
            }
        };
        if let Some(value) = authorization {
            tracker.observe(value, period);
        }
    }
    Ok(tracker)
}

/// Scans every log file of the requested years. Files that fail to read are
/// logged and left out; they never abort the scan.
pub fn scan_directory(
    directory: &Path,
    options: &ScanOptions,
    progress: &ProgressBar,
) -> Result<ScanOutcome> {
    let files = find_log_files(directory)?;
    let mut outcome = ScanOutcome {
        tracker: TokenTracker::new(options.pattern),
        ..ScanOutcome::default()
    };

    let total = files.len();
    let selected: Vec<_> = files
        .into_iter()
        .filter(|(path, period)| {
            let keep = options.years.contains(&period.year);
            if !keep {
                debug!("Skipping {} (year {} not requested)", path.display(), period.year);
            }
            keep
        })
        .collect();
    outcome.files_out_of_range = total - selected.len();

    progress.set_length(selected.len() as u64);
    for (path, period) in selected {
        progress.set_message(format!("Processing: {}", path.display()));
        match scan_file(&path, &period, options) {
            Ok(tracker) => {
                outcome.tracker.merge(tracker);
                outcome.files_processed += 1;
            }
            Err(e) => {
                warn!("Error reading {}: {}", path.display(), e);
                outcome.failures.push((path, e.to_string()));
            }
        }
        progress.inc(1);
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const TOKEN_A: &str = "0f1e2d3c-4b5a-6978-8a9b-0c1d2e3f4a5b";
    const TOKEN_B: &str = "11111111-2222-3333-4444-555555555555";

    fn options(years: &[u16]) -> ScanOptions {
        ScanOptions {
            years: years.to_vec(),
            pattern: TokenPattern::Strict,
            source: AuthorizationSource::HeaderScan,
        }
    }

    fn entry(token: &str) -> String {
        format!(
            "t # REMOTE_ADDR: 1.1.1.1 # HTTP_USER_AGENT: a # HTTP_REFERER: r # HTTP_HOST: h \
             # REQUEST_URI: /index/api/v1/x # HTTP_AUTHORIZATION: {token}\n"
        )
    }

    #[test]
    fn finds_only_conventional_names_in_period_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["oc-2024-02.txt", "oc-2023-11.txt", "oc-2024.txt", "notes.txt"] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        let files = find_log_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|(p, _)| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["oc-2023-11.txt", "oc-2024-02.txt"]);
    }

    #[test]
    fn header_scan_counts_lines_outside_the_grammar() {
        let line = format!("partial line HTTP_AUTHORIZATION: {TOKEN_A}\n");
        let period = LogPeriod::new(2024, 1).unwrap();

        let scanned = scan_reader(line.as_bytes(), &period, &options(&[2024])).unwrap();
        assert_eq!(scanned.month(&period).unwrap().unique_tokens(), 1);

        let mut record_options = options(&[2024]);
        record_options.source = AuthorizationSource::FullRecord;
        let parsed = scan_reader(line.as_bytes(), &period, &record_options).unwrap();
        assert!(parsed.is_empty());
    }

    #[test]
    fn filters_by_requested_years() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("oc-2023-05.txt"), entry(TOKEN_A)).unwrap();
        fs::write(dir.path().join("oc-2024-05.txt"), entry(TOKEN_B)).unwrap();

        let outcome =
            scan_directory(dir.path(), &options(&[2024]), &ProgressBar::hidden()).unwrap();
        assert_eq!(outcome.files_processed, 1);
        assert_eq!(outcome.files_out_of_range, 1);
        assert!(outcome.tracker.year(2023).is_none());
        assert!(outcome.tracker.year(2024).unwrap().contains(TOKEN_B));
    }

    #[test]
    fn corrupt_file_is_skipped_without_partial_counts() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("oc-2024-01.txt"), entry(TOKEN_A)).unwrap();
        fs::write(
            dir.path().join("oc-2024-02.txt"),
            format!("{}{}", entry(TOKEN_A), entry(TOKEN_B)),
        )
        .unwrap();
        fs::write(dir.path().join("oc-2024-03.txt"), entry(TOKEN_B)).unwrap();

        let mut corrupt = entry(TOKEN_A).into_bytes();
        corrupt.extend_from_slice(&[0xff, 0xfe, b'\n']);
        fs::write(dir.path().join("oc-2024-04.txt"), corrupt).unwrap();

        let outcome =
            scan_directory(dir.path(), &options(&[2024]), &ProgressBar::hidden()).unwrap();
        assert_eq!(outcome.files_processed, 3);
        assert_eq!(outcome.failures.len(), 1);
        assert!(outcome.failures[0].0.ends_with("oc-2024-04.txt"));

        let year = outcome.tracker.year(2024).unwrap();
        assert_eq!(year.unique_tokens(), 2);
        assert_eq!(year.calls_for(TOKEN_A), 2);
        assert_eq!(year.calls_for(TOKEN_B), 2);
        assert!(outcome
            .tracker
            .month(&LogPeriod::new(2024, 4).unwrap())
            .is_none());
    }
}
