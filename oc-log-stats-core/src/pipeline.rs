use std::borrow::Cow;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use indicatif::ProgressBar;
use log::{debug, info};

use crate::aggregator::Aggregator;
use crate::classifier::Classifier;
use crate::error::{Result, StatsError};
use crate::indicators::ExternalIndicators;
use crate::period::LogPeriod;
use crate::record::LogRecord;
use crate::tokens::{TokenPattern, TokenTracker};

const PROGRESS_EVERY_LINES: u64 = 50_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessingStats {
    pub lines_read: u64,
    pub lines_matched: u64,
    pub lines_skipped: u64,
    pub tokens_counted: u64,
}

impl ProcessingStats {
    pub fn log_summary(&self, label: &str) {
        info!("--- Processing Summary ({}) ---", label);
        info!(" Lines Read: {}", self.lines_read);
        info!(" Lines Matched: {}", self.lines_matched);
        info!(" Lines Skipped (no match): {}", self.lines_skipped);
        info!(" Token Observations: {}", self.tokens_counted);
        info!("-------------------------------");
    }
}

/// State of one monthly extraction: the classifier, the counters it feeds and
/// the token tracker, all owned by the run and dropped with it.
#[derive(Debug)]
pub struct AccessLogRun {
    period: LogPeriod,
    classifier: Classifier,
    aggregator: Aggregator,
    tracker: TokenTracker,
    stats: ProcessingStats,
}

impl AccessLogRun {
    pub fn new(period: LogPeriod, classifier: Classifier, pattern: TokenPattern) -> Self {
        let aggregator = Aggregator::new(classifier.taxonomy());
        AccessLogRun {
            period,
            classifier,
            aggregator,
            tracker: TokenTracker::new(pattern),
            stats: ProcessingStats::default(),
        }
    }

    /// Feeds one raw line. Lines off the grammar leave every counter as it
    /// was; returns whether the line matched.
    pub fn ingest_line(&mut self, line: &str) -> bool {
        self.stats.lines_read += 1;

        let Some(record) = LogRecord::parse(line) else {
            self.stats.lines_skipped += 1;
            return false;
        };
        self.stats.lines_matched += 1;

        let hit = self.classifier.classify(record.request_uri);
        self.aggregator.record_hit(hit.endpoint, hit.category);

        if self.tracker.observe(record.authorization, &self.period) {
            self.stats.tokens_counted += 1;
        }
        true
    }

    /// Streams every line through `ingest_line`. Bytes that are not valid
    /// UTF-8 are replaced rather than failing the run; only read errors are
    /// returned.
    pub fn ingest_reader<R: BufRead>(
        &mut self,
        mut reader: R,
        progress: &ProgressBar,
    ) -> std::io::Result<()> {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }

            let line = String::from_utf8_lossy(&buf);
            if let Cow::Owned(_) = line {
                debug!("Line {} is not valid UTF-8", self.stats.lines_read + 1);
            }
            self.ingest_line(line.trim_end_matches(|c| c == '\n' || c == '\r'));

            if self.stats.lines_read % PROGRESS_EVERY_LINES == 0 {
                progress.set_message(format!("{} lines read", self.stats.lines_read));
                progress.tick();
            }
        }
        Ok(())
    }

    pub fn ingest_file(&mut self, path: &Path, progress: &ProgressBar) -> Result<()> {
        debug!("Reading {}", path.display());
        let file = File::open(path).map_err(|e| StatsError::io(path, e))?;
        self.ingest_reader(BufReader::new(file), progress)
            .map_err(|e| StatsError::io(path, e))?;
        debug!(
            "Finished {} ({} lines)",
            path.display(),
            self.stats.lines_read
        );
        Ok(())
    }

    pub fn apply_indicators(&mut self, indicators: &ExternalIndicators) {
        indicators.apply_to(&mut self.aggregator);
    }

    pub fn period(&self) -> &LogPeriod {
        &self.period
    }

    pub fn aggregator(&self) -> &Aggregator {
        &self.aggregator
    }

    pub fn tracker(&self) -> &TokenTracker {
        &self.tracker
    }

    pub fn stats(&self) -> &ProcessingStats {
        &self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Category;

    const TOKEN: &str = "0f1e2d3c-4b5a-6978-8a9b-0c1d2e3f4a5b";

    fn line(uri: &str, auth: &str) -> String {
        format!(
            "2024-03-01 10:00:00 # REMOTE_ADDR: 10.0.0.1 # HTTP_USER_AGENT: curl \
             # HTTP_REFERER: None # HTTP_HOST: opencitations.net \
             # REQUEST_URI: {uri} # HTTP_AUTHORIZATION: {auth}"
        )
    }

    fn run() -> AccessLogRun {
        AccessLogRun::new(
            LogPeriod::new(2024, 3).unwrap(),
            Classifier::default(),
            TokenPattern::Strict,
        )
    }

    #[test]
    fn classifies_and_counts_each_category_once() {
        let mut run = run();
        run.ingest_line(&line("/sparql?x=1", "None"));
        run.ingest_line(&line("/index/api/v1/foo", "None"));
        run.ingest_line(&line("/unrelated/path", "None"));

        let agg = run.aggregator();
        assert_eq!(agg.category_count(Category::Sparql), 1);
        assert_eq!(agg.category_count(Category::OcApi), 1);
        assert_eq!(agg.category_count(Category::Others), 1);
        assert_eq!(agg.category_count(Category::Dataset), 0);
        assert_eq!(agg.category_count(Category::AdditionalServices), 0);
        assert_eq!(agg.endpoint_count("/sparql"), Some(1));
        assert_eq!(agg.endpoint_count("/index/api/v1/"), Some(1));
    }

    #[test]
    fn malformed_lines_change_nothing() {
        let mut run = run();
        assert!(!run.ingest_line("garbage"));
        assert!(!run.ingest_line(""));

        assert_eq!(run.aggregator().total_hits(), 0);
        assert!(run.tracker().is_empty());
        assert_eq!(run.stats().lines_skipped, 2);
        assert_eq!(run.stats().lines_matched, 0);
    }

    #[test]
    fn category_total_equals_matched_lines() {
        let mut run = run();
        let input = [
            line("/sparql", TOKEN),
            "noise".to_string(),
            line("/corpus/br/1", TOKEN),
            line("/oci", "None"),
            line("/", "Bearer"),
        ]
        .join("\n");

        run.ingest_reader(input.as_bytes(), &ProgressBar::hidden())
            .unwrap();

        assert_eq!(run.stats().lines_read, 5);
        assert_eq!(run.stats().lines_matched, 4);
        assert_eq!(run.aggregator().total_hits(), 4);
        assert_eq!(run.stats().tokens_counted, 2);

        let month = run.tracker().month(run.period()).unwrap();
        assert_eq!(month.unique_tokens(), 1);
        assert_eq!(month.calls_for(TOKEN), 2);
    }

    #[test]
    fn invalid_utf8_line_does_not_stop_the_run() {
        let mut run = run();
        let mut input = Vec::new();
        input.extend_from_slice(line("/sparql", TOKEN).as_bytes());
        input.extend_from_slice(b"\r\n2024-03-01 10:00:01 # REMOTE_ADDR: 10.0.0.2 # HTTP_USER_AGENT: bot\xff\xfe \
            # HTTP_REFERER: None # HTTP_HOST: opencitations.net \
            # REQUEST_URI: /index/api/v1/x # HTTP_AUTHORIZATION: None\n");
        input.extend_from_slice(line("/sparql?x=2", TOKEN).as_bytes());

        run.ingest_reader(input.as_slice(), &ProgressBar::hidden())
            .unwrap();

        assert_eq!(run.stats().lines_read, 3);
        assert_eq!(run.stats().lines_matched, 3);
        assert_eq!(run.aggregator().category_count(Category::Sparql), 2);
        assert_eq!(run.aggregator().category_count(Category::OcApi), 1);
        assert_eq!(run.tracker().month(run.period()).unwrap().calls_for(TOKEN), 2);
    }
}
