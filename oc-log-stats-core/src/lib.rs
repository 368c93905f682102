//! Statistics over the monthly OpenCitations access logs.
//!
//! Each log line is parsed into a [`record::LogRecord`], its request URI is
//! classified against an ordered endpoint [`classifier::Taxonomy`], and its
//! authorization value is tracked per month and per year by the
//! [`tokens::TokenTracker`]. The [`report`] module turns the accumulated state
//! into a Prometheus text file and CSV token reports.

pub mod aggregator;
pub mod classifier;
pub mod error;
pub mod indicators;
pub mod inputs;
pub mod logging;
pub mod period;
pub mod pipeline;
pub mod record;
pub mod report;
pub mod scan;
pub mod tokens;

pub use aggregator::Aggregator;
pub use classifier::{
    Category, Classification, Classifier, EndpointRule, SuffixMatchMode, Taxonomy,
    TaxonomyGeneration,
};
pub use error::{Result, StatsError};
pub use indicators::ExternalIndicators;
pub use period::LogPeriod;
pub use pipeline::{AccessLogRun, ProcessingStats};
pub use record::LogRecord;
pub use scan::{AuthorizationSource, ScanOptions, ScanOutcome};
pub use tokens::{TokenCounts, TokenPattern, TokenTracker};
