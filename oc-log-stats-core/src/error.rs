use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Expected a .{expected} file, got {}", .path.display())]
    WrongExtension { path: PathBuf, expected: &'static str },

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Log file name '{0}' does not follow the oc-<YYYY>-<MM>.txt convention")]
    InvalidPeriod(String),

    #[error("Invalid year '{0}', expected four digits")]
    InvalidYear(String),

    #[error("Invalid external indicators in {}: {source}", .path.display())]
    Indicators {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {}: {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Invalid search pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    #[error("Metrics registry error: {0}")]
    Metrics(#[from] prometheus::Error),
}

impl StatsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        StatsError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        StatsError::Csv {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, StatsError>;
