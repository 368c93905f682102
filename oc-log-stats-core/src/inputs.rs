//! Command-line value parsers. They run while clap parses the arguments, so
//! a bad path is reported as a usage error before any work starts.

use std::path::{Path, PathBuf};

use crate::error::StatsError;

fn existing_file(value: &str, expected: &'static str) -> Result<PathBuf, StatsError> {
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(StatsError::FileNotFound(path));
    }
    if !has_extension(&path, expected) {
        return Err(StatsError::WrongExtension { path, expected });
    }
    Ok(path)
}

fn has_extension(path: &Path, expected: &str) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case(expected))
        .unwrap_or(false)
}

/// Monthly access log, `.txt`.
pub fn log_file(value: &str) -> Result<PathBuf, StatsError> {
    existing_file(value, "txt")
}

/// External indicators, `.json`.
pub fn indicators_file(value: &str) -> Result<PathBuf, StatsError> {
    existing_file(value, "json")
}

pub fn directory(value: &str) -> Result<PathBuf, StatsError> {
    let path = PathBuf::from(value);
    if path.is_dir() {
        Ok(path)
    } else {
        Err(StatsError::NotADirectory(path))
    }
}

pub fn year(value: &str) -> Result<u16, StatsError> {
    let value = value.trim();
    if value.len() != 4 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(StatsError::InvalidYear(value.to_string()));
    }
    value
        .parse()
        .map_err(|_| StatsError::InvalidYear(value.to_string()))
}
