use std::fmt;
use std::path::Path;

use crate::error::{Result, StatsError};

pub const LOG_FILE_PREFIX: &str = "oc-";
pub const LOG_FILE_SUFFIX: &str = ".txt";

/// The month a log file covers, recovered from its `oc-<YYYY>-<MM>.txt` name.
///
/// Keys and labels always render the month zero-padded, so `oc-2024-3.txt`
/// reports as `2024-03` (and `month="03"` in the date info series) rather
/// than echoing the file name's `3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LogPeriod {
    pub year: u16,
    pub month: u8,
}

impl LogPeriod {
    pub fn new(year: u16, month: u8) -> Option<Self> {
        (1..=12).contains(&month).then_some(LogPeriod { year, month })
    }

    pub fn from_file_name(name: &str) -> Result<Self> {
        let invalid = || StatsError::InvalidPeriod(name.to_string());

        let stem = name
            .strip_prefix(LOG_FILE_PREFIX)
            .and_then(|rest| rest.strip_suffix(LOG_FILE_SUFFIX))
            .ok_or_else(invalid)?;

        let (year, month) = stem.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        if month.is_empty() || month.len() > 2 || !month.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let year: u16 = year.parse().map_err(|_| invalid())?;
        let month: u8 = month.parse().map_err(|_| invalid())?;
        LogPeriod::new(year, month).ok_or_else(invalid)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        LogPeriod::from_file_name(&name)
    }

    /// `YYYY`
    pub fn year_key(&self) -> String {
        format!("{:04}", self.year)
    }

    /// `YYYY-MM`
    pub fn month_key(&self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }
}

impl fmt::Display for LogPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}
