use std::collections::{BTreeMap, HashMap};

use clap::ValueEnum;
use lazy_static::lazy_static;
use regex::Regex;

use crate::period::LogPeriod;

/// Placeholder the platform writes when a request carries no token.
pub const NO_TOKEN: &str = "None";

lazy_static! {
    static ref UUID_TOKEN: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    )
    .expect("Failed to compile UUID token pattern");
    static ref HYPHENATED_TOKEN: Regex =
        Regex::new(r"^.*-.*-.*-").expect("Failed to compile hyphenated token pattern");
}

/// Which values count as a user token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum TokenPattern {
    /// Canonical hyphenated UUID
    #[default]
    Strict,
    /// Anything with at least three hyphens
    Loose,
}

impl TokenPattern {
    pub fn accepts(self, value: &str) -> bool {
        if value == NO_TOKEN {
            return false;
        }
        match self {
            TokenPattern::Strict => UUID_TOKEN.is_match(value),
            TokenPattern::Loose => HYPHENATED_TOKEN.is_match(value),
        }
    }

    /// Lowercased token key, or `None` when the value is not a token.
    pub fn normalize(self, value: &str) -> Option<String> {
        let value = value.trim();
        self.accepts(value).then(|| value.to_lowercase())
    }
}

/// Calls per distinct token within one period.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenCounts {
    calls: HashMap<String, u64>,
}

impl TokenCounts {
    fn record(&mut self, token: &str) {
        match self.calls.get_mut(token) {
            Some(count) => *count += 1,
            None => {
                self.calls.insert(token.to_string(), 1);
            }
        }
    }

    pub fn unique_tokens(&self) -> usize {
        self.calls.len()
    }

    pub fn total_calls(&self) -> u64 {
        self.calls.values().sum()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.calls.contains_key(token)
    }

    pub fn calls_for(&self, token: &str) -> u64 {
        self.calls.get(token).copied().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    /// Busiest tokens first; ties are broken by token so output is stable.
    pub fn by_calls_desc(&self) -> Vec<(&str, u64)> {
        let mut rows: Vec<(&str, u64)> = self
            .calls
            .iter()
            .map(|(token, calls)| (token.as_str(), *calls))
            .collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        rows
    }

    fn merge(&mut self, other: TokenCounts) {
        for (token, calls) in other.calls {
            *self.calls.entry(token).or_insert(0) += calls;
        }
    }
}

/// Distinct tokens and their call counts, per month (`YYYY-MM`) and per year
/// (`YYYY`). Every observation lands in both its month and its year.
#[derive(Debug, Clone, Default)]
pub struct TokenTracker {
    pattern: TokenPattern,
    monthly: BTreeMap<String, TokenCounts>,
    yearly: BTreeMap<String, TokenCounts>,
}

impl TokenTracker {
    pub fn new(pattern: TokenPattern) -> Self {
        TokenTracker {
            pattern,
            monthly: BTreeMap::new(),
            yearly: BTreeMap::new(),
        }
    }

    pub fn pattern(&self) -> TokenPattern {
        self.pattern
    }

    /// Records the authorization value if it is a token. Returns whether it
    /// was counted.
    pub fn observe(&mut self, authorization: &str, period: &LogPeriod) -> bool {
        let Some(token) = self.pattern.normalize(authorization) else {
            return false;
        };

        self.monthly
            .entry(period.month_key())
            .or_default()
            .record(&token);
        self.yearly
            .entry(period.year_key())
            .or_default()
            .record(&token);
        true
    }

    pub fn month(&self, period: &LogPeriod) -> Option<&TokenCounts> {
        self.monthly.get(&period.month_key())
    }

    pub fn year(&self, year: u16) -> Option<&TokenCounts> {
        self.yearly.get(&format!("{:04}", year))
    }

    /// Months in ascending order.
    pub fn monthly(&self) -> impl Iterator<Item = (&str, &TokenCounts)> {
        self.monthly.iter().map(|(key, counts)| (key.as_str(), counts))
    }

    /// Years in ascending order.
    pub fn yearly(&self) -> impl Iterator<Item = (&str, &TokenCounts)> {
        self.yearly.iter().map(|(key, counts)| (key.as_str(), counts))
    }

    pub fn is_empty(&self) -> bool {
        self.monthly.is_empty()
    }

    pub fn merge(&mut self, other: TokenTracker) {
        for (key, counts) in other.monthly {
            self.monthly.entry(key).or_default().merge(counts);
        }
        for (key, counts) in other.yearly {
            self.yearly.entry(key).or_default().merge(counts);
        }
    }
}
