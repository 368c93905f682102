use std::collections::BTreeMap;

use log::debug;

use crate::classifier::{Category, Taxonomy};

/// Counters for one run: hits per endpoint label, hits per category, and the
/// gauge values merged in from the external indicators file.
#[derive(Debug, Clone)]
pub struct Aggregator {
    endpoints: Vec<(&'static str, u64)>,
    categories: [u64; Category::COUNT],
    indicators: BTreeMap<String, i64>,
}

impl Aggregator {
    /// Every label of the taxonomy starts at zero so the report always lists
    /// the full key set.
    pub fn new(taxonomy: &Taxonomy) -> Self {
        let mut endpoints: Vec<(&'static str, u64)> = Vec::new();
        for label in taxonomy.labels() {
            if !endpoints.iter().any(|(known, _)| *known == label) {
                endpoints.push((label, 0));
            }
        }

        Aggregator {
            endpoints,
            categories: [0; Category::COUNT],
            indicators: BTreeMap::new(),
        }
    }

    /// Labels outside the taxonomy still count toward their category but
    /// never add an endpoint key.
    pub fn record_hit(&mut self, endpoint: Option<&'static str>, category: Category) {
        if let Some(label) = endpoint {
            match self.endpoints.iter_mut().find(|(known, _)| *known == label) {
                Some((_, count)) => *count += 1,
                None => debug!("Ignoring undeclared endpoint label {}", label),
            }
        }
        self.categories[category.index()] += 1;
    }

    pub fn set_indicator(&mut self, name: &str, value: i64) {
        self.indicators.insert(name.to_string(), value);
    }

    pub fn endpoint_counts(&self) -> impl Iterator<Item = (&'static str, u64)> + '_ {
        self.endpoints.iter().copied()
    }

    pub fn endpoint_count(&self, label: &str) -> Option<u64> {
        self.endpoints
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, count)| *count)
    }

    pub fn category_count(&self, category: Category) -> u64 {
        self.categories[category.index()]
    }

    pub fn category_counts(&self) -> impl Iterator<Item = (Category, u64)> + '_ {
        Category::ALL
            .iter()
            .map(move |category| (*category, self.categories[category.index()]))
    }

    pub fn indicator(&self, name: &str) -> Option<i64> {
        self.indicators.get(name).copied()
    }

    pub fn indicators(&self) -> impl Iterator<Item = (&str, i64)> {
        self.indicators
            .iter()
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn total_hits(&self) -> u64 {
        self.categories.iter().sum()
    }
}
