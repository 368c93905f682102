use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::Deserialize;

use crate::aggregator::Aggregator;
use crate::error::{Result, StatsError};

pub const INDEXED_RECORDS: &str = "indexed_records";
pub const HARVESTED_DATA_SOURCES: &str = "harvested_data_sources";

/// Figures produced outside the access logs and published next to them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ExternalIndicators {
    pub indexed_records: i64,
    pub harvested_data_sources: i64,
}

impl ExternalIndicators {
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| StatsError::io(path, e))?;
        serde_json::from_reader(BufReader::new(file)).map_err(|source| StatsError::Indicators {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn apply_to(&self, aggregator: &mut Aggregator) {
        aggregator.set_indicator(INDEXED_RECORDS, self.indexed_records);
        aggregator.set_indicator(HARVESTED_DATA_SOURCES, self.harvested_data_sources);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Taxonomy;
    use std::io::Write;

    fn write_json(dir: &tempfile::TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("indicators.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn loads_both_keys_and_ignores_extras() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(
            &dir,
            r#"{"indexed_records": 1000, "harvested_data_sources": 5, "note": "x"}"#,
        );

        let indicators = ExternalIndicators::load(&path).unwrap();
        assert_eq!(
            indicators,
            ExternalIndicators {
                indexed_records: 1000,
                harvested_data_sources: 5
            }
        );

        let mut aggregator = Aggregator::new(&Taxonomy::full());
        indicators.apply_to(&mut aggregator);
        assert_eq!(aggregator.indicator(INDEXED_RECORDS), Some(1000));
        assert_eq!(aggregator.indicator(HARVESTED_DATA_SOURCES), Some(5));
    }

    #[test]
    fn missing_key_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_json(&dir, r#"{"indexed_records": 1000}"#);

        let err = ExternalIndicators::load(&path).unwrap_err();
        assert!(matches!(err, StatsError::Indicators { .. }));
        assert!(err.to_string().contains("harvested_data_sources"));
    }
}
