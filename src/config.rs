//! Reader options.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Options for [`Ip2lReader::init`](crate::Ip2lReader::init).
///
/// Every field is optional when loaded from JSON:
///
/// ```json
/// {
///   "reload_on_db_update": true,
///   "cache_database_in_memory": true,
///   "subdivision_csv_path": "/data/IP2LOCATION-ISO3166-2.CSV"
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReaderOptions {
    /// Reload the database (and side tables) when the file changes
    pub reload_on_db_update: bool,
    /// Read the whole BIN file into memory instead of reading per query
    pub cache_database_in_memory: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdivision_csv_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geoname_id_csv_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_info_csv_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iata_icao_csv_path: Option<PathBuf>,
}

impl ReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file. Unknown keys are rejected.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = std::fs::read_to_string(path)?;
        serde_json::from_str(&data)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn with_reload_on_db_update(mut self, enabled: bool) -> Self {
        self.reload_on_db_update = enabled;
        self
    }

    pub fn with_cache_database_in_memory(mut self, enabled: bool) -> Self {
        self.cache_database_in_memory = enabled;
        self
    }

    pub fn with_subdivision_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.subdivision_csv_path = Some(path.into());
        self
    }

    pub fn with_geoname_id_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.geoname_id_csv_path = Some(path.into());
        self
    }

    pub fn with_country_info_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.country_info_csv_path = Some(path.into());
        self
    }

    pub fn with_iata_icao_csv(mut self, path: impl Into<PathBuf>) -> Self {
        self.iata_icao_csv_path = Some(path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let options = ReaderOptions::default();
        assert!(!options.reload_on_db_update);
        assert!(!options.cache_database_in_memory);
        assert!(options.subdivision_csv_path.is_none());
    }

    #[test]
    fn test_builders() {
        let options = ReaderOptions::new()
            .with_reload_on_db_update(true)
            .with_cache_database_in_memory(true)
            .with_subdivision_csv("sub.csv")
            .with_iata_icao_csv("air.csv");
        assert!(options.reload_on_db_update);
        assert!(options.cache_database_in_memory);
        assert_eq!(options.subdivision_csv_path, Some(PathBuf::from("sub.csv")));
        assert_eq!(options.iata_icao_csv_path, Some(PathBuf::from("air.csv")));
        assert_eq!(options.geoname_id_csv_path, None);
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(
            &path,
            r#"{"cache_database_in_memory": true, "country_info_csv_path": "ci.csv"}"#,
        )
        .unwrap();

        let options = ReaderOptions::from_json_file(&path).unwrap();
        assert!(options.cache_database_in_memory);
        assert!(!options.reload_on_db_update);
        assert_eq!(options.country_info_csv_path, Some(PathBuf::from("ci.csv")));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("options.json");
        std::fs::write(&path, r#"{"reloadOnDbUpdate": true}"#).unwrap();
        assert!(matches!(
            ReaderOptions::from_json_file(&path),
            Err(Error::Config(_))
        ));
    }
}
