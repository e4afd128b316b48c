//! ISO 3166-2 subdivision codes by country and region name.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;

use super::{de, CsvReader, CsvTable};
use crate::Result;

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(deserialize_with = "de::text")]
    country_code: String,
    #[serde(deserialize_with = "de::text")]
    subdivision_name: String,
    #[serde(deserialize_with = "de::text")]
    code: String,
}

/// `country_code -> subdivision_name -> code`
#[derive(Debug, Default)]
pub struct SubdivisionTable {
    codes: HashMap<String, HashMap<String, String>>,
}

impl CsvTable for SubdivisionTable {
    const REQUIRED_HEADERS: &'static [&'static str] = &["country_code", "subdivision_name", "code"];

    fn from_csv(reader: &mut csv::Reader<File>) -> Result<Self> {
        let mut codes: HashMap<String, HashMap<String, String>> = HashMap::new();
        for row in reader.deserialize::<Row>() {
            let row = row?;
            codes
                .entry(row.country_code)
                .or_default()
                .insert(row.subdivision_name, row.code);
        }
        Ok(Self { codes })
    }
}

impl SubdivisionTable {
    /// Subdivision part of the code (`US-CA` -> `CA`).
    ///
    /// Codes of 3 characters or fewer carry no subdivision part and read
    /// as empty.
    pub fn get(&self, country: &str, region: &str) -> Option<String> {
        let code = self.codes.get(country)?.get(region)?;
        Some(code.get(3..).unwrap_or_default().to_string())
    }

    pub fn len(&self) -> usize {
        self.codes.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }
}

pub type SubdivisionReader = CsvReader<SubdivisionTable>;

impl CsvReader<SubdivisionTable> {
    /// Look up the subdivision code for a country code and region name.
    pub fn get(&self, country: &str, region: &str) -> Option<String> {
        if country.is_empty() || region.is_empty() {
            return None;
        }
        self.table()?.get(country, region)
    }
}
