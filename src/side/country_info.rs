//! Country metadata by ISO 3166 country code.

use std::collections::HashMap;
use std::fs::File;

use super::{CsvReader, CsvTable};
use crate::{CountryInfo, Result};

#[derive(Debug, Default)]
pub struct CountryInfoTable {
    countries: HashMap<String, CountryInfo>,
}

impl CsvTable for CountryInfoTable {
    const REQUIRED_HEADERS: &'static [&'static str] = &["country_code", "capital", "total_area"];

    fn from_csv(reader: &mut csv::Reader<File>) -> Result<Self> {
        let mut countries = HashMap::new();
        for row in reader.deserialize::<CountryInfo>() {
            let info = row?;
            countries.insert(info.country_code.clone(), info);
        }
        Ok(Self { countries })
    }
}

impl CountryInfoTable {
    pub fn get(&self, country: &str) -> Option<&CountryInfo> {
        self.countries.get(country)
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }
}

pub type CountryInfoReader = CsvReader<CountryInfoTable>;

impl CsvReader<CountryInfoTable> {
    /// Look up a country's metadata.
    pub fn get(&self, country: &str) -> Option<CountryInfo> {
        if country.is_empty() {
            return None;
        }
        self.table()?.get(country).cloned()
    }
}
