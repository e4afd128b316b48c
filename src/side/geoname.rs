//! GeoName IDs by country, region and city.

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
    region_name: String,
    #[serde(deserialize_with = "de::text")]
    city_name: String,
    #[serde(deserialize_with = "de::number")]
    geonameid: Option<u32>,
}

#[derive(Debug, Default)]
pub struct GeoNameIdTable {
    ids: HashMap<(String, String, String), u32>,
}

impl CsvTable for GeoNameIdTable {
    const REQUIRED_HEADERS: &'static [&'static str] =
        &["country_code", "region_name", "city_name", "geonameid"];

    fn from_csv(reader: &mut csv::Reader<File>) -> Result<Self> {
        let mut ids = HashMap::new();
        for row in reader.deserialize::<Row>() {
            let row = row?;
            // rows without a usable id carry nothing to look up
            if let Some(id) = row.geonameid {
                ids.insert((row.country_code, row.region_name, row.city_name), id);
            }
        }
        Ok(Self { ids })
    }
}

impl GeoNameIdTable {
    pub fn get(&self, country: &str, region: &str, city: &str) -> Option<u32> {
        self.ids
            .get(&(country.to_string(), region.to_string(), city.to_string()))
            .copied()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

pub type GeoNameIdReader = CsvReader<GeoNameIdTable>;

impl CsvReader<GeoNameIdTable> {
    /// Look up the GeoName ID of a city.
    pub fn get(&self, country: &str, region: &str, city: &str) -> Option<u32> {
        if country.is_empty() || region.is_empty() || city.is_empty() {
            return None;
        }
        self.table()?.get(country, region, city)
    }
}
