//! Airports (IATA/ICAO codes) by country and region.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs::File;

use super::{de, CsvReader, CsvTable};
use crate::{Airport, Result};

#[derive(Debug, Deserialize)]
struct Row {
    #[serde(deserialize_with = "de::text")]
    country_code: String,
    #[serde(deserialize_with = "de::text")]
    region_name: String,
    #[serde(deserialize_with = "de::text")]
    iata: String,
    #[serde(deserialize_with = "de::text")]
    icao: String,
    #[serde(default, deserialize_with = "de::text")]
    airport: String,
    #[serde(deserialize_with = "de::number")]
    latitude: Option<f64>,
    #[serde(deserialize_with = "de::number")]
    longitude: Option<f64>,
}

/// `(country_code, region_name) -> airports`, in file order.
#[derive(Debug, Default)]
pub struct IataIcaoTable {
    airports: HashMap<(String, String), Vec<Airport>>,
}

impl CsvTable for IataIcaoTable {
    const REQUIRED_HEADERS: &'static [&'static str] =
        &["country_code", "region_name", "iata", "icao", "latitude", "longitude"];

    fn from_csv(reader: &mut csv::Reader<File>) -> Result<Self> {
        let mut airports: HashMap<(String, String), Vec<Airport>> = HashMap::new();
        for row in reader.deserialize::<Row>() {
            let row = row?;
            airports
                .entry((row.country_code, row.region_name))
                .or_default()
                .push(Airport {
                    iata: row.iata,
                    icao: row.icao,
                    airport: row.airport,
                    latitude: row.latitude,
                    longitude: row.longitude,
                });
        }
        Ok(Self { airports })
    }
}

impl IataIcaoTable {
    pub fn get(&self, country: &str, region: &str) -> &[Airport] {
        self.airports
            .get(&(country.to_string(), region.to_string()))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.airports.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.airports.is_empty()
    }
}

pub type IataIcaoReader = CsvReader<IataIcaoTable>;

impl CsvReader<IataIcaoTable> {
    /// Every airport in a region. An empty region reads as not found.
    pub fn get(&self, country: &str, region: &str) -> Option<Vec<Airport>> {
        if country.is_empty() || region.is_empty() {
            return None;
        }
        let table = self.table()?;
        let airports = table.get(country, region);
        (!airports.is_empty()).then(|| airports.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::side::testutil::write_csv;
    use tempfile::tempdir;

    const CSV: &str = "\
country_code,region_name,airport,iata,icao,latitude,longitude
US,California,San Francisco International Airport,SFO,KSFO,37.618889,-122.375
US,California,San Jose International Airport,SJC,KSJC,37.362598,-121.929001
JP,Tokyo,Tokyo Haneda International Airport,HND,RJTT,35.552299,139.779999
JP,Tokyo,Chofu Airport,-,RJTF,-,-
";

    #[test]
    fn test_airports_by_region() {
        let dir = tempdir().unwrap();
        let reader = IataIcaoReader::new();
        reader.init(write_csv(dir.path(), "air.csv", CSV), false).unwrap();

        let ca = reader.get("US", "California").unwrap();
        assert_eq!(ca.len(), 2);
        assert_eq!(ca[0].iata, "SFO");
        assert_eq!(ca[0].icao, "KSFO");
        assert_eq!(ca[0].airport, "San Francisco International Airport");
        assert_eq!(ca[0].latitude, Some(37.618889));
        assert_eq!(ca[1].iata, "SJC");

        let tokyo = reader.get("JP", "Tokyo").unwrap();
        assert_eq!(tokyo[1].iata, "");
        assert_eq!(tokyo[1].latitude, None);

        assert_eq!(reader.get("US", "Texas"), None);
        assert_eq!(reader.get("", "Tokyo"), None);
        assert_eq!(reader.table().unwrap().len(), 4);
    }

    #[test]
    fn test_airport_name_column_is_optional() {
        let dir = tempdir().unwrap();
        let csv = "country_code,region_name,iata,icao,latitude,longitude\nDE,Hessen,FRA,EDDF,50.033333,8.570556\n";
        let reader = IataIcaoReader::new();
        reader.init(write_csv(dir.path(), "air.csv", csv), false).unwrap();

        let hessen = reader.get("DE", "Hessen").unwrap();
        assert_eq!(hessen[0].airport, "");
        assert_eq!(hessen[0].longitude, Some(8.570556));
    }
}
