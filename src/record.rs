//! Query result records.

use serde::{Deserialize, Serialize};

use crate::binary::Field;
use crate::side::de;
use crate::Status;

/// Result of a geolocation query.
///
/// `ip`, `ip_no` and `status` are always present. Every other field is
/// `Some` only when the database type carries it (or, for enrichment
/// fields, when the side table had an entry). Coordinates are
/// `Some(None)` when the database stores exactly zero, meaning unknown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoRecord {
    pub ip: String,
    pub ip_no: String,
    pub status: Status,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_short: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_long: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<Option<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zipcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub netspeed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iddcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub areacode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weatherstationcode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weatherstationname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mcc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mnc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobilebrand: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usagetype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub addresstype: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub asn: Option<String>,
    #[serde(rename = "as", skip_serializing_if = "Option::is_none")]
    pub as_name: Option<String>,

    /// ISO 3166-2 subdivision code, from the subdivision side table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subdivision: Option<String>,
    /// GeoName ID, from the GeoName ID side table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub geoname_id: Option<u32>,
    /// Country metadata, from the country info side table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_info: Option<CountryInfo>,
    /// Airports in the region, from the IATA/ICAO side table
    #[serde(skip_serializing_if = "Option::is_none")]
    pub airports: Option<Vec<Airport>>,
}

impl GeoRecord {
    /// Create a record with only the mandatory fields set.
    pub fn new(ip: impl Into<String>, ip_no: impl Into<String>, status: Status) -> Self {
        Self {
            ip: ip.into(),
            ip_no: ip_no.into(),
            status,
            country_short: None,
            country_long: None,
            region: None,
            city: None,
            isp: None,
            latitude: None,
            longitude: None,
            domain: None,
            zipcode: None,
            timezone: None,
            netspeed: None,
            iddcode: None,
            areacode: None,
            weatherstationcode: None,
            weatherstationname: None,
            mcc: None,
            mnc: None,
            mobilebrand: None,
            elevation: None,
            usagetype: None,
            addresstype: None,
            category: None,
            district: None,
            asn: None,
            as_name: None,
            subdivision: None,
            geoname_id: None,
            country_info: None,
            airports: None,
        }
    }

    /// Record for a query that stopped before the lookup.
    pub fn with_status(ip: &str, status: Status) -> Self {
        Self::new(ip, "", status)
    }

    /// Slot for a string column. `Country` maps to `country_short`;
    /// coordinates are not string columns.
    pub(crate) fn text_slot(&mut self, field: Field) -> Option<&mut Option<String>> {
        let slot = match field {
            Field::Country => &mut self.country_short,
            Field::Region => &mut self.region,
            Field::City => &mut self.city,
            Field::Isp => &mut self.isp,
            Field::Domain => &mut self.domain,
            Field::Zipcode => &mut self.zipcode,
            Field::Timezone => &mut self.timezone,
            Field::Netspeed => &mut self.netspeed,
            Field::Iddcode => &mut self.iddcode,
            Field::Areacode => &mut self.areacode,
            Field::WeatherStationCode => &mut self.weatherstationcode,
            Field::WeatherStationName => &mut self.weatherstationname,
            Field::Mcc => &mut self.mcc,
            Field::Mnc => &mut self.mnc,
            Field::MobileBrand => &mut self.mobilebrand,
            Field::Elevation => &mut self.elevation,
            Field::UsageType => &mut self.usagetype,
            Field::AddressType => &mut self.addresstype,
            Field::Category => &mut self.category,
            Field::District => &mut self.district,
            Field::Asn => &mut self.asn,
            Field::As => &mut self.as_name,
            Field::Latitude | Field::Longitude => return None,
        };
        Some(slot)
    }

    /// A string field's value, if present and non-empty.
    pub fn non_empty(value: &Option<String>) -> Option<&str> {
        value.as_deref().filter(|s| !s.is_empty())
    }
}

/// Country metadata from the country info side table.
///
/// Deserialized straight from a CSV row; a `-` cell reads as empty text or
/// as a null number.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CountryInfo {
    /// ISO 3166 two-letter code
    #[serde(deserialize_with = "de::text")]
    pub country_code: String,
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub country_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub country_alpha3_code: Option<String>,
    #[serde(default, deserialize_with = "de::number")]
    pub country_numeric_code: Option<u64>,
    #[serde(deserialize_with = "de::text")]
    pub capital: String,
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub country_demonym: Option<String>,
    /// Square kilometres
    #[serde(deserialize_with = "de::number")]
    pub total_area: Option<f64>,
    #[serde(default, deserialize_with = "de::number")]
    pub population: Option<u64>,
    #[serde(default, deserialize_with = "de::number")]
    pub idd_code: Option<u64>,
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub currency_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub currency_symbol: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub lang_code: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub lang_name: Option<String>,
    #[serde(default, deserialize_with = "de::opt_text", skip_serializing_if = "Option::is_none")]
    pub cctld: Option<String>,
}

/// One airport from the IATA/ICAO side table.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Airport {
    pub iata: String,
    pub icao: String,
    pub airport: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}
