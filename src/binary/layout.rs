//! Per-schema-variant column layout.
//!
//! Each database type carries a fixed subset of columns. The table below
//! gives, for every field, the 1-based column position in a row for each
//! database type (0 = the type does not carry the field). Column 1 is always
//! `ip_from`.

use bitflags::bitflags;

/// Highest database type the layout table knows about.
pub const MAX_DB_TYPE: u8 = 26;

const DB_TYPE_COUNT: usize = MAX_DB_TYPE as usize + 1;

/// Number of decodable fields.
pub const FIELD_COUNT: usize = 24;

/// A decodable column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Country,
    Region,
    City,
    Isp,
    Latitude,
    Longitude,
    Domain,
    Zipcode,
    Timezone,
    Netspeed,
    Iddcode,
    Areacode,
    WeatherStationCode,
    WeatherStationName,
    Mcc,
    Mnc,
    MobileBrand,
    Elevation,
    UsageType,
    AddressType,
    Category,
    District,
    Asn,
    As,
}

impl Field {
    /// All fields, in table order.
    pub const ALL: [Field; FIELD_COUNT] = [
        Field::Country,
        Field::Region,
        Field::City,
        Field::Isp,
        Field::Latitude,
        Field::Longitude,
        Field::Domain,
        Field::Zipcode,
        Field::Timezone,
        Field::Netspeed,
        Field::Iddcode,
        Field::Areacode,
        Field::WeatherStationCode,
        Field::WeatherStationName,
        Field::Mcc,
        Field::Mnc,
        Field::MobileBrand,
        Field::Elevation,
        Field::UsageType,
        Field::AddressType,
        Field::Category,
        Field::District,
        Field::Asn,
        Field::As,
    ];

    /// Field name as it appears in a result record.
    pub fn name(&self) -> &'static str {
        match self {
            Field::Country => "country",
            Field::Region => "region",
            Field::City => "city",
            Field::Isp => "isp",
            Field::Latitude => "latitude",
            Field::Longitude => "longitude",
            Field::Domain => "domain",
            Field::Zipcode => "zipcode",
            Field::Timezone => "timezone",
            Field::Netspeed => "netspeed",
            Field::Iddcode => "iddcode",
            Field::Areacode => "areacode",
            Field::WeatherStationCode => "weatherstationcode",
            Field::WeatherStationName => "weatherstationname",
            Field::Mcc => "mcc",
            Field::Mnc => "mnc",
            Field::MobileBrand => "mobilebrand",
            Field::Elevation => "elevation",
            Field::UsageType => "usagetype",
            Field::AddressType => "addresstype",
            Field::Category => "category",
            Field::District => "district",
            Field::Asn => "asn",
            Field::As => "as",
        }
    }

    /// The flag for this field in a [`Fields`] set.
    pub fn flag(self) -> Fields {
        Fields::from_bits_retain(1 << self as u32)
    }

    /// 1-based column position for a database type, if carried.
    pub fn position(self, db_type: u8) -> Option<u8> {
        POSITIONS[self as usize]
            .get(db_type as usize)
            .copied()
            .filter(|&pos| pos != 0)
    }
}

bitflags! {
    /// Set of fields carried by a database type.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Fields: u32 {
        const COUNTRY = 1 << 0;
        const REGION = 1 << 1;
        const CITY = 1 << 2;
        const ISP = 1 << 3;
        const LATITUDE = 1 << 4;
        const LONGITUDE = 1 << 5;
        const DOMAIN = 1 << 6;
        const ZIPCODE = 1 << 7;
        const TIMEZONE = 1 << 8;
        const NETSPEED = 1 << 9;
        const IDDCODE = 1 << 10;
        const AREACODE = 1 << 11;
        const WEATHER_STATION_CODE = 1 << 12;
        const WEATHER_STATION_NAME = 1 << 13;
        const MCC = 1 << 14;
        const MNC = 1 << 15;
        const MOBILE_BRAND = 1 << 16;
        const ELEVATION = 1 << 17;
        const USAGE_TYPE = 1 << 18;
        const ADDRESS_TYPE = 1 << 19;
        const CATEGORY = 1 << 20;
        const DISTRICT = 1 << 21;
        const ASN = 1 << 22;
        const AS = 1 << 23;
    }
}

#[rustfmt::skip]
const POSITIONS: [[u8; DB_TYPE_COUNT]; FIELD_COUNT] = [
    /* country   */ [0, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2, 2],
    /* region    */ [0, 0, 0, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3, 3],
    /* city      */ [0, 0, 0, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4, 4],
    /* isp       */ [0, 0, 3, 0, 5, 0, 7, 5, 7, 0, 8, 0, 9, 0, 9, 0, 9, 0, 9, 7, 9, 0, 9, 7, 9, 9, 9],
    /* latitude  */ [0, 0, 0, 0, 0, 5, 5, 0, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5, 5],
    /* longitude */ [0, 0, 0, 0, 0, 6, 6, 0, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6, 6],
    /* domain    */ [0, 0, 0, 0, 0, 0, 0, 6, 8, 0, 9, 0, 10, 0, 10, 0, 10, 0, 10, 8, 10, 0, 10, 8, 10, 10, 10],
    /* zipcode   */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 7, 7, 7, 7, 0, 7, 7, 7, 0, 7, 0, 7, 7, 7, 0, 7, 7, 7],
    /* timezone  */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8, 8, 7, 8, 8, 8, 7, 8, 0, 8, 8, 8, 0, 8, 8, 8],
    /* netspeed  */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 8, 11, 0, 11, 8, 11, 0, 11, 0, 11, 0, 11, 11, 11],
    /* iddcode   */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 9, 12, 0, 12, 0, 12, 9, 12, 0, 12, 12, 12],
    /* areacode  */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10, 13, 0, 13, 0, 13, 10, 13, 0, 13, 13, 13],
    /* wx code   */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 9, 14, 0, 14, 0, 14, 0, 14, 14, 14],
    /* wx name   */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10, 15, 0, 15, 0, 15, 0, 15, 15, 15],
    /* mcc       */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 9, 16, 0, 16, 9, 16, 16, 16],
    /* mnc       */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 10, 17, 0, 17, 10, 17, 17, 17],
    /* brand     */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 11, 18, 0, 18, 11, 18, 18, 18],
    /* elevation */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 11, 19, 0, 19, 19, 19],
    /* usagetype */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 12, 20, 20, 20],
    /* addrtype  */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 21, 21],
    /* category  */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 22, 22],
    /* district  */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 23],
    /* asn       */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 24],
    /* as        */ [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 25],
];

/// Byte offsets of the enabled fields for one database type.
///
/// Offsets are relative to the first byte after a row's `ip_from` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnLayout {
    db_type: u8,
    enabled: Fields,
    offsets: [usize; FIELD_COUNT],
}

impl ColumnLayout {
    /// Build the layout for a database type.
    ///
    /// Returns `None` for types beyond [`MAX_DB_TYPE`].
    pub fn for_db_type(db_type: u8) -> Option<Self> {
        if db_type > MAX_DB_TYPE {
            return None;
        }

        let mut enabled = Fields::empty();
        let mut offsets = [0usize; FIELD_COUNT];
        for field in Field::ALL {
            if let Some(pos) = field.position(db_type) {
                enabled |= field.flag();
                offsets[field as usize] = (pos as usize - 2) << 2;
            }
        }

        Some(Self {
            db_type,
            enabled,
            offsets,
        })
    }

    /// The database type this layout was built for.
    pub fn db_type(&self) -> u8 {
        self.db_type
    }

    /// The set of enabled fields.
    pub fn enabled(&self) -> Fields {
        self.enabled
    }

    /// Check if a field is carried by this database type.
    pub fn is_enabled(&self, field: Field) -> bool {
        self.enabled.contains(field.flag())
    }

    /// Byte offset of a field, or `None` if the field is disabled.
    pub fn offset(&self, field: Field) -> Option<usize> {
        self.is_enabled(field).then(|| self.offsets[field as usize])
    }

    /// Iterate over enabled fields and their offsets, in table order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, usize)> + '_ {
        Field::ALL
            .into_iter()
            .filter_map(move |field| self.offset(field).map(|off| (field, off)))
    }
}
