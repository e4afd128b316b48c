//! BIN format constants and header structure.

use serde::Serialize;

use crate::{Error, Result};

/// Bytes covered by the fixed header (1-based positions 1..=35).
pub const HEADER_LEN: usize = 35;

/// Entries in each index table, one per value of the top 16 address bits.
pub const INDEX_ENTRIES: usize = 65536;

/// Size of one `(low_row, high_row)` index entry.
pub const INDEX_ENTRY_SIZE: usize = 8;

/// Largest IPv4 address value; lookups clamp to one below it.
pub const MAX_IPV4_RANGE: u128 = 4_294_967_295;

/// Largest IPv6 address value; lookups clamp to one below it.
pub const MAX_IPV6_RANGE: u128 = u128::MAX;

/// Leading bytes of a ZIP archive.
pub const ZIP_SIGNATURE: [u8; 2] = *b"PK";

/// Product code of IP2Location geolocation databases.
pub const PRODUCT_CODE_IP2LOCATION: u8 = 1;

/// Releases from this year onward carry a product code.
pub const PRODUCT_CODE_SINCE_YEAR: u8 = 21;

/// Parsed BIN file header.
///
/// Offsets (`*_base`) are 1-based file positions, as stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DatabaseHeader {
    /// Schema variant, selects the column layout
    pub db_type: u8,
    /// Columns per row, including `ip_from`
    pub column_count: u8,
    /// Release year, two digits
    pub year: u8,
    /// Release month
    pub month: u8,
    /// Release day
    pub day: u8,
    /// Number of IPv4 rows
    pub ipv4_count: u32,
    /// Position of the first IPv4 row
    pub ipv4_base: u32,
    /// Number of IPv6 rows (0 for IPv4-only databases)
    pub ipv6_count: u32,
    /// Position of the first IPv6 row
    pub ipv6_base: u32,
    /// Position of the IPv4 index table (0 if not indexed)
    pub ipv4_index_base: u32,
    /// Position of the IPv6 index table (0 if not indexed)
    pub ipv6_index_base: u32,
    /// Product code
    pub product_code: u8,
    /// Product type
    pub product_type: u8,
    /// Declared file size
    pub file_size: u32,
}

impl DatabaseHeader {
    /// Parse the header from the first bytes of a file.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(Error::HeaderTooShort {
                expected: HEADER_LEN,
                actual: bytes.len(),
            });
        }

        // positions below are 1-based, as documented for the format
        let u8_at = |pos: usize| bytes[pos - 1];
        let u32_at = |pos: usize| {
            u32::from_le_bytes([bytes[pos - 1], bytes[pos], bytes[pos + 1], bytes[pos + 2]])
        };

        Ok(Self {
            db_type: u8_at(1),
            column_count: u8_at(2),
            year: u8_at(3),
            month: u8_at(4),
            day: u8_at(5),
            ipv4_count: u32_at(6),
            ipv4_base: u32_at(10),
            ipv6_count: u32_at(14),
            ipv6_base: u32_at(18),
            ipv4_index_base: u32_at(22),
            ipv6_index_base: u32_at(26),
            product_code: u8_at(30),
            product_type: u8_at(31),
            file_size: u32_at(32),
        })
    }

    /// Minimal sanity check that this is an uncompressed, current-format file.
    pub fn validate(&self) -> Result<()> {
        if [self.db_type, self.column_count] == ZIP_SIGNATURE {
            return Err(Error::CompressedDatabase);
        }
        if self.product_code != PRODUCT_CODE_IP2LOCATION && self.year >= PRODUCT_CODE_SINCE_YEAR {
            return Err(Error::IncorrectFormat {
                product_code: self.product_code,
                year: self.year,
            });
        }
        Ok(())
    }

    /// IPv4-only databases predate the IPv6 row table.
    pub fn is_old_format(&self) -> bool {
        self.ipv6_count == 0
    }

    /// Whether an IPv4 index table is present.
    pub fn is_indexed(&self) -> bool {
        self.ipv4_index_base > 0
    }

    /// Whether an IPv6 index table is present.
    pub fn is_indexed_ipv6(&self) -> bool {
        self.ipv6_index_base > 0 && !self.is_old_format()
    }

    /// Row size of the IPv4 table: 4 bytes per column.
    pub fn ipv4_row_size(&self) -> u64 {
        (self.column_count as u64) << 2
    }

    /// Row size of the IPv6 table: 16-byte `ip_from`, then 4 bytes per column.
    pub fn ipv6_row_size(&self) -> u64 {
        16 + ((self.column_count.saturating_sub(1) as u64) << 2)
    }
}
