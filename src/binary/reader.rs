//! BIN database decoder and range lookup.

use std::path::{Path, PathBuf};

use super::format::*;
use super::layout::{ColumnLayout, Field};
use super::source::Storage;
use crate::ip::{AddressValue, IpFamily};
use crate::{Error, GeoRecord, Result, Status};

/// Index table: `(low_row, high_row)` bounds per top-16-bit bucket.
pub struct IndexTable {
    entries: Box<[(u32, u32)]>,
}

impl IndexTable {
    fn from_bytes(bytes: &[u8]) -> Self {
        let entries = bytes
            .chunks_exact(INDEX_ENTRY_SIZE)
            .map(|e| {
                (
                    u32::from_le_bytes([e[0], e[1], e[2], e[3]]),
                    u32::from_le_bytes([e[4], e[5], e[6], e[7]]),
                )
            })
            .collect();
        Self { entries }
    }

    /// Row bounds for a bucket, both inclusive.
    pub fn bounds(&self, bucket: usize) -> (u32, u32) {
        self.entries.get(bucket).copied().unwrap_or((0, 0))
    }
}

/// One address family's row table, resolved from the header.
struct RowTable<'a> {
    family: IpFamily,
    base: u64,
    count: u32,
    row_size: u64,
    max_range: u128,
    index: Option<&'a IndexTable>,
    index_shift: u32,
}

impl RowTable<'_> {
    /// Bytes taken by the leading `ip_from` column.
    fn address_size(&self) -> u64 {
        match self.family {
            IpFamily::V6 => 16,
            _ => 4,
        }
    }
}

/// One fully loaded database generation.
///
/// Everything a query needs (header, layout, index tables and storage) is
/// built before a `Database` exists, so a generation can be swapped in
/// atomically and is immutable afterwards.
///
/// # Example
///
/// ```ignore
/// use ip2l::{normalize, Database};
///
/// let db = Database::open("IP2LOCATION-LITE-DB1.BIN", true)?;
/// let record = db.query(&normalize("8.8.8.8"));
/// println!("{}: {:?}", record.status, record.country_short);
/// ```
pub struct Database {
    path: Option<PathBuf>,
    header: DatabaseHeader,
    layout: ColumnLayout,
    ipv4_index: Option<IndexTable>,
    ipv6_index: Option<IndexTable>,
    storage: Storage,
}

impl Database {
    /// Open a BIN database file.
    ///
    /// With `cache_in_memory` the whole file is read up front; otherwise
    /// rows are read through an open handle on every query.
    pub fn open(path: impl AsRef<Path>, cache_in_memory: bool) -> Result<Self> {
        let path = path.as_ref();
        let storage = Storage::open(path, cache_in_memory)?;
        let db = Self::load(storage, Some(path.to_path_buf()))?;

        let h = &db.header;
        log::info!(
            "Loaded database {:?}: type {}, 20{:02}-{:02}-{:02}, {} IPv4 rows, {} IPv6 rows{}",
            path,
            h.db_type,
            h.year,
            h.month,
            h.day,
            h.ipv4_count,
            h.ipv6_count,
            if cache_in_memory { ", cached in memory" } else { "" }
        );
        Ok(db)
    }

    /// Load a database from bytes already in memory.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        Self::load(Storage::Buffer(data), None)
    }

    fn load(storage: Storage, path: Option<PathBuf>) -> Result<Self> {
        let header = match storage.read_at(0, HEADER_LEN) {
            Some(bytes) => DatabaseHeader::parse(&bytes)?,
            None => {
                return Err(Error::HeaderTooShort {
                    expected: HEADER_LEN,
                    actual: storage.byte_len()? as usize,
                })
            }
        };
        header.validate()?;

        let layout = ColumnLayout::for_db_type(header.db_type)
            .ok_or(Error::UnsupportedDatabaseType(header.db_type))?;

        let (ipv4_index, ipv6_index) = Self::read_indexes(&storage, &header)?;

        Ok(Self {
            path,
            header,
            layout,
            ipv4_index,
            ipv6_index,
            storage,
        })
    }

    /// Read the index tables. The IPv6 table, when present, directly
    /// follows the IPv4 table.
    fn read_indexes(
        storage: &Storage,
        header: &DatabaseHeader,
    ) -> Result<(Option<IndexTable>, Option<IndexTable>)> {
        if !header.is_indexed() {
            return Ok((None, None));
        }

        let table_len = INDEX_ENTRIES * INDEX_ENTRY_SIZE;
        let tables = if header.is_indexed_ipv6() { 2 } else { 1 };
        let bytes = storage
            .read_bytes(header.ipv4_index_base as u64, table_len * tables)
            .ok_or(Error::TruncatedIndex {
                offset: header.ipv4_index_base,
            })?;

        let ipv4 = IndexTable::from_bytes(&bytes[..table_len]);
        let ipv6 = (tables == 2).then(|| IndexTable::from_bytes(&bytes[table_len..]));
        Ok((Some(ipv4), ipv6))
    }

    /// The parsed file header.
    pub fn header(&self) -> &DatabaseHeader {
        &self.header
    }

    /// Column layout for this database type.
    pub fn layout(&self) -> &ColumnLayout {
        &self.layout
    }

    /// Path the database was opened from, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether the whole file is held in memory.
    pub fn is_buffered(&self) -> bool {
        self.storage.is_buffered()
    }

    /// Whether the database has an IPv6 row table.
    pub fn supports_ipv6(&self) -> bool {
        !self.header.is_old_format()
    }

    /// Look up a normalized address.
    ///
    /// Returns status `OK` with every enabled column decoded, or
    /// `IP_ADDRESS_NOT_FOUND` when no range matches or a read comes up short.
    pub fn query(&self, addr: &AddressValue) -> GeoRecord {
        let table = match addr.family {
            IpFamily::V4 => self.ipv4_table(),
            IpFamily::V6 if self.supports_ipv6() => self.ipv6_table(),
            IpFamily::V6 => return GeoRecord::with_status(&addr.input, Status::Ipv6NotSupported),
            IpFamily::Invalid => {
                return GeoRecord::with_status(&addr.input, Status::InvalidIpAddress)
            }
        };

        let value = if addr.value >= table.max_range {
            table.max_range - 1
        } else {
            addr.value
        };

        let record = GeoRecord::new(
            addr.display.clone(),
            value.to_string(),
            Status::IpAddressNotFound,
        );

        if let Some(row) = self.find_row(&table, value) {
            let mut found = record.clone();
            if self.decode_row(&table, row, &mut found).is_some() {
                found.status = Status::Ok;
                return found;
            }
        }

        record
    }

    fn ipv4_table(&self) -> RowTable<'_> {
        RowTable {
            family: IpFamily::V4,
            base: self.header.ipv4_base as u64,
            count: self.header.ipv4_count,
            row_size: self.header.ipv4_row_size(),
            max_range: MAX_IPV4_RANGE,
            index: self.ipv4_index.as_ref(),
            index_shift: 16,
        }
    }

    fn ipv6_table(&self) -> RowTable<'_> {
        RowTable {
            family: IpFamily::V6,
            base: self.header.ipv6_base as u64,
            count: self.header.ipv6_count,
            row_size: self.header.ipv6_row_size(),
            max_range: MAX_IPV6_RANGE,
            index: self.ipv6_index.as_ref(),
            index_shift: 112,
        }
    }

    /// Binary search for the row whose `[ip_from, ip_to)` covers `value`.
    ///
    /// `ip_to` of a row is the `ip_from` of the next one. Returns the row's
    /// 1-based position.
    fn find_row(&self, table: &RowTable<'_>, value: u128) -> Option<u64> {
        let (mut low, mut high) = match table.index {
            Some(index) => {
                let (low, high) = index.bounds((value >> table.index_shift) as usize);
                (low as u64, high as u64)
            }
            None => (0, table.count as u64),
        };

        while low <= high {
            let mid = low + (high - low) / 2;
            let row = table.base + mid * table.row_size;

            let ip_from = self.read_address(table, row)?;
            let ip_to = self.read_address(table, row + table.row_size)?;

            if ip_from <= value && value < ip_to {
                return Some(row);
            }

            if ip_from > value {
                if mid == 0 {
                    break;
                }
                high = mid - 1;
            } else {
                low = mid + 1;
            }
        }

        None
    }

    fn read_address(&self, table: &RowTable<'_>, pos: u64) -> Option<u128> {
        match table.family {
            IpFamily::V6 => self.storage.read_u128(pos),
            _ => self.storage.read_u32(pos).map(u128::from),
        }
    }

    /// Decode every enabled column of a row into `record`.
    fn decode_row(&self, table: &RowTable<'_>, row: u64, record: &mut GeoRecord) -> Option<()> {
        let first = table.address_size();
        let len = usize::try_from(table.row_size.checked_sub(first)?).ok()?;
        let columns = self.storage.read_bytes(row + first, len)?;

        for (field, offset) in self.layout.iter() {
            match field {
                Field::Country => {
                    let pointer = column_u32(&columns, offset)?;
                    record.country_short = Some(self.storage.read_string(pointer)?);
                    record.country_long = Some(self.storage.read_string(pointer.checked_add(3)?)?);
                }
                Field::Latitude => {
                    record.latitude = Some(coordinate(column_f32(&columns, offset)?));
                }
                Field::Longitude => {
                    record.longitude = Some(coordinate(column_f32(&columns, offset)?));
                }
                _ => {
                    let value = self.storage.read_string(column_u32(&columns, offset)?)?;
                    if let Some(slot) = record.text_slot(field) {
                        *slot = Some(value);
                    }
                }
            }
        }

        Some(())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("path", &self.path)
            .field("header", &self.header)
            .field("storage", &self.storage)
            .finish()
    }
}

fn column_u32(columns: &[u8], offset: usize) -> Option<u32> {
    let b = columns.get(offset..offset + 4)?;
    Some(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
}

fn column_f32(columns: &[u8], offset: usize) -> Option<f32> {
    column_u32(columns, offset).map(f32::from_bits)
}

/// Round to 6 decimal places; an exact zero means unknown.
fn coordinate(raw: f32) -> Option<f64> {
    if raw == 0.0 {
        return None;
    }
    Some((raw as f64 * 1_000_000.0).round() / 1_000_000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coordinate_rounding() {
        assert_eq!(coordinate(0.0), None);
        assert_eq!(coordinate(-0.0), None);
        assert_eq!(coordinate(37.386051), Some(37.386051));
        assert_eq!(coordinate(-122.083847), Some(-122.083847));
        assert_eq!(coordinate(1.5), Some(1.5));
    }

    #[test]
    fn test_column_reads_are_bounded() {
        let columns = [1, 0, 0, 0, 2, 0];
        assert_eq!(column_u32(&columns, 0), Some(1));
        assert_eq!(column_u32(&columns, 4), None);
        assert_eq!(column_u32(&columns, 100), None);
    }

    #[test]
    fn test_index_bounds() {
        let mut bytes = Vec::new();
        for i in 0..3u32 {
            bytes.extend_from_slice(&(i * 10).to_le_bytes());
            bytes.extend_from_slice(&(i * 10 + 9).to_le_bytes());
        }
        let index = IndexTable::from_bytes(&bytes);
        assert_eq!(index.bounds(0), (0, 9));
        assert_eq!(index.bounds(2), (20, 29));
        assert_eq!(index.bounds(3), (0, 0));
    }
}
