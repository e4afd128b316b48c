//! Synthetic BIN database writer for tests and benchmarks.
//!
//! Only depends on std so it can be pulled into integration tests and
//! benches with `#[path]`.

#![allow(dead_code)]

use std::io;
use std::path::Path;

const HEADER_SIZE: usize = 64;
const INDEX_TABLE_SIZE: usize = 65536 * 8;

/// One column value after `ip_from`.
#[derive(Debug, Clone)]
pub enum Column {
    /// Short code and long name, stored 3 bytes apart
    Country(String, String),
    Text(String),
    Float(f32),
}

pub fn country(short: &str, long: &str) -> Column {
    Column::Country(short.to_string(), long.to_string())
}

pub fn text(value: &str) -> Column {
    Column::Text(value.to_string())
}

pub fn float(value: f32) -> Column {
    Column::Float(value)
}

/// Builds a BIN file. Rows must be added in ascending `ip_from` order; a
/// sentinel row closing the last range is appended automatically.
#[derive(Debug, Clone)]
pub struct BinBuilder {
    db_type: u8,
    column_count: u8,
    date: (u8, u8, u8),
    product_code: u8,
    indexed: bool,
    ipv4: Vec<(u128, Vec<Column>)>,
    ipv6: Vec<(u128, Vec<Column>)>,
}

impl BinBuilder {
    pub fn new(db_type: u8, column_count: u8) -> Self {
        Self {
            db_type,
            column_count,
            date: (24, 1, 1),
            product_code: 1,
            indexed: false,
            ipv4: Vec::new(),
            ipv6: Vec::new(),
        }
    }

    pub fn indexed(mut self, indexed: bool) -> Self {
        self.indexed = indexed;
        self
    }

    pub fn date(mut self, year: u8, month: u8, day: u8) -> Self {
        self.date = (year, month, day);
        self
    }

    pub fn product_code(mut self, code: u8) -> Self {
        self.product_code = code;
        self
    }

    pub fn ipv4(mut self, from: u32, columns: Vec<Column>) -> Self {
        self.ipv4.push((from as u128, columns));
        self
    }

    pub fn ipv6(mut self, from: u128, columns: Vec<Column>) -> Self {
        self.ipv6.push((from, columns));
        self
    }

    fn ipv4_row_size(&self) -> usize {
        self.column_count as usize * 4
    }

    fn ipv6_row_size(&self) -> usize {
        16 + (self.column_count as usize - 1) * 4
    }

    pub fn build(&self) -> Vec<u8> {
        let has_ipv6 = !self.ipv6.is_empty();
        let index_tables = match (self.indexed, has_ipv6) {
            (false, _) => 0,
            (true, false) => 1,
            (true, true) => 2,
        };

        let ipv4_index_offset = HEADER_SIZE;
        let ipv6_index_offset = HEADER_SIZE + INDEX_TABLE_SIZE;
        let ipv4_offset = HEADER_SIZE + index_tables * INDEX_TABLE_SIZE;
        let ipv4_len = (self.ipv4.len() + 1) * self.ipv4_row_size();
        let ipv6_offset = ipv4_offset + ipv4_len;
        let ipv6_len = if has_ipv6 {
            (self.ipv6.len() + 1) * self.ipv6_row_size()
        } else {
            0
        };
        let pool_offset = ipv6_offset + ipv6_len;

        let mut pool = StringPool::new(pool_offset);
        let mut out = vec![0u8; HEADER_SIZE];

        if self.indexed {
            out.extend(index_table(&self.ipv4, 16, u32::MAX as u128));
            if has_ipv6 {
                out.extend(index_table(&self.ipv6, 112, u128::MAX));
            }
        }

        self.write_rows(&mut out, &mut pool, &self.ipv4, 4, u32::MAX as u128);
        if has_ipv6 {
            self.write_rows(&mut out, &mut pool, &self.ipv6, 16, u128::MAX);
        }
        debug_assert_eq!(out.len(), pool_offset);
        out.extend(pool.bytes);

        let pos = |offset: usize| (offset + 1) as u32;
        let (year, month, day) = self.date;
        out[0] = self.db_type;
        out[1] = self.column_count;
        out[2] = year;
        out[3] = month;
        out[4] = day;
        out[5..9].copy_from_slice(&(self.ipv4.len() as u32).to_le_bytes());
        out[9..13].copy_from_slice(&pos(ipv4_offset).to_le_bytes());
        if has_ipv6 {
            out[13..17].copy_from_slice(&(self.ipv6.len() as u32).to_le_bytes());
            out[17..21].copy_from_slice(&pos(ipv6_offset).to_le_bytes());
        }
        if self.indexed {
            out[21..25].copy_from_slice(&pos(ipv4_index_offset).to_le_bytes());
            if has_ipv6 {
                out[25..29].copy_from_slice(&pos(ipv6_index_offset).to_le_bytes());
            }
        }
        out[29] = self.product_code;
        out[30] = 1;
        let size = out.len() as u32;
        out[31..35].copy_from_slice(&size.to_le_bytes());
        out
    }

    fn write_rows(
        &self,
        out: &mut Vec<u8>,
        pool: &mut StringPool,
        rows: &[(u128, Vec<Column>)],
        address_size: usize,
        end: u128,
    ) {
        let columns = self.column_count as usize - 1;
        let sentinel = (end, Vec::new());

        for (from, values) in rows.iter().chain(std::iter::once(&sentinel)) {
            out.extend_from_slice(&from.to_le_bytes()[..address_size]);
            for i in 0..columns {
                let cell = match values.get(i) {
                    Some(Column::Country(short, long)) => pool.country(short, long),
                    Some(Column::Text(value)) => pool.text(value),
                    Some(Column::Float(value)) => value.to_bits(),
                    None => 0,
                };
                out.extend_from_slice(&cell.to_le_bytes());
            }
        }
    }

    pub fn write_to(&self, path: &Path) -> io::Result<()> {
        std::fs::write(path, self.build())
    }
}

struct StringPool {
    base: usize,
    bytes: Vec<u8>,
}

impl StringPool {
    fn new(base: usize) -> Self {
        Self {
            base,
            bytes: Vec::new(),
        }
    }

    fn push(&mut self, value: &str) -> u32 {
        let pointer = (self.base + self.bytes.len()) as u32;
        self.bytes.push(value.len() as u8);
        self.bytes.extend_from_slice(value.as_bytes());
        pointer
    }

    fn country(&mut self, short: &str, long: &str) -> u32 {
        let pointer = (self.base + self.bytes.len()) as u32;
        let mut slot = [0u8; 3];
        slot[0] = short.len() as u8;
        slot[1..1 + short.len()].copy_from_slice(short.as_bytes());
        self.bytes.extend_from_slice(&slot);
        self.push(long);
        pointer
    }

    fn text(&mut self, value: &str) -> u32 {
        self.push(value)
    }
}

/// `(low, high)` row bounds for every top-16-bit bucket.
fn index_table(rows: &[(u128, Vec<Column>)], shift: u32, end: u128) -> Vec<u8> {
    let mut froms: Vec<u128> = rows.iter().map(|(from, _)| *from).collect();
    froms.push(end);
    let containing = |value: u128| froms.partition_point(|&f| f <= value).saturating_sub(1) as u32;

    let mut out = Vec::with_capacity(INDEX_TABLE_SIZE);
    for bucket in 0..65536u128 {
        let first = bucket << shift;
        let last = first | ((1u128 << shift) - 1);
        out.extend_from_slice(&containing(first).to_le_bytes());
        out.extend_from_slice(&containing(last).to_le_bytes());
    }
    out
}

/// DB1: country only. IPv4 rows only, so an old-format file.
pub fn db1() -> BinBuilder {
    BinBuilder::new(1, 2)
        .ipv4(0, vec![country("-", "-")])
        .ipv4(16_777_216, vec![country("AU", "Australia")]) // 1.0.0.0
        .ipv4(16_777_472, vec![country("CN", "China")]) // 1.0.1.0
        .ipv4(134_744_064, vec![country("US", "United States of America")]) // 8.8.8.0
        .ipv4(134_744_320, vec![country("-", "-")]) // 8.8.9.0
}

/// DB5: country, region, city, latitude, longitude, with an IPv6 table.
pub fn db5() -> BinBuilder {
    let empty = || vec![country("-", "-"), text("-"), text("-"), float(0.0), float(0.0)];
    BinBuilder::new(5, 6)
        .ipv4(0, empty())
        .ipv4(
            134_744_064, // 8.8.8.0
            vec![
                country("US", "United States of America"),
                text("California"),
                text("Mountain View"),
                float(37.40625),
                float(-122.078125),
            ],
        )
        .ipv4(134_744_320, empty()) // 8.8.9.0
        .ipv4(
            3_232_235_520, // 192.168.0.0
            vec![country("-", "-"), text("-"), text("-"), float(0.0), float(0.0)],
        )
        .ipv4(
            3_232_301_056, // 192.169.0.0
            vec![
                country("JP", "Japan"),
                text("Tokyo"),
                text("Tokyo"),
                float(35.6875),
                float(139.6875),
            ],
        )
        .ipv4(3_232_366_592, empty()) // 192.170.0.0
        .ipv6(0, empty())
        .ipv6(
            0x2001_4860_0000_0000_0000_0000_0000_0000,
            vec![
                country("US", "United States of America"),
                text("California"),
                text("Mountain View"),
                float(37.40625),
                float(-122.078125),
            ],
        )
        .ipv6(0x2001_4861_0000_0000_0000_0000_0000_0000, empty())
        .ipv6(
            0x2400_cb00_0000_0000_0000_0000_0000_0000,
            vec![
                country("DE", "Germany"),
                text("Hessen"),
                text("Frankfurt am Main"),
                float(50.109375),
                float(8.6875),
            ],
        )
        .ipv6(0x2400_cb01_0000_0000_0000_0000_0000_0000, empty())
}
