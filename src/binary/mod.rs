//! IP2Location BIN database format.
//!
//! A BIN file is a fixed header, optional index tables, two row tables and a
//! string pool. All integers are little-endian and all positions stored in
//! the file are 1-based, except string pointers which are 0-based.
//!
//! # File Structure
//!
//! ```text
//! +------------------+
//! |     HEADER       |  35 bytes used, padded to 64
//! +------------------+
//! |   IPv4 INDEX     |  65536 x (u32 low_row, u32 high_row), optional
//! +------------------+
//! |   IPv6 INDEX     |  65536 x (u32 low_row, u32 high_row), optional
//! +------------------+
//! |   IPv4 ROWS      |  (count + 1) x column_count x 4 bytes
//! +------------------+
//! |   IPv6 ROWS      |  (count + 1) x (16 + (column_count - 1) x 4) bytes
//! +------------------+
//! |   STRING POOL    |  u8 length + bytes per string
//! +------------------+
//! ```
//!
//! Each row starts with `ip_from`; the range ends where the next row starts.
//! Index buckets are keyed by the top 16 bits of the address.

mod format;
mod layout;
mod reader;
mod source;

#[cfg(test)]
pub(crate) mod fixture;

pub use format::*;
pub use layout::{ColumnLayout, Field, Fields, FIELD_COUNT, MAX_DB_TYPE};
pub use reader::{Database, IndexTable};
pub use source::Storage;
