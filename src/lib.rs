//! ip2l - IP2Location BIN database reader.
//!
//! This crate resolves IPv4 and IPv6 addresses to geolocation records using
//! IP2Location BIN databases, optionally enriched from the IP2Location CSV
//! side tables.
//!
//! # Features
//!
//! - **All database types**: DB1 through DB26, columns decoded per type
//! - **Indexed binary search**: over both IPv4 and IPv6 row tables
//! - **Address normalization**: IPv4-mapped, 6to4 and Teredo addresses
//!   resolve through the IPv4 table
//! - **Two storage modes**: whole file in memory, or reads through an open
//!   file handle
//! - **Hot reload**: watches the files and swaps in a new generation
//!   atomically after a 500 ms debounce
//! - **Side tables**: ISO 3166-2 subdivision codes, GeoName IDs, country
//!   metadata and airports
//!
//! # Quick Start
//!
//! ```no_run
//! use ip2l::{Ip2lReader, ReaderOptions};
//!
//! let reader = Ip2lReader::new();
//! reader.init(
//!     "IP2LOCATION-LITE-DB11.BIN",
//!     &ReaderOptions::new().with_reload_on_db_update(true),
//! )?;
//!
//! let record = reader.get("2001:4860:4860::8888");
//! println!("{} {:?} {:?}", record.status, record.country_long, record.city);
//!
//! reader.close();
//! # Ok::<(), ip2l::Error>(())
//! ```
//!
//! # Query Status
//!
//! `get` never fails. Its record carries one of, checked in this order:
//! 1. `NOT_INITIALIZED` / `INITIALIZING`: no database is ready
//! 2. `DATABASE_NOT_FOUND`: the database file has been removed
//! 3. `INVALID_IP_ADDRESS` / `IPV6_NOT_SUPPORTED`
//! 4. `IP_ADDRESS_NOT_FOUND` or `OK`

mod config;
mod error;
mod ip;
mod record;
mod resolver;
mod status;

pub mod binary;
pub mod reload;
pub mod side;

// Re-export core types
pub use error::{Error, Result};
pub use record::{Airport, CountryInfo, GeoRecord};
pub use status::Status;

// Re-export address normalization
pub use ip::{normalize, AddressValue, IpFamily};

// Re-export the reader and its options
pub use config::ReaderOptions;
pub use resolver::Ip2lReader;

// Re-export lifecycle types
pub use reload::{ReaderState, ReloadCoordinator, ReloadOptions, Staged};

// Re-export side-table readers
pub use side::{CountryInfoReader, CsvReader, GeoNameIdReader, IataIcaoReader, SubdivisionReader};

// Re-export binary types for advanced usage
pub use binary::{ColumnLayout, Database, DatabaseHeader, Field, Fields};
