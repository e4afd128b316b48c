//! CSV side tables joined onto BIN lookup results.
//!
//! Each table is an in-memory map built from one CSV file and published
//! through its own [`ReloadCoordinator`], so it has its own lifecycle and
//! can reload independently of the primary database. Tables stay `Ready`
//! while a reload is pending: the previous map keeps serving until the new
//! one is swapped in.

mod airport;
mod country_info;
mod geoname;
mod subdivision;

pub use airport::{IataIcaoReader, IataIcaoTable};
pub use country_info::{CountryInfoReader, CountryInfoTable};
pub use geoname::{GeoNameIdReader, GeoNameIdTable};
pub use subdivision::{SubdivisionReader, SubdivisionTable};

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::reload::{ReaderState, ReloadCoordinator, ReloadOptions, Staged};
use crate::{Error, Result};

/// A table that can be built from a CSV file.
pub trait CsvTable: Sized + Send + Sync + 'static {
    /// Column names that must appear in the header row.
    const REQUIRED_HEADERS: &'static [&'static str];

    /// Build the table from the data rows.
    fn from_csv(reader: &mut csv::Reader<File>) -> Result<Self>;
}

/// Open a CSV file, check its header row and build the table.
pub fn load_table<T: CsvTable>(path: &Path) -> Result<T> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Headers).from_path(path)?;

    let headers = reader.headers()?;
    let missing: Vec<String> = T::REQUIRED_HEADERS
        .iter()
        .filter(|name| !headers.iter().any(|h| h == **name))
        .map(|name| name.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::MissingCsvHeaders {
            path: path.to_path_buf(),
            missing,
        });
    }

    T::from_csv(&mut reader)
}

/// Reader for one side table.
///
/// Lookups return `None` unless the reader is `Ready`.
pub struct CsvReader<T> {
    inner: ReloadCoordinator<T>,
}

impl<T: CsvTable> CsvReader<T> {
    pub fn new() -> Self {
        Self {
            inner: ReloadCoordinator::new(),
        }
    }

    /// Load the CSV file, optionally watching it for changes.
    pub fn init(&self, path: impl AsRef<Path>, reload_on_update: bool) -> Result<()> {
        self.stage(path, reload_on_update)?.commit();
        Ok(())
    }

    /// Load the CSV file without publishing it. See [`ReloadCoordinator::stage`].
    pub fn stage(&self, path: impl AsRef<Path>, reload_on_update: bool) -> Result<Staged<'_, T>> {
        let options = ReloadOptions {
            watch: reload_on_update,
            hold_during_reload: false,
        };
        self.inner.stage(path, options, load_table::<T>)
    }

    pub fn close(&self) {
        self.inner.close();
    }
}

impl<T> CsvReader<T> {
    pub fn state(&self) -> ReaderState {
        self.inner.state()
    }

    pub fn generation(&self) -> u64 {
        self.inner.generation()
    }

    pub fn path(&self) -> Option<PathBuf> {
        self.inner.path()
    }

    /// The loaded table, if the reader is ready.
    pub fn table(&self) -> Option<Arc<T>> {
        if self.inner.state() != ReaderState::Ready {
            return None;
        }
        self.inner.current()
    }
}

impl<T: CsvTable> Default for CsvReader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for CsvReader<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("CsvReader").field(&self.inner).finish()
    }
}

/// Serde helpers for CSV cells. A lone `-` means "unknown".
pub(crate) mod de {
    use serde::{Deserialize, Deserializer};
    use std::str::FromStr;

    /// Text cell; `-` reads as empty.
    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        let value = String::deserialize(d)?;
        Ok(if value == "-" { String::new() } else { value })
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        text(d).map(Some)
    }

    /// Numeric cell; `-`, empty and unparseable cells read as `None`.
    pub fn number<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
    where
        D: Deserializer<'de>,
        T: FromStr,
    {
        let value = String::deserialize(d)?;
        Ok(value.trim().parse().ok())
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::{Path, PathBuf};

    pub fn write_csv(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }
}
