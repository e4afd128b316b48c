//! Composite reader: BIN lookup plus side-table enrichment.

use std::path::Path;

use crate::binary::{Database, DatabaseHeader};
use crate::ip::{normalize, IpFamily};
use crate::reload::{ReaderState, ReloadCoordinator, ReloadOptions, Staged};
use crate::side::{
    CountryInfoReader, CsvReader, CsvTable, GeoNameIdReader, IataIcaoReader, SubdivisionReader,
};
use crate::{GeoRecord, ReaderOptions, Result, Status};

/// IP2Location reader.
///
/// Owns the primary BIN database and the optional side tables, each with
/// its own lifecycle. `get` never fails: anything that prevents a lookup is
/// reported through the record's [`Status`].
///
/// # Example
///
/// ```no_run
/// use ip2l::{Ip2lReader, ReaderOptions, Status};
///
/// let reader = Ip2lReader::new();
/// let options = ReaderOptions::new()
///     .with_cache_database_in_memory(true)
///     .with_subdivision_csv("IP2LOCATION-ISO3166-2.CSV");
/// reader.init("IP2LOCATION-LITE-DB3.BIN", &options)?;
///
/// let record = reader.get("8.8.8.8");
/// if record.status == Status::Ok {
///     println!("{:?} {:?}", record.country_short, record.subdivision);
/// }
/// # Ok::<(), ip2l::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct Ip2lReader {
    db: ReloadCoordinator<Database>,
    subdivisions: SubdivisionReader,
    geoname_ids: GeoNameIdReader,
    country_info: CountryInfoReader,
    airports: IataIcaoReader,
}

impl Ip2lReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the BIN database and every side table named in `options`.
    ///
    /// Nothing is published until every file has loaded, so on error the
    /// reader keeps serving exactly what it served before the call. On
    /// success, side tables not named in `options` are closed.
    pub fn init(&self, path: impl AsRef<Path>, options: &ReaderOptions) -> Result<()> {
        let cache = options.cache_database_in_memory;
        let reload = ReloadOptions {
            watch: options.reload_on_db_update,
            // a buffered generation keeps serving while the file is replaced
            hold_during_reload: !cache,
        };
        let db = self.db.stage(path, reload, move |path| Database::open(path, cache))?;

        let watch = options.reload_on_db_update;
        let subdivisions =
            stage_side(&self.subdivisions, options.subdivision_csv_path.as_deref(), watch)?;
        let geoname_ids =
            stage_side(&self.geoname_ids, options.geoname_id_csv_path.as_deref(), watch)?;
        let country_info =
            stage_side(&self.country_info, options.country_info_csv_path.as_deref(), watch)?;
        let airports = stage_side(&self.airports, options.iata_icao_csv_path.as_deref(), watch)?;

        db.commit();
        commit_side(&self.subdivisions, subdivisions);
        commit_side(&self.geoname_ids, geoname_ids);
        commit_side(&self.country_info, country_info);
        commit_side(&self.airports, airports);
        Ok(())
    }

    /// Look up an IP address.
    pub fn get(&self, ip: &str) -> GeoRecord {
        match self.db.state() {
            ReaderState::NotInitialized => return GeoRecord::with_status(ip, Status::NotInitialized),
            ReaderState::Initializing => return GeoRecord::with_status(ip, Status::Initializing),
            ReaderState::Ready => {}
        }

        let Some(db) = self.db.current() else {
            return GeoRecord::with_status(ip, Status::NotInitialized);
        };

        if self.db.path().is_some_and(|path| !path.exists()) {
            return GeoRecord::with_status(ip, Status::DatabaseNotFound);
        }

        if db.header().db_type == 0 {
            return GeoRecord::with_status(ip, Status::NotInitialized);
        }

        let addr = normalize(ip);
        if !addr.is_valid() {
            return GeoRecord::with_status(ip, Status::InvalidIpAddress);
        }
        if addr.family == IpFamily::V6 && !db.supports_ipv6() {
            return GeoRecord::with_status(ip, Status::Ipv6NotSupported);
        }

        let mut record = db.query(&addr);
        if record.status.is_ok() {
            self.enrich(&mut record);
        }
        record
    }

    /// Join side-table values onto a found record.
    fn enrich(&self, record: &mut GeoRecord) {
        let Some(country) = GeoRecord::non_empty(&record.country_short).map(str::to_string) else {
            return;
        };
        let region = GeoRecord::non_empty(&record.region).map(str::to_string);
        let city = GeoRecord::non_empty(&record.city).map(str::to_string);

        if let Some(region) = region.as_deref() {
            record.subdivision = self.subdivisions.get(&country, region);
            record.airports = self.airports.get(&country, region);
            if let Some(city) = city.as_deref() {
                record.geoname_id = self.geoname_ids.get(&country, region, city);
            }
        }
        record.country_info = self.country_info.get(&country);
    }

    /// Stop watching and unload the database and every side table.
    pub fn close(&self) {
        self.db.close();
        self.subdivisions.close();
        self.geoname_ids.close();
        self.country_info.close();
        self.airports.close();
    }

    /// State of the primary database.
    pub fn state(&self) -> ReaderState {
        self.db.state()
    }

    /// Successful loads of the primary database since the last `close`.
    pub fn generation(&self) -> u64 {
        self.db.generation()
    }

    /// Header of the loaded database.
    pub fn database_info(&self) -> Option<DatabaseHeader> {
        self.db.current().map(|db| *db.header())
    }

    pub fn subdivisions(&self) -> &SubdivisionReader {
        &self.subdivisions
    }

    pub fn geoname_ids(&self) -> &GeoNameIdReader {
        &self.geoname_ids
    }

    pub fn country_info(&self) -> &CountryInfoReader {
        &self.country_info
    }

    pub fn airports(&self) -> &IataIcaoReader {
        &self.airports
    }
}

fn stage_side<'a, T: CsvTable>(
    reader: &'a CsvReader<T>,
    path: Option<&Path>,
    watch: bool,
) -> Result<Option<Staged<'a, T>>> {
    path.map(|path| reader.stage(path, watch)).transpose()
}

fn commit_side<T: CsvTable>(reader: &CsvReader<T>, staged: Option<Staged<'_, T>>) {
    match staged {
        Some(staged) => staged.commit(),
        None => reader.close(),
    }
}
