//! ip2l-lookup: CLI tool for looking up IP addresses in an IP2Location BIN database.

use clap::Parser;
use ip2l::{GeoRecord, Ip2lReader, ReaderOptions};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "ip2l-lookup")]
#[command(author = "Kaitu.io")]
#[command(version = "0.1.0")]
#[command(about = "Look up IP addresses in an IP2Location BIN database", long_about = None)]
struct Cli {
    /// IP2Location BIN database
    #[arg(short, long)]
    db: PathBuf,

    /// JSON options file; flags below are applied on top of it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read the whole database into memory
    #[arg(long)]
    cache: bool,

    /// Keep running and reload files when they change (stdin mode)
    #[arg(short, long)]
    watch: bool,

    /// ISO 3166-2 subdivision CSV
    #[arg(long)]
    subdivision_csv: Option<PathBuf>,

    /// GeoName ID CSV
    #[arg(long)]
    geoname_id_csv: Option<PathBuf>,

    /// Country information CSV
    #[arg(long)]
    country_info_csv: Option<PathBuf>,

    /// IATA/ICAO airport CSV
    #[arg(long)]
    iata_icao_csv: Option<PathBuf>,

    /// Addresses to look up; one per line from stdin when omitted
    ips: Vec<String>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let options = options_from(cli)?;

    let reader = Ip2lReader::new();
    reader.init(&cli.db, &options)?;
    if let Some(info) = reader.database_info() {
        log::debug!(
            "DB{} 20{:02}-{:02}-{:02}",
            info.db_type,
            info.year,
            info.month,
            info.day
        );
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.ips.is_empty() {
        for line in io::stdin().lock().lines() {
            let line = line?;
            let ip = line.trim();
            if ip.is_empty() {
                continue;
            }
            print_record(&mut out, &reader.get(ip))?;
            out.flush()?;
        }
    } else {
        for ip in &cli.ips {
            print_record(&mut out, &reader.get(ip))?;
        }
    }

    reader.close();
    Ok(())
}

fn options_from(cli: &Cli) -> Result<ReaderOptions, Box<dyn std::error::Error>> {
    let mut options = match &cli.config {
        Some(path) => ReaderOptions::from_json_file(path)?,
        None => ReaderOptions::default(),
    };

    if cli.cache {
        options.cache_database_in_memory = true;
    }
    if cli.watch {
        options.reload_on_db_update = true;
    }
    if let Some(path) = &cli.subdivision_csv {
        options = options.with_subdivision_csv(path);
    }
    if let Some(path) = &cli.geoname_id_csv {
        options = options.with_geoname_id_csv(path);
    }
    if let Some(path) = &cli.country_info_csv {
        options = options.with_country_info_csv(path);
    }
    if let Some(path) = &cli.iata_icao_csv {
        options = options.with_iata_icao_csv(path);
    }
    Ok(options)
}

fn print_record(out: &mut impl Write, record: &GeoRecord) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer(&mut *out, record)?;
    writeln!(out)?;
    Ok(())
}
