//! # OTPS2 Prediction Command Line
//!
//! Small front end over the OTPS2 bindings:
//!
//! - `otps2-predict locate`: show which shared library would be loaded
//! - `otps2-predict times --start 2020-01-01T00:00:00`: print the native time
//!   buffer (days since 1858-11-17) without touching the library
//! - `otps2-predict predict --constituents m2.json --latitude 45 --start ...`:
//!   predict one location and print `timestamp,height` lines or an ASCII chart
//!
//! Constituent files are JSON arrays, in constituent order:
//!
//! ```json
//! [
//!   { "name": "M2", "re": 1.02, "im": -0.35 },
//!   { "name": "S2", "amplitude": 0.31, "phase": 127.0 }
//! ]
//! ```
//!
//! Exit status: 1 when no library is found, 2 when it cannot be loaded, 3 for
//! any other error.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use chrono::{NaiveDate, NaiveDateTime};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use otps2_lib::config::Config;
use otps2_lib::native::{EXIT_LIBRARY_LOAD, EXIT_LIBRARY_NOT_FOUND};
use otps2_lib::renderer::draw_ascii;
use otps2_lib::resolver::LibraryResolver;
use otps2_lib::{predict_tide_with, Coefficient, ConstituentSet, Otps2Error, Otps2Library, TimeGrid};

/// Exit status for errors other than library resolution and loading
const EXIT_OTHER: u8 = 3;

/// Harmonic tide prediction through the OTPS2 shared library
#[derive(Parser)]
#[command(name = "otps2-predict")]
#[command(version)]
#[command(about = "Harmonic tide prediction through the OTPS2 shared library")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to ./otps2.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the path of the OTPS2 library that would be loaded
    Locate,
    /// Print the time buffer handed to the library
    Times(GridArgs),
    /// Predict a tide height series at one location
    Predict(PredictArgs),
}

#[derive(Args)]
struct GridArgs {
    /// First sample, e.g. 2020-01-01T00:00:00 or 2020-01-01
    #[arg(long, value_parser = parse_timestamp)]
    start: NaiveDateTime,

    /// Number of samples [default: from config]
    #[arg(long)]
    ntime: Option<usize>,

    /// Seconds between samples [default: from config]
    #[arg(long)]
    delta: Option<f64>,
}

#[derive(Args)]
struct PredictArgs {
    /// JSON file listing constituents in order
    #[arg(long)]
    constituents: PathBuf,

    /// Latitude in degrees north
    #[arg(long, allow_hyphen_values = true)]
    latitude: f64,

    #[command(flatten)]
    grid: GridArgs,

    /// Draw an ASCII chart instead of printing CSV
    #[arg(long)]
    ascii: bool,
}

/// One entry of a constituent file
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ConstituentEntry {
    Complex { name: String, re: f64, im: f64 },
    Polar {
        name: String,
        amplitude: f64,
        phase: f64,
    },
}

fn parse_timestamp(s: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    for format in FORMATS {
        if let Ok(ts) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .ok_or_else(|| format!("unrecognised timestamp {s:?}, expected YYYY-MM-DDTHH:MM:SS"))
}

/// Read a constituent file, keeping the order of its entries.
fn load_constituents(path: &Path) -> anyhow::Result<ConstituentSet<Coefficient>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading constituents from {}", path.display()))?;
    let entries: Vec<ConstituentEntry> = serde_json::from_str(&contents)
        .with_context(|| format!("parsing constituents in {}", path.display()))?;

    let pairs = entries.into_iter().map(|entry| match entry {
        ConstituentEntry::Complex { name, re, im } => (name, Coefficient::new(re, im)),
        ConstituentEntry::Polar {
            name,
            amplitude,
            phase,
        } => (name, Coefficient::from_amplitude_phase(amplitude, phase)),
    });
    Ok(ConstituentSet::try_from_named(pairs)?)
}

fn time_grid(args: &GridArgs, config: &Config) -> anyhow::Result<TimeGrid> {
    let ntime = args.ntime.unwrap_or(config.prediction.ntime);
    let delta = args.delta.unwrap_or(config.prediction.delta_time);
    Ok(TimeGrid::new(args.start, ntime, delta)?)
}

/// Timestamp of sample `i` as printed in CSV output.
fn sample_label(grid: &TimeGrid, i: usize) -> anyhow::Result<String> {
    let ts = grid
        .timestamp(i)
        .with_context(|| format!("sample {i} is outside the time grid"))?;
    Ok(ts.format("%Y-%m-%dT%H:%M:%S").to_string())
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => Config::try_load_from_path(path)?,
        None => Config::load(),
    };
    let resolver = LibraryResolver::from_config(&config.library);
    debug!(?resolver, "library search order");

    match cli.command {
        Commands::Locate => {
            let path = resolver.resolve()?;
            println!("{}", path.display());
        }
        Commands::Times(args) => {
            let grid = time_grid(&args, &config)?;
            for (i, days) in grid.days()?.into_iter().enumerate() {
                println!("{},{},{:.8}", i, sample_label(&grid, i)?, days);
            }
        }
        Commands::Predict(args) => {
            let components = load_constituents(&args.constituents)?;
            let grid = time_grid(&args.grid, &config)?;
            let library = Otps2Library::locate_and_load(&resolver)?;

            let heights = predict_tide_with(
                &library,
                &components,
                args.latitude,
                grid.start_time(),
                grid.ntime(),
                grid.delta_time(),
            )?;

            if args.ascii {
                draw_ascii(&grid, heights.as_slice().unwrap_or_default());
            } else {
                for (i, height) in heights.iter().enumerate() {
                    println!("{},{:.4}", sample_label(&grid, i)?, height);
                }
            }
        }
    }
    Ok(())
}

/// Map a failure to the process exit status.
fn exit_code_for(error: &anyhow::Error) -> u8 {
    match error.downcast_ref::<Otps2Error>() {
        Some(Otps2Error::LibraryNotFound { .. }) => EXIT_LIBRARY_NOT_FOUND as u8,
        Some(Otps2Error::LibraryLoad { .. } | Otps2Error::MissingSymbol { .. }) => {
            EXIT_LIBRARY_LOAD as u8
        }
        _ => EXIT_OTHER,
    }
}

/// Main application entry point.
fn main() -> ExitCode {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error:#}");
            ExitCode::from(exit_code_for(&error))
        }
    }
}
