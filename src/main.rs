//! CrashLens - NYC Vehicle Collision CSV Analysis Pipeline
//!
//! Text-report front end for the collision pipeline: loads a CSV, applies
//! the requested filters, and prints the aggregates a dashboard would
//! render as maps and bar charts.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use chrono::NaiveDate;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crashlens::{
    stats::{clock_label, Aggregator},
    CollisionTable, DataLoader, FilterEngine, FilterParams, InjuryCategory, LoadOptions,
    TableCache,
};

#[derive(Parser, Debug)]
#[command(name = "crashlens", about = "Analyze a vehicle-collision CSV", version)]
struct Cli {
    /// Path to the collision CSV file.
    data: PathBuf,

    /// JSON file with filter parameters; individual flags override it.
    #[arg(long)]
    params: Option<PathBuf>,

    /// Start of the date range (YYYY-MM-DD), inclusive.
    #[arg(long)]
    from: Option<NaiveDate>,

    /// End of the date range (YYYY-MM-DD), inclusive.
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Restrict the breakdown to a single hour of day (0-23).
    #[arg(long)]
    hour: Option<u32>,

    /// Keep only records with at least this many injured persons.
    #[arg(long)]
    min_injuries: Option<u32>,

    /// Injury category for the street ranking (pedestrians/cyclists/motorists).
    #[arg(long)]
    category: Option<InjuryCategory>,

    /// Number of streets in the ranking.
    #[arg(long)]
    top_n: Option<usize>,

    /// Read at most this many rows from the file.
    #[arg(long)]
    limit: Option<u32>,

    /// Print the filtered records as JSON lines.
    #[arg(long)]
    raw: bool,
}

impl Cli {
    /// Params file first, then flag overrides.
    fn filter_params(&self) -> anyhow::Result<FilterParams> {
        let mut params = match &self.params {
            Some(path) => {
                let text = fs::read_to_string(path)
                    .with_context(|| format!("reading params file {}", path.display()))?;
                serde_json::from_str(&text)
                    .with_context(|| format!("parsing params file {}", path.display()))?
            }
            None => FilterParams::default(),
        };

        if self.from.is_some() {
            params.date_start = self.from;
        }
        if self.to.is_some() {
            params.date_end = self.to;
        }
        if self.hour.is_some() {
            params.hour = self.hour;
        }
        if let Some(min_injuries) = self.min_injuries {
            params.min_injuries = min_injuries;
        }
        if self.category.is_some() {
            params.injury_category = self.category;
        }
        if let Some(top_n) = self.top_n {
            params.top_n = top_n;
        }
        Ok(params)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let params = cli.filter_params()?;
    params.validate()?;

    let options = LoadOptions {
        row_limit: cli.limit,
        date_range: params.date_start.zip(params.date_end),
    };
    let loader = DataLoader::with_options(options);
    let mut cache = TableCache::new();
    let table = cache.load(&loader, &cli.data)?;

    println!("Vehicle collisions loaded: {} records", table.height());
    println!(
        "Max injured persons at a single location: {}",
        Aggregator::max_injuries_by_location(&table)?
    );

    println!("\nCrashes by hour of day:");
    let by_hour = Aggregator::hour_histogram(&table)?;
    for (hour, crashes) in by_hour.iter().enumerate() {
        println!("  {:>8}  {crashes}", clock_label(hour as u32));
    }

    let mut filtered = FilterEngine::by_min_injuries(&table, params.min_injuries)?;
    if params.min_injuries > 0 {
        println!(
            "\nRecords with at least {} injured: {}",
            params.min_injuries,
            filtered.height()
        );
    }

    if let Some(hour) = params.hour {
        filtered = FilterEngine::by_hour(&filtered, hour)?;
        println!(
            "\nCollisions between {} and {}: {}",
            clock_label(hour),
            clock_label(hour + 1),
            filtered.height()
        );

        if let Some((lat, lon)) = Aggregator::geographic_midpoint(&filtered)? {
            println!("Map midpoint: ({lat:.5}, {lon:.5})");
        }

        let window = FilterEngine::by_hour_window(&table, hour, hour + 1)?;
        let by_minute = Aggregator::minute_histogram(&window)?;
        println!("Breakdown by minute:");
        for (minute, crashes) in by_minute.iter().enumerate().filter(|(_, c)| **c > 0) {
            println!("  :{minute:02}  {crashes}");
        }
    }

    if let Some(category) = params.injury_category {
        println!("\nTop {} dangerous streets ({category}):", params.top_n);
        let ranking = Aggregator::top_streets_by_category(&table, category, params.top_n)?;
        if ranking.is_empty() {
            println!("  (no qualifying records)");
        }
        for entry in ranking {
            println!("  {:>4}  {}", entry.injured, entry.street);
        }
    }

    if cli.raw {
        print_raw(&filtered)?;
    }

    Ok(())
}

fn print_raw(table: &CollisionTable) -> anyhow::Result<()> {
    println!("\nRaw data:");
    for record in table.records()? {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}
