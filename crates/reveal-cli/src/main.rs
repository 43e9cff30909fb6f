//! Globe Reveal CLI
//!
//! Computes which countries are revealed by visited places and scratches.
//!
//! Usage:
//!   globe-reveal --countries data/countries.geojson \
//!                --places data/places.json \
//!                --store .globe-reveal.json \
//!                --scratch France --output reveal.json --geojson

use anyhow::{Context, Result};
use clap::Parser;
use reveal_core::{
    export::{self, RevealSummary},
    loader, CountryIdExtractor, CoverageMatcher, FileStore, GeoProvider, GeocodeCache, MatcherConfig,
    PersistentScratchSet, RevealSession,
};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "globe-reveal",
    about = "Compute revealed countries from visited places and scratches"
)]
struct Args {
    /// Country boundaries (GeoJSON FeatureCollection)
    #[arg(short = 'c', long)]
    countries: PathBuf,

    /// Visited places JSON file
    #[arg(short = 'p', long)]
    places: Option<PathBuf>,

    /// Pre-built coverage disks JSON file
    #[arg(long)]
    disks: Option<PathBuf>,

    /// Bundled geocode results (JSON object of query -> entry)
    #[arg(long)]
    geocode_seed: Option<PathBuf>,

    /// Durable state file (scratch set, geocode overlay)
    #[arg(short, long, default_value = ".globe-reveal.json")]
    store: PathBuf,

    /// Mark a country as scratched
    #[arg(long)]
    scratch: Vec<String>,

    /// Remove a country from the scratch set
    #[arg(long)]
    unscratch: Vec<String>,

    /// Matcher configuration JSON file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Coverage disk radius in km (overrides config)
    #[arg(long)]
    radius_km: Option<f64>,

    /// Vertices per coverage disk (overrides config)
    #[arg(long)]
    steps: Option<usize>,

    /// Summary JSON output file (stdout when omitted)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also write a GeoJSON of countries next to the output
    #[arg(long)]
    geojson: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose {
        "globe_reveal=debug,reveal_core=debug"
    } else {
        "globe_reveal=info,reveal_core=info"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let config = load_config(&args)?;
    let extractor = config.id_extractor();

    // Durable state
    let mut store = FileStore::open(&args.store)
        .with_context(|| format!("opening store {:?}", args.store))?;

    let mut cache = match &args.geocode_seed {
        Some(path) => GeocodeCache::from_seed_file(path)?,
        None => GeocodeCache::new(),
    };
    cache.load_overlay(&store)?;

    // Inputs
    let countries = loader::load_countries(&args.countries)?;
    warn_unknown_collisions(&countries, &extractor);

    let places = match &args.places {
        Some(path) => loader::load_places(path, &cache)?,
        None => Vec::new(),
    };
    if cache.persist(&mut store)? {
        info!("Saved geocode overlay to {:?}", store.path());
    }

    let mut scratch = PersistentScratchSet::load(store)?;
    for id in &args.scratch {
        scratch.insert(id.as_str())?;
    }
    for id in &args.unscratch {
        scratch.remove(id)?;
    }
    info!("{} countries scratched", scratch.set().len());

    let matcher = CoverageMatcher::new(GeoProvider::new(), config);
    let mut disks = matcher.disks_for_places(&places);
    if let Some(path) = &args.disks {
        disks.extend(loader::load_disks(path)?);
    }

    // Match
    let mut session = RevealSession::new(matcher, extractor);
    session.set_countries(countries);
    session.set_disks(disks);
    session.set_scratch(scratch.set().clone());

    let results = session.reveal_results().to_vec();
    let visited = session.revealed_countries().clone();
    let area = session.covered_area().clone();
    let summary = RevealSummary::new(&results, visited, session.scratch(), &area);

    // Output
    match &args.output {
        Some(path) => {
            info!("Writing summary to {:?}", path);
            let writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(writer, &summary)?;
        }
        None => {
            let mut stdout = io::stdout().lock();
            serde_json::to_writer_pretty(&mut stdout, &summary)?;
            writeln!(stdout)?;
        }
    }

    if args.geojson {
        let geojson_path = args
            .output
            .as_ref()
            .map(|p| p.with_extension("geojson"))
            .unwrap_or_else(|| PathBuf::from("reveal.geojson"));
        info!("Writing GeoJSON to {:?}", geojson_path);
        let geojson = export::to_geojson(session.countries(), &results);
        let writer = BufWriter::new(File::create(&geojson_path)?);
        serde_json::to_writer_pretty(writer, &geojson)?;
    }

    info!("{}", "=".repeat(60));
    info!("SUMMARY");
    info!("{}", "=".repeat(60));
    info!("Countries visited: {}", summary.revealed_countries.count);
    info!(
        "Countries revealed: {} of {}",
        summary.covered_countries.len(),
        summary.total_countries
    );
    info!("Covered area: {:.0} km2", summary.covered_area_km2);

    Ok(())
}

fn load_config(args: &Args) -> Result<MatcherConfig> {
    let mut config = match &args.config {
        Some(path) => MatcherConfig::from_file(path)?,
        None => MatcherConfig::default(),
    };
    if let Some(radius) = args.radius_km {
        config.disk_radius_km = radius;
    }
    if let Some(steps) = args.steps {
        config.disk_steps = steps;
    }
    config.validate()?;
    Ok(config)
}

/// Countries with no id field all share the sentinel and merge into one
fn warn_unknown_collisions(countries: &[reveal_core::Country], extractor: &CountryIdExtractor) {
    let unnamed = countries
        .iter()
        .filter(|c| extractor.try_extract(c).is_none())
        .count();
    if unnamed > 1 {
        warn!(
            "{} countries have no identifier and share {:?}",
            unnamed,
            extractor.unknown()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from([
            "globe-reveal",
            "--countries",
            "c.geojson",
            "--scratch",
            "France",
            "--scratch",
            "Peru",
            "--radius-km",
            "50",
        ])
        .unwrap();
        assert_eq!(args.scratch, vec!["France", "Peru"]);
        assert_eq!(args.radius_km, Some(50.0));
        assert_eq!(args.store, PathBuf::from(".globe-reveal.json"));
    }

    #[test]
    fn test_overrides_applied_and_validated() {
        let args = Args::try_parse_from(["globe-reveal", "-c", "c.geojson", "--steps", "8"]).unwrap();
        assert_eq!(load_config(&args).unwrap().disk_steps, 8);

        let args = Args::try_parse_from(["globe-reveal", "-c", "c.geojson", "--steps", "2"]).unwrap();
        assert!(load_config(&args).is_err());
    }
}
