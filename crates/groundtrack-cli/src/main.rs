//! Ground-track pass planning CLI
//!
//! Propagates a TLE over a horizon, optionally labels each sample with
//! the country overflown and/or picks the closest-approach sample per
//! point of interest, then writes the results out as CSV.
//!
//! Usage:
//!   plan-pass --line1 "1 25544U ..." --line2 "2 25544 ..." \
//!             --horizon-h 1.5 --step-s 5 --output pass.csv

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use groundtrack_core::cancel::CancellationToken;
use groundtrack_core::config::{ObserverSite, RunConfig};
use groundtrack_core::dataset::{PoiDataset, TerritoryDataset};
use groundtrack_core::ephemeris::EphemerisEngine;
use groundtrack_core::export::{self, ExportMetadata};
use groundtrack_core::labeler::{self, TerritorySelector};
use groundtrack_core::poi_selector;
use groundtrack_core::propagator::SatState;

#[derive(Parser, Debug)]
#[command(name = "plan-pass", about = "Plan satellite passes over a ground track")]
struct Args {
    /// TLE line 1
    #[arg(long)]
    line1: String,

    /// TLE line 2
    #[arg(long)]
    line2: String,

    /// Sample step in seconds
    #[arg(long, default_value_t = 1.0)]
    step_s: f64,

    /// Horizon in hours
    #[arg(long, default_value_t = 1.0)]
    horizon_h: f64,

    /// Country/territory tile dataset CSV (optional)
    #[arg(long)]
    territory_dataset: Option<PathBuf>,

    /// Restrict territory labeling to one country; omit for all land
    #[arg(long)]
    country: Option<String>,

    /// Point-of-interest tile dataset CSV (optional)
    #[arg(long)]
    poi_dataset: Option<PathBuf>,

    /// Restrict POI selection to one POI by name; omit for all POIs
    #[arg(long)]
    poi_name: Option<String>,

    /// Observer site name, recorded alongside the run (not used by the
    /// propagation math)
    #[arg(long, default_value = "origin")]
    observer_name: String,

    /// Observer latitude in degrees
    #[arg(long, default_value_t = 0.0)]
    observer_lat: f64,

    /// Observer longitude in degrees
    #[arg(long, default_value_t = 0.0)]
    observer_lon: f64,

    /// Observer altitude in meters
    #[arg(long, default_value_t = 0.0)]
    observer_alt_m: f64,

    /// Ground-track output CSV path
    #[arg(long, default_value = "ground_track.csv")]
    output: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value = "csv")]
    format: OutputFormat,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Debug, clap::ValueEnum)]
enum OutputFormat {
    Csv,
    Txt,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install tracing subscriber")?;

    info!("{}", "=".repeat(60));
    info!("SX9-Orbital Ground Track Planner");
    info!("{}", "=".repeat(60));

    let mut config = RunConfig::new(args.line1.clone(), args.line2.clone());
    config.step_s = args.step_s;
    config.horizon_s = args.horizon_h * 3600.0;
    config.territory_dataset_path = args.territory_dataset.clone();
    config.territory_selector = match &args.country {
        Some(name) => TerritorySelector::Country(name.clone()),
        None => TerritorySelector::All,
    };
    config.poi_dataset_path = args.poi_dataset.clone();
    config.observer = ObserverSite {
        name: args.observer_name.clone(),
        lat: args.observer_lat,
        lon: args.observer_lon,
        altitude_m: args.observer_alt_m,
    };

    let state = SatState::from_tle(&config.tle_line1, &config.tle_line2)
        .context("failed to parse TLE")?;
    info!("parsed TLE for NORAD id {}", state.norad_id());

    let cancel = CancellationToken::new();
    let now = chrono::Utc::now();
    let jd_now = 2_440_587.5 + now.timestamp() as f64 / 86_400.0;

    info!(
        "propagating {} samples at {}s step over {}h horizon",
        (config.horizon_s / config.step_s).floor() as u64 + 1,
        config.step_s,
        args.horizon_h
    );
    let buffer = EphemerisEngine::run(
        &state,
        jd_now,
        config.horizon_s,
        config.step_s,
        &config.observer,
        &cancel,
    )
    .context("ephemeris generation failed")?;
    info!("generated {} samples", buffer.len());

    let metadata = ExportMetadata {
        tle: Some(state.norad_id().to_string()),
        step_s: Some(config.step_s),
        horizon_h: Some(args.horizon_h),
    };

    let countries = if let Some(path) = &config.territory_dataset_path {
        info!("loading territory dataset from {path:?}");
        let dataset = TerritoryDataset::load(path).context("failed to load territory dataset")?;
        let rows = labeler::label(&buffer, &dataset, &config.territory_selector, &cancel)
            .context("territory labeling failed")?;
        info!("labeled {} of {} samples", rows.len(), buffer.len());

        let territory_path = args.output.with_file_name(format!(
            "{}_territory.csv",
            args.output.file_stem().and_then(|s| s.to_str()).unwrap_or("ground_track")
        ));
        export::export_territory_csv(&territory_path, &rows, &metadata)
            .context("failed to write territory export")?;
        info!("wrote territory export to {territory_path:?}");

        Some(
            buffer
                .samples
                .iter()
                .map(|s| {
                    rows.iter()
                        .find(|r| r.time_str == s.time_str)
                        .map(|r| r.country_label.clone())
                        .unwrap_or_default()
                })
                .collect::<Vec<_>>(),
        )
    } else {
        None
    };

    if let Some(path) = &config.poi_dataset_path {
        info!("loading POI dataset from {path:?}");
        let dataset = PoiDataset::load(path).context("failed to load POI dataset")?;
        let picks = poi_selector::select(&buffer, &dataset.tiles, args.poi_name.as_deref(), &cancel)
            .context("POI selection failed")?;
        info!("selected {} of {} POI tiles", picks.len(), dataset.tiles.len());

        let poi_path = args.output.with_file_name(format!(
            "{}_poi.csv",
            args.output.file_stem().and_then(|s| s.to_str()).unwrap_or("ground_track")
        ));
        export::export_poi_csv(&poi_path, &picks, &metadata).context("failed to write POI export")?;
        info!("wrote POI export to {poi_path:?}");
    }

    match args.format {
        OutputFormat::Csv => {
            export::export_ephemeris_csv(&args.output, &buffer.samples, countries.as_deref(), &metadata)
                .context("failed to write ground-track export")?;
        }
        OutputFormat::Txt => {
            let txt_path = args.output.with_extension("txt");
            export::export_ephemeris_txt(&txt_path, &buffer.samples, countries.as_deref())
                .context("failed to write ground-track export")?;
            fs::metadata(&txt_path).context("ground-track export missing after write")?;
        }
    }

    info!("\n{}", "=".repeat(60));
    info!("wrote {} samples to {:?}", buffer.len(), args.output);
    info!("{}", "=".repeat(60));

    Ok(())
}
