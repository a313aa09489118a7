//! Surface renderer: interpolates one observed feature over a boundary and
//! writes the masked result as a PNG (and optionally as JSON). Scatter mode
//! draws the stations themselves instead.

mod render;

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use image::RgbaImage;
use serde::Deserialize;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use isotherm_core::aggregate::{aggregate, standard_rules, Aggregation, RawRecord};
use isotherm_core::mask::{rasterize_boundary, rasterize_outline};
use isotherm_core::{Boundary, InterpolationConfig, Method, ObservationSet, SurfaceEngine};

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Mode {
    /// Interpolated, gap-filled surface clipped to the boundary.
    #[default]
    Surface,
    /// Region in grey with one marker per station.
    Scatter,
}

#[derive(Parser, Debug)]
#[command(name = "surface", about = "Interpolate a climate feature over a region boundary")]
#[command(group(ArgGroup::new("input").required(true).args(["observations", "records"])))]
struct Args {
    /// Observations JSON: {"coords": [[lon, lat], ..], "feature_values": {name: [..]}}.
    #[arg(long)]
    observations: Option<PathBuf>,

    /// Raw per-record JSON: [{"lon": .., "lat": .., "values": {name: ..}}, ..].
    /// Records sharing a location are aggregated first.
    #[arg(long)]
    records: Option<PathBuf>,

    /// Per-feature reduction for --records, as name=mean or name=sum.
    /// Repeatable; overrides the daily-export defaults.
    #[arg(long = "aggregate", value_name = "NAME=RULE")]
    aggregate: Vec<String>,

    /// Boundary JSON: {"polygons": [[[[lon, lat], ..], ..holes], ..]}.
    #[arg(long)]
    boundary: PathBuf,

    /// Feature column to interpolate.
    #[arg(short, long)]
    feature: String,

    #[arg(long, value_enum, default_value_t = Mode::Surface)]
    mode: Mode,

    /// Draw the boundary rings in black on top.
    #[arg(long)]
    outline: bool,

    /// nearest, linear or cubic. Overrides the config file.
    #[arg(short, long)]
    method: Option<String>,

    /// Grid nodes per axis. Overrides the config file.
    #[arg(short, long)]
    resolution: Option<usize>,

    /// InterpolationConfig JSON; missing fields take defaults.
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(short, long, default_value = "surface.png")]
    output: PathBuf,

    /// Also write the full result (grids, raster, mask, report) as JSON.
    /// Surface mode only.
    #[arg(long)]
    raster_json: Option<PathBuf>,
}

#[derive(Deserialize)]
struct BoundaryFile {
    polygons: Vec<Vec<Vec<[f64; 2]>>>,
}

// ── Inputs ───────────────────────────────────────────────────────────────────

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("cannot parse {}", path.display()))
}

fn load_config(args: &Args) -> Result<InterpolationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("cannot read {}", path.display()))?;
            InterpolationConfig::from_json(&text).with_context(|| format!("bad config {}", path.display()))?
        }
        None => InterpolationConfig::default(),
    };
    if let Some(name) = &args.method {
        config = config.with_method(name.parse::<Method>()?);
    }
    if let Some(resolution) = args.resolution {
        config = config.with_resolution(resolution);
    }
    Ok(config)
}

/// Default rules with `overrides` applied, restricted to features that at
/// least one record carries.
fn aggregation_rules(overrides: &[String], records: &[RawRecord]) -> Result<BTreeMap<String, Aggregation>> {
    let mut rules = standard_rules();
    for rule in overrides {
        let (name, how) = rule
            .split_once('=')
            .with_context(|| format!("bad --aggregate `{rule}` (expected NAME=mean or NAME=sum)"))?;
        rules.insert(name.trim().to_string(), how.parse()?);
    }
    rules.retain(|name, _| records.iter().any(|r| r.values.contains_key(name)));
    Ok(rules)
}

fn load_observations(args: &Args) -> Result<ObservationSet> {
    if let Some(path) = &args.records {
        let records: Vec<RawRecord> = read_json(path)?;
        let rules = aggregation_rules(&args.aggregate, &records)?;
        let set = aggregate(&records, &rules)
            .with_context(|| format!("cannot aggregate records in {}", path.display()))?;
        info!(records = records.len(), stations = set.len(), features = rules.len(), "aggregated records");
        return Ok(set);
    }
    let Some(path) = &args.observations else {
        bail!("one of --observations or --records is required");
    };
    let set: ObservationSet = read_json(path)?;
    set.validate()
        .with_context(|| format!("invalid observations in {}", path.display()))?;
    Ok(set)
}

// ── Modes ────────────────────────────────────────────────────────────────────

fn surface_image(
    args: &Args,
    config: InterpolationConfig,
    observations: &ObservationSet,
    boundary: &Boundary,
) -> Result<RgbaImage> {
    let result = SurfaceEngine::new(config)
        .generate(observations, boundary, &args.feature)
        .with_context(|| format!("surface generation failed for `{}`", args.feature))?;

    let report = &result.report;
    info!(primary_gaps = report.primary_gaps, "primary interpolation done");
    for stage in &report.stages {
        if stage.targets > 0 {
            warn!(stage = %stage.stage, targets = stage.targets, filled = stage.filled, "fallback stage fired");
        }
    }

    let (lon_min, lon_max, lat_min, lat_max) = result.extent();
    if let Some((lo, hi)) = result.raster.value_range() {
        info!(lon_min, lon_max, lat_min, lat_max, min = lo, max = hi, "surface ready");
    }

    if let Some(path) = &args.raster_json {
        let json = serde_json::to_string(&result)?;
        fs::write(path, json).with_context(|| format!("cannot write {}", path.display()))?;
        info!(path = %path.display(), "wrote raster json");
    }
    Ok(render::surface(&result.raster))
}

fn scatter_image(
    args: &Args,
    config: &InterpolationConfig,
    observations: &ObservationSet,
    boundary: &Boundary,
) -> Result<RgbaImage> {
    config.validate()?;
    let bounds = boundary.bounds()?;
    bounds.validate()?;
    boundary.validate()?;
    let samples = observations.samples(&args.feature)?;
    if samples.values.is_empty() {
        warn!(feature = %args.feature, "no usable values; drawing the region only");
    }
    if args.raster_json.is_some() {
        warn!("--raster-json is ignored in scatter mode");
    }

    let inside = rasterize_boundary(boundary, bounds, (config.resolution, config.resolution));
    info!(stations = samples.values.len(), "scatter ready");
    Ok(render::scatter(&inside, bounds, &samples.points, &samples.values))
}

// ── Entry point ──────────────────────────────────────────────────────────────

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    let observations = load_observations(&args)?;
    let boundary_file: BoundaryFile = read_json(&args.boundary)?;
    let boundary = Boundary::from_rings(&boundary_file.polygons)?;

    info!(
        stations = observations.len(),
        polygons = boundary_file.polygons.len(),
        feature = %args.feature,
        mode = ?args.mode,
        method = %config.method,
        resolution = config.resolution,
        "generating image"
    );

    let mut img = match args.mode {
        Mode::Surface => surface_image(&args, config, &observations, &boundary)?,
        Mode::Scatter => scatter_image(&args, &config, &observations, &boundary)?,
    };

    if args.outline {
        let shape = (img.height() as usize, img.width() as usize);
        render::burn_outline(&mut img, &rasterize_outline(&boundary, boundary.bounds()?, shape));
    }

    img.save(&args.output)
        .with_context(|| format!("cannot write {}", args.output.display()))?;
    info!(path = %args.output.display(), "wrote image");
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}
