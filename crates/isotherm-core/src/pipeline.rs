//! Surface engine: runs every stage for one feature over one boundary.
//!
//! Pipeline order:
//!   1. Grid over the boundary's bounding box
//!   2. Primary interpolation (nearest / linear / cubic)
//!   3. All-touched boundary mask
//!   4. Gap filling (nearest, then smoothing)
//!   5. Masking
//!
//! Any failure aborts the call; no partial surface is returned.

use ndarray::Array2;
use serde::Serialize;

use crate::boundary::Boundary;
use crate::config::{InterpolationConfig, Method};
use crate::error::Result;
use crate::gap_fill::{FillContext, GapFillChain, GapFillReport};
use crate::grid::{Bounds, Grid};
use crate::interpolate::Interpolant;
use crate::mask::rasterize_boundary;
use crate::observation::ObservationSet;
use crate::raster::MaskedRaster;

/// Full output of one surface generation.
#[derive(Debug, Clone, Serialize)]
pub struct SurfaceResult {
    pub feature: String,
    pub method: Method,
    pub bounds: Bounds,
    /// Longitude of every node, `R × R`.
    pub grid_lon: Array2<f64>,
    /// Latitude of every node, `R × R`.
    pub grid_lat: Array2<f64>,
    pub raster: MaskedRaster,
    pub report: GapFillReport,
}

impl SurfaceResult {
    /// `(lon_min, lon_max, lat_min, lat_max)` for placing the raster on a map.
    pub fn extent(&self) -> (f64, f64, f64, f64) {
        let b = self.bounds;
        (b.lon_min, b.lon_max, b.lat_min, b.lat_max)
    }
}

/// Reusable engine holding one configuration.
#[derive(Debug, Clone, Default)]
pub struct SurfaceEngine {
    config: InterpolationConfig,
}

impl SurfaceEngine {
    pub fn new(config: InterpolationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &InterpolationConfig {
        &self.config
    }

    /// Interpolate `feature` over `boundary` with the standard gap-fill chain.
    pub fn generate(&self, observations: &ObservationSet, boundary: &Boundary, feature: &str) -> Result<SurfaceResult> {
        self.generate_with(observations, boundary, feature, &GapFillChain::standard(&self.config))
    }

    /// As [`generate`](Self::generate), with a caller-supplied fallback chain.
    pub fn generate_with(
        &self,
        observations: &ObservationSet,
        boundary: &Boundary,
        feature: &str,
        chain: &GapFillChain,
    ) -> Result<SurfaceResult> {
        let config = &self.config;
        config.validate()?;

        // ── 1. Grid ─────────────────────────────────────────────────────────
        // A zero-extent box is a bounds problem first, so build the grid
        // before judging the polygons.
        let bounds = boundary.bounds()?;
        let grid = Grid::new(bounds, config.resolution)?;
        boundary.validate()?;

        // ── 2. Primary interpolation ────────────────────────────────────────
        let samples = observations.samples(feature)?;
        let interpolant = Interpolant::fit(config.method, &samples.points, &samples.values, config)?;
        let mut data = interpolant.evaluate(&grid);

        // ── 3. Boundary mask ────────────────────────────────────────────────
        let inside = rasterize_boundary(boundary, bounds, grid.shape());

        // ── 4. Gap filling ──────────────────────────────────────────────────
        let ctx = FillContext {
            grid: &grid,
            inside: &inside,
            points: &samples.points,
            values: &samples.values,
        };
        let report = chain.resolve(&ctx, &mut data)?;

        // ── 5. Mask ─────────────────────────────────────────────────────────
        Ok(SurfaceResult {
            feature: feature.to_string(),
            method: config.method,
            bounds,
            grid_lon: grid.grid_lon(),
            grid_lat: grid.grid_lat(),
            raster: MaskedRaster::new(data, inside),
            report,
        })
    }
}

/// One-call entry point with the default configuration; `method` is one of
/// `nearest`, `linear` or `cubic` (case-insensitive).
pub fn interpolate_with_gap_filling(
    observations: &ObservationSet,
    boundary: &Boundary,
    feature: &str,
    method: &str,
) -> Result<SurfaceResult> {
    let method: Method = method.parse()?;
    SurfaceEngine::new(InterpolationConfig::default().with_method(method)).generate(observations, boundary, feature)
}
