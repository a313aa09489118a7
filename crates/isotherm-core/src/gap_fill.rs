//! Ordered fallback rules that fill cells the primary interpolation left
//! undefined.
//!
//! Linear and cubic interpolants are only defined on the convex hull of the
//! observations, but the boundary usually reaches past it. The standard chain
//! is:
//!   1. `NearestFill`: copy the nearest observation's value into every
//!      undefined in-boundary cell.
//!   2. `SmoothFill`: blur the whole raster and copy the blurred value into
//!      anything still undefined inside the boundary. Nearest fill always
//!      succeeds, so this only fires for custom chains or empty samples.
//!
//! Each rule only writes the cells its predicate selects at the moment it
//! runs. After the last rule every in-boundary cell must be finite.

use ndarray::{Array2, Zip};
use serde::Serialize;

use crate::config::InterpolationConfig;
use crate::error::{Result, SurfaceError};
use crate::grid::Grid;
use crate::interpolate::NearestInterpolator;
use crate::smoothing::{finite_mean, gaussian_filter};

/// Read-only inputs shared by every rule.
#[derive(Debug, Clone, Copy)]
pub struct FillContext<'a> {
    pub grid: &'a Grid,
    pub inside: &'a Array2<bool>,
    pub points: &'a [[f64; 2]],
    pub values: &'a [f64],
}

/// One fallback strategy.
pub trait GapFiller: Send + Sync {
    fn name(&self) -> &str;

    /// Write replacement values into `raster` where `targets` is set and
    /// return how many target cells now hold a finite value.
    fn fill(&self, ctx: &FillContext<'_>, raster: &mut Array2<f64>, targets: &Array2<bool>) -> Result<usize>;
}

/// Selects the cells a rule may write, from the cell's current value and
/// whether it lies inside the boundary.
pub type Predicate = fn(f64, bool) -> bool;

/// Default predicate: undefined (NaN or infinite) and inside the boundary.
pub fn undefined_in_mask(value: f64, inside: bool) -> bool {
    inside && !value.is_finite()
}

pub struct FillRule {
    pub predicate: Predicate,
    pub filler: Box<dyn GapFiller>,
}

impl FillRule {
    pub fn new(filler: impl GapFiller + 'static) -> Self {
        Self { predicate: undefined_in_mask, filler: Box::new(filler) }
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }
}

impl std::fmt::Debug for FillRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FillRule").field("filler", &self.filler.name()).finish()
    }
}

// ── Fillers ──────────────────────────────────────────────────────────────────

/// Value of the nearest observation.
#[derive(Debug, Clone, Copy, Default)]
pub struct NearestFill;

impl GapFiller for NearestFill {
    fn name(&self) -> &str {
        "nearest"
    }

    fn fill(&self, ctx: &FillContext<'_>, raster: &mut Array2<f64>, targets: &Array2<bool>) -> Result<usize> {
        let nearest = NearestInterpolator::new(ctx.points, ctx.values)?;
        let mut filled = 0;
        for ((r, c), v) in raster.indexed_iter_mut() {
            if targets[[r, c]] {
                *v = nearest.value_at(ctx.grid.node(r, c));
                filled += usize::from(v.is_finite());
            }
        }
        Ok(filled)
    }
}

/// Gaussian-blurred raster, after replacing non-finite cells with the
/// global mean.
#[derive(Debug, Clone, Copy)]
pub struct SmoothFill {
    pub sigma: f64,
    pub truncate: f64,
}

impl SmoothFill {
    pub fn new(sigma: f64, truncate: f64) -> Self {
        Self { sigma, truncate }
    }
}

impl GapFiller for SmoothFill {
    fn name(&self) -> &str {
        "smooth"
    }

    fn fill(&self, _ctx: &FillContext<'_>, raster: &mut Array2<f64>, targets: &Array2<bool>) -> Result<usize> {
        // Nothing defined to spread.
        let Some(mean) = finite_mean(raster) else { return Ok(0) };
        let mut seeded = raster.clone();
        seeded.mapv_inplace(|v| if v.is_finite() { v } else { mean });
        let blurred = gaussian_filter(&seeded, self.sigma, self.truncate);

        let mut filled = 0;
        Zip::from(raster).and(targets).and(&blurred).for_each(|v, &t, &b| {
            if t {
                *v = b;
                filled += usize::from(b.is_finite());
            }
        });
        Ok(filled)
    }
}

// ── Chain ────────────────────────────────────────────────────────────────────

/// Outcome of one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageReport {
    pub stage: String,
    /// Cells the predicate selected.
    pub targets: usize,
    /// Targets holding a finite value after the stage.
    pub filled: usize,
}

/// What the fallback chain did for one surface.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GapFillReport {
    /// Undefined in-boundary cells left by the primary interpolation.
    pub primary_gaps: usize,
    pub stages: Vec<StageReport>,
}

impl GapFillReport {
    /// Cells filled by the stage named `stage` (0 if it never ran).
    pub fn filled_by(&self, stage: &str) -> usize {
        self.stages.iter().filter(|s| s.stage == stage).map(|s| s.filled).sum()
    }

    pub fn total_filled(&self) -> usize {
        self.stages.iter().map(|s| s.filled).sum()
    }
}

#[derive(Debug, Default)]
pub struct GapFillChain {
    rules: Vec<FillRule>,
}

impl GapFillChain {
    /// Empty chain; any gap becomes an `UnresolvedGaps` error.
    pub fn new() -> Self {
        Self::default()
    }

    /// Nearest fill, then Gaussian smoothing.
    pub fn standard(config: &InterpolationConfig) -> Self {
        let mut chain = Self::new();
        chain
            .push(FillRule::new(NearestFill))
            .push(FillRule::new(SmoothFill::new(config.smoothing_sigma, config.smoothing_truncate)));
        chain
    }

    /// Append a rule after the existing ones.
    pub fn push(&mut self, rule: FillRule) -> &mut Self {
        self.rules.push(rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn stage_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.filler.name())
    }

    /// Run every rule in order, then fail with `UnresolvedGaps` if any
    /// in-boundary cell is still not finite.
    pub fn resolve(&self, ctx: &FillContext<'_>, raster: &mut Array2<f64>) -> Result<GapFillReport> {
        let mut report = GapFillReport {
            primary_gaps: count_gaps(raster, ctx.inside),
            stages: Vec::with_capacity(self.rules.len()),
        };

        for rule in &self.rules {
            let mut targets = Array2::from_elem(raster.dim(), false);
            Zip::from(&mut targets)
                .and(&*raster)
                .and(ctx.inside)
                .for_each(|t, &v, &m| *t = (rule.predicate)(v, m));
            let n = targets.iter().filter(|&&t| t).count();

            let filled = if n == 0 { 0 } else { rule.filler.fill(ctx, raster, &targets)? };
            report.stages.push(StageReport {
                stage: rule.filler.name().to_string(),
                targets: n,
                filled,
            });
        }

        let remaining = count_gaps(raster, ctx.inside);
        if remaining > 0 {
            return Err(SurfaceError::UnresolvedGaps { remaining });
        }
        Ok(report)
    }
}

fn count_gaps(raster: &Array2<f64>, inside: &Array2<bool>) -> usize {
    raster
        .iter()
        .zip(inside.iter())
        .filter(|&(&v, &m)| undefined_in_mask(v, m))
        .count()
}
