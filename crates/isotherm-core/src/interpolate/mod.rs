//! Scattered-data interpolation onto a regular grid.
//!
//! `nearest` is defined everywhere. `linear` and `cubic` are defined only on
//! the convex hull of the observations; nodes outside it come back as NaN.

pub mod cubic;
pub mod linear;
pub mod nearest;

use std::collections::HashMap;

use ndarray::Array2;

use crate::config::{InterpolationConfig, Method};
use crate::error::{Result, SurfaceError};
use crate::grid::Grid;
use crate::triangulation::{barycentric, Triangulation};

pub use cubic::CloughTocher;
pub use linear::LinearInterpolator;
pub use nearest::NearestInterpolator;

/// Barycentric slack for nodes lying on a triangle edge.
const BARY_EPS: f64 = 1.0e-10;

/// A fitted interpolant for one feature.
#[derive(Debug, Clone)]
pub enum Interpolant {
    Nearest(NearestInterpolator),
    Linear(LinearInterpolator),
    Cubic(CloughTocher),
}

impl Interpolant {
    /// Fit `method` to the samples. Duplicate coordinates keep their first value.
    pub fn fit(
        method: Method,
        points: &[[f64; 2]],
        values: &[f64],
        config: &InterpolationConfig,
    ) -> Result<Self> {
        Ok(match method {
            Method::Nearest => Self::Nearest(NearestInterpolator::new(points, values)?),
            Method::Linear => Self::Linear(LinearInterpolator::new(points, values)?),
            Method::Cubic => Self::Cubic(CloughTocher::new(
                points,
                values,
                config.gradient_max_iterations,
                config.gradient_tolerance,
            )?),
        })
    }

    pub fn method(&self) -> Method {
        match self {
            Self::Nearest(_) => Method::Nearest,
            Self::Linear(_) => Method::Linear,
            Self::Cubic(_) => Method::Cubic,
        }
    }

    /// Evaluate at every grid node. NaN marks nodes outside the hull.
    pub fn evaluate(&self, grid: &Grid) -> Array2<f64> {
        match self {
            Self::Nearest(i) => i.evaluate(grid),
            Self::Linear(i) => i.evaluate(grid),
            Self::Cubic(i) => i.evaluate(grid),
        }
    }
}

/// Collapse repeated coordinates, keeping the first occurrence's value.
pub(crate) fn dedup_samples(points: &[[f64; 2]], values: &[f64]) -> (Vec<[f64; 2]>, Vec<f64>) {
    // +0.0 and -0.0 compare equal, so normalise before hashing bits.
    let key = |p: &[f64; 2]| ((p[0] + 0.0).to_bits(), (p[1] + 0.0).to_bits());
    let mut seen = HashMap::with_capacity(points.len());
    let mut out_points = Vec::with_capacity(points.len());
    let mut out_values = Vec::with_capacity(points.len());
    for (p, &v) in points.iter().zip(values) {
        if seen.insert(key(p), ()).is_none() {
            out_points.push(*p);
            out_values.push(v);
        }
    }
    (out_points, out_values)
}

/// Dedupe and triangulate, or fail with `InsufficientData` for `method`.
pub(crate) fn triangulate_samples(
    method: Method,
    points: &[[f64; 2]],
    values: &[f64],
) -> Result<(Triangulation, Vec<f64>)> {
    let (points, values) = dedup_samples(points, values);
    let provided = points.len();
    let insufficient = || SurfaceError::InsufficientData {
        method,
        required: method.min_points(),
        provided,
    };
    if provided < method.min_points() {
        return Err(insufficient());
    }
    let tri = Triangulation::new(points).ok_or_else(insufficient)?;
    Ok((tri, values))
}

/// Visit every grid node covered by a triangle and store `eval(t, bary)`.
/// Nodes outside every triangle stay NaN; a node on a shared edge is taken
/// by the first triangle that reaches it.
pub(crate) fn rasterize_triangles<F>(tri: &Triangulation, grid: &Grid, mut eval: F) -> Array2<f64>
where
    F: FnMut(usize, [f64; 3]) -> f64,
{
    let mut out = Array2::from_elem(grid.shape(), f64::NAN);
    let mut taken = Array2::from_elem(grid.shape(), false);

    for t in 0..tri.triangles().len() {
        let corners = tri.corners(t);
        let (xmin, xmax) = min_max(corners.iter().map(|p| p[0]));
        let (ymin, ymax) = min_max(corners.iter().map(|p| p[1]));
        let (Some((c0, c1)), Some((r0, r1))) = (grid.col_span(xmin, xmax), grid.row_span(ymin, ymax))
        else {
            continue;
        };
        for r in r0..=r1 {
            for c in c0..=c1 {
                if taken[[r, c]] {
                    continue;
                }
                let Some(b) = barycentric(&corners, grid.node(r, c)) else {
                    continue;
                };
                if b.iter().all(|&w| w >= -BARY_EPS) {
                    out[[r, c]] = eval(t, b);
                    taken[[r, c]] = true;
                }
            }
        }
    }
    out
}

fn min_max(it: impl Iterator<Item = f64>) -> (f64, f64) {
    it.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Bounds;

    fn interpolate(
        points: &[[f64; 2]],
        values: &[f64],
        grid: &Grid,
        method: Method,
        config: &InterpolationConfig,
    ) -> Result<Array2<f64>> {
        Ok(Interpolant::fit(method, points, values, config)?.evaluate(grid))
    }

    #[test]
    fn dedup_keeps_first_value() {
        let (p, v) = dedup_samples(&[[1.0, 2.0], [0.0, 0.0], [1.0, 2.0], [-0.0, 0.0]], &[5.0, 6.0, 7.0, 8.0]);
        assert_eq!(p, vec![[1.0, 2.0], [0.0, 0.0]]);
        assert_eq!(v, vec![5.0, 6.0]);
    }

    #[test]
    fn two_points_are_insufficient_for_triangulated_methods() {
        let grid = Grid::new(Bounds::new(0.0, 0.0, 1.0, 1.0), 4).unwrap();
        let config = InterpolationConfig::default();
        for method in [Method::Linear, Method::Cubic] {
            let err = interpolate(&[[0.0, 0.0], [1.0, 1.0]], &[1.0, 2.0], &grid, method, &config).unwrap_err();
            assert_eq!(err, SurfaceError::InsufficientData { method, required: 3, provided: 2 });
        }
    }

    #[test]
    fn duplicates_do_not_count_towards_minimum() {
        let grid = Grid::new(Bounds::new(0.0, 0.0, 1.0, 1.0), 4).unwrap();
        let pts = [[0.0, 0.0], [1.0, 0.0], [1.0, 0.0]];
        let err = interpolate(&pts, &[1.0, 2.0, 3.0], &grid, Method::Linear, &Default::default()).unwrap_err();
        assert!(matches!(err, SurfaceError::InsufficientData { provided: 2, .. }));
    }

    #[test]
    fn collinear_points_are_insufficient() {
        let grid = Grid::new(Bounds::new(0.0, 0.0, 3.0, 3.0), 4).unwrap();
        let pts = [[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]];
        let err = interpolate(&pts, &[1.0; 4], &grid, Method::Cubic, &Default::default()).unwrap_err();
        assert!(matches!(err, SurfaceError::InsufficientData { method: Method::Cubic, .. }));
    }

    #[test]
    fn nodes_outside_hull_are_nan() {
        // Triangle covering the lower-left half of the unit square.
        let grid = Grid::new(Bounds::new(0.0, 0.0, 1.0, 1.0), 11).unwrap();
        let pts = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        let out = interpolate(&pts, &[1.0, 1.0, 1.0], &grid, Method::Linear, &Default::default()).unwrap();
        assert!(out[[10, 10]].is_nan());
        assert!(out[[9, 9]].is_nan());
        assert_eq!(out[[0, 0]], 1.0);
        // On the hypotenuse.
        assert!((out[[5, 5]] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn fit_reports_its_method() {
        let pts = [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]];
        for method in [Method::Nearest, Method::Linear, Method::Cubic] {
            let i = Interpolant::fit(method, &pts, &[1.0, 2.0, 3.0], &Default::default()).unwrap();
            assert_eq!(i.method(), method);
        }
    }
}
