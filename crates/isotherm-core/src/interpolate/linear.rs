use ndarray::Array2;

use crate::config::Method;
use crate::error::Result;
use crate::grid::Grid;
use crate::triangulation::Triangulation;

use super::{rasterize_triangles, triangulate_samples};

/// Piecewise-linear interpolant on the Delaunay triangulation.
#[derive(Debug, Clone)]
pub struct LinearInterpolator {
    tri: Triangulation,
    values: Vec<f64>,
}

impl LinearInterpolator {
    /// Needs three distinct, non-collinear observations.
    pub fn new(points: &[[f64; 2]], values: &[f64]) -> Result<Self> {
        let (tri, values) = triangulate_samples(Method::Linear, points, values)?;
        Ok(Self { tri, values })
    }

    pub fn evaluate(&self, grid: &Grid) -> Array2<f64> {
        rasterize_triangles(&self.tri, grid, |t, b| {
            let [i, j, k] = self.tri.triangles()[t];
            b[0] * self.values[i] + b[1] * self.values[j] + b[2] * self.values[k]
        })
    }
}
