use ndarray::Array2;
use rstar::primitives::GeomWithData;
use rstar::RTree;

use crate::config::Method;
use crate::error::{Result, SurfaceError};
use crate::grid::Grid;

use super::dedup_samples;

/// Observation site in the R*-tree; `data` indexes the value table.
type Site = GeomWithData<[f64; 2], usize>;

/// Nearest-observation lookup backed by an R*-tree.
#[derive(Debug, Clone)]
pub struct NearestInterpolator {
    tree: RTree<Site>,
    values: Vec<f64>,
}

impl NearestInterpolator {
    /// Needs at least one observation.
    pub fn new(points: &[[f64; 2]], values: &[f64]) -> Result<Self> {
        let (points, values) = dedup_samples(points, values);
        if points.is_empty() {
            return Err(SurfaceError::InsufficientData {
                method: Method::Nearest,
                required: Method::Nearest.min_points(),
                provided: 0,
            });
        }
        let sites = points
            .into_iter()
            .enumerate()
            .map(|(i, p)| Site::new(p, i))
            .collect();
        Ok(Self { tree: RTree::bulk_load(sites), values })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of the observation closest to `p`.
    #[inline]
    pub fn value_at(&self, p: [f64; 2]) -> f64 {
        self.tree
            .nearest_neighbor(&p)
            .map_or(f64::NAN, |site| self.values[site.data])
    }

    pub fn evaluate(&self, grid: &Grid) -> Array2<f64> {
        Array2::from_shape_fn(grid.shape(), |(r, c)| self.value_at(grid.node(r, c)))
    }
}
