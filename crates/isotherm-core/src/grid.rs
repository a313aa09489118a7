use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SurfaceError};

/// Axis-aligned geographic bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub lon_min: f64,
    pub lat_min: f64,
    pub lon_max: f64,
    pub lat_max: f64,
}

impl Bounds {
    pub fn new(lon_min: f64, lat_min: f64, lon_max: f64, lat_max: f64) -> Self {
        Self { lon_min, lat_min, lon_max, lat_max }
    }

    pub fn width(&self) -> f64 {
        self.lon_max - self.lon_min
    }

    pub fn height(&self) -> f64 {
        self.lat_max - self.lat_min
    }

    /// Fails with `InvalidBounds` unless both extents are finite and positive.
    pub fn validate(&self) -> Result<()> {
        let finite = [self.lon_min, self.lat_min, self.lon_max, self.lat_max]
            .iter()
            .all(|v| v.is_finite());
        if !finite || self.lon_min >= self.lon_max || self.lat_min >= self.lat_max {
            return Err(SurfaceError::InvalidBounds {
                lon_min: self.lon_min,
                lat_min: self.lat_min,
                lon_max: self.lon_max,
                lat_max: self.lat_max,
            });
        }
        Ok(())
    }
}

/// Regular `R × R` sampling lattice over a bounding box, both endpoints
/// included on each axis.
///
/// Layout: row `r` is latitude (row 0 = `lat_min`), column `c` is longitude
/// (column 0 = `lon_min`). The boundary mask uses the same orientation.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    bounds: Bounds,
    resolution: usize,
    lons: Vec<f64>,
    lats: Vec<f64>,
}

/// `n` evenly spaced values from `start` to `stop` inclusive; the last value
/// is exactly `stop`.
fn linspace(start: f64, stop: f64, n: usize) -> Vec<f64> {
    let span = stop - start;
    let denom = (n - 1) as f64;
    let mut v: Vec<f64> = (0..n).map(|i| start + span * i as f64 / denom).collect();
    if let Some(last) = v.last_mut() {
        *last = stop;
    }
    v
}

impl Grid {
    pub fn new(bounds: Bounds, resolution: usize) -> Result<Self> {
        bounds.validate()?;
        if resolution < 2 {
            return Err(SurfaceError::InvalidConfig(format!(
                "grid resolution must be at least 2, got {resolution}"
            )));
        }
        Ok(Self {
            bounds,
            resolution,
            lons: linspace(bounds.lon_min, bounds.lon_max, resolution),
            lats: linspace(bounds.lat_min, bounds.lat_max, resolution),
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.lats.len(), self.lons.len())
    }

    /// Longitude of every column.
    pub fn lons(&self) -> &[f64] {
        &self.lons
    }

    /// Latitude of every row.
    pub fn lats(&self) -> &[f64] {
        &self.lats
    }

    /// Node spacing `(Δlon, Δlat)`.
    pub fn spacing(&self) -> (f64, f64) {
        let d = (self.resolution - 1) as f64;
        (self.bounds.width() / d, self.bounds.height() / d)
    }

    #[inline]
    pub fn node(&self, row: usize, col: usize) -> [f64; 2] {
        [self.lons[col], self.lats[row]]
    }

    /// Longitude of every node, shape `R × R`.
    pub fn grid_lon(&self) -> Array2<f64> {
        Array2::from_shape_fn(self.shape(), |(_, c)| self.lons[c])
    }

    /// Latitude of every node, shape `R × R`.
    pub fn grid_lat(&self) -> Array2<f64> {
        Array2::from_shape_fn(self.shape(), |(r, _)| self.lats[r])
    }

    /// Inclusive column range of nodes with longitude in `[lo, hi]`, or
    /// `None` if no node falls inside.
    pub(crate) fn col_span(&self, lo: f64, hi: f64) -> Option<(usize, usize)> {
        axis_span(self.bounds.lon_min, self.spacing().0, self.resolution, lo, hi)
    }

    /// Inclusive row range of nodes with latitude in `[lo, hi]`.
    pub(crate) fn row_span(&self, lo: f64, hi: f64) -> Option<(usize, usize)> {
        axis_span(self.bounds.lat_min, self.spacing().1, self.resolution, lo, hi)
    }
}

fn axis_span(origin: f64, step: f64, n: usize, lo: f64, hi: f64) -> Option<(usize, usize)> {
    // One extra node either side absorbs rounding; callers re-test each node.
    let first = ((lo - origin) / step).floor() - 1.0;
    let last = ((hi - origin) / step).ceil() + 1.0;
    if last < 0.0 || first > (n - 1) as f64 {
        return None;
    }
    let first = first.max(0.0) as usize;
    let last = (last as usize).min(n - 1);
    Some((first, last))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn endpoints_are_inclusive() {
        let g = Grid::new(Bounds::new(79.5, 5.9, 81.9, 9.9), 500).unwrap();
        assert_eq!(g.shape(), (500, 500));
        assert_eq!(g.lons()[0], 79.5);
        assert_eq!(g.lons()[499], 81.9);
        assert_eq!(g.lats()[0], 5.9);
        assert_eq!(g.lats()[499], 9.9);
    }

    #[test]
    fn coordinate_arrays_follow_row_lat_col_lon() {
        let g = Grid::new(Bounds::new(0.0, 10.0, 4.0, 12.0), 5).unwrap();
        let lon = g.grid_lon();
        let lat = g.grid_lat();
        assert_eq!(lon.dim(), (5, 5));
        assert_relative_eq!(lon[[3, 1]], 1.0);
        assert_relative_eq!(lat[[3, 1]], 11.5);
        // Longitude is constant down a column, latitude along a row.
        assert!(lon.column(2).iter().all(|&v| v == lon[[0, 2]]));
        assert!(lat.row(4).iter().all(|&v| v == 12.0));
    }

    #[test]
    fn degenerate_bounds_rejected() {
        let err = Grid::new(Bounds::new(80.0, 6.0, 80.0, 9.0), 10).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidBounds { .. }));
        let err = Grid::new(Bounds::new(80.0, 9.0, 81.0, 6.0), 10).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidBounds { .. }));
        let err = Grid::new(Bounds::new(f64::NAN, 6.0, 81.0, 9.0), 10).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidBounds { .. }));
    }

    #[test]
    fn resolution_below_two_rejected() {
        let err = Grid::new(Bounds::new(0.0, 0.0, 1.0, 1.0), 1).unwrap_err();
        assert!(matches!(err, SurfaceError::InvalidConfig(_)));
    }

    #[test]
    fn spans_cover_requested_interval() {
        let g = Grid::new(Bounds::new(0.0, 0.0, 10.0, 10.0), 11).unwrap();
        let (a, b) = g.col_span(2.5, 4.5).unwrap();
        assert!(a <= 3 && b >= 4);
        assert!(g.col_span(-5.0, -3.0).is_none());
        assert!(g.row_span(12.0, 15.0).is_none());
        assert_eq!(g.row_span(-1.0, 20.0), Some((0, 10)));
    }
}
