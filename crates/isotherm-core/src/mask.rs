//! Boundary rasterization with "all-touched" semantics.
//!
//! A cell is inside when any part of the boundary geometry intersects it.
//! Two passes build that set:
//!   1. Scanline fill at cell centres, even–odd per polygon so holes drop out.
//!      Polygons are ORed together, so overlapping parts stay a union.
//!   2. Supercover burn of every ring edge, which adds each cell an edge
//!      passes through or touches. This is what catches slivers and thin
//!      islands whose interiors miss every cell centre.

use geo::{LineString, Polygon};
use ndarray::Array2;

use crate::boundary::Boundary;
use crate::grid::Bounds;

/// Affine map between geographic coordinates and fractional cell indices.
///
/// Cells are `(max − min) / n` wide, so `n` cells tile the bounding box
/// exactly. Row 0 sits at `lat_min`, matching [`Grid`](crate::grid::Grid).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridTransform {
    origin: [f64; 2],
    cell: [f64; 2],
}

impl GridTransform {
    pub fn new(bounds: Bounds, (rows, cols): (usize, usize)) -> Self {
        Self {
            origin: [bounds.lon_min, bounds.lat_min],
            cell: [bounds.width() / cols as f64, bounds.height() / rows as f64],
        }
    }

    /// Fractional `[col, row]` of a geographic point.
    #[inline]
    pub fn to_cell(&self, lon: f64, lat: f64) -> [f64; 2] {
        [(lon - self.origin[0]) / self.cell[0], (lat - self.origin[1]) / self.cell[1]]
    }
}

/// Boolean mask of shape `shape` over `bounds`: `true` where the boundary
/// touches the cell.
pub fn rasterize_boundary(boundary: &Boundary, bounds: Bounds, shape: (usize, usize)) -> Array2<bool> {
    let mut mask = Array2::from_elem(shape, false);
    if shape.0 == 0 || shape.1 == 0 {
        return mask;
    }
    let transform = GridTransform::new(bounds, shape);

    for polygon in boundary.polygons() {
        let rings = cell_rings(polygon, &transform);
        fill_interior(&rings, &mut mask);
        for ring in &rings {
            for edge in ring.windows(2) {
                burn_segment(edge[0], edge[1], &mut mask);
            }
        }
    }
    mask
}

/// Cells touched by any ring edge of the boundary, interiors left clear.
/// Same transform and orientation as [`rasterize_boundary`].
pub fn rasterize_outline(boundary: &Boundary, bounds: Bounds, shape: (usize, usize)) -> Array2<bool> {
    let mut outline = Array2::from_elem(shape, false);
    if shape.0 == 0 || shape.1 == 0 {
        return outline;
    }
    let transform = GridTransform::new(bounds, shape);
    for polygon in boundary.polygons() {
        for ring in cell_rings(polygon, &transform) {
            for edge in ring.windows(2) {
                burn_segment(edge[0], edge[1], &mut outline);
            }
        }
    }
    outline
}

/// Exterior and interior rings of `polygon` in fractional cell space.
fn cell_rings(polygon: &Polygon<f64>, transform: &GridTransform) -> Vec<Vec<[f64; 2]>> {
    let to_cells = |ring: &LineString<f64>| -> Vec<[f64; 2]> {
        ring.coords().map(|c| transform.to_cell(c.x, c.y)).collect()
    };
    std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .map(to_cells)
        .collect()
}

/// Even–odd scanline fill of one polygon, sampled at cell centres.
fn fill_interior(rings: &[Vec<[f64; 2]>], mask: &mut Array2<bool>) {
    let (rows, cols) = mask.dim();
    let (ymin, ymax) = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| (lo.min(p[1]), hi.max(p[1])));
    if !(ymin.is_finite() && ymax.is_finite()) {
        return;
    }
    let first = (ymin - 0.5).ceil().max(0.0) as usize;
    let last = ((ymax - 0.5).floor().min(rows as f64 - 1.0)).max(-1.0);
    if last < first as f64 {
        return;
    }

    let mut crossings = Vec::new();
    for row in first..=last as usize {
        let y = row as f64 + 0.5;
        crossings.clear();
        for ring in rings {
            for edge in ring.windows(2) {
                let (a, b) = (edge[0], edge[1]);
                // Half-open rule: a vertex on the scanline counts once.
                if (a[1] > y) != (b[1] > y) {
                    crossings.push(a[0] + (y - a[1]) * (b[0] - a[0]) / (b[1] - a[1]));
                }
            }
        }
        crossings.sort_by(f64::total_cmp);

        for span in crossings.chunks_exact(2) {
            // Columns whose centre c + 0.5 lies in [x0, x1).
            let c0 = (span[0] - 0.5).ceil().max(0.0);
            let c1 = ((span[1] - 0.5).ceil() - 1.0).min(cols as f64 - 1.0);
            if c1 < c0 {
                continue;
            }
            for col in c0 as usize..=c1 as usize {
                mask[[row, col]] = true;
            }
        }
    }
}

/// Mark every cell the closed segment `a → b` passes through or touches.
///
/// Walks the column strips the segment spans and, per strip, the rows
/// covered by the sub-segment inside it.
fn burn_segment(a: [f64; 2], b: [f64; 2], mask: &mut Array2<bool>) {
    let (rows, cols) = mask.dim();
    let (xlo, xhi) = (a[0].min(b[0]), a[0].max(b[0]));
    let (ylo, yhi) = (a[1].min(b[1]), a[1].max(b[1]));
    if !(xlo.is_finite() && xhi.is_finite() && ylo.is_finite() && yhi.is_finite()) {
        return;
    }

    let Some((c0, c1)) = touched_range(xlo, xhi, cols) else { return };
    let dx = b[0] - a[0];
    let y_at = |x: f64| a[1] + (x - a[0]) * (b[1] - a[1]) / dx;

    for col in c0..=c1 {
        let (sy0, sy1) = if dx == 0.0 {
            (ylo, yhi)
        } else {
            let x0 = xlo.max(col as f64);
            let x1 = xhi.min(col as f64 + 1.0);
            let (p, q) = (y_at(x0), y_at(x1));
            (p.min(q), p.max(q))
        };
        if let Some((r0, r1)) = touched_range(sy0, sy1, rows) {
            for row in r0..=r1 {
                mask[[row, col]] = true;
            }
        }
    }
}

/// Inclusive range of unit cells `[i, i + 1]` that meet the closed interval
/// `[lo, hi]`, clipped to `0..n`.
fn touched_range(lo: f64, hi: f64, n: usize) -> Option<(usize, usize)> {
    let first = (lo.ceil() - 1.0).max(0.0);
    let last = hi.floor().min(n as f64 - 1.0);
    if last < first || last < 0.0 {
        return None;
    }
    Some((first as usize, last as usize))
}
