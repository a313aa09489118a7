//! Clough–Tocher C1 piecewise-cubic interpolation.
//!
//! Each Delaunay triangle is split at its centroid into three cubic Bézier
//! patches. Vertex values and gradients fix the edge control points; the
//! interior ones are chosen so the normal derivative is continuous across
//! shared edges. Vertex gradients come from a global estimate that minimises
//! the second-derivative energy of the surface along every edge (Nielson's
//! method), solved by Gauss–Seidel sweeps.

use ndarray::Array2;

use crate::config::Method;
use crate::error::Result;
use crate::grid::Grid;
use crate::triangulation::{barycentric, Triangulation};

use super::{rasterize_triangles, triangulate_samples};

#[derive(Debug, Clone)]
pub struct CloughTocher {
    tri: Triangulation,
    values: Vec<f64>,
    gradients: Vec<[f64; 2]>,
}

impl CloughTocher {
    /// Needs three distinct, non-collinear observations.
    pub fn new(points: &[[f64; 2]], values: &[f64], max_iterations: usize, tolerance: f64) -> Result<Self> {
        let (tri, values) = triangulate_samples(Method::Cubic, points, values)?;
        let gradients = estimate_gradients(&tri, &values, max_iterations, tolerance);
        Ok(Self { tri, values, gradients })
    }

    /// Estimated `(∂f/∂lon, ∂f/∂lat)` at each vertex.
    pub fn gradients(&self) -> &[[f64; 2]] {
        &self.gradients
    }

    pub fn evaluate(&self, grid: &Grid) -> Array2<f64> {
        // Triangles are visited in order, so one cached patch suffices.
        let mut cached: Option<(usize, Patch)> = None;
        rasterize_triangles(&self.tri, grid, |t, b| {
            let patch = match cached {
                Some((ct, p)) if ct == t => p,
                _ => {
                    let p = self.patch(t);
                    cached = Some((t, p));
                    p
                }
            };
            patch.eval(b)
        })
    }

    fn patch(&self, t: usize) -> Patch {
        let [i1, i2, i3] = self.tri.triangles()[t];
        let corners = self.tri.corners(t);
        let [p1, p2, p3] = corners;
        let (f1, f2, f3) = (self.values[i1], self.values[i2], self.values[i3]);
        let (g1, g2, g3) = (self.gradients[i1], self.gradients[i2], self.gradients[i3]);

        let e12 = [p2[0] - p1[0], p2[1] - p1[1]];
        let e23 = [p3[0] - p2[0], p3[1] - p2[1]];
        let e31 = [p1[0] - p3[0], p1[1] - p3[1]];
        let dot = |g: [f64; 2], e: [f64; 2]| g[0] * e[0] + g[1] * e[1];

        // Directional derivatives along each edge, scaled by edge length.
        let df12 = dot(g1, e12);
        let df21 = -dot(g2, e12);
        let df23 = dot(g2, e23);
        let df32 = -dot(g3, e23);
        let df31 = dot(g3, e31);
        let df13 = -dot(g1, e31);

        let c3000 = f1;
        let c2100 = (df12 + 3.0 * c3000) / 3.0;
        let c2010 = (df13 + 3.0 * c3000) / 3.0;
        let c0300 = f2;
        let c1200 = (df21 + 3.0 * c0300) / 3.0;
        let c0210 = (df23 + 3.0 * c0300) / 3.0;
        let c0030 = f3;
        let c1020 = (df31 + 3.0 * c0030) / 3.0;
        let c0120 = (df32 + 3.0 * c0030) / 3.0;

        let c2001 = (c2100 + c2010 + c3000) / 3.0;
        let c0201 = (c1200 + c0300 + c0210) / 3.0;
        let c0021 = (c1020 + c0120 + c0030) / 3.0;

        // Cross-edge continuity: where the neighbour's centroid sits in this
        // triangle's barycentric frame. Hull edges fall back to -1/2.
        let mut g = [-0.5; 3];
        for (k, neighbor) in self.tri.neighbors()[t].iter().enumerate() {
            let Some(n) = *neighbor else { continue };
            let [q1, q2, q3] = self.tri.corners(n);
            let centroid = [(q1[0] + q2[0] + q3[0]) / 3.0, (q1[1] + q2[1] + q3[1]) / 3.0];
            let Some(c) = barycentric(&corners, centroid) else { continue };
            g[k] = match k {
                0 => (2.0 * c[2] + c[1] - 1.0) / (2.0 - 3.0 * c[2] - 3.0 * c[1]),
                1 => (2.0 * c[0] + c[2] - 1.0) / (2.0 - 3.0 * c[0] - 3.0 * c[2]),
                _ => (2.0 * c[1] + c[0] - 1.0) / (2.0 - 3.0 * c[1] - 3.0 * c[0]),
            };
        }

        let c0111 = (g[0] * (-c0300 + 3.0 * c0210 - 3.0 * c0120 + c0030)
            + (-c0300 + 2.0 * c0210 - c0120 + c0021 + c0201))
            / 2.0;
        let c1011 = (g[1] * (-c0030 + 3.0 * c1020 - 3.0 * c2010 + c3000)
            + (-c0030 + 2.0 * c1020 - c2010 + c2001 + c0021))
            / 2.0;
        let c1101 = (g[2] * (-c3000 + 3.0 * c2100 - 3.0 * c1200 + c0300)
            + (-c3000 + 2.0 * c2100 - c1200 + c2001 + c0201))
            / 2.0;

        let c1002 = (c1101 + c1011 + c2001) / 3.0;
        let c0102 = (c1101 + c0111 + c0201) / 3.0;
        let c0012 = (c1011 + c0111 + c0021) / 3.0;
        let c0003 = (c1002 + c0102 + c0012) / 3.0;

        Patch {
            c3000, c0300, c0030, c2100, c2010, c1200, c0210, c1020, c0120,
            c2001, c0201, c0021, c1101, c1011, c0111, c1002, c0102, c0012, c0003,
        }
    }
}

/// Bézier control net of one split triangle. Index `abcd` weights vertex 1,
/// vertex 2, vertex 3 and the centroid.
#[derive(Debug, Clone, Copy)]
struct Patch {
    c3000: f64, c0300: f64, c0030: f64,
    c2100: f64, c2010: f64, c1200: f64, c0210: f64, c1020: f64, c0120: f64,
    c2001: f64, c0201: f64, c0021: f64,
    c1101: f64, c1011: f64, c0111: f64,
    c1002: f64, c0102: f64, c0012: f64,
    c0003: f64,
}

impl Patch {
    fn eval(&self, b: [f64; 3]) -> f64 {
        let m = b[0].min(b[1]).min(b[2]);
        let (b1, b2, b3, b4) = (b[0] - m, b[1] - m, b[2] - m, 3.0 * m);
        let c = self;

        if b[0] == m {
            // Sub-triangle (2, 3, centroid).
            b2.powi(3) * c.c0300
                + 3.0 * b2 * b2 * b3 * c.c0210
                + 3.0 * b2 * b3 * b3 * c.c0120
                + b3.powi(3) * c.c0030
                + 3.0 * b2 * b2 * b4 * c.c0201
                + 6.0 * b2 * b3 * b4 * c.c0111
                + 3.0 * b3 * b3 * b4 * c.c0021
                + 3.0 * b2 * b4 * b4 * c.c0102
                + 3.0 * b3 * b4 * b4 * c.c0012
                + b4.powi(3) * c.c0003
        } else if b[1] == m {
            // Sub-triangle (3, 1, centroid).
            b1.powi(3) * c.c3000
                + 3.0 * b1 * b1 * b3 * c.c2010
                + 3.0 * b1 * b3 * b3 * c.c1020
                + b3.powi(3) * c.c0030
                + 3.0 * b1 * b1 * b4 * c.c2001
                + 6.0 * b1 * b3 * b4 * c.c1011
                + 3.0 * b3 * b3 * b4 * c.c0021
                + 3.0 * b1 * b4 * b4 * c.c1002
                + 3.0 * b3 * b4 * b4 * c.c0012
                + b4.powi(3) * c.c0003
        } else {
            // Sub-triangle (1, 2, centroid).
            b1.powi(3) * c.c3000
                + 3.0 * b1 * b1 * b2 * c.c2100
                + 3.0 * b1 * b2 * b2 * c.c1200
                + b2.powi(3) * c.c0300
                + 3.0 * b1 * b1 * b4 * c.c2001
                + 6.0 * b1 * b2 * b4 * c.c1101
                + 3.0 * b2 * b2 * b4 * c.c0201
                + 3.0 * b1 * b4 * b4 * c.c1002
                + 3.0 * b2 * b4 * b4 * c.c0102
                + b4.powi(3) * c.c0003
        }
    }
}

/// Global gradient estimate at every vertex.
///
/// Each sweep solves, per vertex, the 2×2 normal equations that minimise the
/// edge-wise curvature energy given the neighbours' current gradients. Stops
/// once the largest relative update drops below `tolerance`.
fn estimate_gradients(tri: &Triangulation, values: &[f64], max_iterations: usize, tolerance: f64) -> Vec<[f64; 2]> {
    let points = tri.points();
    let adjacency = tri.vertex_neighbors();
    let mut grads = vec![[0.0f64; 2]; points.len()];

    for _ in 0..max_iterations {
        let mut err = 0.0f64;
        for (i, neighbors) in adjacency.iter().enumerate() {
            let mut q = [0.0f64; 3]; // xx, xy, yy
            let mut s = [0.0f64; 2];
            for &j in neighbors {
                let ex = points[j][0] - points[i][0];
                let ey = points[j][1] - points[i][1];
                let l = (ex * ex + ey * ey).sqrt();
                let l3 = l * l * l;
                let df2 = -ex * grads[j][0] - ey * grads[j][1];
                let rhs = 6.0 * (values[i] - values[j]) - 2.0 * df2;

                q[0] += 4.0 * ex * ex / l3;
                q[1] += 4.0 * ex * ey / l3;
                q[2] += 4.0 * ey * ey / l3;
                s[0] += rhs * ex / l3;
                s[1] += rhs * ey / l3;
            }

            let det = q[0] * q[2] - q[1] * q[1];
            if det.abs() <= f64::EPSILON * (q[0] * q[2]).abs() || det == 0.0 {
                continue;
            }
            let r0 = (q[2] * s[0] - q[1] * s[1]) / det;
            let r1 = (-q[1] * s[0] + q[0] * s[1]) / det;

            let change = (grads[i][0] + r0).abs().max((grads[i][1] + r1).abs());
            grads[i] = [-r0, -r1];
            err = err.max(change / r0.abs().max(r1.abs()).max(1.0));
        }
        if err < tolerance {
            break;
        }
    }
    grads
}
