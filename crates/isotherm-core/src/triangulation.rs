//! Delaunay triangulation of scattered observation points (Bowyer–Watson).
//!
//! Construction runs on coordinates rescaled to the unit square so the
//! circumcircle test behaves the same for degree-sized and metre-sized
//! inputs. Stored points keep their original coordinates.
//!
//! Triangles are counter-clockwise. `neighbors[t][k]` is the triangle across
//! the edge opposite vertex `k` of triangle `t`, or `None` on the hull.

use std::collections::HashMap;

/// Half-width of the enclosing super-triangle, in unit-square coordinates.
const SUPER_SCALE: f64 = 1.0e4;

/// Relative area below which a point set counts as collinear.
const COLLINEAR_EPS: f64 = 1.0e-12;

#[derive(Debug, Clone)]
pub struct Triangulation {
    points: Vec<[f64; 2]>,
    triangles: Vec<[usize; 3]>,
    neighbors: Vec<[Option<usize>; 3]>,
}

#[inline]
fn orient(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> f64 {
    (b[0] - a[0]) * (c[1] - a[1]) - (b[1] - a[1]) * (c[0] - a[0])
}

/// Positive when `d` lies strictly inside the circumcircle of the
/// counter-clockwise triangle `(a, b, c)`.
#[inline]
fn in_circle(a: [f64; 2], b: [f64; 2], c: [f64; 2], d: [f64; 2]) -> f64 {
    let (adx, ady) = (a[0] - d[0], a[1] - d[1]);
    let (bdx, bdy) = (b[0] - d[0], b[1] - d[1]);
    let (cdx, cdy) = (c[0] - d[0], c[1] - d[1]);
    let alift = adx * adx + ady * ady;
    let blift = bdx * bdx + bdy * bdy;
    let clift = cdx * cdx + cdy * cdy;
    alift * (bdx * cdy - cdx * bdy) + blift * (cdx * ady - adx * cdy) + clift * (adx * bdy - bdx * ady)
}

/// True when every point lies on one line (or there are fewer than three).
pub fn is_collinear(points: &[[f64; 2]]) -> bool {
    if points.len() < 3 {
        return true;
    }
    let (lo, hi) = extent(points);
    let scale = (hi[0] - lo[0]).max(hi[1] - lo[1]);
    if scale <= 0.0 {
        return true;
    }
    // Farthest point from p0, then the point with the largest area against that chord.
    let p0 = points[0];
    let far = points
        .iter()
        .copied()
        .max_by(|a, b| dist2(p0, *a).total_cmp(&dist2(p0, *b)))
        .unwrap_or(p0);
    let max_area = points
        .iter()
        .map(|&p| orient(p0, far, p).abs())
        .fold(0.0, f64::max);
    max_area <= COLLINEAR_EPS * scale * scale
}

#[inline]
fn dist2(a: [f64; 2], b: [f64; 2]) -> f64 {
    (a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)
}

fn extent(points: &[[f64; 2]]) -> ([f64; 2], [f64; 2]) {
    points.iter().fold(
        ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
        |(lo, hi), p| ([lo[0].min(p[0]), lo[1].min(p[1])], [hi[0].max(p[0]), hi[1].max(p[1])]),
    )
}

impl Triangulation {
    /// Triangulate `points`. Returns `None` when fewer than three points are
    /// given or all of them are collinear. Points must be distinct.
    pub fn new(points: Vec<[f64; 2]>) -> Option<Self> {
        if is_collinear(&points) {
            return None;
        }
        let n = points.len();
        let (lo, hi) = extent(&points);
        let scale = (hi[0] - lo[0]).max(hi[1] - lo[1]);
        let mut work: Vec<[f64; 2]> = points
            .iter()
            .map(|p| [(p[0] - lo[0]) / scale, (p[1] - lo[1]) / scale])
            .collect();

        // Super-triangle around the unit square, vertices n, n+1, n+2.
        let c = [0.5, 0.5];
        for k in 0..3 {
            let theta = std::f64::consts::FRAC_PI_2 + k as f64 * 2.0 * std::f64::consts::PI / 3.0;
            work.push([c[0] + SUPER_SCALE * theta.cos(), c[1] + SUPER_SCALE * theta.sin()]);
        }

        let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

        for i in 0..n {
            let p = work[i];
            let mut bad = Vec::new();
            triangles.retain(|t| {
                let inside = in_circle(work[t[0]], work[t[1]], work[t[2]], p) > 0.0;
                if inside {
                    bad.push(*t);
                }
                !inside
            });

            // Cavity boundary: edges used by exactly one removed triangle.
            let mut edge_count: HashMap<(usize, usize), u32> = HashMap::new();
            for t in &bad {
                for e in 0..3 {
                    let (a, b) = (t[e], t[(e + 1) % 3]);
                    *edge_count.entry((a.min(b), a.max(b))).or_insert(0) += 1;
                }
            }
            for t in &bad {
                for e in 0..3 {
                    let (a, b) = (t[e], t[(e + 1) % 3]);
                    if edge_count[&(a.min(b), a.max(b))] == 1 {
                        // (a, b) kept its counter-clockwise order, so (a, b, p) is too.
                        triangles.push([a, b, i]);
                    }
                }
            }
        }

        // Near-collinear hull vertices can leave a sliver owned only by
        // super-triangle faces; it goes with them.
        triangles.retain(|t| t.iter().all(|&v| v < n));
        triangles.retain(|t| orient(work[t[0]], work[t[1]], work[t[2]]) > 0.0);
        if triangles.is_empty() {
            return None;
        }

        let neighbors = build_neighbors(&triangles);
        Some(Self { points, triangles, neighbors })
    }

    pub fn points(&self) -> &[[f64; 2]] {
        &self.points
    }

    pub fn triangles(&self) -> &[[usize; 3]] {
        &self.triangles
    }

    pub fn neighbors(&self) -> &[[Option<usize>; 3]] {
        &self.neighbors
    }

    /// Vertex coordinates of triangle `t`.
    pub fn corners(&self, t: usize) -> [[f64; 2]; 3] {
        let [a, b, c] = self.triangles[t];
        [self.points[a], self.points[b], self.points[c]]
    }

    /// Sorted, deduplicated adjacency list for every vertex.
    pub fn vertex_neighbors(&self) -> Vec<Vec<usize>> {
        let mut adj = vec![Vec::new(); self.points.len()];
        for t in &self.triangles {
            for k in 0..3 {
                let (a, b) = (t[k], t[(k + 1) % 3]);
                adj[a].push(b);
                adj[b].push(a);
            }
        }
        for list in &mut adj {
            list.sort_unstable();
            list.dedup();
        }
        adj
    }
}

fn build_neighbors(triangles: &[[usize; 3]]) -> Vec<[Option<usize>; 3]> {
    let mut owner: HashMap<(usize, usize), (usize, usize)> = HashMap::new();
    let mut neighbors = vec![[None; 3]; triangles.len()];
    for (ti, t) in triangles.iter().enumerate() {
        for k in 0..3 {
            // Edge opposite vertex k.
            let (a, b) = (t[(k + 1) % 3], t[(k + 2) % 3]);
            let key = (a.min(b), a.max(b));
            if let Some(&(tj, kj)) = owner.get(&key) {
                neighbors[ti][k] = Some(tj);
                neighbors[tj][kj] = Some(ti);
            } else {
                owner.insert(key, (ti, k));
            }
        }
    }
    neighbors
}

/// Barycentric coordinates of `p` in triangle `tri`. Returns `None` for a
/// degenerate triangle.
#[inline]
pub fn barycentric(tri: &[[f64; 2]; 3], p: [f64; 2]) -> Option<[f64; 3]> {
    let [a, b, c] = *tri;
    let det = orient(a, b, c);
    if det == 0.0 {
        return None;
    }
    let b1 = orient(a, p, c) / det;
    let b2 = orient(a, b, p) / det;
    Some([1.0 - b1 - b2, b1, b2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn square_with_centre() -> Vec<[f64; 2]> {
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.5, 0.5]]
    }

    fn total_area(tri: &Triangulation) -> f64 {
        (0..tri.triangles().len())
            .map(|t| {
                let [a, b, c] = tri.corners(t);
                orient(a, b, c) / 2.0
            })
            .sum()
    }

    #[test]
    fn square_with_centre_gives_four_triangles() {
        let tri = Triangulation::new(square_with_centre()).unwrap();
        assert_eq!(tri.triangles().len(), 4);
        assert_relative_eq!(total_area(&tri), 1.0, epsilon = 1e-12);
        // Every triangle touches the centre vertex.
        assert!(tri.triangles().iter().all(|t| t.contains(&4)));
    }

    #[test]
    fn triangles_are_counter_clockwise() {
        let pts = vec![[80.1, 6.2], [81.7, 6.9], [80.9, 9.4], [79.9, 8.1], [80.8, 7.6], [81.2, 8.3]];
        let tri = Triangulation::new(pts).unwrap();
        for t in 0..tri.triangles().len() {
            let [a, b, c] = tri.corners(t);
            assert!(orient(a, b, c) > 0.0);
        }
    }

    #[test]
    fn empty_circumcircle_property_holds() {
        let pts = vec![
            [0.1, 0.2], [0.9, 0.1], [0.5, 0.9], [0.3, 0.6], [0.7, 0.55],
            [0.45, 0.3], [0.2, 0.85], [0.85, 0.8], [0.6, 0.15],
        ];
        let tri = Triangulation::new(pts.clone()).unwrap();
        for t in tri.triangles() {
            let (a, b, c) = (pts[t[0]], pts[t[1]], pts[t[2]]);
            for (i, &p) in pts.iter().enumerate() {
                if t.contains(&i) {
                    continue;
                }
                assert!(in_circle(a, b, c, p) <= 1e-12, "point {i} inside circumcircle of {t:?}");
            }
        }
    }

    #[test]
    fn neighbors_are_symmetric() {
        let tri = Triangulation::new(square_with_centre()).unwrap();
        for (ti, ns) in tri.neighbors().iter().enumerate() {
            for n in ns.iter().flatten() {
                assert!(tri.neighbors()[*n].contains(&Some(ti)));
            }
        }
        // Four hull edges have no neighbour.
        let hull_edges = tri.neighbors().iter().flatten().filter(|n| n.is_none()).count();
        assert_eq!(hull_edges, 4);
    }

    #[test]
    fn collinear_input_yields_none() {
        assert!(Triangulation::new(vec![[0.0, 0.0], [1.0, 1.0], [2.0, 2.0], [3.0, 3.0]]).is_none());
        assert!(Triangulation::new(vec![[0.0, 0.0], [1.0, 1.0]]).is_none());
    }

    #[test]
    fn barycentric_reconstructs_point() {
        let t = [[0.0, 0.0], [2.0, 0.0], [0.0, 2.0]];
        let b = barycentric(&t, [0.5, 0.5]).unwrap();
        assert_relative_eq!(b[0], 0.5);
        assert_relative_eq!(b[1], 0.25);
        assert_relative_eq!(b[2], 0.25);
        assert!(barycentric(&[[0.0, 0.0], [1.0, 1.0], [2.0, 2.0]], [0.0, 1.0]).is_none());
    }

    #[test]
    fn vertex_neighbors_of_centre_are_corners() {
        let tri = Triangulation::new(square_with_centre()).unwrap();
        assert_eq!(tri.vertex_neighbors()[4], vec![0, 1, 2, 3]);
    }

    fn hull_area(points: &[[f64; 2]]) -> f64 {
        use geo::{Area, ConvexHull, MultiPoint, Point};
        let cloud: MultiPoint<f64> = points.iter().map(|p| Point::new(p[0], p[1])).collect();
        cloud.convex_hull().unsigned_area()
    }

    #[test]
    fn random_points_cover_their_hull() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        for seed in 0..40 {
            let mut rng = StdRng::seed_from_u64(seed);
            let points: Vec<[f64; 2]> =
                (0..50).map(|_| [rng.gen_range(79.5..82.0), rng.gen_range(5.9..9.9)]).collect();
            let hull = hull_area(&points);
            let tri = Triangulation::new(points).unwrap();
            assert_relative_eq!(total_area(&tri), hull, max_relative = 1e-9);
        }
    }

    /// Near-collinear hull edges can lose a sliver when the super-triangle
    /// is stripped. The loss is bounded by jitter times perimeter.
    #[test]
    fn jittered_lattice_loses_at_most_a_sliver() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};
        let mut rng = StdRng::seed_from_u64(7);
        let mut points = Vec::new();
        for r in 0..17 {
            for c in 0..10 {
                let lon = 79.5 + 2.5 * c as f64 / 9.0 + rng.gen_range(-1e-6..1e-6);
                let lat = 5.9 + 4.0 * r as f64 / 16.0 + rng.gen_range(-1e-6..1e-6);
                points.push([lon, lat]);
            }
        }
        let hull = hull_area(&points);
        let tri = Triangulation::new(points).unwrap();
        let area = total_area(&tri);
        assert!(area <= hull * (1.0 + 1e-12));
        assert!((hull - area) / hull < 1e-5, "lost {} of the hull", (hull - area) / hull);
    }
}
