//! Region boundary: a union of closed polygons (holes allowed).
//!
//! Coordinates are `(lon, lat)` in the same reference system as the
//! observations; no reprojection is performed.

use geo::{Area, BoundingRect, Coord, LineString, MultiPolygon, Polygon};

use crate::error::{Result, SurfaceError};
use crate::grid::Bounds;

#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    shape: MultiPolygon<f64>,
}

impl Boundary {
    pub fn new(shape: MultiPolygon<f64>) -> Self {
        Self { shape }
    }

    pub fn from_polygons(polygons: Vec<Polygon<f64>>) -> Self {
        Self::new(MultiPolygon::new(polygons))
    }

    /// Build from nested coordinate arrays: polygons → rings → `[lon, lat]`.
    /// The first ring of each polygon is the exterior, the rest are holes.
    /// Rings are closed automatically.
    pub fn from_rings(polygons: &[Vec<Vec<[f64; 2]>>]) -> Result<Self> {
        let mut parts = Vec::with_capacity(polygons.len());
        for (i, rings) in polygons.iter().enumerate() {
            let mut rings = rings.iter().map(|ring| {
                LineString::from(ring.iter().map(|&[x, y]| Coord { x, y }).collect::<Vec<_>>())
            });
            let exterior = rings
                .next()
                .ok_or_else(|| SurfaceError::Geometry(format!("polygon {i} has no exterior ring")))?;
            parts.push(Polygon::new(exterior, rings.collect()));
        }
        Ok(Self::from_polygons(parts))
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    pub fn polygons(&self) -> impl Iterator<Item = &Polygon<f64>> {
        self.shape.0.iter()
    }

    /// Axis-aligned bounding box of all parts.
    ///
    /// Fails with `Geometry` for an empty boundary. A zero-extent box is
    /// returned as-is; the grid builder rejects it.
    pub fn bounds(&self) -> Result<Bounds> {
        let rect = self
            .shape
            .bounding_rect()
            .ok_or_else(|| SurfaceError::Geometry("boundary has no polygons".into()))?;
        Ok(Bounds {
            lon_min: rect.min().x,
            lat_min: rect.min().y,
            lon_max: rect.max().x,
            lat_max: rect.max().y,
        })
    }

    /// Check the shape is usable as a mask: at least one polygon, closed
    /// rings with ≥ 4 finite coordinates, and non-zero total area.
    /// Self-intersection is not checked.
    pub fn validate(&self) -> Result<()> {
        if self.shape.0.is_empty() {
            return Err(SurfaceError::Geometry("boundary has no polygons".into()));
        }
        for (i, polygon) in self.polygons().enumerate() {
            for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
                if ring.0.len() < 4 {
                    return Err(SurfaceError::Geometry(format!(
                        "polygon {i} has a ring with {} coordinates, need at least 4",
                        ring.0.len()
                    )));
                }
                if !ring.is_closed() {
                    return Err(SurfaceError::Geometry(format!("polygon {i} has an open ring")));
                }
                if ring.coords().any(|c| !c.x.is_finite() || !c.y.is_finite()) {
                    return Err(SurfaceError::Geometry(format!(
                        "polygon {i} has a non-finite coordinate"
                    )));
                }
            }
        }
        let area = self.shape.unsigned_area();
        if !(area > 0.0) {
            return Err(SurfaceError::Geometry(format!("boundary area is {area}")));
        }
        Ok(())
    }
}

impl From<MultiPolygon<f64>> for Boundary {
    fn from(shape: MultiPolygon<f64>) -> Self {
        Self::new(shape)
    }
}

impl From<Polygon<f64>> for Boundary {
    fn from(polygon: Polygon<f64>) -> Self {
        Self::from_polygons(vec![polygon])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;

    #[test]
    fn bounds_span_all_parts() {
        let b = Boundary::from_rings(&[
            vec![vec![[80.0, 6.0], [81.0, 6.0], [81.0, 7.0], [80.0, 7.0]]],
            vec![vec![[79.5, 9.0], [79.7, 9.0], [79.7, 9.9]]],
        ])
        .unwrap();
        let bb = b.bounds().unwrap();
        assert_eq!((bb.lon_min, bb.lat_min, bb.lon_max, bb.lat_max), (79.5, 6.0, 81.0, 9.9));
        b.validate().unwrap();
    }

    #[test]
    fn empty_boundary_is_a_geometry_error() {
        let b = Boundary::from_polygons(vec![]);
        assert!(matches!(b.bounds(), Err(SurfaceError::Geometry(_))));
        assert!(matches!(b.validate(), Err(SurfaceError::Geometry(_))));
    }

    #[test]
    fn polygon_without_rings_is_rejected() {
        let err = Boundary::from_rings(&[vec![]]).unwrap_err();
        assert!(matches!(err, SurfaceError::Geometry(_)));
    }

    #[test]
    fn zero_area_sliver_fails_validation() {
        let b: Boundary = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0), (x: 2.0, y: 2.0)].into();
        assert!(b.bounds().is_ok());
        assert!(matches!(b.validate(), Err(SurfaceError::Geometry(_))));
    }

    #[test]
    fn non_finite_vertex_fails_validation() {
        let b = Boundary::from_rings(&[vec![vec![[0.0, 0.0], [f64::NAN, 0.0], [1.0, 1.0]]]]).unwrap();
        assert!(matches!(b.validate(), Err(SurfaceError::Geometry(_))));
    }
}
