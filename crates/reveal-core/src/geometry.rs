//! Geometry capability used by the matcher
//!
//! The matcher never calls a geometry library directly; it goes through
//! [`GeometryProvider`] so numerical failures surface as values it can
//! degrade on. [`GeoProvider`] is the default, backed by the `geo` crate.
//!
//! Coordinates are (x = longitude, y = latitude) in degrees.

use geo::{
    BooleanOps, ChamberlainDuquetteArea, CoordsIter, HaversineDestination, HaversineDistance,
    Intersects, LineString, MultiPolygon, Point, Polygon, Rect,
};
use std::panic::{self, AssertUnwindSafe};
use thiserror::Error;

/// Minimum positions in a closed ring (three corners plus the closing one)
const MIN_RING_POSITIONS: usize = 4;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("shape has no polygons")]
    Empty,
    #[error("shape contains a non-finite coordinate")]
    NonFinite,
    #[error("ring with {0} positions is degenerate")]
    DegenerateRing(usize),
    #[error("invalid circle: {0}")]
    InvalidCircle(String),
    #[error("numerical failure in {0}")]
    Numerical(&'static str),
}

/// Primitive geometry operations over geographic shapes
pub trait GeometryProvider {
    /// Point-in-polygon, boundary inclusive
    fn contains_point(&self, shape: &MultiPolygon<f64>, point: Point<f64>) -> Result<bool, GeometryError>;

    /// True when boundaries cross or one shape contains the other
    fn intersects(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<bool, GeometryError>;

    /// Great-circle distance in kilometers
    fn distance_km(&self, a: Point<f64>, b: Point<f64>) -> f64;

    /// Area on the sphere in square kilometers
    fn area_km2(&self, shape: &MultiPolygon<f64>) -> f64;

    fn union(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError>;

    /// Polygon of `steps` vertices at `radius_km` great-circle distance from `center`
    fn circle(&self, center: Point<f64>, radius_km: f64, steps: usize) -> Result<Polygon<f64>, GeometryError>;
}

/// [`GeometryProvider`] backed by the `geo` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct GeoProvider;

impl GeoProvider {
    pub fn new() -> Self {
        Self
    }
}

impl GeometryProvider for GeoProvider {
    fn contains_point(&self, shape: &MultiPolygon<f64>, point: Point<f64>) -> Result<bool, GeometryError> {
        validate_shape(shape)?;
        if !(point.x().is_finite() && point.y().is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        Ok(shape.intersects(&point))
    }

    fn intersects(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<bool, GeometryError> {
        validate_shape(a)?;
        validate_shape(b)?;
        guarded("intersects", || a.intersects(b))
    }

    fn distance_km(&self, a: Point<f64>, b: Point<f64>) -> f64 {
        a.haversine_distance(&b) / 1000.0
    }

    fn area_km2(&self, shape: &MultiPolygon<f64>) -> f64 {
        shape.chamberlain_duquette_unsigned_area() / 1_000_000.0
    }

    fn union(&self, a: &MultiPolygon<f64>, b: &MultiPolygon<f64>) -> Result<MultiPolygon<f64>, GeometryError> {
        validate_shape(a)?;
        validate_shape(b)?;
        guarded("union", || a.union(b))
    }

    fn circle(&self, center: Point<f64>, radius_km: f64, steps: usize) -> Result<Polygon<f64>, GeometryError> {
        if !(center.x().is_finite() && center.y().is_finite()) {
            return Err(GeometryError::NonFinite);
        }
        if !(radius_km.is_finite() && radius_km > 0.0) {
            return Err(GeometryError::InvalidCircle(format!("radius {radius_km} km")));
        }
        if steps < 3 {
            return Err(GeometryError::InvalidCircle(format!("{steps} steps")));
        }

        let radius_m = radius_km * 1000.0;
        let ring: Vec<(f64, f64)> = (0..steps)
            .map(|i| {
                // Counter-clockwise from north, one vertex per step
                let bearing = -360.0 * i as f64 / steps as f64;
                let p = center.haversine_destination(bearing, radius_m);
                (p.x(), p.y())
            })
            .collect();

        Ok(Polygon::new(LineString::from(ring), vec![]))
    }
}

/// Run a geometry operation, turning a panic inside the library into an error
///
/// The process panic hook still runs first, so a caught panic prints its
/// message to stderr outside of `tracing`.
fn guarded<T>(op: &'static str, f: impl FnOnce() -> T) -> Result<T, GeometryError> {
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(|_| GeometryError::Numerical(op))
}

fn validate_shape(shape: &MultiPolygon<f64>) -> Result<(), GeometryError> {
    if shape.0.is_empty() {
        return Err(GeometryError::Empty);
    }
    for polygon in &shape.0 {
        for ring in std::iter::once(polygon.exterior()).chain(polygon.interiors()) {
            let positions = ring.0.len();
            if positions < MIN_RING_POSITIONS {
                return Err(GeometryError::DegenerateRing(positions));
            }
        }
    }
    if shape.coords_iter().any(|c| !(c.x.is_finite() && c.y.is_finite())) {
        return Err(GeometryError::NonFinite);
    }
    Ok(())
}

/// Bounding box over finite coordinates; `None` for empty or non-finite shapes
pub fn bounding_box(shape: &MultiPolygon<f64>) -> Option<Rect<f64>> {
    let mut coords = shape.coords_iter().peekable();
    coords.peek()?;

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for c in coords {
        if !(c.x.is_finite() && c.y.is_finite()) {
            return None;
        }
        min_x = min_x.min(c.x);
        min_y = min_y.min(c.y);
        max_x = max_x.max(c.x);
        max_y = max_y.max(c.y);
    }

    Some(Rect::new((min_x, min_y), (max_x, max_y)))
}

/// Smallest box covering both
pub fn merge_boxes(a: &Rect<f64>, b: &Rect<f64>) -> Rect<f64> {
    Rect::new(
        (a.min().x.min(b.min().x), a.min().y.min(b.min().y)),
        (a.max().x.max(b.max().x), a.max().y.max(b.max().y)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(min_x: f64, min_y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![Polygon::new(
            LineString::from(vec![
                (min_x, min_y),
                (min_x + size, min_y),
                (min_x + size, min_y + size),
                (min_x, min_y + size),
            ]),
            vec![],
        )])
    }

    #[test]
    fn test_contains_point_includes_boundary() {
        let geo = GeoProvider::new();
        let sq = square(0.0, 0.0, 2.0);
        assert!(geo.contains_point(&sq, Point::new(1.0, 1.0)).unwrap());
        assert!(geo.contains_point(&sq, Point::new(0.0, 1.0)).unwrap());
        assert!(!geo.contains_point(&sq, Point::new(3.0, 1.0)).unwrap());
    }

    #[test]
    fn test_empty_shape_is_an_error() {
        let geo = GeoProvider::new();
        let empty = MultiPolygon::<f64>(vec![]);
        assert_eq!(
            geo.contains_point(&empty, Point::new(0.0, 0.0)),
            Err(GeometryError::Empty)
        );
        assert!(geo.intersects(&empty, &square(0.0, 0.0, 1.0)).is_err());
    }

    #[test]
    fn test_degenerate_ring_is_an_error() {
        let geo = GeoProvider::new();
        let line = MultiPolygon(vec![Polygon::new(
            LineString::from(vec![(0.0, 0.0), (1.0, 1.0)]),
            vec![],
        )]);
        assert!(matches!(
            geo.intersects(&line, &square(0.0, 0.0, 1.0)),
            Err(GeometryError::DegenerateRing(_))
        ));
    }

    #[test]
    fn test_intersects_containment_and_crossing() {
        let geo = GeoProvider::new();
        let big = square(0.0, 0.0, 10.0);
        let inner = square(2.0, 2.0, 1.0);
        let crossing = square(9.0, 9.0, 2.0);
        let far = square(20.0, 20.0, 1.0);
        assert!(geo.intersects(&big, &inner).unwrap());
        assert!(geo.intersects(&big, &crossing).unwrap());
        assert!(!geo.intersects(&big, &far).unwrap());
    }

    #[test]
    fn test_circle_vertices_at_radius() {
        let geo = GeoProvider::new();
        let center = Point::new(13.405, 52.52);
        let circle = geo.circle(center, 50.0, 32).unwrap();
        // 32 vertices plus the closing one
        assert_eq!(circle.exterior().0.len(), 33);
        for c in circle.exterior().0.iter() {
            let d = geo.distance_km(center, Point::new(c.x, c.y));
            assert!((d - 50.0).abs() < 0.01, "vertex at {d} km");
        }
    }

    #[test]
    fn test_circle_rejects_bad_input() {
        let geo = GeoProvider::new();
        let center = Point::new(0.0, 0.0);
        assert!(geo.circle(center, 0.0, 64).is_err());
        assert!(geo.circle(center, -5.0, 64).is_err());
        assert!(geo.circle(center, 10.0, 2).is_err());
        assert!(geo.circle(Point::new(f64::NAN, 0.0), 10.0, 64).is_err());
    }

    #[test]
    fn test_distance_km() {
        let geo = GeoProvider::new();
        // NYC to London: ~5,570 km
        let d = geo.distance_km(Point::new(-74.006, 40.7128), Point::new(-0.1278, 51.5074));
        assert!((d - 5570.0).abs() < 50.0);
    }

    #[test]
    fn test_union_of_disjoint_keeps_both_areas() {
        let geo = GeoProvider::new();
        let a = square(0.0, 0.0, 1.0);
        let b = square(5.0, 0.0, 1.0);
        let merged = geo.union(&a, &b).unwrap();
        assert_eq!(merged.0.len(), 2);
        let expected = geo.area_km2(&a) + geo.area_km2(&b);
        assert!((geo.area_km2(&merged) - expected).abs() / expected < 1e-9);
    }

    #[test]
    fn test_bounding_box() {
        let sq = square(-3.0, 4.0, 2.0);
        let bbox = bounding_box(&sq).unwrap();
        assert_eq!(bbox.min().x, -3.0);
        assert_eq!(bbox.max().y, 6.0);
        assert!(bounding_box(&MultiPolygon(vec![])).is_none());
    }

    #[test]
    fn test_box_overlap_is_inclusive() {
        let a = Rect::new((0.0, 0.0), (2.0, 2.0));
        let touching = Rect::new((2.0, 0.0), (3.0, 1.0));
        let apart_x = Rect::new((2.5, 0.0), (3.0, 1.0));
        let apart_y = Rect::new((0.0, 2.5), (1.0, 3.0));
        assert!(a.intersects(&touching));
        assert!(!a.intersects(&apart_x));
        assert!(!a.intersects(&apart_y));
        assert!(a.intersects(&Point::new(2.0, 2.0)));
        assert!(!a.intersects(&Point::new(2.0, 2.1)));
    }
}
