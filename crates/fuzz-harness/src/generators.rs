//! Geographic generators for property-based testing
//!
//! Coordinates are degrees; rings are (lng, lat) pairs.

use proptest::prelude::*;

/// Kilometers per degree of latitude (and of longitude at the equator)
pub const KM_PER_DEGREE: f64 = 111.195;

/// Axis-aligned square country
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SquareSpec {
    pub min_lng: f64,
    pub min_lat: f64,
    pub size_deg: f64,
}

impl SquareSpec {
    /// Open ring, counter-clockwise from the south-west corner
    pub fn ring(&self) -> Vec<(f64, f64)> {
        let (x, y, s) = (self.min_lng, self.min_lat, self.size_deg);
        vec![(x, y), (x + s, y), (x + s, y + s), (x, y + s)]
    }

    /// (lat, lng) of the center
    pub fn center(&self) -> (f64, f64) {
        (
            self.min_lat + self.size_deg / 2.0,
            self.min_lng + self.size_deg / 2.0,
        )
    }

    /// Same square moved east by `degrees`
    pub fn shifted_east(&self, degrees: f64) -> Self {
        Self {
            min_lng: self.min_lng + degrees,
            ..*self
        }
    }

    /// Shortest ground distance across the square, in km
    ///
    /// Longitude degrees shrink toward the poles, so this uses the
    /// latitude edge farthest from the equator.
    pub fn min_width_km(&self) -> f64 {
        let max_abs_lat = self.min_lat.abs().max((self.min_lat + self.size_deg).abs());
        self.size_deg * KM_PER_DEGREE * max_abs_lat.to_radians().cos()
    }
}

/// Coverage disk parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiskSpec {
    pub lat: f64,
    pub lng: f64,
    pub radius_km: f64,
}

impl DiskSpec {
    /// Disk at the square's center, well inside it
    pub fn inside(square: &SquareSpec) -> Self {
        let (lat, lng) = square.center();
        Self {
            lat,
            lng,
            radius_km: square.min_width_km() * 0.25,
        }
    }

    /// Concentric disk with a fraction of this radius
    pub fn shrunk(&self, factor: f64) -> Self {
        Self {
            radius_km: self.radius_km * factor,
            ..*self
        }
    }
}

// ============================================================================
// Coordinate Generators
// ============================================================================

/// Latitude (-90 to 90 deg)
pub fn latitude_deg() -> impl Strategy<Value = f64> {
    -90.0f64..=90.0
}

/// Longitude (-180 to 180 deg)
pub fn longitude_deg() -> impl Strategy<Value = f64> {
    -180.0f64..=180.0
}

/// Latitude away from the poles (-60 to 60 deg)
pub fn mid_latitude_deg() -> impl Strategy<Value = f64> {
    -60.0f64..=60.0
}

/// Coverage radius (5-500 km)
pub fn radius_km() -> impl Strategy<Value = f64> {
    5.0f64..=500.0
}

/// Vertex count for disk polygons
pub fn disk_steps() -> impl Strategy<Value = usize> {
    prop_oneof![Just(16usize), Just(32usize), Just(64usize)]
}

// ============================================================================
// Shape Generators
// ============================================================================

/// Square country (1-10 deg), clear of the poles and the antimeridian
///
/// Leaves at least 60 deg of room to the east for a shifted copy.
pub fn square_country() -> impl Strategy<Value = SquareSpec> {
    (-150.0f64..=100.0, -60.0f64..=50.0, 1.0f64..=10.0).prop_map(|(min_lng, min_lat, size_deg)| {
        SquareSpec {
            min_lng,
            min_lat,
            size_deg,
        }
    })
}

/// Small square country (0.05-0.5 deg)
pub fn small_square_country() -> impl Strategy<Value = SquareSpec> {
    (-150.0f64..=150.0, -60.0f64..=60.0, 0.05f64..=0.5).prop_map(|(min_lng, min_lat, size_deg)| {
        SquareSpec {
            min_lng,
            min_lat,
            size_deg,
        }
    })
}

/// Disk anywhere away from the poles and the antimeridian
pub fn disk() -> impl Strategy<Value = DiskSpec> {
    (mid_latitude_deg(), -170.0f64..=170.0, radius_km())
        .prop_map(|(lat, lng, radius_km)| DiskSpec { lat, lng, radius_km })
}

/// Square plus a disk whose center lies within a few square-widths of it
pub fn square_with_nearby_disk() -> impl Strategy<Value = (SquareSpec, DiskSpec)> {
    square_country().prop_flat_map(|square| {
        let (lat, lng) = square.center();
        let reach = square.size_deg * 2.0;
        (
            Just(square),
            (lat - reach..=lat + reach, lng - reach..=lng + reach, radius_km())
                .prop_map(|(lat, lng, radius_km)| DiskSpec { lat, lng, radius_km }),
        )
    })
}

/// 1 to `max` disks clustered in one region so unions overlap
pub fn disk_cluster(max: usize) -> impl Strategy<Value = Vec<DiskSpec>> {
    (mid_latitude_deg(), -170.0f64..=170.0).prop_flat_map(move |(lat, lng)| {
        prop::collection::vec(
            (-2.0f64..=2.0, -2.0f64..=2.0, 20.0f64..=200.0).prop_map(move |(dlat, dlng, radius_km)| {
                DiskSpec {
                    lat: (lat + dlat).clamp(-60.0, 60.0),
                    lng: lng + dlng,
                    radius_km,
                }
            }),
            1..=max,
        )
    })
}

/// Country identifier
pub fn country_id() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,12}"
}
