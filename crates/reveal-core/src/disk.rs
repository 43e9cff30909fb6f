//! Visited places and the coverage disks built around them

use crate::geometry::{bounding_box, GeometryError, GeometryProvider};
use geo::{LineString, MultiPolygon, Point, Polygon, Rect};
use serde::{Deserialize, Serialize};

/// A geocoded place
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

impl Place {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
            address: None,
        }
    }

    pub fn point(&self) -> Point<f64> {
        Point::new(self.lng, self.lat)
    }

    /// Address when known, otherwise the place name
    pub fn label(&self) -> &str {
        self.address.as_deref().unwrap_or(&self.name)
    }
}

/// Polygonal approximation of a circle around a place
#[derive(Debug, Clone)]
pub struct CoverageDisk {
    label: String,
    center_lat: f64,
    center_lng: f64,
    radius_km: f64,
    shape: MultiPolygon<f64>,
    bbox: Option<Rect<f64>>,
}

impl CoverageDisk {
    /// Build a disk of `steps` vertices around (lat, lng)
    pub fn around<G: GeometryProvider>(
        geometry: &G,
        label: impl Into<String>,
        lat: f64,
        lng: f64,
        radius_km: f64,
        steps: usize,
    ) -> Result<Self, GeometryError> {
        let polygon = geometry.circle(Point::new(lng, lat), radius_km, steps)?;
        Ok(Self::from_shape(label.into(), lat, lng, radius_km, MultiPolygon(vec![polygon])))
    }

    pub fn for_place<G: GeometryProvider>(
        geometry: &G,
        place: &Place,
        radius_km: f64,
        steps: usize,
    ) -> Result<Self, GeometryError> {
        Self::around(geometry, place.label(), place.lat, place.lng, radius_km, steps)
    }

    /// Disk from externally computed (lng, lat) vertices
    pub fn from_vertices(
        label: impl Into<String>,
        lat: f64,
        lng: f64,
        radius_km: f64,
        vertices: Vec<(f64, f64)>,
    ) -> Self {
        let shape = if vertices.is_empty() {
            MultiPolygon(vec![])
        } else {
            MultiPolygon(vec![Polygon::new(LineString::from(vertices), vec![])])
        };
        Self::from_shape(label.into(), lat, lng, radius_km, shape)
    }

    fn from_shape(label: String, lat: f64, lng: f64, radius_km: f64, shape: MultiPolygon<f64>) -> Self {
        let bbox = bounding_box(&shape);
        Self {
            label,
            center_lat: lat,
            center_lng: lng,
            radius_km,
            shape,
            bbox,
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn center_lat(&self) -> f64 {
        self.center_lat
    }

    pub fn center_lng(&self) -> f64 {
        self.center_lng
    }

    pub fn center(&self) -> Point<f64> {
        Point::new(self.center_lng, self.center_lat)
    }

    pub fn radius_km(&self) -> f64 {
        self.radius_km
    }

    pub fn shape(&self) -> &MultiPolygon<f64> {
        &self.shape
    }

    pub fn bbox(&self) -> Option<&Rect<f64>> {
        self.bbox.as_ref()
    }
}
