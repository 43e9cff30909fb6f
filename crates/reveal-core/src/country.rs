//! Country boundaries and identifier resolution

use crate::geometry::bounding_box;
use geo::{Centroid, LineString, MultiPolygon, Point, Polygon, Rect};
use serde_json::{Map, Value};

/// Property names tried, in order, when resolving a country identifier
pub const DEFAULT_ID_FIELDS: [&str; 4] = ["name", "NAME", "ADMIN", "NAME_EN"];

/// Identifier used when none of the id fields is populated
pub const UNKNOWN_COUNTRY_ID: &str = "unknown";

/// A country boundary with its source properties
///
/// Bounding box and centroid are computed once on construction; the
/// geometry is immutable afterwards.
#[derive(Debug, Clone)]
pub struct Country {
    properties: Map<String, Value>,
    geometry: MultiPolygon<f64>,
    bbox: Option<Rect<f64>>,
    centroid: Option<Point<f64>>,
}

impl Country {
    pub fn new(properties: Map<String, Value>, geometry: MultiPolygon<f64>) -> Self {
        let bbox = bounding_box(&geometry);
        let centroid = bbox.and_then(|_| geometry.centroid());
        Self {
            properties,
            geometry,
            bbox,
            centroid,
        }
    }

    /// Country with a single `name` property
    pub fn named(name: impl Into<String>, geometry: MultiPolygon<f64>) -> Self {
        let mut properties = Map::new();
        properties.insert("name".to_string(), Value::String(name.into()));
        Self::new(properties, geometry)
    }

    /// Country from (lng, lat) rings; each ring is a separate part
    pub fn from_rings(name: impl Into<String>, rings: Vec<Vec<(f64, f64)>>) -> Self {
        let parts = rings
            .into_iter()
            .filter(|ring| !ring.is_empty())
            .map(|ring| Polygon::new(LineString::from(ring), vec![]))
            .collect();
        Self::named(name, MultiPolygon(parts))
    }

    pub fn properties(&self) -> &Map<String, Value> {
        &self.properties
    }

    pub fn geometry(&self) -> &MultiPolygon<f64> {
        &self.geometry
    }

    /// `None` when the geometry has no rings or a non-finite coordinate
    pub fn bbox(&self) -> Option<&Rect<f64>> {
        self.bbox.as_ref()
    }

    pub fn centroid(&self) -> Option<Point<f64>> {
        self.centroid
    }

    /// Countries without usable geometry are excluded from matching
    pub fn is_matchable(&self) -> bool {
        self.bbox.is_some()
    }
}

/// Prioritized list of property accessors for a country's identifier
#[derive(Debug, Clone, PartialEq)]
pub struct CountryIdExtractor {
    fields: Vec<String>,
    unknown: String,
}

impl CountryIdExtractor {
    pub fn new<I, S>(fields: I, unknown: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: fields.into_iter().map(Into::into).collect(),
            unknown: unknown.into(),
        }
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn unknown(&self) -> &str {
        &self.unknown
    }

    /// First non-empty string field, if any
    pub fn try_extract<'a>(&self, country: &'a Country) -> Option<&'a str> {
        self.fields.iter().find_map(|field| {
            country
                .properties
                .get(field)
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
        })
    }

    pub fn extract(&self, country: &Country) -> String {
        self.try_extract(country)
            .map(str::to_string)
            .unwrap_or_else(|| self.unknown.clone())
    }
}

impl Default for CountryIdExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELDS, UNKNOWN_COUNTRY_ID)
    }
}
