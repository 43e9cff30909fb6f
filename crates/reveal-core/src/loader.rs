//! Data loading from GeoJSON and JSON files

use crate::country::Country;
use crate::disk::{CoverageDisk, Place};
use crate::geocode::GeocodeCache;
use crate::{Result, RevealError};
use geo::{Geometry, MultiPolygon};
use geojson::GeoJson;
use serde::Deserialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info, warn};

/// Raw place record from JSON
#[derive(Debug, Deserialize)]
struct RawPlace {
    name: Option<String>,
    #[serde(alias = "latitude")]
    lat: Option<f64>,
    #[serde(alias = "longitude", alias = "lon")]
    lng: Option<f64>,
    /// Free-text address resolved through the geocode cache
    query: Option<String>,
    address: Option<String>,
}

/// Raw externally built coverage disk
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDisk {
    center_lat: f64,
    center_lng: f64,
    radius_km: f64,
    #[serde(default)]
    vertices: Vec<[f64; 2]>,
    label: Option<String>,
}

/// Load country boundaries from a GeoJSON FeatureCollection file
pub fn load_countries(path: impl AsRef<Path>) -> Result<Vec<Country>> {
    let path = path.as_ref();
    info!("Loading countries from {:?}", path);
    let text = fs::read_to_string(path)?;
    countries_from_geojson(&text)
}

/// Parse countries; features without polygon geometry are skipped
pub fn countries_from_geojson(text: &str) -> Result<Vec<Country>> {
    let geojson: GeoJson = text.parse()?;
    let collection = match geojson {
        GeoJson::FeatureCollection(fc) => fc,
        GeoJson::Feature(_) => return Err(RevealError::NotAFeatureCollection("Feature")),
        GeoJson::Geometry(_) => return Err(RevealError::NotAFeatureCollection("Geometry")),
    };

    let mut countries = Vec::with_capacity(collection.features.len());
    let mut skipped = 0;

    for (i, feature) in collection.features.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            skipped += 1;
            continue;
        };
        let shape = match Geometry::<f64>::try_from(geometry.value) {
            Ok(Geometry::Polygon(p)) => MultiPolygon(vec![p]),
            Ok(Geometry::MultiPolygon(mp)) => mp,
            Ok(_) => {
                debug!("Feature {} is not a polygon, skipping", i);
                skipped += 1;
                continue;
            }
            Err(e) => {
                warn!("Feature {} has unreadable geometry: {}", i, e);
                skipped += 1;
                continue;
            }
        };

        let country = Country::new(feature.properties.unwrap_or_default(), shape);
        if !country.is_matchable() {
            skipped += 1;
            continue;
        }
        countries.push(country);
    }

    info!(
        "Loaded {} countries ({} skipped for missing geometry)",
        countries.len(),
        skipped
    );

    Ok(countries)
}

/// Load places from a JSON array, resolving queries through `cache`
pub fn load_places(path: impl AsRef<Path>, cache: &GeocodeCache) -> Result<Vec<Place>> {
    let path = path.as_ref();
    info!("Loading places from {:?}", path);

    let file = File::open(path)?;
    let raw: Vec<RawPlace> = serde_json::from_reader(BufReader::new(file))?;
    Ok(resolve_places(raw, cache))
}

pub fn places_from_json(text: &str, cache: &GeocodeCache) -> Result<Vec<Place>> {
    let raw: Vec<RawPlace> = serde_json::from_str(text)?;
    Ok(resolve_places(raw, cache))
}

fn resolve_places(raw: Vec<RawPlace>, cache: &GeocodeCache) -> Vec<Place> {
    let mut places = Vec::with_capacity(raw.len());
    let mut unresolved = 0;

    for (i, record) in raw.into_iter().enumerate() {
        match (record.lat, record.lng, record.query) {
            (Some(lat), Some(lng), query) => places.push(Place {
                name: record.name.or(query).unwrap_or_else(|| format!("place-{}", i)),
                lat,
                lng,
                address: record.address,
            }),
            (_, _, Some(query)) => match cache.get(&query) {
                Some(hit) => places.push(Place {
                    name: record.name.unwrap_or_else(|| query.clone()),
                    lat: hit.lat,
                    lng: hit.lng,
                    address: record.address.or_else(|| Some(hit.formatted_address.clone())),
                }),
                None => {
                    debug!("No geocode for {:?}", query);
                    unresolved += 1;
                }
            },
            _ => unresolved += 1,
        }
    }

    info!(
        "Loaded {} places ({} without coordinates or geocode)",
        places.len(),
        unresolved
    );

    places
}

/// Load externally built coverage disks
pub fn load_disks(path: impl AsRef<Path>) -> Result<Vec<CoverageDisk>> {
    let path = path.as_ref();
    info!("Loading coverage disks from {:?}", path);

    let file = File::open(path)?;
    let raw: Vec<RawDisk> = serde_json::from_reader(BufReader::new(file))?;

    let disks: Vec<CoverageDisk> = raw
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let vertices = d.vertices.into_iter().map(|[lng, lat]| (lng, lat)).collect();
            CoverageDisk::from_vertices(
                d.label.unwrap_or_else(|| format!("disk-{}", i)),
                d.center_lat,
                d.center_lng,
                d.radius_km,
                vertices,
            )
        })
        .collect();

    info!("Loaded {} coverage disks", disks.len());
    Ok(disks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::country::CountryIdExtractor;
    use crate::geocode::GeocodeEntry;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const COUNTRIES: &str = r#"{
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "properties": {"ADMIN": "Aland"},
             "geometry": {"type": "Polygon", "coordinates": [[[19.3, 59.8], [21.2, 59.8], [21.2, 60.5], [19.3, 60.5], [19.3, 59.8]]]}},
            {"type": "Feature", "properties": {"NAME_EN": "Two Islands"},
             "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[0, 0], [1, 0], [1, 1], [0, 1], [0, 0]]],
                [[[3, 0], [4, 0], [4, 1], [3, 1], [3, 0]]]]}},
            {"type": "Feature", "properties": {"name": "Capital"},
             "geometry": {"type": "Point", "coordinates": [1, 1]}},
            {"type": "Feature", "properties": {"name": "Lost"}, "geometry": null},
            {"type": "Feature", "properties": {"name": "Hollow"},
             "geometry": {"type": "MultiPolygon", "coordinates": []}}
        ]
    }"#;

    #[test]
    fn test_countries_from_geojson() {
        let countries = countries_from_geojson(COUNTRIES).unwrap();
        assert_eq!(countries.len(), 2);

        let extractor = CountryIdExtractor::default();
        assert_eq!(extractor.extract(&countries[0]), "Aland");
        assert_eq!(extractor.extract(&countries[1]), "Two Islands");
        assert_eq!(countries[1].geometry().0.len(), 2);
    }

    #[test]
    fn test_rejects_bare_geometry() {
        let text = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(matches!(
            countries_from_geojson(text),
            Err(RevealError::NotAFeatureCollection("Geometry"))
        ));
    }

    #[test]
    fn test_load_countries_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(COUNTRIES.as_bytes()).unwrap();
        assert_eq!(load_countries(file.path()).unwrap().len(), 2);
    }

    #[test]
    fn test_places_with_coordinates_and_queries() {
        let mut bundled = HashMap::new();
        bundled.insert(
            "mariehamn".to_string(),
            GeocodeEntry {
                lat: 60.0973,
                lng: 19.9348,
                formatted_address: "Mariehamn, Aland".to_string(),
            },
        );
        let cache = GeocodeCache::with_bundled(bundled);

        let json = r#"[
            {"name": "Home", "latitude": 40.0, "longitude": -74.0},
            {"query": "Mariehamn"},
            {"name": "Nowhere", "query": "atlantis"},
            {"name": "No coords"}
        ]"#;

        let places = places_from_json(json, &cache).unwrap();
        assert_eq!(places.len(), 2);
        assert_eq!(places[0].name, "Home");
        assert_eq!(places[1].name, "Mariehamn");
        assert_eq!(places[1].address.as_deref(), Some("Mariehamn, Aland"));
    }

    #[test]
    fn test_load_places_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"[{"name": "Oslo", "lat": 59.91, "lng": 10.75}]"#).unwrap();
        let places = load_places(file.path(), &GeocodeCache::new()).unwrap();
        assert_eq!(places[0].lng, 10.75);
    }

    #[test]
    fn test_load_disks() {
        let json = r#"[
            {"centerLat": 0.5, "centerLng": 0.5, "radiusKm": 10.0,
             "vertices": [[0.4, 0.4], [0.6, 0.4], [0.6, 0.6], [0.4, 0.6]], "label": "box"},
            {"centerLat": 5.0, "centerLng": 5.0, "radiusKm": 1.0}
        ]"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let disks = load_disks(file.path()).unwrap();
        assert_eq!(disks.len(), 2);
        assert_eq!(disks[0].label(), "box");
        assert!(disks[0].bbox().is_some());
        assert_eq!(disks[1].label(), "disk-1");
        assert!(disks[1].bbox().is_none());
    }
}
