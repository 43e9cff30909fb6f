//! Summary and GeoJSON export

use crate::country::Country;
use crate::matcher::{CoverageArea, RevealResult, RevealedCountries};
use crate::scratch::ScratchSet;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RevealSummary {
    /// Countries containing a visited place
    pub revealed_countries: RevealedCountries,
    /// Countries revealed by scratch or disk coverage
    pub covered_countries: Vec<String>,
    pub scratched: Vec<String>,
    pub covered_area_km2: f64,
    pub unmerged_pairs: usize,
    pub total_countries: usize,
    pub generated_at: String,
}

impl RevealSummary {
    pub fn new(
        results: &[RevealResult],
        revealed_countries: RevealedCountries,
        scratch: &ScratchSet,
        area: &CoverageArea,
    ) -> Self {
        let mut covered_countries: Vec<String> = results
            .iter()
            .filter(|r| r.revealed)
            .map(|r| r.id.clone())
            .collect();
        covered_countries.sort();
        covered_countries.dedup();

        Self {
            revealed_countries,
            covered_countries,
            scratched: scratch.iter().map(str::to_string).collect(),
            covered_area_km2: area.total_km2,
            unmerged_pairs: area.unmerged_pairs,
            total_countries: results.len(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Countries as a FeatureCollection with reveal state in the properties
///
/// `results` must be in the same order as `countries`.
pub fn to_geojson(countries: &[Country], results: &[RevealResult]) -> serde_json::Value {
    let features: Vec<serde_json::Value> = countries
        .iter()
        .zip(results)
        .map(|(country, result)| {
            let geometry = geojson::Geometry::new(geojson::Value::from(country.geometry()));
            serde_json::json!({
                "type": "Feature",
                "geometry": geometry,
                "properties": {
                    "id": result.id,
                    "revealed": result.revealed,
                    "reason": result.reason,
                }
            })
        })
        .collect();

    serde_json::json!({
        "type": "FeatureCollection",
        "features": features,
    })
}
