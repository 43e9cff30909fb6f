//! Region-coverage matching
//!
//! Two coverage strategies decide whether a country is revealed:
//!
//! 1. **Scratch**: the country's identifier is in the user's scratch set.
//! 2. **Disk**: a coverage disk touches the country. Per (country, disk)
//!    pair: bounding-box reject, centroid-in-disk, center-in-country, then a
//!    general intersection test with a distance fallback when the geometry
//!    primitive fails.
//!
//! The visited-countries statistic uses a stricter point-in-polygon test of
//! the place itself.

use crate::config::MatcherConfig;
use crate::country::{Country, CountryIdExtractor};
use crate::disk::{CoverageDisk, Place};
use crate::geometry::{bounding_box, merge_boxes, GeometryProvider};
use crate::scratch::ScratchSet;
use geo::{Intersects, MultiPolygon, Point, Rect};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

/// Why a country counts as revealed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RevealReason {
    Scratched,
    Disk { label: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RevealResult {
    pub id: String,
    pub revealed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RevealReason>,
}

/// Countries containing at least one visited place
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RevealedCountries {
    pub count: usize,
    /// Deduplicated, alphabetical
    pub names: Vec<String>,
}

/// Area under the union of all coverage disks
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoverageArea {
    pub total_km2: f64,
    /// Disjoint merged shapes summed into the total
    pub pieces: usize,
    /// Overlapping pairs whose union failed and were summed separately
    pub unmerged_pairs: usize,
}

pub struct CoverageMatcher<G> {
    geometry: G,
    config: MatcherConfig,
}

impl<G: GeometryProvider> CoverageMatcher<G> {
    pub fn new(geometry: G, config: MatcherConfig) -> Self {
        Self { geometry, config }
    }

    pub fn geometry(&self) -> &G {
        &self.geometry
    }

    pub fn config(&self) -> &MatcherConfig {
        &self.config
    }

    /// Build one disk per place with the configured radius and steps
    ///
    /// Places whose disk cannot be built are skipped.
    pub fn disks_for_places(&self, places: &[Place]) -> Vec<CoverageDisk> {
        let mut disks = Vec::with_capacity(places.len());
        for place in places {
            match CoverageDisk::for_place(
                &self.geometry,
                place,
                self.config.disk_radius_km,
                self.config.disk_steps,
            ) {
                Ok(disk) => disks.push(disk),
                Err(e) => warn!("Skipping disk for {:?}: {}", place.name, e),
            }
        }
        disks
    }

    /// True when any disk touches the country
    pub fn is_country_covered(&self, country: &Country, disks: &[CoverageDisk]) -> bool {
        self.covering_disk(country, disks).is_some()
    }

    /// First disk that touches the country
    pub fn covering_disk<'d>(&self, country: &Country, disks: &'d [CoverageDisk]) -> Option<&'d CoverageDisk> {
        let country_box = country.bbox()?;
        disks
            .iter()
            .find(|disk| self.disk_covers(country, country_box, disk))
    }

    fn disk_covers(&self, country: &Country, country_box: &Rect<f64>, disk: &CoverageDisk) -> bool {
        let Some(disk_box) = disk.bbox() else {
            return false;
        };
        if !country_box.intersects(disk_box) {
            return false;
        }

        let centroid = country.centroid();
        if let Some(c) = centroid {
            match self.geometry.contains_point(disk.shape(), c) {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => debug!("centroid-in-disk failed for {}: {}", disk.label(), e),
            }
        }

        match self.geometry.contains_point(country.geometry(), disk.center()) {
            Ok(true) => return true,
            Ok(false) => {}
            Err(e) => debug!("center-in-country failed for {}: {}", disk.label(), e),
        }

        match self.geometry.intersects(country.geometry(), disk.shape()) {
            Ok(hit) => hit,
            Err(e) => {
                let Some(c) = centroid else {
                    return false;
                };
                let distance = self.geometry.distance_km(c, disk.center());
                let limit = self.config.fallback_radius_factor * disk.radius_km();
                debug!(
                    "intersection failed for {} ({}), distance fallback {:.1} km <= {:.1} km",
                    disk.label(),
                    e,
                    distance,
                    limit
                );
                distance <= limit
            }
        }
    }

    pub fn is_country_scratched(
        &self,
        country: &Country,
        scratch: &ScratchSet,
        extractor: &CountryIdExtractor,
    ) -> bool {
        is_country_scratched(country, scratch, extractor)
    }

    /// Per-country reveal state, scratch membership first, then disks
    pub fn reveal(
        &self,
        countries: &[Country],
        disks: &[CoverageDisk],
        scratch: &ScratchSet,
        extractor: &CountryIdExtractor,
    ) -> Vec<RevealResult> {
        countries
            .iter()
            .map(|country| {
                let id = extractor.extract(country);
                let reason = if scratch.contains(&id) {
                    Some(RevealReason::Scratched)
                } else {
                    self.covering_disk(country, disks).map(|disk| RevealReason::Disk {
                        label: disk.label().to_string(),
                    })
                };
                RevealResult {
                    id,
                    revealed: reason.is_some(),
                    reason,
                }
            })
            .collect()
    }

    /// Countries containing at least one of the places
    pub fn compute_revealed_countries(
        &self,
        countries: &[Country],
        places: &[Place],
        extractor: &CountryIdExtractor,
    ) -> RevealedCountries {
        let points: Vec<Point<f64>> = places.iter().map(Place::point).collect();
        self.revealed_from_points(countries, &points, extractor)
    }

    /// Same as [`Self::compute_revealed_countries`] using each disk's center
    pub fn compute_revealed_from_disks(
        &self,
        countries: &[Country],
        disks: &[CoverageDisk],
        extractor: &CountryIdExtractor,
    ) -> RevealedCountries {
        let points: Vec<Point<f64>> = disks.iter().map(CoverageDisk::center).collect();
        self.revealed_from_points(countries, &points, extractor)
    }

    fn revealed_from_points(
        &self,
        countries: &[Country],
        points: &[Point<f64>],
        extractor: &CountryIdExtractor,
    ) -> RevealedCountries {
        if points.is_empty() {
            return RevealedCountries::default();
        }

        let candidates: Vec<(&Country, &Rect<f64>)> = countries
            .iter()
            .filter_map(|c| c.bbox().map(|bbox| (c, bbox)))
            .collect();

        let mut names = BTreeSet::new();
        for point in points {
            let containing = candidates.iter().find(|(country, bbox)| {
                bbox.intersects(point)
                    && self
                        .geometry
                        .contains_point(country.geometry(), *point)
                        .unwrap_or(false)
            });
            if let Some((country, _)) = containing {
                names.insert(extractor.extract(country));
            }
        }

        let names: Vec<String> = names.into_iter().collect();
        debug!("{} places fall in {} countries", points.len(), names.len());
        RevealedCountries {
            count: names.len(),
            names,
        }
    }

    /// Total area under the union of disks
    ///
    /// Overlapping shapes are merged first so overlaps count once. A pair
    /// whose union fails stays separate and is summed twice.
    pub fn covered_area(&self, disks: &[CoverageDisk]) -> CoverageArea {
        let mut pieces: Vec<(MultiPolygon<f64>, Rect<f64>)> = Vec::new();
        let mut unmerged_pairs = 0;

        for disk in disks {
            let Some(disk_box) = disk.bbox() else {
                continue;
            };
            let mut shape = disk.shape().clone();
            let mut shape_box = *disk_box;
            let mut remaining = Vec::with_capacity(pieces.len() + 1);

            for (piece, piece_box) in pieces.drain(..) {
                if !shape_box.intersects(&piece_box) {
                    remaining.push((piece, piece_box));
                    continue;
                }
                match self.geometry.union(&shape, &piece) {
                    Ok(merged) => {
                        shape_box = bounding_box(&merged).unwrap_or_else(|| merge_boxes(&shape_box, &piece_box));
                        shape = merged;
                    }
                    Err(e) => {
                        warn!("Union with {} failed, counting separately: {}", disk.label(), e);
                        unmerged_pairs += 1;
                        remaining.push((piece, piece_box));
                    }
                }
            }

            remaining.push((shape, shape_box));
            pieces = remaining;
        }

        let total_km2 = pieces
            .iter()
            .map(|(piece, _)| self.geometry.area_km2(piece))
            .sum();

        info!(
            "Covered area {:.1} km2 from {} disks ({} pieces, {} unmerged pairs)",
            total_km2,
            disks.len(),
            pieces.len(),
            unmerged_pairs
        );

        CoverageArea {
            total_km2,
            pieces: pieces.len(),
            unmerged_pairs,
        }
    }
}

/// Identifier membership test; no geometry involved
pub fn is_country_scratched(country: &Country, scratch: &ScratchSet, extractor: &CountryIdExtractor) -> bool {
    scratch.contains(&extractor.extract(country))
}
