//! Globe Reveal Core
//!
//! Decides which countries on the globe count as "revealed" and computes the
//! statistics shown alongside the globe.
//!
//! # Coverage Strategies
//!
//! | Strategy | Input | Test |
//! |----------|-------|------|
//! | Scratch  | identifiers clicked or dragged over by the user | id membership |
//! | Disk     | coverage disks around geocoded places | box reject, centroid-in-disk, center-in-country, intersection |
//!
//! The "N countries visited" statistic is stricter than either strategy: a
//! country only counts once a place *point* lies inside its polygon.
//!
//! All matching is pure. Storage and geocoding live behind explicit objects
//! ([`store::KeyValueStore`], [`geocode::GeocodeCache`]) owned by the caller.

use thiserror::Error;

pub mod config;
pub mod country;
pub mod disk;
pub mod export;
pub mod geocode;
pub mod geometry;
pub mod loader;
pub mod matcher;
pub mod memo;
pub mod scratch;
pub mod store;

pub use config::MatcherConfig;
pub use country::{Country, CountryIdExtractor};
pub use disk::{CoverageDisk, Place};
pub use geocode::{GeocodeCache, GeocodeEntry};
pub use geometry::{GeoProvider, GeometryError, GeometryProvider};
pub use matcher::{CoverageArea, CoverageMatcher, RevealReason, RevealResult, RevealedCountries};
pub use memo::RevealSession;
pub use scratch::{PersistentScratchSet, ScratchSet};
pub use store::{FileStore, KeyValueStore, MemoryStore};

#[derive(Error, Debug)]
pub enum RevealError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
    #[error("Expected a FeatureCollection, found {0}")]
    NotAFeatureCollection(&'static str),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, RevealError>;
