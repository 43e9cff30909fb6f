//! Matcher configuration

use crate::country::{CountryIdExtractor, DEFAULT_ID_FIELDS, UNKNOWN_COUNTRY_ID};
use crate::{Result, RevealError};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Radius of the disk drawn around each visited place
pub const DEFAULT_DISK_RADIUS_KM: f64 = 100.0;

/// Vertices per coverage disk
pub const DEFAULT_DISK_STEPS: usize = 64;

/// Distance fallback: covered when centroid is within this many radii of the disk center
pub const FALLBACK_RADIUS_FACTOR: f64 = 1.5;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    pub disk_radius_km: f64,
    pub disk_steps: usize,
    pub fallback_radius_factor: f64,
    /// Country property names tried in order for the identifier
    pub id_fields: Vec<String>,
    pub unknown_id: String,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            disk_radius_km: DEFAULT_DISK_RADIUS_KM,
            disk_steps: DEFAULT_DISK_STEPS,
            fallback_radius_factor: FALLBACK_RADIUS_FACTOR,
            id_fields: DEFAULT_ID_FIELDS.iter().map(|s| s.to_string()).collect(),
            unknown_id: UNKNOWN_COUNTRY_ID.to_string(),
        }
    }
}

impl MatcherConfig {
    /// Load from a JSON file; missing fields take their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading matcher config from {:?}", path);

        let file = File::open(path)?;
        let config: Self = serde_json::from_reader(BufReader::new(file))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.disk_radius_km.is_finite() && self.disk_radius_km > 0.0) {
            return Err(RevealError::InvalidConfig(format!(
                "disk_radius_km must be positive, got {}",
                self.disk_radius_km
            )));
        }
        if self.disk_steps < 3 {
            return Err(RevealError::InvalidConfig(format!(
                "disk_steps must be at least 3, got {}",
                self.disk_steps
            )));
        }
        if !(self.fallback_radius_factor.is_finite() && self.fallback_radius_factor >= 0.0) {
            return Err(RevealError::InvalidConfig(format!(
                "fallback_radius_factor must be non-negative, got {}",
                self.fallback_radius_factor
            )));
        }
        if self.id_fields.is_empty() {
            return Err(RevealError::InvalidConfig("id_fields is empty".into()));
        }
        Ok(())
    }

    pub fn id_extractor(&self) -> CountryIdExtractor {
        CountryIdExtractor::new(self.id_fields.iter().cloned(), self.unknown_id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = MatcherConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.id_extractor(), CountryIdExtractor::default());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"disk_radius_km": 250.0}"#).unwrap();

        let config = MatcherConfig::from_file(file.path()).unwrap();
        assert_eq!(config.disk_radius_km, 250.0);
        assert_eq!(config.disk_steps, DEFAULT_DISK_STEPS);
        assert_eq!(config.fallback_radius_factor, FALLBACK_RADIUS_FACTOR);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = MatcherConfig::default();
        config.disk_steps = 2;
        assert!(matches!(config.validate(), Err(RevealError::InvalidConfig(_))));

        let mut config = MatcherConfig::default();
        config.disk_radius_km = -1.0;
        assert!(config.validate().is_err());

        let mut config = MatcherConfig::default();
        config.id_fields.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_file_rejected() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"disk_steps": 1}"#).unwrap();
        assert!(MatcherConfig::from_file(file.path()).is_err());
    }
}
