//! Geocode cache: bundled results plus a user overlay

use crate::store::KeyValueStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{info, warn};

/// Store key holding the overlay as a JSON object
pub const GEOCODE_STORAGE_KEY: &str = "geocode-cache";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodeEntry {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
}

/// Cache keys are trimmed and lower-cased
pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Lookups hit the overlay first, then the bundled data
#[derive(Debug, Clone, Default)]
pub struct GeocodeCache {
    bundled: HashMap<String, GeocodeEntry>,
    overlay: HashMap<String, GeocodeEntry>,
    /// Overlay has entries the store has not seen
    dirty: bool,
}

impl GeocodeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bundled(bundled: HashMap<String, GeocodeEntry>) -> Self {
        Self {
            bundled: normalize_keys(bundled),
            overlay: HashMap::new(),
            dirty: false,
        }
    }

    /// Bundled data from a JSON object of query -> entry
    pub fn from_seed_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading geocode seed from {:?}", path);

        let file = File::open(path)?;
        let bundled: HashMap<String, GeocodeEntry> = serde_json::from_reader(BufReader::new(file))?;
        info!("Loaded {} bundled geocode entries", bundled.len());
        Ok(Self::with_bundled(bundled))
    }

    /// Merge the overlay saved in `store`; an unreadable overlay is ignored
    pub fn load_overlay<S: KeyValueStore>(&mut self, store: &S) -> Result<()> {
        let Some(raw) = store.get(GEOCODE_STORAGE_KEY)? else {
            return Ok(());
        };
        match serde_json::from_str::<HashMap<String, GeocodeEntry>>(&raw) {
            Ok(entries) => {
                info!("Loaded {} overlay geocode entries", entries.len());
                self.overlay.extend(normalize_keys(entries));
            }
            Err(e) => warn!("Ignoring unreadable geocode overlay: {}", e),
        }
        Ok(())
    }

    /// Write the overlay back to `store` if it changed since the last write
    ///
    /// Returns whether anything was written.
    pub fn persist<S: KeyValueStore>(&mut self, store: &mut S) -> Result<bool> {
        if !self.dirty {
            return Ok(false);
        }
        let raw = serde_json::to_string(&self.overlay)?;
        store.set(GEOCODE_STORAGE_KEY, &raw)?;
        self.dirty = false;
        Ok(true)
    }

    pub fn get(&self, query: &str) -> Option<&GeocodeEntry> {
        let key = normalize_query(query);
        self.overlay.get(&key).or_else(|| self.bundled.get(&key))
    }

    /// Record a fresh result in the overlay
    pub fn insert(&mut self, query: &str, entry: GeocodeEntry) {
        self.overlay.insert(normalize_query(query), entry);
        self.dirty = true;
    }

    /// Distinct queries across bundled data and overlay
    pub fn len(&self) -> usize {
        self.bundled.len() + self.overlay.keys().filter(|k| !self.bundled.contains_key(*k)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.bundled.is_empty() && self.overlay.is_empty()
    }
}

fn normalize_keys(entries: HashMap<String, GeocodeEntry>) -> HashMap<String, GeocodeEntry> {
    entries
        .into_iter()
        .map(|(k, v)| (normalize_query(&k), v))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn entry(lat: f64, lng: f64, address: &str) -> GeocodeEntry {
        GeocodeEntry {
            lat,
            lng,
            formatted_address: address.to_string(),
        }
    }

    #[test]
    fn test_lookup_is_case_and_space_insensitive() {
        let mut bundled = HashMap::new();
        bundled.insert("Paris, France".to_string(), entry(48.8566, 2.3522, "Paris, France"));
        let cache = GeocodeCache::with_bundled(bundled);

        assert!(cache.get("  paris, FRANCE ").is_some());
        assert!(cache.get("Lyon").is_none());
    }

    #[test]
    fn test_overlay_wins_on_collision() {
        let mut bundled = HashMap::new();
        bundled.insert("springfield".to_string(), entry(39.8, -89.6, "Springfield, IL"));
        let mut cache = GeocodeCache::with_bundled(bundled);

        let mut store = MemoryStore::new();
        store
            .set(
                GEOCODE_STORAGE_KEY,
                r#"{"Springfield": {"lat": 44.05, "lng": -123.02, "formattedAddress": "Springfield, OR"}}"#,
            )
            .unwrap();
        cache.load_overlay(&store).unwrap();

        assert_eq!(cache.get("springfield").unwrap().formatted_address, "Springfield, OR");
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_insert_and_persist_round_trip() {
        let mut cache = GeocodeCache::new();
        cache.insert("Reykjavik", entry(64.1466, -21.9426, "Reykjavik, Iceland"));

        let mut store = MemoryStore::new();
        assert!(cache.persist(&mut store).unwrap());
        assert!(!cache.persist(&mut store).unwrap());

        let mut reloaded = GeocodeCache::new();
        reloaded.load_overlay(&store).unwrap();
        assert_eq!(reloaded.get("reykjavik"), cache.get("REYKJAVIK"));
    }

    #[test]
    fn test_unchanged_overlay_not_rewritten() {
        let mut bundled = HashMap::new();
        bundled.insert("tallinn".to_string(), entry(59.437, 24.7536, "Tallinn, Estonia"));
        let mut cache = GeocodeCache::with_bundled(bundled);

        let mut store = MemoryStore::new();
        cache.load_overlay(&store).unwrap();
        assert!(!cache.persist(&mut store).unwrap());
        assert_eq!(store.get(GEOCODE_STORAGE_KEY).unwrap(), None);
    }

    #[test]
    fn test_unreadable_overlay_ignored() {
        let mut store = MemoryStore::new();
        store.set(GEOCODE_STORAGE_KEY, "[1, 2]").unwrap();
        let mut cache = GeocodeCache::new();
        cache.load_overlay(&store).unwrap();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_seed_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(br#"{"Tokyo": {"lat": 35.68, "lng": 139.69, "formattedAddress": "Tokyo, Japan"}}"#)
            .unwrap();
        let cache = GeocodeCache::from_seed_file(file.path()).unwrap();
        assert_eq!(cache.get("tokyo").unwrap().lng, 139.69);
    }
}
