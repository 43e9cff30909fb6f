//! Countries the user has scratched off directly

use crate::store::KeyValueStore;
use crate::Result;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// Store key holding the scratch set as a JSON array of strings
pub const SCRATCH_STORAGE_KEY: &str = "scratched-countries";

/// Set of country identifiers marked revealed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScratchSet(BTreeSet<String>);

impl ScratchSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Returns true if the id was newly added
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    /// Returns true if the id was present
    pub fn remove(&mut self, id: &str) -> bool {
        self.0.remove(id)
    }

    /// Flip membership; returns the new state
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.0.remove(id) {
            false
        } else {
            self.0.insert(id.to_string());
            true
        }
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for ScratchSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

/// Scratch set written through to a store on every mutation
pub struct PersistentScratchSet<S> {
    set: ScratchSet,
    store: S,
}

impl<S: KeyValueStore> PersistentScratchSet<S> {
    /// Load the saved set; a missing or unreadable entry starts empty
    pub fn load(store: S) -> Result<Self> {
        let set = match store.get(SCRATCH_STORAGE_KEY)? {
            Some(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!("Discarding unreadable scratch set: {}", e);
                ScratchSet::new()
            }),
            None => ScratchSet::new(),
        };
        debug!("Loaded {} scratched countries", set.len());
        Ok(Self { set, store })
    }

    pub fn set(&self) -> &ScratchSet {
        &self.set
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    pub fn insert(&mut self, id: impl Into<String>) -> Result<bool> {
        let added = self.set.insert(id);
        self.save()?;
        Ok(added)
    }

    pub fn remove(&mut self, id: &str) -> Result<bool> {
        let removed = self.set.remove(id);
        self.save()?;
        Ok(removed)
    }

    pub fn toggle(&mut self, id: &str) -> Result<bool> {
        let now = self.set.toggle(id);
        self.save()?;
        Ok(now)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.set.clear();
        self.save()
    }

    fn save(&mut self) -> Result<()> {
        let raw = serde_json::to_string(&self.set)?;
        self.store.set(SCRATCH_STORAGE_KEY, &raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_membership() {
        let mut set = ScratchSet::new();
        assert!(set.insert("France"));
        assert!(!set.insert("France"));
        assert!(set.contains("France"));
        assert!(set.remove("France"));
        assert!(!set.contains("France"));
    }

    #[test]
    fn test_toggle() {
        let mut set = ScratchSet::new();
        assert!(set.toggle("Peru"));
        assert!(set.contains("Peru"));
        assert!(!set.toggle("Peru"));
        assert!(set.is_empty());
    }

    #[test]
    fn test_serializes_as_string_array() {
        let set: ScratchSet = ["b", "a"].into_iter().collect();
        assert_eq!(serde_json::to_string(&set).unwrap(), r#"["a","b"]"#);
    }

    #[test]
    fn test_every_mutation_persists() {
        let mut scratch = PersistentScratchSet::load(MemoryStore::new()).unwrap();
        scratch.insert("Japan").unwrap();
        scratch.toggle("Chile").unwrap();
        assert_eq!(
            scratch.store().get(SCRATCH_STORAGE_KEY).unwrap().as_deref(),
            Some(r#"["Chile","Japan"]"#)
        );

        scratch.remove("Japan").unwrap();
        let reloaded = PersistentScratchSet::load(scratch.into_store()).unwrap();
        assert!(reloaded.set().contains("Chile"));
        assert!(!reloaded.set().contains("Japan"));
    }

    #[test]
    fn test_clear_persists_empty_array() {
        let mut scratch = PersistentScratchSet::load(MemoryStore::new()).unwrap();
        scratch.insert("Japan").unwrap();
        scratch.clear().unwrap();
        assert_eq!(
            scratch.store().get(SCRATCH_STORAGE_KEY).unwrap().as_deref(),
            Some("[]")
        );
    }

    #[test]
    fn test_unreadable_entry_starts_empty() {
        let mut store = MemoryStore::new();
        store.set(SCRATCH_STORAGE_KEY, "{oops").unwrap();
        let scratch = PersistentScratchSet::load(store).unwrap();
        assert!(scratch.set().is_empty());
    }
}
