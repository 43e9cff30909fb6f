//! Memoized reveal state
//!
//! [`RevealSession`] holds the three inputs (countries, disks, scratch set),
//! each tagged with a version counter bumped on every mutation. Derived
//! results are cached against the versions of the inputs they read, so a
//! change to one input only recomputes what depends on it.

use crate::country::{Country, CountryIdExtractor};
use crate::disk::CoverageDisk;
use crate::geometry::GeometryProvider;
use crate::matcher::{CoverageArea, CoverageMatcher, RevealResult, RevealedCountries};
use crate::scratch::ScratchSet;
use tracing::debug;

/// A value with a version counter bumped on every mutation
#[derive(Debug, Clone, Default)]
pub struct Versioned<T> {
    value: T,
    version: u64,
}

impl<T> Versioned<T> {
    pub fn new(value: T) -> Self {
        Self { value, version: 0 }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn replace(&mut self, value: T) -> T {
        self.version += 1;
        std::mem::replace(&mut self.value, value)
    }

    pub fn update<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        self.version += 1;
        f(&mut self.value)
    }
}

/// Single-slot cache keyed by input versions
#[derive(Debug, Clone)]
struct Memo<K, V> {
    slot: Option<(K, V)>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<K: PartialEq, V> Memo<K, V> {
    fn get_or_compute(&mut self, key: K, compute: impl FnOnce() -> V) -> &V {
        if !matches!(&self.slot, Some((k, _)) if *k == key) {
            self.slot = None;
        }
        let (_, value) = self.slot.get_or_insert_with(|| (key, compute()));
        value
    }
}

pub struct RevealSession<G> {
    matcher: CoverageMatcher<G>,
    extractor: CountryIdExtractor,
    countries: Versioned<Vec<Country>>,
    disks: Versioned<Vec<CoverageDisk>>,
    scratch: Versioned<ScratchSet>,
    reveal_memo: Memo<(u64, u64, u64), Vec<RevealResult>>,
    visited_memo: Memo<(u64, u64), RevealedCountries>,
    area_memo: Memo<u64, CoverageArea>,
    recomputations: usize,
}

impl<G: GeometryProvider> RevealSession<G> {
    pub fn new(matcher: CoverageMatcher<G>, extractor: CountryIdExtractor) -> Self {
        Self {
            matcher,
            extractor,
            countries: Versioned::default(),
            disks: Versioned::default(),
            scratch: Versioned::default(),
            reveal_memo: Memo::default(),
            visited_memo: Memo::default(),
            area_memo: Memo::default(),
            recomputations: 0,
        }
    }

    pub fn matcher(&self) -> &CoverageMatcher<G> {
        &self.matcher
    }

    pub fn extractor(&self) -> &CountryIdExtractor {
        &self.extractor
    }

    pub fn countries(&self) -> &[Country] {
        self.countries.get()
    }

    pub fn disks(&self) -> &[CoverageDisk] {
        self.disks.get()
    }

    pub fn scratch(&self) -> &ScratchSet {
        self.scratch.get()
    }

    pub fn set_countries(&mut self, countries: Vec<Country>) {
        self.countries.replace(countries);
    }

    pub fn set_disks(&mut self, disks: Vec<CoverageDisk>) {
        self.disks.replace(disks);
    }

    pub fn add_disk(&mut self, disk: CoverageDisk) {
        self.disks.update(|disks| disks.push(disk));
    }

    pub fn set_scratch(&mut self, scratch: ScratchSet) {
        self.scratch.replace(scratch);
    }

    /// Flip a country's scratch membership; returns the new state
    pub fn toggle_scratch(&mut self, id: &str) -> bool {
        self.scratch.update(|set| set.toggle(id))
    }

    /// Number of derived results computed so far
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }

    /// Per-country reveal state; depends on all three inputs
    pub fn reveal_results(&mut self) -> &[RevealResult] {
        let key = (self.countries.version(), self.disks.version(), self.scratch.version());
        let Self {
            matcher,
            extractor,
            countries,
            disks,
            scratch,
            reveal_memo,
            recomputations,
            ..
        } = self;
        reveal_memo.get_or_compute(key, || {
            *recomputations += 1;
            debug!("Recomputing reveal state for versions {:?}", key);
            matcher.reveal(countries.get(), disks.get(), scratch.get(), extractor)
        })
    }

    /// Countries containing a disk center; ignores the scratch set
    pub fn revealed_countries(&mut self) -> &RevealedCountries {
        let key = (self.countries.version(), self.disks.version());
        let Self {
            matcher,
            extractor,
            countries,
            disks,
            visited_memo,
            recomputations,
            ..
        } = self;
        visited_memo.get_or_compute(key, || {
            *recomputations += 1;
            matcher.compute_revealed_from_disks(countries.get(), disks.get(), extractor)
        })
    }

    /// Union area of all disks; depends on disks only
    pub fn covered_area(&mut self) -> &CoverageArea {
        let key = self.disks.version();
        let Self {
            matcher,
            disks,
            area_memo,
            recomputations,
            ..
        } = self;
        area_memo.get_or_compute(key, || {
            *recomputations += 1;
            matcher.covered_area(disks.get())
        })
    }
}
