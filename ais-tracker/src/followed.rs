use std::{
    collections::{HashMap, hash_map::Entry},
    sync::RwLock,
};

use vessel_core::{Mmsi, VesselMetadata};

/// The working set of vessels the tracker cares about, with optional seed
/// metadata used as a fallback until a live metadata message arrives.
///
/// Seeded once from the rescue-vessel registry after its first load. Later
/// registry refreshes do not propagate here, so a manually followed vessel
/// survives a refresh that no longer lists it.
#[derive(Debug, Default)]
pub struct FollowedSet {
    inner: RwLock<HashMap<Mmsi, Option<VesselMetadata>>>,
}

impl FollowedSet {
    pub fn new() -> FollowedSet {
        FollowedSet::default()
    }

    /// Replaces the entire set with the given registry snapshot.
    pub fn initialize_from(&self, registry: HashMap<Mmsi, VesselMetadata>) {
        *self.inner.write().unwrap() = registry
            .into_iter()
            .map(|(mmsi, metadata)| (mmsi, Some(metadata)))
            .collect();
    }

    /// Inserts an identifier if not already present. Returns whether the
    /// identifier was new, so the caller knows to issue a feed subscription.
    pub fn add(&self, mmsi: Mmsi, seed: Option<VesselMetadata>) -> bool {
        match self.inner.write().unwrap().entry(mmsi) {
            Entry::Occupied(_) => false,
            Entry::Vacant(vacant) => {
                vacant.insert(seed);
                true
            }
        }
    }

    pub fn contains(&self, mmsi: &Mmsi) -> bool {
        self.inner.read().unwrap().contains_key(mmsi)
    }

    pub fn fallback_metadata_for(&self, mmsi: &Mmsi) -> Option<VesselMetadata> {
        self.inner.read().unwrap().get(mmsi).cloned().flatten()
    }

    pub fn mmsis(&self) -> Vec<Mmsi> {
        self.inner.read().unwrap().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.inner.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().unwrap().is_empty()
    }
}
