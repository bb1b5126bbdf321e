use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};

use geo::Point;
use serde::Serialize;
use serde_json::{Map, Value};
use snafu::ResultExt;
use vessel_core::{Mmsi, VesselFeature, VesselLocation, VesselMetadata};

use crate::{
    error::{Result, error::MalformedPayloadSnafu},
    followed::FollowedSet,
    models::{MessageKind, VesselTopic},
};

#[derive(Debug, Clone, Default)]
struct CacheEntry {
    location: Option<VesselLocation>,
    metadata: Option<VesselMetadata>,
}

/// What happened to an ingested frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    Stored(MessageKind),
    /// The frame referenced a vessel outside the followed set. This is the
    /// expected fate of most traffic on a shared feed, not an error.
    NotFollowed,
}

/// Latest known state per followed vessel.
///
/// Entries are created lazily on the first frame for an identifier and never
/// deleted; the followed set bounds their number. Each frame fully overwrites
/// one side of one entry.
pub struct VesselCache {
    followed: Arc<FollowedSet>,
    entries: RwLock<HashMap<Mmsi, CacheEntry>>,
}

impl VesselCache {
    pub fn new(followed: Arc<FollowedSet>) -> VesselCache {
        VesselCache {
            followed,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Parses the topic, filters against the followed set and stores the
    /// payload. Last write wins: a stale frame arriving late overwrites a
    /// newer one, timestamps are not compared.
    pub fn ingest(&self, topic: &str, payload: &str) -> Result<IngestOutcome> {
        let parsed = VesselTopic::parse(topic)?;

        if !self.followed.contains(&parsed.mmsi) {
            return Ok(IngestOutcome::NotFollowed);
        }

        match parsed.kind {
            MessageKind::Location => {
                let location: VesselLocation =
                    serde_json::from_str(payload).context(MalformedPayloadSnafu { topic })?;
                self.entries
                    .write()
                    .unwrap()
                    .entry(parsed.mmsi)
                    .or_default()
                    .location = Some(location);
            }
            MessageKind::Metadata => {
                let metadata: VesselMetadata =
                    serde_json::from_str(payload).context(MalformedPayloadSnafu { topic })?;
                self.entries
                    .write()
                    .unwrap()
                    .entry(parsed.mmsi)
                    .or_default()
                    .metadata = Some(metadata);
            }
        }

        Ok(IngestOutcome::Stored(parsed.kind))
    }

    /// Render-ready snapshot for one vessel, `None` until a location frame
    /// has been seen. Properties are layered in increasing priority: live
    /// metadata (or the followed set's fallback when no live metadata ever
    /// arrived), then location fields, then the identifier itself.
    pub fn snapshot(&self, mmsi: &Mmsi) -> Option<VesselFeature> {
        let (location, live_metadata) = {
            let entries = self.entries.read().unwrap();
            let entry = entries.get(mmsi)?;
            (entry.location.clone()?, entry.metadata.clone())
        };

        let metadata = live_metadata.or_else(|| self.followed.fallback_metadata_for(mmsi));

        let mut properties = Map::new();
        if let Some(metadata) = &metadata {
            merge_into(&mut properties, metadata);
        }
        merge_into(&mut properties, &location);
        properties.insert("mmsi".into(), Value::String(mmsi.to_string()));

        Some(VesselFeature {
            mmsi: mmsi.clone(),
            geometry: Point::new(location.lon, location.lat),
            properties,
        })
    }

    /// Snapshots every given vessel in the caller's order, skipping vessels
    /// without a location.
    pub fn snapshot_all(&self, mmsis: &[Mmsi]) -> Vec<VesselFeature> {
        mmsis.iter().filter_map(|mmsi| self.snapshot(mmsi)).collect()
    }
}

fn merge_into<T: Serialize>(properties: &mut Map<String, Value>, value: &T) {
    if let Ok(Value::Object(fields)) = serde_json::to_value(value) {
        properties.extend(fields);
    }
}
