use serde::Deserialize;
use serde_json::value::RawValue;
use vessel_core::{Mmsi, VesselMetadata};

use crate::error::{Result, error::MalformedTopicSnafu};

/// One frame on the vessel feed: the pub/sub topic the message was published
/// on, and its still-unparsed JSON payload.
#[derive(Debug, Deserialize)]
pub struct FeedEnvelope {
    pub topic: String,
    pub payload: Box<RawValue>,
}

/// The message kinds carried on a vessel topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Fast-changing kinematics.
    Location,
    /// Slowly-changing vessel related data.
    Metadata,
}

/// A parsed `<prefix>/<mmsi>/<kind>` topic.
#[derive(Debug, Clone, PartialEq)]
pub struct VesselTopic {
    pub mmsi: Mmsi,
    pub kind: MessageKind,
}

impl VesselTopic {
    /// Topics are required to have exactly three segments with a known kind;
    /// anything else is reported to the caller and the frame dropped.
    pub fn parse(topic: &str) -> Result<VesselTopic> {
        let mut segments = topic.split('/');
        match (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) {
            (Some(_prefix), Some(mmsi), Some(kind), None) if !mmsi.is_empty() => {
                let kind = match kind {
                    "location" => MessageKind::Location,
                    "metadata" => MessageKind::Metadata,
                    _ => return MalformedTopicSnafu { topic }.fail(),
                };

                Ok(VesselTopic {
                    mmsi: Mmsi::new(mmsi),
                    kind,
                })
            }
            _ => MalformedTopicSnafu { topic }.fail(),
        }
    }
}

/// A single vessel record from the registry endpoint. Only `mmsi` is
/// mandatory; everything else passes through into [`VesselMetadata`].
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryVessel {
    pub mmsi: Mmsi,
    #[serde(flatten)]
    pub metadata: VesselMetadata,
}
