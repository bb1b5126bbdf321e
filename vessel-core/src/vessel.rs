use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer, de};
use serde_json::{Map, Value};

/// Maritime Mobile Service Identity, the unique station identifier of a
/// vessel's AIS equipment.
///
/// Kept as a string: identifiers arrive both as JSON numbers (registry) and
/// as topic path segments (feed), and an opaque string avoids numeric
/// precision and formatting pitfalls downstream.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Mmsi(String);

impl Mmsi {
    pub fn new(value: impl Into<String>) -> Mmsi {
        Mmsi(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Mmsi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Mmsi {
    fn from(value: &str) -> Self {
        Mmsi(value.into())
    }
}

impl Serialize for Mmsi {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Mmsi {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct MmsiVisitor;

        impl de::Visitor<'_> for MmsiVisitor {
            type Value = Mmsi;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an mmsi as a number or string")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                Ok(Mmsi(v.to_string()))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                Ok(Mmsi(v.to_string()))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                Ok(Mmsi(v.into()))
            }
        }

        deserializer.deserialize_any(MmsiVisitor)
    }
}

/// Fast-changing kinematics for a single vessel, emitted every few seconds.
/// Only the most recently received value is ever retained.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct VesselLocation {
    pub lat: f64,
    pub lon: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sog: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cog: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rot: Option<f64>,
    #[serde(rename = "navStat", skip_serializing_if = "Option::is_none")]
    pub navigational_status: Option<i32>,
    #[serde(
        default,
        with = "chrono::serde::ts_seconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    /// Unrecognized payload fields, passed through verbatim into the rendered
    /// property set.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Slowly-changing descriptive attributes, emitted every few minutes and also
/// served by the vessel registry. All fields are optional; `None` fields are
/// skipped on serialization so they never shadow anything when flattened into
/// a property set.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct VesselMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "callSign", skip_serializing_if = "Option::is_none")]
    pub call_sign: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imo: Option<i64>,
    #[serde(rename = "shipType", skip_serializing_if = "Option::is_none")]
    pub ship_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// Estimated time of arrival in the packed AIS encoding.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub eta: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub draught: Option<f64>,
    #[serde(rename = "refA", skip_serializing_if = "Option::is_none")]
    pub ref_a: Option<i32>,
    #[serde(rename = "refB", skip_serializing_if = "Option::is_none")]
    pub ref_b: Option<i32>,
    #[serde(rename = "refC", skip_serializing_if = "Option::is_none")]
    pub ref_c: Option<i32>,
    #[serde(rename = "refD", skip_serializing_if = "Option::is_none")]
    pub ref_d: Option<i32>,
    #[serde(rename = "shipLength", skip_serializing_if = "Option::is_none")]
    pub ship_length: Option<f64>,
    #[serde(rename = "shipWidth", skip_serializing_if = "Option::is_none")]
    pub ship_width: Option<f64>,
    #[serde(
        default,
        with = "chrono::serde::ts_milliseconds_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<DateTime<Utc>>,
    /// Unrecognized payload fields, passed through verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl VesselMetadata {
    /// The registry's data-driven selection rule: a vessel is a rescue vessel
    /// iff its declared name contains the substring "rescue", case
    /// insensitively.
    pub fn is_rescue_vessel(&self) -> bool {
        self.name
            .as_deref()
            .is_some_and(|name| name.to_lowercase().contains("rescue"))
    }
}

#[cfg(feature = "test")]
impl Mmsi {
    pub fn test_random() -> Mmsi {
        Mmsi(format!("2{:08}", rand::random::<u32>() % 100_000_000))
    }
}

#[cfg(feature = "test")]
impl VesselLocation {
    pub fn test_default() -> VesselLocation {
        VesselLocation {
            lat: 60.1564,
            lon: 24.983,
            sog: Some(8.4),
            cog: Some(123.3),
            heading: Some(120),
            rot: Some(0.0),
            navigational_status: Some(0),
            timestamp: Some(chrono::offset::Utc::now()),
            extra: Map::new(),
        }
    }
}

#[cfg(feature = "test")]
impl VesselMetadata {
    pub fn test_default() -> VesselMetadata {
        VesselMetadata {
            name: Some("RESCUE TESTAREN".to_string()),
            call_sign: Some("OH1234".to_string()),
            imo: Some(0),
            ship_type: Some(51),
            destination: Some("HELSINKI".to_string()),
            eta: Some(733376),
            draught: Some(18.0),
            ref_a: Some(8),
            ref_b: Some(4),
            ref_c: Some(2),
            ref_d: Some(2),
            ship_length: Some(12.0),
            ship_width: Some(4.0),
            timestamp: Some(chrono::offset::Utc::now()),
            extra: Map::new(),
        }
    }
}
