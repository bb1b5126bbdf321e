#![deny(warnings)]
#![deny(rust_2018_idioms)]

//! Live vessel tracking core: consumes a topic-tagged AIS feed, filters it
//! against a followed-vessel set seeded from the rescue-vessel registry, and
//! serves render-ready snapshots to the map layer.

pub mod cache;
pub mod consumer;
pub mod error;
pub mod feed;
pub mod followed;
pub mod models;
pub mod registry;
pub mod settings;
pub mod startup;
