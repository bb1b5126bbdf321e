use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub registry: RegistrySettings,
    pub feed: FeedSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    pub url: String,
    #[serde(with = "humantime_serde")]
    pub refresh_interval: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeedSettings {
    /// Streaming feed endpoint; `None` disables the live feed (tests drive
    /// the consumer over an in-memory stream instead).
    #[serde(default)]
    pub address: Option<String>,
    pub topic_prefix: String,
}

impl Settings {
    pub fn new() -> Result<Settings, ConfigError> {
        let config = Config::builder()
            .set_default("registry.url", "https://meri.digitraffic.fi/api/ais/v1/vessels")?
            .set_default("registry.refresh_interval", "30m")?
            .set_default("feed.topic_prefix", "vessels-v2")?
            .add_source(File::with_name("config/tracker").required(false))
            .add_source(config::Environment::with_prefix("AIS_TRACKER").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
