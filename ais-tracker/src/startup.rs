use std::{str::FromStr, sync::Arc, time::Duration};

use reqwest::Url;
use tokio::{io::AsyncRead, sync::Notify, task::JoinSet};
use tracing::{error, info, instrument};
use vessel_core::{Mmsi, VesselFeature};

use crate::{
    cache::VesselCache, consumer::Consumer, error::Result, feed::FeedClient,
    followed::FollowedSet, registry::VesselRegistry, settings::Settings,
};

pub struct App {
    registry: Arc<VesselRegistry>,
    followed: Arc<FollowedSet>,
    cache: Arc<VesselCache>,
    consumer: Consumer,
    feed: Option<Arc<FeedClient>>,
    topic_prefix: String,
    resubscribe: Notify,
}

impl App {
    pub fn build(settings: Settings) -> App {
        let registry = Arc::new(VesselRegistry::new(
            Url::from_str(&settings.registry.url).unwrap(),
            settings.registry.refresh_interval,
        ));
        let followed = Arc::new(FollowedSet::new());
        let cache = Arc::new(VesselCache::new(followed.clone()));
        let feed = settings
            .feed
            .address
            .as_ref()
            .map(|address| Arc::new(FeedClient::new(Url::from_str(address).unwrap())));

        App {
            consumer: Consumer::new(cache.clone()),
            registry,
            followed,
            cache,
            feed,
            topic_prefix: settings.feed.topic_prefix,
            resubscribe: Notify::new(),
        }
    }

    /// First registry load and followed set seeding. A failed first fetch is
    /// degraded mode, not fatal: tracking continues with an empty registry
    /// and the refresh loop keeps trying.
    pub async fn initialize(&self) {
        if let Err(e) = self.registry.initialize().await {
            error!("initial registry fetch failed, continuing with an empty registry: {e:?}");
        }

        self.followed.initialize_from(self.registry.all());
        for mmsi in self.followed.mmsis() {
            self.subscribe(&mmsi);
        }

        info!("following {} vessels", self.followed.len());
    }

    /// Starts tracking an additional vessel at runtime, seeding its fallback
    /// metadata from the registry when known there. Interrupts a live stream
    /// so the new subscription takes effect immediately rather than on the
    /// next reconnect.
    pub fn follow(&self, mmsi: Mmsi) {
        let seed = self.registry.lookup(&mmsi);
        if self.followed.add(mmsi.clone(), seed) {
            self.subscribe(&mmsi);
            self.resubscribe.notify_one();
        }
    }

    fn subscribe(&self, mmsi: &Mmsi) {
        if let Some(feed) = &self.feed {
            feed.subscribe(format!("{}/{}/+", self.topic_prefix, mmsi));
        }
    }

    /// The renderer-facing surface: one point feature per followed vessel
    /// with a known location.
    pub fn snapshot_features(&self) -> Vec<VesselFeature> {
        self.cache.snapshot_all(&self.followed.mmsis())
    }

    pub fn registry(&self) -> &Arc<VesselRegistry> {
        &self.registry
    }

    pub fn followed(&self) -> &Arc<FollowedSet> {
        &self.followed
    }

    pub fn cache(&self) -> &Arc<VesselCache> {
        &self.cache
    }

    pub fn feed(&self) -> Option<&Arc<FeedClient>> {
        self.feed.as_ref()
    }

    pub async fn run(self) {
        if self.feed.is_none() {
            panic!("no feed address configured, set feed.address or AIS_TRACKER__FEED__ADDRESS");
        }

        self.initialize().await;

        let mut set = JoinSet::new();

        let registry = self.registry.clone();
        set.spawn(async move { registry.run_refresh_loop(None).await });
        set.spawn(async move {
            loop {
                self.run_impl().await;
                // If the feed is unresponsive we dont want to relentlessly spam it
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
        });

        let out = set.join_next().await;
        panic!("feed consume loop or registry refresh loop exited unexpectedly: {out:?}");
    }

    #[instrument(skip_all)]
    async fn run_impl(&self) {
        if let Err(e) = self.run_inner().await {
            error!("feed consumer failed: {e:?}");
        }
    }

    async fn run_inner(&self) -> Result<()> {
        let source = self.feed.as_ref().unwrap().streamer().await?;
        self.consume_stream(source).await
    }

    /// Drives the consumer over the given stream until it closes or a newly
    /// followed vessel requires the subscriptions to be re-issued, in which
    /// case the caller re-opens the stream with the updated topic patterns.
    pub async fn consume_stream(&self, source: impl AsyncRead + Unpin) -> Result<()> {
        tokio::select! {
            result = self.consumer.run(source) => result,
            _ = self.resubscribe.notified() => {
                info!("followed set changed, re-opening the feed stream");
                Ok(())
            }
        }
    }

    /// Drives the consumer over an in-memory feed until the stream closes.
    pub async fn run_test(&self, source: impl AsyncRead + Unpin) -> Result<()> {
        self.consumer.run(source).await
    }
}
