use std::{
    collections::HashMap,
    sync::{
        Arc, RwLock,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use reqwest::{Client, Url};
use snafu::ResultExt;
use tokio::sync::mpsc::Receiver;
use tracing::{error, info, instrument};
use vessel_core::{Mmsi, VesselMetadata};

use crate::{
    error::{
        Result,
        error::{RegistryDecodeSnafu, RegistryRequestSnafu, RegistryStatusSnafu},
    },
    models::RegistryVessel,
};

#[derive(Debug, Default)]
struct RegistryState {
    vessels: HashMap<Mmsi, VesselMetadata>,
    last_fetch: Option<Instant>,
}

/// Catalog of known rescue vessels, bulk fetched from the vessel registry
/// endpoint and fully replaced on every successful refresh. A vessel renamed
/// to drop "rescue" disappears on the next cycle; a failed fetch retains the
/// previous contents.
pub struct VesselRegistry {
    client: Client,
    url: Url,
    refresh_interval: Duration,
    fetching: AtomicBool,
    state: RwLock<RegistryState>,
}

impl VesselRegistry {
    pub fn new(url: Url, refresh_interval: Duration) -> VesselRegistry {
        VesselRegistry {
            client: Client::new(),
            url,
            refresh_interval,
            fetching: AtomicBool::new(false),
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// First fetch. On failure the registry stays empty and the caller may
    /// continue in degraded mode; the refresh loop keeps trying.
    pub async fn initialize(&self) -> Result<()> {
        self.refresh().await
    }

    /// Unconditional refresh. A concurrent in-flight fetch is detected and
    /// the call becomes a no-op, so fetches never overlap.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<()> {
        if self.fetching.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let result = self.fetch().await;
        self.fetching.store(false, Ordering::Release);

        let vessels = result?;
        info!("registry refresh found {} rescue vessels", vessels.len());

        let mut state = self.state.write().unwrap();
        state.vessels = vessels;
        state.last_fetch = Some(Instant::now());

        Ok(())
    }

    /// Refreshes only when the last successful fetch is older than the
    /// refresh interval.
    pub async fn refresh_if_stale(&self) -> Result<()> {
        if self.is_stale() {
            self.refresh().await
        } else {
            Ok(())
        }
    }

    fn is_stale(&self) -> bool {
        self.state
            .read()
            .unwrap()
            .last_fetch
            .is_none_or(|at| at.elapsed() > self.refresh_interval)
    }

    async fn fetch(&self) -> Result<HashMap<Mmsi, VesselMetadata>> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .context(RegistryRequestSnafu)?;

        let status = response.status();
        if !status.is_success() {
            return RegistryStatusSnafu {
                url: self.url.to_string(),
                status,
                body: response.text().await.context(RegistryRequestSnafu)?,
            }
            .fail();
        }

        let vessels: Vec<RegistryVessel> =
            response.json().await.context(RegistryDecodeSnafu)?;

        Ok(vessels
            .into_iter()
            .filter(|vessel| vessel.metadata.is_rescue_vessel())
            .map(|vessel| (vessel.mmsi, vessel.metadata))
            .collect())
    }

    pub fn lookup(&self, mmsi: &Mmsi) -> Option<VesselMetadata> {
        self.state.read().unwrap().vessels.get(mmsi).cloned()
    }

    pub fn is_known(&self, mmsi: &Mmsi) -> bool {
        self.state.read().unwrap().vessels.contains_key(mmsi)
    }

    /// A copy of the full current registry.
    pub fn all(&self) -> HashMap<Mmsi, VesselMetadata> {
        self.state.read().unwrap().vessels.clone()
    }

    /// Display name for a vessel, falling back to the identifier when the
    /// registry does not know the vessel or it has no declared name.
    pub fn vessel_name(&self, mmsi: &Mmsi) -> String {
        self.lookup(mmsi)
            .and_then(|metadata| metadata.name)
            .unwrap_or_else(|| mmsi.to_string())
    }

    /// Periodic background refresh. Failures are logged and the next tick
    /// still happens; a message on the cancellation channel stops the loop.
    pub async fn run_refresh_loop(self: Arc<Self>, cancellation: Option<Receiver<()>>) {
        let mut interval = tokio::time::interval(self.refresh_interval);
        // The first tick fires immediately and is already satisfied by
        // `initialize`.
        interval.tick().await;

        match cancellation {
            Some(mut cancellation) => loop {
                tokio::select! {
                    _ = interval.tick() => self.tick().await,
                    _ = cancellation.recv() => break,
                }
            },
            None => loop {
                interval.tick().await;
                self.tick().await;
            },
        }
    }

    async fn tick(&self) {
        if let Err(e) = self.refresh_if_stale().await {
            error!("registry refresh failed: {e:?}");
        }
    }
}
