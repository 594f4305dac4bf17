// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Background tickers that keep the sync engine, unconfirmed pool and
//! catalog moving without an explicit RPC call. Each ticker is its own
//! `JoinSet` task: a failure in one is logged and does not bring down the
//! others, and the handle returned by [`PeriodicTasks::spawn`] can be
//! awaited to join all of them (used by tests; the `dexd` binary runs it
//! forever alongside the rest of the process).

use dex_manager::OfferManager;
use dex_pool::{PoolOutcome, UnconfirmedPool};
use dex_store::CatalogStore;
use dex_sync::SyncEngine;
use dex_types::TransactionSource;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task::JoinSet;

/// Interval configuration for every ticker. Defaults are concrete guesses
/// at reasonable cadences for everything except the sync engine's own
/// fixed 30s answer/finish timers.
#[derive(Debug, Clone, Copy)]
pub struct PeriodicConfig {
    /// How often an idle engine attempts [`SyncEngine::start`].
    pub sync_kickoff_interval: Duration,
    /// The sync engine's own answer-timeout cadence.
    pub sync_answer_interval: Duration,
    /// The sync engine's own finish/re-fetch cadence.
    pub sync_finish_interval: Duration,
    /// How often the unconfirmed pool is rechecked against the chain.
    pub unconfirmed_rescan_interval: Duration,
    /// How often expired offers are swept out of the catalog and
    /// `my_offers` is walked for expirations.
    pub expiration_sweep_interval: Duration,
    /// How often terminal `my_offers` rows past retention are deleted.
    pub gc_interval: Duration,
    /// How long a terminal (`Expired`/`Cancelled`) `my_offers` row is kept
    /// before [`CatalogStore::gc_my_offers`] removes it.
    pub gc_retention: Duration,
}

impl Default for PeriodicConfig {
    fn default() -> Self {
        PeriodicConfig {
            sync_kickoff_interval: Duration::from_secs(60),
            sync_answer_interval: Duration::from_secs(30),
            sync_finish_interval: Duration::from_secs(30),
            unconfirmed_rescan_interval: Duration::from_secs(20),
            expiration_sweep_interval: Duration::from_secs(300),
            gc_interval: Duration::from_secs(3600),
            gc_retention: Duration::from_secs(7 * 24 * 3600),
        }
    }
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before unix epoch")
        .as_secs()
}

/// Owns every background ticker. Holds the same shared handles `dexd`'s
/// composition root wires into [`OfferManager`] and [`dex_rpc::RpcHandler`]
/// -- this crate adds no new state of its own, only scheduling.
pub struct PeriodicTasks {
    config: PeriodicConfig,
    catalog: Arc<CatalogStore>,
    pool_new: Arc<UnconfirmedPool>,
    manager: Arc<OfferManager>,
    sync: Arc<SyncEngine>,
    tx_source: Arc<dyn TransactionSource>,
}

impl PeriodicTasks {
    pub fn new(
        config: PeriodicConfig,
        catalog: Arc<CatalogStore>,
        pool_new: Arc<UnconfirmedPool>,
        manager: Arc<OfferManager>,
        sync: Arc<SyncEngine>,
        tx_source: Arc<dyn TransactionSource>,
    ) -> Self {
        PeriodicTasks {
            config,
            catalog,
            pool_new,
            manager,
            sync,
            tx_source,
        }
    }

    /// Spawns every ticker into a [`JoinSet`] and returns it. The set never
    /// resolves on its own in normal operation -- each ticker loops
    /// forever -- so the caller is expected to hold the handle for the
    /// life of the process and only await it while shutting down.
    pub fn spawn(self) -> JoinSet<()> {
        let mut services = JoinSet::new();
        let this = Arc::new(self);

        {
            let this = Arc::clone(&this);
            services.spawn(async move { this.run_sync_kickoff().await });
        }
        {
            let this = Arc::clone(&this);
            services.spawn(async move { this.run_sync_answer_timer().await });
        }
        {
            let this = Arc::clone(&this);
            services.spawn(async move { this.run_sync_finish_timer().await });
        }
        {
            let this = Arc::clone(&this);
            services.spawn(async move { this.run_unconfirmed_rescan().await });
        }
        {
            let this = Arc::clone(&this);
            services.spawn(async move { this.run_expiration_sweep().await });
        }
        {
            let this = Arc::clone(&this);
            services.spawn(async move { this.run_gc().await });
        }

        services
    }

    async fn run_sync_kickoff(&self) {
        let mut interval = tokio::time::interval(self.config.sync_kickoff_interval);
        loop {
            interval.tick().await;
            match self.sync.start().await {
                Ok(true) => log::info!("periodic: sync round started"),
                Ok(false) => {}
                Err(e) => log::warn!("periodic: sync kickoff failed: {e}"),
            }
        }
    }

    async fn run_sync_answer_timer(&self) {
        let mut interval = tokio::time::interval(self.config.sync_answer_interval);
        loop {
            interval.tick().await;
            if let Err(e) = self.sync.on_answer_timer().await {
                log::warn!("periodic: sync answer timer failed: {e}");
            }
        }
    }

    async fn run_sync_finish_timer(&self) {
        let mut interval = tokio::time::interval(self.config.sync_finish_interval);
        loop {
            interval.tick().await;
            if let Err(e) = self.sync.on_finish_timer().await {
                log::warn!("periodic: sync finish timer failed: {e}");
            }
        }
    }

    /// Rechecks every offer staged in the unconfirmed pool (both offers
    /// gossiped in from peers and this node's own `Unconfirmed` offers,
    /// see [`OfferManager::prepare_and_send`]) against the chain. A
    /// promotion lands the offer in the catalog -- directly for a peer's
    /// offer, through [`OfferManager::promote_confirmed`] for one of ours
    /// -- while an eviction falls one of our own offers back to
    /// `Suspended` and simply drops a peer's.
    async fn run_unconfirmed_rescan(&self) {
        let mut interval = tokio::time::interval(self.config.unconfirmed_rescan_interval);
        loop {
            interval.tick().await;
            let now = now_secs();
            let outcomes = self.pool_new.reevaluate(self.tx_source.as_ref(), now).await;
            for outcome in outcomes {
                match outcome {
                    PoolOutcome::Promoted(offer) => {
                        let hash = offer.hash;
                        let is_mine = matches!(self.catalog.get_my_offer(&hash), Ok(Some(_)));
                        let result = if is_mine {
                            self.manager.promote_confirmed(&hash, now).map_err(anyhow::Error::from)
                        } else {
                            match offer.offer_type {
                                dex_types::OfferType::Buy => self.catalog.upsert_buy(&offer, None, now),
                                dex_types::OfferType::Sell => self.catalog.upsert_sell(&offer, None, now),
                            }
                            .map_err(anyhow::Error::from)
                        };
                        if let Err(e) = result {
                            log::warn!("periodic: promoting offer {hash} failed: {e}");
                        } else {
                            log::debug!("periodic: offer {hash} promoted to the catalog");
                        }
                    }
                    PoolOutcome::Evicted(hash) => {
                        if matches!(self.catalog.get_my_offer(&hash), Ok(Some(_))) {
                            if let Err(e) = self.manager.suspend(&hash, now) {
                                log::warn!("periodic: suspending offer {hash} failed: {e}");
                            }
                        } else {
                            log::debug!("periodic: evicted unconfirmed offer {hash}");
                        }
                    }
                }
            }
        }
    }

    async fn run_expiration_sweep(&self) {
        let mut interval = tokio::time::interval(self.config.expiration_sweep_interval);
        loop {
            interval.tick().await;
            let now = now_secs();
            match self.catalog.sweep_expired(now) {
                Ok(n) if n > 0 => log::info!("periodic: swept {n} expired catalog offers"),
                Ok(_) => {}
                Err(e) => log::warn!("periodic: catalog expiration sweep failed: {e}"),
            }
            match self.catalog.expire_my_offers(now) {
                Ok(hashes) if !hashes.is_empty() => {
                    log::info!("periodic: expired {} of this node's offers", hashes.len())
                }
                Ok(_) => {}
                Err(e) => log::warn!("periodic: my_offers expiration sweep failed: {e}"),
            }
        }
    }

    async fn run_gc(&self) {
        let mut interval = tokio::time::interval(self.config.gc_interval);
        loop {
            interval.tick().await;
            let now = now_secs();
            match self.catalog.gc_my_offers(now, self.config.gc_retention.as_secs()) {
                Ok(n) if n > 0 => log::info!("periodic: garbage-collected {n} retired offers"),
                Ok(_) => {}
                Err(e) => log::warn!("periodic: my_offers gc failed: {e}"),
            }
        }
    }
}
