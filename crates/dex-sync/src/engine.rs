// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! [`SyncEngine`]: the multi-phase inventory-reconciliation state machine.
//! One instance runs per node; the composition root feeds it inbound wire
//! messages and drives its two timers.

use crate::distribute::distribute;
use crate::errors::Error;
use crate::state::{is_qualifying_neighbor, NeighborStatus, SyncState};
use dex_net::{HashVersion, StatusOffers, SyncInfo, WireMessage};
use dex_pool::UnconfirmedPool;
use dex_store::{CatalogStore, OfferFilter, Period};
use dex_types::constants::min_number_dex_node;
use dex_types::{
    ChainView, FeeBinding, MasternodeRegistry, NeighborId, OfferHash, OfferRecord, OfferType,
    OutPoint, Transport, TransactionSource, Wallet,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::watch;

struct NeighborEntry {
    status: NeighborStatus,
}

#[derive(Default)]
struct EngineState {
    state: SyncState,
    neighbors: HashMap<NeighborId, NeighborEntry>,
    need_download: HashSet<OfferHash>,
    max_need_download: usize,
    waiting_for_reply: HashSet<NeighborId>,
    /// Guards the Open Question around `DEXSYNCNEEDSYNC`: a reset request
    /// is honored at most once per neighbor per sync round.
    need_sync_seen: HashSet<NeighborId>,
    last_finish_len: usize,
    last_finish_max: usize,
}

/// A read-only view of engine state, for RPC and logging.
#[derive(Debug, Clone)]
pub struct SyncSnapshot {
    pub state: SyncState,
    pub need_download: usize,
    pub max_need_download: usize,
    pub neighbors: Vec<(NeighborId, NeighborStatus)>,
    pub progress: f64,
}

/// The sync state machine, parameterized over the external collaborators
/// it needs: the confirmed catalog, the staging pool for newly observed
/// offers, and the chain/transport/wallet boundary traits from
/// [`dex_types::traits`].
pub struct SyncEngine {
    inner: Mutex<EngineState>,
    progress_tx: watch::Sender<f64>,
    progress_rx: watch::Receiver<f64>,
    rescan: bool,
    catalog: Arc<CatalogStore>,
    pool_new: Arc<UnconfirmedPool>,
    transport: Arc<dyn Transport>,
    registry: Arc<dyn MasternodeRegistry>,
    chain: Arc<dyn ChainView>,
    tx_source: Arc<dyn TransactionSource>,
    wallet: Arc<dyn Wallet>,
}

impl SyncEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<CatalogStore>,
        pool_new: Arc<UnconfirmedPool>,
        transport: Arc<dyn Transport>,
        registry: Arc<dyn MasternodeRegistry>,
        chain: Arc<dyn ChainView>,
        tx_source: Arc<dyn TransactionSource>,
        wallet: Arc<dyn Wallet>,
        rescan: bool,
    ) -> Self {
        let (progress_tx, progress_rx) = watch::channel(0.0);
        SyncEngine {
            inner: Mutex::new(EngineState::default()),
            progress_tx,
            progress_rx,
            rescan,
            catalog,
            pool_new,
            transport,
            registry,
            chain,
            tx_source,
            wallet,
        }
    }

    pub fn state(&self) -> SyncState {
        self.inner.lock().state
    }

    pub fn progress(&self) -> f64 {
        *self.progress_rx.borrow()
    }

    pub fn subscribe_progress(&self) -> watch::Receiver<f64> {
        self.progress_rx.clone()
    }

    pub fn snapshot(&self) -> SyncSnapshot {
        let st = self.inner.lock();
        SyncSnapshot {
            state: st.state,
            need_download: st.need_download.len(),
            max_need_download: st.max_need_download,
            neighbors: st
                .neighbors
                .iter()
                .map(|(n, e)| (*n, e.status))
                .collect(),
            progress: *self.progress_rx.borrow(),
        }
    }

    /// Attempts to start a sync round. Returns `Ok(false)` (not an error)
    /// when the quorum precondition isn't met; the engine simply stays
    /// `NotStarted`.
    pub async fn start(&self) -> Result<bool, Error> {
        {
            let st = self.inner.lock();
            if !matches!(st.state, SyncState::NotStarted | SyncState::Finished) {
                return Ok(false);
            }
        }

        let neighbors = self
            .transport
            .neighbors()
            .await
            .map_err(Error::Transport)?;
        let mut qualifying = Vec::new();
        for n in neighbors {
            let ok = is_qualifying_neighbor(
                n,
                self.chain.as_ref(),
                self.transport.as_ref(),
                self.registry.as_ref(),
            )
            .await
            .map_err(Error::Transport)?;
            if ok {
                qualifying.push(n);
            }
        }

        let min_required = min_number_dex_node(self.chain.is_testnet());
        if qualifying.len() < min_required {
            log::info!(
                "sync: {} qualifying neighbors, need {min_required}; staying NotStarted",
                qualifying.len()
            );
            return Ok(false);
        }

        // Quorum is met: mark the round `Started` before doing any of the
        // bookkeeping a round needs, so a concurrent `state()` read between
        // here and the `Initial` transition below sees the round as
        // underway rather than freshly reset.
        {
            let mut st = self.inner.lock();
            *st = EngineState::default();
            st.state = SyncState::Started;
        }

        let local_count = self.total_count()?;
        let local_last_mod = self.last_mod()?;

        {
            let mut st = self.inner.lock();
            st.waiting_for_reply = qualifying.iter().copied().collect();
            for n in &qualifying {
                st.neighbors.insert(
                    *n,
                    NeighborEntry {
                        status: NeighborStatus::Good,
                    },
                );
            }
            st.state = SyncState::Initial;
        }
        let _ = self.progress_tx.send(0.0);

        for n in &qualifying {
            self.send(*n, WireMessage::GetAllHash(SyncInfo::new(local_count, local_last_mod)))
                .await?;
        }
        Ok(true)
    }

    /// Clears state back to `NotStarted`. Rejected while reconciling
    /// (`SyncStepOne`/`SyncStepSecond`).
    pub fn reset(&self) -> Result<(), Error> {
        let mut st = self.inner.lock();
        if !st.state.can_reset() {
            return Err(Error::ResetRejected(st.state));
        }
        *st = EngineState::default();
        Ok(())
    }

    /// Resets, then immediately retries `start()`.
    pub async fn reset_and_restart(&self) -> Result<bool, Error> {
        self.reset()?;
        self.start().await
    }

    /// Forces the engine straight to `Finished`, regardless of outstanding
    /// `need_download` entries or neighbor statuses. Backs the RPC surface's
    /// `sync force-synced` operator override; unlike [`Self::reset`] this is
    /// never rejected by the current state.
    pub fn force_synced(&self) {
        {
            let mut st = self.inner.lock();
            st.state = SyncState::Finished;
        }
        let _ = self.progress_tx.send(1.0);
    }

    pub async fn handle_message(
        &self,
        from: NeighborId,
        msg: WireMessage,
        now: u64,
    ) -> Result<(), Error> {
        match msg {
            WireMessage::GetAllHash(info) => self.handle_get_all_hash(from, info).await,
            WireMessage::PartHash {
                entries,
                part_idx,
                part_total,
            } => self.handle_part_hash(from, entries, part_idx, part_total).await,
            WireMessage::NoOffers(status) => self.handle_no_offers(from, status).await,
            WireMessage::NeedSync => self.handle_need_sync(from).await,
            WireMessage::GetOffer(hash) => self.handle_get_offer(from, hash).await,
            WireMessage::Offer(offer) => self.handle_offer(from, *offer, now).await,
            WireMessage::NoHash(hash) => self.handle_no_hash(hash).await,
            WireMessage::NewOffer { .. } | WireMessage::EditOffer { .. } | WireMessage::DeleteOffer { .. } => {
                Err(Error::NotSyncMessage(msg.tag()))
            }
        }
    }

    /// One tick of the 30s answer timer: every neighbor still waiting for a
    /// Phase 1 reply is reclassified `Bad`.
    pub async fn on_answer_timer(&self) -> Result<(), Error> {
        let waiting: Vec<NeighborId> = {
            let mut st = self.inner.lock();
            let waiting: Vec<_> = st.waiting_for_reply.drain().collect();
            for n in &waiting {
                st.neighbors
                    .entry(*n)
                    .or_insert(NeighborEntry {
                        status: NeighborStatus::Bad,
                    })
                    .status = NeighborStatus::Bad;
            }
            waiting
        };
        if !waiting.is_empty() {
            log::debug!("sync: answer timer marked {} neighbors Bad", waiting.len());
        }
        self.maybe_finish().await
    }

    /// One tick of the 30s finish timer: re-issues `GET_OFFER` for whatever
    /// remains in `need_download` unless progress has advanced since the
    /// last tick.
    pub async fn on_finish_timer(&self) -> Result<(), Error> {
        let (should_refetch, hashes) = {
            let mut st = self.inner.lock();
            if st.state != SyncState::SyncStepSecond {
                return Ok(());
            }
            let progressed =
                st.need_download.len() < st.last_finish_len || st.max_need_download > st.last_finish_max;
            st.last_finish_len = st.need_download.len();
            st.last_finish_max = st.max_need_download;
            (!progressed, st.need_download.iter().copied().collect::<Vec<_>>())
        };
        if should_refetch {
            self.dispatch_get_offer(&hashes).await?;
        }
        Ok(())
    }

    // ---- Phase 1: responder side ----

    async fn handle_get_all_hash(&self, from: NeighborId, info: SyncInfo) -> Result<(), Error> {
        let local_count = self.total_count()?;
        if local_count == 0 {
            return self.send(from, WireMessage::NoOffers(StatusOffers::Empty)).await;
        }
        let local_last_mod = self.last_mod()?;
        if info.count == local_count && info.last_mod == local_last_mod {
            return self.send(from, WireMessage::NoOffers(StatusOffers::Actual)).await;
        }

        let entries = self.entries_since(info.last_mod)?;
        let part_size = dex_types::constants::PART_SIZE;
        let batches: Vec<&[(OfferHash, u32)]> = if entries.is_empty() {
            vec![&[]]
        } else {
            entries.chunks(part_size).collect()
        };
        let part_total = batches.len() as u32;
        for (idx, chunk) in batches.into_iter().enumerate() {
            let wire_entries = chunk
                .iter()
                .map(|(hash, editing_version)| HashVersion {
                    hash: *hash,
                    editing_version: *editing_version,
                })
                .collect();
            self.send(
                from,
                WireMessage::PartHash {
                    entries: wire_entries,
                    part_idx: (idx + 1) as u32,
                    part_total,
                },
            )
            .await?;
        }
        Ok(())
    }

    async fn handle_get_offer(&self, from: NeighborId, hash: OfferHash) -> Result<(), Error> {
        let found = match self.catalog.get_by_hash(OfferType::Buy, &hash)? {
            Some(o) => Some(o),
            None => self.catalog.get_by_hash(OfferType::Sell, &hash)?,
        };
        match found {
            Some(offer) => self.send(from, WireMessage::Offer(Box::new(offer))).await,
            None => self.send(from, WireMessage::NoHash(hash)).await,
        }
    }

    // ---- Phase 2/3: initiator side ----

    async fn handle_part_hash(
        &self,
        from: NeighborId,
        entries: Vec<HashVersion>,
        part_idx: u32,
        part_total: u32,
    ) -> Result<(), Error> {
        let mut diffs = Vec::new();
        for hv in &entries {
            let known = self.local_version(hv.hash)?;
            if known.map_or(true, |v| v < hv.editing_version) {
                diffs.push(hv.hash);
            }
        }

        let (should_reply_need_sync, refetch_hashes) = {
            let mut st = self.inner.lock();
            let status_before = st.neighbors.get(&from).map(|e| e.status);
            if status_before == Some(NeighborStatus::Bad) {
                return Ok(());
            }
            if st.state == SyncState::Initial {
                st.state = SyncState::SyncStepOne;
            }
            let was_good = matches!(status_before, None | Some(NeighborStatus::Good));
            st.neighbors
                .entry(from)
                .or_insert(NeighborEntry {
                    status: NeighborStatus::Good,
                })
                .status = NeighborStatus::Good;

            for hash in &diffs {
                st.need_download.insert(*hash);
            }
            st.neighbors.get_mut(&from).unwrap().status = NeighborStatus::Process;

            let mut should_reply = false;
            if part_idx == part_total {
                should_reply = was_good;
                if matches!(st.state, SyncState::SyncStepOne | SyncState::SyncStepSecond) {
                    st.max_need_download = st.max_need_download.max(st.need_download.len());
                    st.state = SyncState::SyncStepSecond;
                }
            }
            let refetch = if part_idx == part_total {
                st.need_download.iter().copied().collect::<Vec<_>>()
            } else {
                Vec::new()
            };
            (should_reply, refetch)
        };

        if should_reply_need_sync {
            self.send(from, WireMessage::NeedSync).await?;
        }
        if !refetch_hashes.is_empty() {
            self.dispatch_get_offer(&refetch_hashes).await?;
        }
        self.maybe_finish().await
    }

    async fn handle_no_offers(&self, from: NeighborId, status: StatusOffers) -> Result<(), Error> {
        {
            let mut st = self.inner.lock();
            st.waiting_for_reply.remove(&from);
            let _ = status;
            st.neighbors
                .entry(from)
                .or_insert(NeighborEntry {
                    status: NeighborStatus::Actual,
                })
                .status = NeighborStatus::Actual;
        }
        self.maybe_finish().await
    }

    async fn handle_need_sync(&self, from: NeighborId) -> Result<(), Error> {
        {
            let mut st = self.inner.lock();
            if !st.need_sync_seen.insert(from) {
                log::debug!("sync: ignoring repeat NEED_SYNC from {from:?} this round");
                return Ok(());
            }
        }
        self.reset_and_restart().await.map(|_| ())
    }

    async fn handle_offer(&self, from: NeighborId, offer: OfferRecord, now: u64) -> Result<(), Error> {
        let hash = offer.hash;
        if offer.compute_hash() != hash {
            log::warn!(
                "sync: dropping offer with mismatched self-hash from {from:?} \
                 (penalty {})",
                dex_types::PENALTY_HASH_MISMATCH
            );
            let _ = self.transport.penalize(from, dex_types::PENALTY_HASH_MISMATCH).await;
            self.remove_need_download(hash);
            return self.maybe_finish().await;
        }

        let countries: Vec<String> = self
            .catalog
            .list_countries()?
            .into_iter()
            .filter(|e| e.enabled)
            .map(|e| e.iso)
            .collect();
        let currencies: Vec<String> = self
            .catalog
            .list_currencies()?
            .into_iter()
            .filter(|e| e.enabled)
            .map(|e| e.iso)
            .collect();
        if let Err(e) = offer.check(&countries, &currencies) {
            let penalty = dex_types::penalty_for_check_error(&e);
            log::warn!("sync: offer {hash} from {from:?} failed check: {e} (penalty {penalty})");
            let _ = self.transport.penalize(from, penalty).await;
            self.remove_need_download(hash);
            return self.maybe_finish().await;
        }

        match self.verify_fee_binding(&offer).await {
            Ok(()) => self.upsert_confirmed(&offer, now)?,
            Err(e) => {
                log::debug!("sync: offer {hash} not yet fee-confirmed ({e}); staging");
                self.pool_new.insert_or_update(offer.clone(), now);
            }
        }

        if self.rescan {
            self.maybe_record_as_my_offer(&offer, now).await?;
        }

        self.remove_need_download(hash);
        self.maybe_finish().await
    }

    async fn handle_no_hash(&self, hash: OfferHash) -> Result<(), Error> {
        self.remove_need_download(hash);
        self.maybe_finish().await
    }

    // ---- shared helpers ----

    async fn dispatch_get_offer(&self, hashes: &[OfferHash]) -> Result<(), Error> {
        if hashes.is_empty() {
            return Ok(());
        }
        let eligible: Vec<NeighborId> = {
            let st = self.inner.lock();
            st.neighbors
                .iter()
                .filter(|(_, e)| !matches!(e.status, NeighborStatus::Bad | NeighborStatus::Actual))
                .map(|(n, _)| *n)
                .collect()
        };
        for (neighbor, hash) in distribute(hashes, &eligible) {
            self.send(neighbor, WireMessage::GetOffer(hash)).await?;
        }
        Ok(())
    }

    async fn maybe_finish(&self) -> Result<(), Error> {
        let progress = {
            let mut st = self.inner.lock();
            let any_actual = st.neighbors.values().any(|e| e.status == NeighborStatus::Actual);
            let none_in_flight = st
                .neighbors
                .values()
                .all(|e| !matches!(e.status, NeighborStatus::Good | NeighborStatus::Process));
            let done = st.need_download.is_empty() && any_actual && none_in_flight;
            if done {
                st.state = SyncState::Finished;
                1.0
            } else if st.max_need_download == 0 {
                0.0
            } else {
                1.0 - 0.9 * (st.need_download.len() as f64 / st.max_need_download as f64)
            }
        };
        let _ = self.progress_tx.send(progress);
        Ok(())
    }

    fn remove_need_download(&self, hash: OfferHash) {
        self.inner.lock().need_download.remove(&hash);
    }

    async fn verify_fee_binding(
        &self,
        offer: &OfferRecord,
    ) -> Result<(), dex_types::FeeBindingError> {
        let txid = offer
            .id_transaction
            .as_ref()
            .ok_or_else(|| dex_types::FeeBindingError::TxMissing("<none>".to_string()))?;
        let tx = self
            .tx_source
            .get_transaction(txid)
            .await
            .map_err(|_| dex_types::FeeBindingError::TxMissing(txid.clone()))?
            .ok_or_else(|| dex_types::FeeBindingError::TxMissing(txid.clone()))?;
        let binding = FeeBinding {
            offer_hash: offer.hash,
            outpoint: OutPoint {
                txid: txid.clone(),
                vout: 0,
            },
        };
        binding.verify(&tx, offer.time_create, offer.time_expiration)
    }

    fn upsert_confirmed(&self, offer: &OfferRecord, now: u64) -> Result<(), Error> {
        match offer.offer_type {
            OfferType::Buy => self.catalog.upsert_buy(offer, None, now)?,
            OfferType::Sell => self.catalog.upsert_sell(offer, None, now)?,
        }
        Ok(())
    }

    async fn maybe_record_as_my_offer(&self, offer: &OfferRecord, now: u64) -> Result<(), Error> {
        let has_key = self
            .wallet
            .has_private_key(&offer.pub_key)
            .await
            .unwrap_or(false);
        if !has_key {
            return Ok(());
        }
        let mut my = dex_types::MyOfferRecord::draft(offer.clone());
        my.status = dex_types::MyOfferStatus::Active;
        my.fee_tx_hash = offer.id_transaction.clone();
        my.is_broadcast = true;
        self.catalog.upsert_my_offer(&my, now)?;
        Ok(())
    }

    fn total_count(&self) -> Result<u64, Error> {
        Ok(self.catalog.count(OfferType::Buy, &OfferFilter::default())?
            + self.catalog.count(OfferType::Sell, &OfferFilter::default())?)
    }

    fn last_mod(&self) -> Result<u64, Error> {
        Ok(self
            .catalog
            .last_modification_buy()?
            .max(self.catalog.last_modification_sell()?))
    }

    fn local_version(&self, hash: OfferHash) -> Result<Option<u32>, Error> {
        if let Some(o) = self.catalog.get_by_hash(OfferType::Buy, &hash)? {
            return Ok(Some(o.editing_version));
        }
        if let Some(o) = self.catalog.get_by_hash(OfferType::Sell, &hash)? {
            return Ok(Some(o.editing_version));
        }
        Ok(None)
    }

    fn entries_since(&self, pivot: u64) -> Result<Vec<(OfferHash, u32)>, Error> {
        let period = if pivot == 0 {
            Period::All
        } else {
            Period::YoungTimeMod(pivot)
        };
        let mut entries = self.catalog.hashes_and_versions(OfferType::Buy, period)?;
        entries.extend(self.catalog.hashes_and_versions(OfferType::Sell, period)?);
        Ok(entries)
    }

    async fn send(&self, to: NeighborId, msg: WireMessage) -> Result<(), Error> {
        let bytes = msg.encode()?;
        self.transport.send_to(to, bytes).await.map_err(Error::Transport)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_store::CatalogStore;
    use dex_types::test_support::{TestChain, TestMasternodeRegistry, TestTransport, TestWallet};
    use dex_types::{OfferType, PaymentMethod};

    fn sample_offer(hash_seed: u8, editing_version: u32) -> OfferRecord {
        let mut o = OfferRecord {
            hash: OfferHash::zero(),
            id_transaction: Some(format!("tx{hash_seed}")),
            offer_type: OfferType::Sell,
            country_iso: "US".into(),
            currency_iso: "USD".into(),
            payment_method: PaymentMethod::CASH,
            price: 100 + hash_seed as u64,
            min_amount: 10,
            short_info: "cash".into(),
            details: "details".into(),
            pub_key: vec![hash_seed],
            time_create: 1_000,
            time_expiration: 1_000 + 86_400,
            editing_version,
            edit_hash: OfferHash::zero(),
            edit_sign: None,
        };
        o.hash = o.compute_hash();
        o.edit_hash = o.compute_edit_hash();
        o
    }

    fn confirmed_tx(offer: &OfferRecord) -> dex_types::fee::Transaction {
        dex_types::fee::Transaction {
            txid: offer.id_transaction.clone().unwrap(),
            size_bytes: 250,
            vout: vec![dex_types::fee::TxOut {
                value: dex_types::constants::PAYOFFER_RETURN_FEE,
                script_pubkey: {
                    let mut bytes = vec![0x6a, 32];
                    bytes.extend_from_slice(offer.hash.as_bytes());
                    dex_types::fee::Script(bytes)
                },
            }],
            credit: 0,
            debit: dex_types::constants::required_fee_margin(offer.time_create, offer.time_expiration),
            confirmations: dex_types::constants::PAYOFFER_MIN_TX_HEIGHT,
        }
    }

    #[allow(clippy::type_complexity)]
    async fn new_engine(
        neighbors: Vec<NeighborId>,
    ) -> (
        SyncEngine,
        Arc<CatalogStore>,
        Arc<TestTransport>,
        Arc<TestChain>,
    ) {
        let catalog = Arc::new(CatalogStore::open_in_memory().unwrap());
        catalog
            .replace_countries(&[dex_store::ReferenceEntry {
                iso: "US".into(),
                name: "United States".into(),
                enabled: true,
            }])
            .unwrap();
        catalog
            .replace_currencies(&[dex_store::ReferenceEntry {
                iso: "USD".into(),
                name: "US Dollar".into(),
                enabled: true,
            }])
            .unwrap();
        let pool_new = Arc::new(UnconfirmedPool::new("new"));
        let transport = Arc::new(TestTransport::with_neighbors(neighbors.clone()));
        let chain = Arc::new(TestChain::new(true, 0));
        let registry = Arc::new(TestMasternodeRegistry::with_registered(neighbors));
        let wallet = Arc::new(TestWallet::default());
        for n in transport.neighbors().await.unwrap() {
            transport.set_version(n, dex_types::constants::MIN_DEX_VERSION);
        }
        let engine = SyncEngine::new(
            catalog.clone(),
            pool_new,
            transport.clone() as Arc<dyn Transport>,
            registry as Arc<dyn MasternodeRegistry>,
            chain.clone() as Arc<dyn ChainView>,
            chain.clone() as Arc<dyn TransactionSource>,
            wallet as Arc<dyn Wallet>,
            false,
        );
        (engine, catalog, transport, chain)
    }

    #[tokio::test]
    async fn start_stays_not_started_below_quorum() {
        let (engine, _, _, _) = new_engine(vec![NeighborId(1)]).await;
        assert!(!engine.start().await.unwrap());
        assert_eq!(engine.state(), SyncState::NotStarted);
    }

    #[tokio::test]
    async fn start_broadcasts_get_all_hash_to_every_qualifying_neighbor() {
        let (engine, _, transport, _) = new_engine(vec![NeighborId(1), NeighborId(2)]).await;
        assert!(engine.start().await.unwrap());
        assert_eq!(engine.state(), SyncState::Initial);
        assert_eq!(transport.sent().len(), 2);
    }

    #[tokio::test]
    async fn reset_rejected_mid_reconciliation() {
        let (engine, _, _, _) = new_engine(vec![NeighborId(1), NeighborId(2)]).await;
        engine.start().await.unwrap();
        engine
            .handle_message(
                NeighborId(1),
                WireMessage::PartHash {
                    entries: vec![HashVersion {
                        hash: sample_offer(1, 0).hash,
                        editing_version: 0,
                    }],
                    part_idx: 1,
                    part_total: 1,
                },
                0,
            )
            .await
            .unwrap();
        assert_eq!(engine.state(), SyncState::SyncStepSecond);
        assert!(matches!(engine.reset(), Err(Error::ResetRejected(_))));
    }

    #[tokio::test]
    async fn force_synced_overrides_any_state() {
        let (engine, _, _, _) = new_engine(vec![NeighborId(1), NeighborId(2)]).await;
        engine.start().await.unwrap();
        engine.force_synced();
        assert_eq!(engine.state(), SyncState::Finished);
        assert_eq!(engine.progress(), 1.0);
    }

    /// A full two-neighbor round: one neighbor reports its inventory ahead
    /// (PART_HASH), the other reports nothing new (NO_OFFERS/Actual). The
    /// offered hash is fetched, fee-verified, and upserted; the still-Good
    /// PART_HASH neighbor only resolves to done once the answer timer marks
    /// it Bad, since only NO_OFFERS clears `waiting_for_reply`.
    #[tokio::test]
    async fn full_round_reconciles_and_finishes() {
        let (engine, catalog, transport, chain) = new_engine(vec![NeighborId(1), NeighborId(2)]).await;
        let offer = sample_offer(7, 0);
        chain.insert_tx(confirmed_tx(&offer));

        assert!(engine.start().await.unwrap());

        engine
            .handle_message(NeighborId(2), WireMessage::NoOffers(StatusOffers::Actual), 0)
            .await
            .unwrap();

        engine
            .handle_message(
                NeighborId(1),
                WireMessage::PartHash {
                    entries: vec![HashVersion {
                        hash: offer.hash,
                        editing_version: 0,
                    }],
                    part_idx: 1,
                    part_total: 1,
                },
                0,
            )
            .await
            .unwrap();
        assert_eq!(engine.state(), SyncState::SyncStepSecond);

        let get_offer_targets: Vec<_> = transport
            .sent()
            .into_iter()
            .filter(|(to, _)| *to == Some(NeighborId(1)))
            .collect();
        assert!(!get_offer_targets.is_empty());

        engine
            .handle_message(NeighborId(1), WireMessage::Offer(Box::new(offer.clone())), 0)
            .await
            .unwrap();
        assert!(catalog.get_by_hash(OfferType::Sell, &offer.hash).unwrap().is_some());
        assert_eq!(engine.state(), SyncState::SyncStepSecond);

        engine.on_answer_timer().await.unwrap();
        assert_eq!(engine.state(), SyncState::Finished);
        assert_eq!(engine.progress(), 1.0);
    }

    #[tokio::test]
    async fn unconfirmed_offer_is_staged_not_upserted() {
        let (engine, catalog, _, _) = new_engine(vec![NeighborId(1), NeighborId(2)]).await;
        let offer = sample_offer(9, 0);
        // No matching transaction inserted into the chain: fee binding
        // cannot verify, so the offer goes to the unconfirmed pool instead
        // of straight into the catalog.
        engine.start().await.unwrap();
        engine
            .handle_message(NeighborId(1), WireMessage::Offer(Box::new(offer.clone())), 0)
            .await
            .unwrap();
        assert!(catalog.get_by_hash(OfferType::Sell, &offer.hash).unwrap().is_none());
    }

    #[tokio::test]
    async fn responder_replies_empty_when_local_catalog_is_empty() {
        let (engine, _, transport, _) = new_engine(vec![NeighborId(1), NeighborId(2)]).await;
        engine
            .handle_message(NeighborId(1), WireMessage::GetAllHash(SyncInfo::new(5, 100)), 0)
            .await
            .unwrap();
        let sent = transport.sent();
        let (_, bytes) = sent.last().unwrap();
        assert!(matches!(
            WireMessage::decode(bytes).unwrap(),
            WireMessage::NoOffers(StatusOffers::Empty)
        ));
    }

    #[tokio::test]
    async fn handle_no_hash_clears_need_download_entry() {
        let (engine, _, _, _) = new_engine(vec![NeighborId(1), NeighborId(2)]).await;
        engine.start().await.unwrap();
        let hash = sample_offer(3, 0).hash;
        engine
            .handle_message(
                NeighborId(1),
                WireMessage::PartHash {
                    entries: vec![HashVersion { hash, editing_version: 0 }],
                    part_idx: 1,
                    part_total: 1,
                },
                0,
            )
            .await
            .unwrap();
        engine.handle_message(NeighborId(1), WireMessage::NoHash(hash), 0).await.unwrap();
        assert_eq!(engine.snapshot().need_download, 0);
    }
}
