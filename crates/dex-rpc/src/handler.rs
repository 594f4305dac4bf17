// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! [`RpcHandler`]: a plain struct holding `Arc`-shared service handles, with
//! one method per RPC command. This workspace stops at the command layer:
//! wire framing (JSON-RPC envelopes, HTTP, exit codes) belongs to the host
//! process.

use crate::errors::Error;
use dex_manager::{ActiveEdit, DraftInput, OfferManager};
use dex_pool::UnconfirmedPool;
use dex_store::{CatalogStore, OfferFilter};
use dex_sync::{SyncEngine, SyncSnapshot};
use dex_types::{MyOfferRecord, MyOfferStatus, OfferHash, OfferRecord, OfferType, PaymentMethod};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Default `list_offers`/`list_my_offers` page size before any
/// `settings maxoutput` call narrows or unbounds it.
const DEFAULT_MAX_OUTPUT: u64 = 100;

/// The mutable-field surface an `edit_offer` call may touch. Every field is
/// optional: an absent field leaves the stored value untouched. Which
/// fields are actually permitted to differ from the stored record depends
/// on the target offer's [`MyOfferStatus`] -- see [`RpcHandler::edit_offer`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EditOfferRequest {
    pub country_iso: Option<String>,
    pub currency_iso: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub price: Option<u64>,
    pub min_amount: Option<u64>,
    pub short_info: Option<String>,
    pub details: Option<String>,
    pub time_expiration: Option<u64>,
}

/// Response payload for the `info` command: counts of buy / sell / my /
/// unconfirmed offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoSnapshot {
    pub buy: u64,
    pub sell: u64,
    pub my_offers: u64,
    pub unconfirmed: u64,
}

/// Owns the command behaviors of the RPC surface over the shared catalog,
/// unconfirmed pool, offer manager and sync engine. One instance per
/// process; the composition root constructs it once every collaborator is
/// wired up.
pub struct RpcHandler {
    catalog: Arc<CatalogStore>,
    pool_new: Arc<UnconfirmedPool>,
    manager: Arc<OfferManager>,
    sync: Arc<SyncEngine>,
    max_output: AtomicU64,
}

impl RpcHandler {
    pub fn new(
        catalog: Arc<CatalogStore>,
        pool_new: Arc<UnconfirmedPool>,
        manager: Arc<OfferManager>,
        sync: Arc<SyncEngine>,
    ) -> Self {
        RpcHandler {
            catalog,
            pool_new,
            manager,
            sync,
            max_output: AtomicU64::new(DEFAULT_MAX_OUTPUT),
        }
    }

    /// `list_offers(type, country?, currency?, method?, limit?, offset?)`.
    /// `limit: None` falls back to the current `settings maxoutput` cap;
    /// a cap of `0` (unlimited) is passed through as SQLite's `LIMIT -1` by
    /// handing `list` the `u64::MAX` sentinel, which casts to `-1` at the
    /// query layer.
    pub fn list_offers(
        &self,
        offer_type: OfferType,
        filter: OfferFilter,
        limit: Option<u64>,
        offset: u64,
    ) -> Result<Vec<OfferRecord>, Error> {
        let requested = limit.unwrap_or_else(|| self.max_output());
        let sql_limit = if requested == 0 { u64::MAX } else { requested };
        self.catalog
            .list(offer_type, &filter, sql_limit, offset)
            .map_err(Error::from)
    }

    pub fn list_my_offers(
        &self,
        status_filter: Option<MyOfferStatus>,
    ) -> Result<Vec<MyOfferRecord>, Error> {
        self.catalog.list_my_offers(status_filter).map_err(Error::from)
    }

    /// `add_offer(json)`: draft insert, generating and storing a fresh
    /// keypair.
    pub async fn add_offer(&self, input: DraftInput, now: u64) -> Result<MyOfferRecord, Error> {
        self.manager
            .add_or_edit_draft(None, input, now)
            .await
            .map_err(Error::from)
    }

    /// `edit_offer(hash, json)`. A `Draft` accepts any field change (the
    /// request's absent fields default to the stored value). An `Active`
    /// offer is restricted to `{price, short_info, details}`, and
    /// `time_expiration` must stay within the same fee-coefficient class if
    /// present at all; any other differing field fails with
    /// [`Error::UnchangedDataMismatch`]. Every other status rejects edits
    /// outright.
    pub async fn edit_offer(
        &self,
        hash: OfferHash,
        edit: EditOfferRequest,
        now: u64,
    ) -> Result<MyOfferRecord, Error> {
        let record = self.catalog.get_my_offer(&hash)?.ok_or(Error::NotFound(hash))?;

        match record.status {
            MyOfferStatus::Draft => {
                let o = &record.offer;
                let input = DraftInput {
                    offer_type: o.offer_type,
                    country_iso: edit.country_iso.unwrap_or_else(|| o.country_iso.clone()),
                    currency_iso: edit.currency_iso.unwrap_or_else(|| o.currency_iso.clone()),
                    payment_method: edit.payment_method.unwrap_or(o.payment_method),
                    price: edit.price.unwrap_or(o.price),
                    min_amount: edit.min_amount.unwrap_or(o.min_amount),
                    short_info: edit.short_info.unwrap_or_else(|| o.short_info.clone()),
                    details: edit.details.unwrap_or_else(|| o.details.clone()),
                    time_expiration: edit.time_expiration.unwrap_or(o.time_expiration),
                };
                self.manager
                    .add_or_edit_draft(Some(hash), input, now)
                    .await
                    .map_err(Error::from)
            }
            MyOfferStatus::Active => {
                let o = &record.offer;
                let unchanged = |a: &Option<String>, b: &str| a.as_deref().map_or(true, |v| v == b);
                if !unchanged(&edit.country_iso, &o.country_iso)
                    || !unchanged(&edit.currency_iso, &o.currency_iso)
                    || edit.payment_method.is_some_and(|v| v != o.payment_method)
                    || edit.min_amount.is_some_and(|v| v != o.min_amount)
                {
                    return Err(Error::UnchangedDataMismatch);
                }
                if let Some(new_expiration) = edit.time_expiration {
                    let old_coef = dex_types::constants::fee_coef(o.time_create, o.time_expiration);
                    let new_coef = dex_types::constants::fee_coef(o.time_create, new_expiration);
                    if old_coef != new_coef {
                        return Err(Error::UnchangedDataMismatch);
                    }
                }
                let active_edit = ActiveEdit {
                    price: edit.price,
                    short_info: edit.short_info,
                    details: edit.details,
                };
                self.manager
                    .edit_active(&hash, active_edit, now)
                    .await
                    .map_err(Error::from)
            }
            other => Err(Error::EditNotAllowed(hash, other)),
        }
    }

    /// `send_offer(hash)`: promotes a draft by paying the fee and
    /// broadcasting.
    pub async fn send_offer(&self, hash: OfferHash, now: u64) -> Result<MyOfferRecord, Error> {
        self.manager.prepare_and_send(&hash, now).await.map_err(Error::from)
    }

    /// `delete_offer(hash)`.
    pub async fn delete_offer(&self, hash: OfferHash, now: u64) -> Result<bool, Error> {
        self.manager.delete(&hash, now).await.map_err(Error::from)
    }

    /// `sync status`.
    pub fn sync_status(&self) -> SyncSnapshot {
        self.sync.snapshot()
    }

    /// `sync reset`: clears sync state and immediately retries `start()`.
    pub async fn sync_reset(&self) -> Result<bool, Error> {
        self.sync.reset_and_restart().await.map_err(Error::from)
    }

    /// `sync force-synced`: operator override, jumps straight to `Finished`.
    pub fn sync_force_synced(&self) {
        self.sync.force_synced();
    }

    /// `settings maxoutput N`: mutates the default list cap (`0` ⇒
    /// unlimited).
    pub fn settings_maxoutput(&self, n: u64) {
        self.max_output.store(n, Ordering::Relaxed);
    }

    pub fn max_output(&self) -> u64 {
        self.max_output.load(Ordering::Relaxed)
    }

    /// `info`: counts of buy / sell / my / unconfirmed offers.
    pub fn info(&self) -> Result<InfoSnapshot, Error> {
        let filter = OfferFilter::default();
        Ok(InfoSnapshot {
            buy: self.catalog.count(OfferType::Buy, &filter)?,
            sell: self.catalog.count(OfferType::Sell, &filter)?,
            my_offers: self.catalog.list_my_offers(None)?.len() as u64,
            unconfirmed: self.pool_new.len() as u64,
        })
    }

    /// `get_offer(hash)`: read-through CatalogStore then UnconfirmedPool.
    pub fn get_offer(&self, hash: OfferHash) -> Result<OfferRecord, Error> {
        if let Some(o) = self.catalog.get_by_hash(OfferType::Buy, &hash)? {
            return Ok(o);
        }
        if let Some(o) = self.catalog.get_by_hash(OfferType::Sell, &hash)? {
            return Ok(o);
        }
        if let Some(o) = self.pool_new.get(&hash) {
            return Ok(o);
        }
        Err(Error::NotFound(hash))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_crypto::Signer;
    use dex_types::test_support::{TestChain, TestTransport, TestWallet};
    use dex_types::{NeighborId, Transport, Wallet};

    fn draft_input() -> DraftInput {
        DraftInput {
            offer_type: OfferType::Sell,
            country_iso: "US".into(),
            currency_iso: "USD".into(),
            payment_method: PaymentMethod::CASH,
            price: 100,
            min_amount: 10,
            short_info: "cash only".into(),
            details: "meet nearby".into(),
            time_expiration: 10 * 86_400,
        }
    }

    fn new_handler() -> (RpcHandler, Arc<CatalogStore>, Arc<TestWallet>, Arc<TestChain>) {
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
        let wallet = Arc::new(TestWallet::default());
        let transport = Arc::new(TestTransport::with_neighbors(vec![NeighborId(1), NeighborId(2)]));
        let chain = Arc::new(TestChain::new(true, 0));
        let signer = Arc::new(Signer::new(wallet.clone() as Arc<dyn Wallet>));
        let manager = Arc::new(OfferManager::new(
            catalog.clone(),
            pool_new.clone(),
            signer,
            wallet.clone() as Arc<dyn Wallet>,
            transport.clone() as Arc<dyn Transport>,
            chain.clone() as Arc<dyn dex_types::TransactionSource>,
        ));
        let sync = Arc::new(SyncEngine::new(
            catalog.clone(),
            pool_new.clone(),
            transport as Arc<dyn Transport>,
            Arc::new(dex_types::test_support::TestMasternodeRegistry::with_registered([
                NeighborId(1),
                NeighborId(2),
            ])),
            chain.clone() as Arc<dyn dex_types::ChainView>,
            chain.clone() as Arc<dyn dex_types::TransactionSource>,
            wallet.clone() as Arc<dyn Wallet>,
            false,
        ));
        (RpcHandler::new(catalog.clone(), pool_new, manager, sync), catalog, wallet, chain)
    }

    #[tokio::test]
    async fn add_offer_then_get_offer_round_trips() {
        let (rpc, _, _, _) = new_handler();
        let record = rpc.add_offer(draft_input(), 1_000).await.unwrap();
        assert_eq!(record.status, MyOfferStatus::Draft);
    }

    #[tokio::test]
    async fn active_edit_rejects_identity_field_change() {
        let (rpc, catalog, _, _) = new_handler();
        let record = rpc.add_offer(draft_input(), 1_000).await.unwrap();
        catalog
            .set_my_offer_status(&record.offer.hash, MyOfferStatus::Active)
            .unwrap();

        let edit = EditOfferRequest {
            country_iso: Some("DE".into()),
            ..Default::default()
        };
        let err = rpc.edit_offer(record.offer.hash, edit, 1_100).await.unwrap_err();
        assert!(matches!(err, Error::UnchangedDataMismatch));
    }

    #[tokio::test]
    async fn active_edit_allows_price_and_bumps_editing_version() {
        let (rpc, catalog, _, _) = new_handler();
        let record = rpc.add_offer(draft_input(), 1_000).await.unwrap();
        catalog
            .set_my_offer_status(&record.offer.hash, MyOfferStatus::Active)
            .unwrap();

        let edit = EditOfferRequest {
            price: Some(999),
            ..Default::default()
        };
        let updated = rpc.edit_offer(record.offer.hash, edit, 1_100).await.unwrap();
        assert_eq!(updated.offer.price, 999);
        assert_eq!(updated.offer.editing_version, 1);
    }

    #[tokio::test]
    async fn settings_maxoutput_zero_means_unlimited() {
        let (rpc, _, _, _) = new_handler();
        rpc.settings_maxoutput(0);
        assert_eq!(rpc.max_output(), 0);
        let offers = rpc.list_offers(OfferType::Sell, OfferFilter::default(), None, 0).unwrap();
        assert!(offers.is_empty());
    }

    #[tokio::test]
    async fn info_counts_my_offers_and_unconfirmed() {
        let (rpc, _, _, _) = new_handler();
        rpc.add_offer(draft_input(), 1_000).await.unwrap();
        let snapshot = rpc.info().unwrap();
        assert_eq!(snapshot.my_offers, 1);
        assert_eq!(snapshot.unconfirmed, 0);
    }

    #[tokio::test]
    async fn get_offer_reports_not_found_when_absent_everywhere() {
        let (rpc, _, _, _) = new_handler();
        let err = rpc.get_offer(OfferHash::zero()).unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
