// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! [`OfferManager`]: the lifecycle owner for the offers this node
//! originates. It is the only writer of
//! `my_offers` rows, and the entry point for the three offer-mutating wire
//! messages (`NEW_OFFER`, `EDIT_OFFER`, `DELETE_OFFER`) regardless of
//! whether they arrived via direct gossip push or a sync session.

use crate::errors::{
    penalty_for_check_error, Error, PENALTY_INVALID_SIGNATURE, PENALTY_STALE_EDIT,
    PENALTY_UNKNOWN_EDIT_TARGET,
};
use crate::lifecycle;
use dex_crypto::Signer;
use dex_net::WireMessage;
use dex_pool::UnconfirmedPool;
use dex_store::CatalogStore;
use dex_types::{
    FeeBinding, FeeBindingError, MyOfferRecord, MyOfferStatus, OfferHash, OfferRecord, OfferType,
    OutPoint, PaymentMethod, Transport, TransactionSource, Wallet,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// The fields that fully describe a draft's content, independent of its
/// lifecycle bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftInput {
    pub offer_type: OfferType,
    pub country_iso: String,
    pub currency_iso: String,
    pub payment_method: PaymentMethod,
    pub price: u64,
    pub min_amount: u64,
    pub short_info: String,
    pub details: String,
    pub time_expiration: u64,
}

/// The restricted set of fields an `Active` offer may be edited to:
/// identity fields and the expiration class are fixed once an offer is live.
#[derive(Debug, Clone, Default)]
pub struct ActiveEdit {
    pub price: Option<u64>,
    pub short_info: Option<String>,
    pub details: Option<String>,
}

impl ActiveEdit {
    fn is_empty(&self) -> bool {
        self.price.is_none() && self.short_info.is_none() && self.details.is_none()
    }
}

/// Owns every mutation of this node's own offers: drafting, fee-funded
/// publication, editing an already-published offer, deletion, and applying
/// the same three operations when they arrive from a peer.
pub struct OfferManager {
    catalog: Arc<CatalogStore>,
    pool_new: Arc<UnconfirmedPool>,
    signer: Arc<Signer>,
    wallet: Arc<dyn Wallet>,
    transport: Arc<dyn Transport>,
    tx_source: Arc<dyn TransactionSource>,
}

impl OfferManager {
    pub fn new(
        catalog: Arc<CatalogStore>,
        pool_new: Arc<UnconfirmedPool>,
        signer: Arc<Signer>,
        wallet: Arc<dyn Wallet>,
        transport: Arc<dyn Transport>,
        tx_source: Arc<dyn TransactionSource>,
    ) -> Self {
        OfferManager {
            catalog,
            pool_new,
            signer,
            wallet,
            transport,
            tx_source,
        }
    }

    fn upsert_catalog(&self, offer: &OfferRecord, now: u64) -> Result<(), Error> {
        match offer.offer_type {
            OfferType::Buy => self.catalog.upsert_buy(offer, None, now),
            OfferType::Sell => self.catalog.upsert_sell(offer, None, now),
        }
        .map_err(Error::from)
    }

    fn get_by_hash_either(&self, hash: &OfferHash) -> Result<Option<(OfferType, OfferRecord)>, Error> {
        if let Some(o) = self.catalog.get_by_hash(OfferType::Buy, hash)? {
            return Ok(Some((OfferType::Buy, o)));
        }
        if let Some(o) = self.catalog.get_by_hash(OfferType::Sell, hash)? {
            return Ok(Some((OfferType::Sell, o)));
        }
        Ok(None)
    }

    async fn verify_fee_binding(&self, offer: &OfferRecord) -> Result<(), FeeBindingError> {
        let txid = offer
            .id_transaction
            .as_ref()
            .ok_or_else(|| FeeBindingError::TxMissing("<none>".to_string()))?;
        let tx = self
            .tx_source
            .get_transaction(txid)
            .await
            .map_err(|_| FeeBindingError::TxMissing(txid.clone()))?
            .ok_or_else(|| FeeBindingError::TxMissing(txid.clone()))?;
        let binding = FeeBinding {
            offer_hash: offer.hash,
            outpoint: OutPoint {
                txid: txid.clone(),
                vout: 0,
            },
        };
        binding.verify(&tx, offer.time_create, offer.time_expiration)
    }

    /// Writes a `Draft` `MyOfferRecord`, regenerating its hash from
    /// `input` and `now`. `existing` names a prior draft to replace in
    /// place (reusing its public key); `None` starts a brand new draft with
    /// a fresh keypair.
    pub async fn add_or_edit_draft(
        &self,
        existing: Option<OfferHash>,
        input: DraftInput,
        now: u64,
    ) -> Result<MyOfferRecord, Error> {
        let pub_key = match existing {
            Some(hash) => {
                let prior = self
                    .catalog
                    .get_my_offer(&hash)?
                    .ok_or(Error::NotFound(hash))?;
                lifecycle::require(prior.status, MyOfferStatus::Draft)?;
                prior.offer.pub_key
            }
            None => self.wallet.generate_keypair().await?,
        };

        let mut offer = OfferRecord {
            hash: OfferHash::zero(),
            id_transaction: None,
            offer_type: input.offer_type,
            country_iso: input.country_iso,
            currency_iso: input.currency_iso,
            payment_method: input.payment_method,
            price: input.price,
            min_amount: input.min_amount,
            short_info: input.short_info,
            details: input.details,
            pub_key,
            time_create: now,
            time_expiration: input.time_expiration,
            editing_version: 0,
            edit_hash: OfferHash::zero(),
            edit_sign: None,
        };
        offer.hash = offer.compute_hash();
        offer.edit_hash = offer.compute_edit_hash();

        if let Some(prior_hash) = existing {
            if prior_hash != offer.hash {
                self.catalog.delete_my_offer(&prior_hash)?;
            }
        }

        let record = MyOfferRecord::draft(offer);
        self.catalog.upsert_my_offer(&record, now)?;
        Ok(record)
    }

    /// Moves a `Draft` to `Unconfirmed`: builds and submits a fee
    /// transaction via the wallet, signs the offer, and broadcasts
    /// `NEW_OFFER` to every neighbor.
    pub async fn prepare_and_send(&self, hash: &OfferHash, now: u64) -> Result<MyOfferRecord, Error> {
        let mut record = self
            .catalog
            .get_my_offer(hash)?
            .ok_or(Error::NotFound(*hash))?;
        lifecycle::require(record.status, MyOfferStatus::Unconfirmed)?;

        let required_fee = dex_types::constants::required_fee_margin(
            record.offer.time_create,
            record.offer.time_expiration,
        );
        let txid = self
            .wallet
            .submit_fee_transaction(&record.offer.pub_key, record.offer.hash.as_bytes(), required_fee)
            .await?;

        record.offer.id_transaction = Some(txid.clone());
        record.fee_tx_hash = Some(txid);
        record.status = MyOfferStatus::Unconfirmed;

        let sig = self.signer.sign_offer(&record.offer).await?;
        let encoded = WireMessage::NewOffer {
            offer: Box::new(record.offer.clone()),
            sig,
        }
        .encode()
        .map_err(|e| Error::Transport(e.into()))?;
        self.transport.broadcast(encoded).await.map_err(Error::Transport)?;
        record.is_broadcast = true;

        self.catalog.upsert_my_offer(&record, now)?;
        self.pool_new.insert_or_update(record.offer.clone(), now);
        Ok(record)
    }

    /// Marks an `Unconfirmed` offer `Active` once its fee transaction has
    /// confirmed, called by the periodic rescan once
    /// [`dex_pool::UnconfirmedPool::reevaluate`] reports a promotion for one
    /// of our own hashes.
    pub fn promote_confirmed(&self, hash: &OfferHash, now: u64) -> Result<(), Error> {
        let Some(mut record) = self.catalog.get_my_offer(hash)? else {
            return Ok(());
        };
        if record.status != MyOfferStatus::Unconfirmed {
            return Ok(());
        }
        lifecycle::require(record.status, MyOfferStatus::Active)?;
        record.status = MyOfferStatus::Active;
        self.upsert_catalog(&record.offer, now)?;
        self.catalog.upsert_my_offer(&record, now)?;
        Ok(())
    }

    /// Falls an `Unconfirmed` offer of ours back to `Suspended`, called by
    /// the periodic rescan once [`dex_pool::UnconfirmedPool::reevaluate`]
    /// reports an eviction for one of our own hashes (its fee transaction
    /// never confirmed within the pool's TTL). The offer can be resubmitted
    /// later via [`Self::prepare_and_send`], which re-enters `Unconfirmed`.
    pub fn suspend(&self, hash: &OfferHash, now: u64) -> Result<(), Error> {
        let Some(mut record) = self.catalog.get_my_offer(hash)? else {
            return Ok(());
        };
        if record.status != MyOfferStatus::Unconfirmed {
            return Ok(());
        }
        lifecycle::require(record.status, MyOfferStatus::Suspended)?;
        record.status = MyOfferStatus::Suspended;
        self.catalog.upsert_my_offer(&record, now)?;
        Ok(())
    }

    /// Edits the restricted field set of an already-`Active` offer,
    /// bumping `editing_version`, resigning `edit_hash`, and broadcasting
    /// `EDIT_OFFER`. `hash` and the expiration class are never touched
    /// here -- that is the line between this and [`Self::add_or_edit_draft`].
    pub async fn edit_active(
        &self,
        hash: &OfferHash,
        edit: ActiveEdit,
        now: u64,
    ) -> Result<MyOfferRecord, Error> {
        if edit.is_empty() {
            return Err(Error::UnchangedDataMismatch);
        }
        let mut record = self
            .catalog
            .get_my_offer(hash)?
            .ok_or(Error::NotFound(*hash))?;
        lifecycle::require(record.status, MyOfferStatus::Active)?;
        if !self.wallet.has_private_key(&record.offer.pub_key).await? {
            return Err(Error::NoPrivateKey(*hash));
        }

        if let Some(price) = edit.price {
            record.offer.price = price;
        }
        if let Some(short_info) = edit.short_info {
            record.offer.short_info = short_info;
        }
        if let Some(details) = edit.details {
            record.offer.details = details;
        }
        record.offer.editing_version += 1;
        record.offer.edit_hash = record.offer.compute_edit_hash();
        record.offer.edit_sign = Some(self.signer.make_edit_sig(&record.offer).await?);

        let encoded = WireMessage::EditOffer {
            offer: Box::new(record.offer.clone()),
            edit_sig: record.offer.edit_sign.clone().expect("just signed"),
        }
        .encode()
        .map_err(|e| Error::Transport(e.into()))?;
        self.transport.broadcast(encoded).await.map_err(Error::Transport)?;

        self.upsert_catalog(&record.offer, now)?;
        self.catalog.upsert_my_offer(&record, now)?;
        Ok(record)
    }

    /// Deletes an offer this node owns. A `Draft` is removed immediately,
    /// since it was never published. A published offer is only removed
    /// locally once at least two neighbors have been broadcast the
    /// `DELETE_OFFER`; [`Transport`] carries no delivery acknowledgement of
    /// its own, so the number of known neighbors at broadcast time stands
    /// in for "accepted" -- the simplification recorded in DESIGN.md.
    /// Otherwise the offer stays `Active` for a later retry and this
    /// returns `false`.
    pub async fn delete(&self, hash: &OfferHash, now: u64) -> Result<bool, Error> {
        let record = self
            .catalog
            .get_my_offer(hash)?
            .ok_or(Error::NotFound(*hash))?;
        if !self.wallet.has_private_key(&record.offer.pub_key).await? {
            return Err(Error::NoPrivateKey(*hash));
        }

        if record.status == MyOfferStatus::Draft {
            self.catalog.delete_my_offer(hash)?;
            return Ok(true);
        }
        lifecycle::require(record.status, MyOfferStatus::Cancelled)?;

        let sig = self.signer.sign_offer(&record.offer).await?;
        let encoded = WireMessage::DeleteOffer { hash: *hash, sig }
            .encode()
            .map_err(|e| Error::Transport(e.into()))?;
        self.transport.broadcast(encoded).await.map_err(Error::Transport)?;

        let neighbor_count = self.transport.neighbors().await.map_err(Error::Transport)?.len();
        if neighbor_count < 2 {
            let _ = now;
            return Ok(false);
        }

        self.catalog.delete_by_hash(record.offer.offer_type, hash)?;
        self.catalog.delete_my_offer(hash)?;
        Ok(true)
    }

    /// Applies an incoming `NEW_OFFER`: verifies the signature and field
    /// bounds, then either upserts it into the confirmed catalog (fee
    /// binding already verifies) or stages it in the unconfirmed pool.
    pub async fn handle_new_offer(
        &self,
        offer: OfferRecord,
        sig: Vec<u8>,
        known_countries: &[String],
        known_currencies: &[String],
        now: u64,
    ) -> Result<(), Error> {
        self.signer
            .verify_offer(&offer, &sig)
            .map_err(|e| Error::BadSignature(e, PENALTY_INVALID_SIGNATURE))?;
        offer
            .check(known_countries, known_currencies)
            .map_err(|e| {
                let penalty = penalty_for_check_error(&e);
                Error::Check(e, penalty)
            })?;

        match self.verify_fee_binding(&offer).await {
            Ok(()) => {
                self.pool_new.remove(&offer.hash);
                self.upsert_catalog(&offer, now)?;
            }
            Err(_) => {
                self.pool_new.insert_or_update(offer, now);
            }
        }
        Ok(())
    }

    /// Applies an incoming `EDIT_OFFER`: verifies the edit signature and
    /// that `editing_version` strictly advances the stored row, then
    /// replaces the mutable fields in place (the hash, and therefore the
    /// catalog key, is untouched).
    pub fn handle_edit_offer(&self, offer: OfferRecord, now: u64) -> Result<(), Error> {
        let edit_sig = offer
            .edit_sign
            .clone()
            .ok_or(Error::BadEdit(offer.hash, PENALTY_UNKNOWN_EDIT_TARGET))?;
        self.signer
            .verify_edit(&offer, &edit_sig)
            .map_err(|e| Error::BadSignature(e, PENALTY_INVALID_SIGNATURE))?;

        let existing = self
            .catalog
            .get_by_hash(offer.offer_type, &offer.hash)?
            .ok_or(Error::BadEdit(offer.hash, PENALTY_UNKNOWN_EDIT_TARGET))?;
        if offer.editing_version <= existing.editing_version {
            return Err(Error::BadEdit(offer.hash, PENALTY_STALE_EDIT));
        }

        self.upsert_catalog(&offer, now)?;
        if let Some(mut my) = self.catalog.get_my_offer(&offer.hash)? {
            my.offer = offer;
            self.catalog.upsert_my_offer(&my, now)?;
        }
        Ok(())
    }

    /// Applies an incoming `DELETE_OFFER`. Idempotent: a hash already gone
    /// (or never seen) is a no-op success rather than a `NotFound` error,
    /// since a delete that raced an earlier one is not misbehavior.
    pub fn handle_delete_offer(&self, hash: OfferHash, sig: Vec<u8>) -> Result<(), Error> {
        let Some((offer_type, offer)) = self.get_by_hash_either(&hash)? else {
            return Ok(());
        };
        self.signer
            .verify_offer(&offer, &sig)
            .map_err(|e| Error::BadSignature(e, PENALTY_INVALID_SIGNATURE))?;

        self.catalog.delete_by_hash(offer_type, &hash)?;
        self.catalog.delete_my_offer(&hash)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_types::test_support::{TestChain, TestTransport, TestWallet};
    use dex_types::{NeighborId, OfferHash};

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

    fn new_manager() -> (
        OfferManager,
        Arc<CatalogStore>,
        Arc<TestWallet>,
        Arc<TestTransport>,
        Arc<TestChain>,
    ) {
        let catalog = Arc::new(CatalogStore::open_in_memory().unwrap());
        catalog.replace_countries(&[dex_store::ReferenceEntry {
            iso: "US".into(),
            name: "United States".into(),
            enabled: true,
        }]).unwrap();
        catalog.replace_currencies(&[dex_store::ReferenceEntry {
            iso: "USD".into(),
            name: "US Dollar".into(),
            enabled: true,
        }]).unwrap();
        let pool_new = Arc::new(UnconfirmedPool::new("new"));
        let wallet = Arc::new(TestWallet::default());
        let transport = Arc::new(TestTransport::with_neighbors(vec![NeighborId(1), NeighborId(2)]));
        let chain = Arc::new(TestChain::new(false, 0));
        let signer = Arc::new(Signer::new(wallet.clone() as Arc<dyn Wallet>));
        let manager = OfferManager::new(
            catalog.clone(),
            pool_new,
            signer,
            wallet.clone() as Arc<dyn Wallet>,
            transport.clone() as Arc<dyn Transport>,
            chain.clone() as Arc<dyn TransactionSource>,
        );
        (manager, catalog, wallet, transport, chain)
    }

    #[tokio::test]
    async fn add_or_edit_draft_creates_a_fresh_draft() {
        let (manager, _, _, _, _) = new_manager();
        let record = manager.add_or_edit_draft(None, draft_input(), 1_000).await.unwrap();
        assert_eq!(record.status, MyOfferStatus::Draft);
        assert_eq!(record.offer.editing_version, 0);
        assert!(!record.offer.pub_key.is_empty());
    }

    #[tokio::test]
    async fn add_or_edit_draft_reuses_pub_key_and_rewrites_hash() {
        let (manager, _, _, _, _) = new_manager();
        let first = manager.add_or_edit_draft(None, draft_input(), 1_000).await.unwrap();

        let mut changed = draft_input();
        changed.price = 500;
        let second = manager
            .add_or_edit_draft(Some(first.offer.hash), changed, 2_000)
            .await
            .unwrap();

        assert_eq!(second.offer.pub_key, first.offer.pub_key);
        assert_ne!(second.offer.hash, first.offer.hash);
    }

    #[tokio::test]
    async fn add_or_edit_draft_rejects_editing_a_non_draft() {
        let (manager, catalog, _, _, _) = new_manager();
        let mut record = manager.add_or_edit_draft(None, draft_input(), 1_000).await.unwrap();
        record.status = MyOfferStatus::Active;
        catalog.upsert_my_offer(&record, 1_000).unwrap();

        let err = manager
            .add_or_edit_draft(Some(record.offer.hash), draft_input(), 2_000)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition(_)));
    }

    #[tokio::test]
    async fn prepare_and_send_submits_fee_and_broadcasts() {
        let (manager, _, wallet, transport, _) = new_manager();
        let draft = manager.add_or_edit_draft(None, draft_input(), 1_000).await.unwrap();

        let sent = manager.prepare_and_send(&draft.offer.hash, 1_000).await.unwrap();
        assert_eq!(sent.status, MyOfferStatus::Unconfirmed);
        assert!(sent.fee_tx_hash.is_some());
        assert_eq!(wallet.submitted_fee_transactions().len(), 1);
        assert_eq!(transport.sent().len(), 1);
    }

    #[tokio::test]
    async fn promote_confirmed_moves_unconfirmed_to_active() {
        let (manager, catalog, _, _, _) = new_manager();
        let draft = manager.add_or_edit_draft(None, draft_input(), 1_000).await.unwrap();
        manager.prepare_and_send(&draft.offer.hash, 1_000).await.unwrap();

        manager.promote_confirmed(&draft.offer.hash, 2_000).unwrap();

        let my = catalog.get_my_offer(&draft.offer.hash).unwrap().unwrap();
        assert_eq!(my.status, MyOfferStatus::Active);
        assert!(catalog.exists_by_hash(OfferType::Sell, &draft.offer.hash).unwrap());
    }

    #[tokio::test]
    async fn edit_active_bumps_version_and_broadcasts() {
        let (manager, catalog, _, transport, _) = new_manager();
        let draft = manager.add_or_edit_draft(None, draft_input(), 1_000).await.unwrap();
        manager.prepare_and_send(&draft.offer.hash, 1_000).await.unwrap();
        manager.promote_confirmed(&draft.offer.hash, 2_000).unwrap();

        let edit = ActiveEdit {
            price: Some(250),
            ..Default::default()
        };
        let edited = manager.edit_active(&draft.offer.hash, edit, 3_000).await.unwrap();
        assert_eq!(edited.offer.price, 250);
        assert_eq!(edited.offer.editing_version, 1);
        assert!(edited.offer.edit_sign.is_some());
        assert_eq!(edited.offer.hash, draft.offer.hash);

        let stored = catalog.get_by_hash(OfferType::Sell, &draft.offer.hash).unwrap().unwrap();
        assert_eq!(stored.price, 250);
        assert_eq!(transport.sent().len(), 2); // NewOffer + EditOffer
    }

    #[tokio::test]
    async fn edit_active_rejects_an_empty_edit() {
        let (manager, _, _, _, _) = new_manager();
        let draft = manager.add_or_edit_draft(None, draft_input(), 1_000).await.unwrap();
        manager.prepare_and_send(&draft.offer.hash, 1_000).await.unwrap();
        manager.promote_confirmed(&draft.offer.hash, 2_000).unwrap();

        let err = manager
            .edit_active(&draft.offer.hash, ActiveEdit::default(), 3_000)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnchangedDataMismatch));
    }

    #[tokio::test]
    async fn delete_removes_a_draft_immediately() {
        let (manager, catalog, _, _, _) = new_manager();
        let draft = manager.add_or_edit_draft(None, draft_input(), 1_000).await.unwrap();
        assert!(manager.delete(&draft.offer.hash, 1_000).await.unwrap());
        assert!(catalog.get_my_offer(&draft.offer.hash).unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_removes_an_active_offer_once_two_neighbors_are_known() {
        let (manager, catalog, _, _, _) = new_manager();
        let draft = manager.add_or_edit_draft(None, draft_input(), 1_000).await.unwrap();
        manager.prepare_and_send(&draft.offer.hash, 1_000).await.unwrap();
        manager.promote_confirmed(&draft.offer.hash, 2_000).unwrap();

        assert!(manager.delete(&draft.offer.hash, 3_000).await.unwrap());
        assert!(catalog.get_my_offer(&draft.offer.hash).unwrap().is_none());
        assert!(!catalog.exists_by_hash(OfferType::Sell, &draft.offer.hash).unwrap());
    }

    #[tokio::test]
    async fn delete_keeps_the_offer_when_too_few_neighbors_are_known() {
        let catalog = Arc::new(CatalogStore::open_in_memory().unwrap());
        catalog.replace_countries(&[dex_store::ReferenceEntry {
            iso: "US".into(),
            name: "United States".into(),
            enabled: true,
        }]).unwrap();
        catalog.replace_currencies(&[dex_store::ReferenceEntry {
            iso: "USD".into(),
            name: "US Dollar".into(),
            enabled: true,
        }]).unwrap();
        let pool_new = Arc::new(UnconfirmedPool::new("new"));
        let wallet = Arc::new(TestWallet::default());
        let transport = Arc::new(TestTransport::with_neighbors(vec![NeighborId(1)]));
        let chain = Arc::new(TestChain::new(false, 0));
        let signer = Arc::new(Signer::new(wallet.clone() as Arc<dyn Wallet>));
        let manager = OfferManager::new(
            catalog.clone(),
            pool_new,
            signer,
            wallet.clone() as Arc<dyn Wallet>,
            transport.clone() as Arc<dyn Transport>,
            chain.clone() as Arc<dyn TransactionSource>,
        );

        let draft = manager.add_or_edit_draft(None, draft_input(), 1_000).await.unwrap();
        manager.prepare_and_send(&draft.offer.hash, 1_000).await.unwrap();
        manager.promote_confirmed(&draft.offer.hash, 2_000).unwrap();

        assert!(!manager.delete(&draft.offer.hash, 3_000).await.unwrap());
        assert!(catalog.get_my_offer(&draft.offer.hash).unwrap().is_some());
    }

    #[tokio::test]
    async fn handle_new_offer_stages_unconfirmed_offers_in_the_pool() {
        use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};

        let (manager, catalog, _, _, _) = new_manager();
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[3u8; 32]).unwrap();
        let pub_key = PublicKey::from_secret_key(&secp, &sk).serialize().to_vec();

        let mut offer = OfferRecord {
            hash: OfferHash::zero(),
            id_transaction: Some("missing-tx".into()),
            offer_type: OfferType::Buy,
            country_iso: "US".into(),
            currency_iso: "USD".into(),
            payment_method: PaymentMethod::CASH,
            price: 100,
            min_amount: 10,
            short_info: "hi".into(),
            details: "there".into(),
            pub_key,
            time_create: 1_000,
            time_expiration: 1_000 + 10 * 86_400,
            editing_version: 0,
            edit_hash: OfferHash::zero(),
            edit_sign: None,
        };
        offer.hash = offer.compute_hash();
        offer.edit_hash = offer.compute_edit_hash();

        let msg = Message::from_digest_slice(offer.hash.as_bytes()).unwrap();
        let sig = secp.sign_ecdsa(&msg, &sk).serialize_compact().to_vec();

        manager
            .handle_new_offer(offer.clone(), sig, &["US".to_string()], &["USD".to_string()], 1_000)
            .await
            .unwrap();

        assert!(!catalog.exists_by_hash(OfferType::Buy, &offer.hash).unwrap());
    }

    #[tokio::test]
    async fn handle_delete_offer_is_idempotent_for_an_unknown_hash() {
        let (manager, _, _, _, _) = new_manager();
        manager.handle_delete_offer(OfferHash::zero(), vec![1, 2, 3]).unwrap();
    }
}
