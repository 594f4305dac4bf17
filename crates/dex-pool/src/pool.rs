// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! [`UnconfirmedPool`]: staging area for offers whose fee transaction has
//! not yet reached [`dex_types::constants::PAYOFFER_MIN_TX_HEIGHT`]
//! confirmations. The composition root can wire up more than one instance
//! with identical semantics -- one for newly observed offers, one for
//! broadcast edits -- distinguished only by name.

use dex_types::constants::UNCONFIRMED_POOL_TTL_SECS;
use dex_types::fee::{FeeBinding, OutPoint};
use dex_types::{OfferHash, OfferRecord, TransactionSource};
use parking_lot::RwLock;
use std::collections::HashMap;

/// A single offer staged in the pool, along with the bookkeeping needed for
/// TTL eviction and rebroadcast backoff.
#[derive(Debug, Clone)]
pub struct PendingOffer {
    pub offer: OfferRecord,
    pub inserted_at: u64,
    pub last_attempt: Option<u64>,
}

/// The result of [`UnconfirmedPool::insert_or_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Updated,
    /// A higher or equal `editing_version` was already staged; the new
    /// offer was discarded.
    Ignored,
}

/// The result of reevaluating one pending entry against the chain.
#[derive(Debug, Clone)]
pub enum PoolOutcome {
    /// The offer's fee transaction now verifies; the caller should promote
    /// it into [`dex_store::CatalogStore`] (this crate does not depend on
    /// the store to avoid a cyclic dependency -- promotion is the caller's
    /// job, handed off to `OfferManager`).
    Promoted(OfferRecord),
    /// The entry's soft TTL elapsed without the fee transaction
    /// confirming; it was removed from the pool.
    Evicted(OfferHash),
}

/// In-memory, mutex-guarded staging pool. One instance models a "newly
/// observed" pool, another a "broadcast edits" pool; `name` is carried only
/// for logging.
pub struct UnconfirmedPool {
    name: &'static str,
    ttl_secs: u64,
    entries: RwLock<HashMap<OfferHash, PendingOffer>>,
}

impl UnconfirmedPool {
    pub fn new(name: &'static str) -> Self {
        UnconfirmedPool {
            name,
            ttl_secs: UNCONFIRMED_POOL_TTL_SECS,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Like [`Self::new`] but with an explicit TTL, for tests and
    /// operator-tuned deployments.
    pub fn with_ttl(name: &'static str, ttl_secs: u64) -> Self {
        UnconfirmedPool {
            name,
            ttl_secs,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Inserts `offer` if its hash is absent, or replaces the existing
    /// entry if `offer.editing_version` is strictly greater; otherwise the
    /// call is a no-op.
    pub fn insert_or_update(&self, offer: OfferRecord, now: u64) -> InsertOutcome {
        let mut entries = self.entries.write();
        match entries.get(&offer.hash) {
            None => {
                let hash = offer.hash;
                entries.insert(
                    hash,
                    PendingOffer {
                        offer,
                        inserted_at: now,
                        last_attempt: None,
                    },
                );
                InsertOutcome::Inserted
            }
            Some(existing) if offer.editing_version > existing.offer.editing_version => {
                let hash = offer.hash;
                entries.insert(
                    hash,
                    PendingOffer {
                        offer,
                        inserted_at: now,
                        last_attempt: None,
                    },
                );
                InsertOutcome::Updated
            }
            Some(_) => InsertOutcome::Ignored,
        }
    }

    pub fn remove(&self, hash: &OfferHash) -> Option<OfferRecord> {
        self.entries.write().remove(hash).map(|e| e.offer)
    }

    pub fn get(&self, hash: &OfferHash) -> Option<OfferRecord> {
        self.entries.read().get(hash).map(|e| e.offer.clone())
    }

    pub fn all(&self) -> Vec<OfferRecord> {
        self.entries.read().values().map(|e| e.offer.clone()).collect()
    }

    /// Re-runs [`FeeBinding::verify`] against every pending offer. Offers
    /// whose fee transaction now confirms are removed from the pool and
    /// returned as [`PoolOutcome::Promoted`]; offers whose soft TTL has
    /// elapsed without confirming are removed and returned as
    /// [`PoolOutcome::Evicted`]. Everything else remains staged for the
    /// next call and is retried indefinitely until it confirms or its TTL
    /// elapses.
    pub async fn reevaluate(
        &self,
        tx_source: &dyn TransactionSource,
        now: u64,
    ) -> Vec<PoolOutcome> {
        let pending: Vec<PendingOffer> = self.entries.read().values().cloned().collect();
        let mut outcomes = Vec::new();

        for entry in pending {
            let hash = entry.offer.hash;
            let outcome = self.reevaluate_one(&entry, tx_source, now).await;
            match outcome {
                Some(PoolOutcome::Promoted(offer)) => {
                    self.entries.write().remove(&hash);
                    outcomes.push(PoolOutcome::Promoted(offer));
                }
                Some(PoolOutcome::Evicted(h)) => {
                    self.entries.write().remove(&h);
                    outcomes.push(PoolOutcome::Evicted(h));
                }
                None => {
                    if let Some(e) = self.entries.write().get_mut(&hash) {
                        e.last_attempt = Some(now);
                    }
                }
            }
        }
        if !outcomes.is_empty() {
            log::debug!(
                "pool[{}]: reevaluate produced {} outcomes",
                self.name,
                outcomes.len()
            );
        }
        outcomes
    }

    async fn reevaluate_one(
        &self,
        entry: &PendingOffer,
        tx_source: &dyn TransactionSource,
        now: u64,
    ) -> Option<PoolOutcome> {
        let offer = &entry.offer;
        let txid = offer.id_transaction.as_ref()?;

        let tx = match tx_source.get_transaction(txid).await {
            Ok(Some(tx)) => tx,
            Ok(None) | Err(_) => {
                return self.ttl_outcome(entry, now);
            }
        };

        let binding = FeeBinding {
            offer_hash: offer.hash,
            outpoint: OutPoint {
                txid: txid.clone(),
                vout: 0,
            },
        };
        match binding.verify(&tx, offer.time_create, offer.time_expiration) {
            Ok(()) => Some(PoolOutcome::Promoted(offer.clone())),
            Err(_) => self.ttl_outcome(entry, now),
        }
    }

    fn ttl_outcome(&self, entry: &PendingOffer, now: u64) -> Option<PoolOutcome> {
        if now.saturating_sub(entry.inserted_at) > self.ttl_secs {
            Some(PoolOutcome::Evicted(entry.offer.hash))
        } else {
            None
        }
    }
}
