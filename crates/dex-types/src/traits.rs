// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! External-collaborator trait boundaries. None of these are implemented in
//! this workspace: the host peer process owns the chain, the wallet and the
//! P2P transport, and hands this subsystem a concrete implementation of each
//! at composition time. Each is a narrow trait scoped tightly to the seam it
//! crosses, with the fallible surface collapsed to `anyhow::Error` since
//! callers here have no stake in the host's internal error taxonomy.

use crate::fee::Transaction;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Opaque identifier for a gossip neighbor, as assigned by the host
/// transport layer (typically a P2P session id or socket address string).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NeighborId(pub u64);

/// Looks up fee transactions by id. Implemented by the host's wallet/chain
/// wallet-transaction index.
#[async_trait]
pub trait TransactionSource: Send + Sync {
    async fn get_transaction(&self, txid: &str) -> anyhow::Result<Option<Transaction>>;
}

/// Read-only access to chain state this subsystem needs but does not own:
/// current tip height (for confirmation counts) and protocol version gating.
#[async_trait]
pub trait ChainView: Send + Sync {
    async fn tip_height(&self) -> anyhow::Result<u32>;

    /// Whether a peer announcing `protocol_version` is allowed to
    /// participate in offer gossip.
    fn is_version_allowed(&self, protocol_version: u32) -> bool;

    /// Whether this node is running against testnet consensus params
    /// (changes the sync quorum via
    /// [`crate::constants::min_number_dex_node`]).
    fn is_testnet(&self) -> bool;
}

#[derive(Debug, Error)]
pub enum WalletError {
    #[error("wallet is locked or unavailable")]
    Unavailable,
    #[error("no key found for the requested public key")]
    KeyNotFound,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Key custody and signing: the lookup/sign shape a key-management backend
/// exposes, generalized to the signatures and fee-payment plumbing this
/// subsystem needs (offer authorship, edit authorization, anti-spam fee
/// funding).
#[async_trait]
pub trait Wallet: Send + Sync {
    /// Returns `true` if this wallet holds the private key for `pub_key`.
    async fn has_private_key(&self, pub_key: &[u8]) -> Result<bool, WalletError>;

    /// Generates a fresh keypair and returns its public key, for a draft
    /// offer that needs a new identity key stored alongside it.
    async fn generate_keypair(&self) -> Result<Vec<u8>, WalletError>;

    /// Signs `digest` (a double-SHA256 offer or edit hash) with the key
    /// matching `pub_key`.
    async fn sign(&self, pub_key: &[u8], digest: &[u8; 32]) -> Result<Vec<u8>, WalletError>;

    /// Builds, signs and broadcasts to the chain network a fee transaction
    /// whose output 0 commits to `offer_hash` via OP_RETURN and whose
    /// debit-minus-credit margin is at least `required_fee`. Returns the
    /// new transaction's id. Used by `OfferManager::prepare_and_send` to
    /// fund a draft's publication; the wallet submits directly to the
    /// chain network, distinct from [`Transport::broadcast`]'s
    /// offer-gossip broadcast.
    async fn submit_fee_transaction(
        &self,
        pub_key: &[u8],
        offer_hash: &[u8; 32],
        required_fee: u64,
    ) -> Result<String, WalletError>;
}

/// Outbound gossip transport: sending to one neighbor, broadcasting to all,
/// and enumerating current neighbors. Framing and session management are
/// entirely the host's concern; this trait only carries already-encoded
/// message bytes.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send_to(&self, neighbor: NeighborId, message: Vec<u8>) -> anyhow::Result<()>;

    async fn broadcast(&self, message: Vec<u8>) -> anyhow::Result<()>;

    async fn neighbors(&self) -> anyhow::Result<Vec<NeighborId>>;

    /// The protocol version a neighbor announced during handshake, checked
    /// against [`ChainView::is_version_allowed`] by the qualifying-neighbor
    /// predicate a sync round uses to decide who participates.
    async fn protocol_version(&self, neighbor: NeighborId) -> anyhow::Result<u32>;

    /// Whether `neighbor`'s session was opened by them dialing us.
    async fn is_inbound(&self, neighbor: NeighborId) -> anyhow::Result<bool>;

    /// Records a misbehavior weight against `neighbor` for the host's
    /// ban-score bookkeeping (spec.md section 7: a `ValidationError` from
    /// the network penalizes the sender). The default is a no-op logged at
    /// debug level; a real transport overrides this to actually move a
    /// ban score.
    async fn penalize(&self, neighbor: NeighborId, weight: crate::offer::Penalty) -> anyhow::Result<()> {
        log::debug!("penalize({neighbor:?}, {weight}) not implemented by this transport");
        Ok(())
    }
}

/// Predicate over masternode registration, used to decide whether a
/// neighbor counts toward the sync quorum.
#[async_trait]
pub trait MasternodeRegistry: Send + Sync {
    async fn is_registered(&self, neighbor: NeighborId) -> anyhow::Result<bool>;

    /// Whether this node itself operates as a masternode. Combined with
    /// [`Transport::is_inbound`] by the qualifying-neighbor predicate: an
    /// inbound neighbor doesn't count toward quorum when we are ourselves a
    /// masternode (the original only originates sync sessions towards
    /// masternodes it dialed out to).
    fn is_self_masternode(&self) -> bool {
        false
    }
}
