// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The sync session's own state machine and the per-neighbor status it
//! tracks, plus the qualifying-neighbor predicate that gates who
//! participates in a round: a small exhaustive enum with an explicit
//! transition guard rather than a scattered set of booleans.

use dex_types::constants::MIN_DEX_VERSION;
use dex_types::{ChainView, MasternodeRegistry, NeighborId, Transport};

/// The sync session's own progress through a gossip-reconciliation round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    NotStarted,
    Started,
    Initial,
    SyncStepOne,
    SyncStepSecond,
    Finished,
}

impl Default for SyncState {
    fn default() -> Self {
        SyncState::NotStarted
    }
}

impl SyncState {
    /// `reset()` is only allowed from these states; SyncStepOne and
    /// SyncStepSecond must run to completion (or timeout to Finished)
    /// first.
    pub fn can_reset(self) -> bool {
        matches!(
            self,
            SyncState::NotStarted | SyncState::Initial | SyncState::Finished
        )
    }
}

/// Per-neighbor reconciliation status tracked during a sync round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborStatus {
    /// Actively exchanging inventory; eligible for `GET_OFFER` fan-out.
    Good,
    /// This neighbor's PART_HASH batches have all been applied; no longer
    /// contributes new `need_download` entries but still counts as
    /// in-flight for termination purposes until it is `Actual` or `Bad`.
    Process,
    /// Catalogs matched, or the neighbor reported an empty one -- nothing
    /// further to reconcile with it this round.
    Actual,
    /// Unresponsive (answer timer) or has sent a malformed message;
    /// excluded from `GET_OFFER` fan-out.
    Bad,
}

/// version >= MIN_DEX_VERSION, registered as a masternode, and -- if we are
/// ourselves a masternode -- not a session the neighbor dialed in to us:
/// the original only originates sync sessions towards masternodes it
/// dialed out to, so an inbound session while self-masternode doesn't
/// count toward quorum or participate in gossip.
pub async fn is_qualifying_neighbor(
    neighbor: NeighborId,
    chain: &dyn ChainView,
    transport: &dyn Transport,
    registry: &dyn MasternodeRegistry,
) -> anyhow::Result<bool> {
    let version = transport.protocol_version(neighbor).await?;
    if version < MIN_DEX_VERSION || !chain.is_version_allowed(version) {
        return Ok(false);
    }
    if !registry.is_registered(neighbor).await? {
        return Ok(false);
    }
    if registry.is_self_masternode() && transport.is_inbound(neighbor).await? {
        return Ok(false);
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_types::test_support::{TestChain, TestMasternodeRegistry, TestTransport};

    #[test]
    fn reset_allowed_states() {
        assert!(SyncState::NotStarted.can_reset());
        assert!(SyncState::Initial.can_reset());
        assert!(SyncState::Finished.can_reset());
        assert!(!SyncState::Started.can_reset());
        assert!(!SyncState::SyncStepOne.can_reset());
        assert!(!SyncState::SyncStepSecond.can_reset());
    }

    #[tokio::test]
    async fn qualifying_requires_version_and_registration() {
        let chain = TestChain::new(false, MIN_DEX_VERSION);
        let transport = TestTransport::with_neighbors(vec![NeighborId(1)]);
        transport.set_version(NeighborId(1), MIN_DEX_VERSION - 1);
        let registry = TestMasternodeRegistry::with_registered([NeighborId(1)]);
        assert!(!is_qualifying_neighbor(NeighborId(1), &chain, &transport, &registry)
            .await
            .unwrap());

        transport.set_version(NeighborId(1), MIN_DEX_VERSION);
        assert!(is_qualifying_neighbor(NeighborId(1), &chain, &transport, &registry)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unregistered_neighbor_does_not_qualify() {
        let chain = TestChain::new(false, MIN_DEX_VERSION);
        let transport = TestTransport::with_neighbors(vec![NeighborId(1)]);
        let registry = TestMasternodeRegistry::with_registered([]);
        assert!(!is_qualifying_neighbor(NeighborId(1), &chain, &transport, &registry)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn inbound_neighbor_excluded_when_self_masternode() {
        let chain = TestChain::new(false, MIN_DEX_VERSION);
        let transport = TestTransport::with_neighbors(vec![NeighborId(1)]);
        transport.set_inbound(NeighborId(1));
        let registry = TestMasternodeRegistry::with_registered([NeighborId(1)]).as_self_masternode();
        assert!(!is_qualifying_neighbor(NeighborId(1), &chain, &transport, &registry)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn inbound_neighbor_allowed_when_not_self_masternode() {
        let chain = TestChain::new(false, MIN_DEX_VERSION);
        let transport = TestTransport::with_neighbors(vec![NeighborId(1)]);
        transport.set_inbound(NeighborId(1));
        let registry = TestMasternodeRegistry::with_registered([NeighborId(1)]);
        assert!(is_qualifying_neighbor(NeighborId(1), &chain, &transport, &registry)
            .await
            .unwrap());
    }
}
