// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The multi-phase gossip-reconciliation state machine: [`SyncEngine`] owns
//! a per-node sync session, tracks per-neighbor [`NeighborStatus`], and
//! drives the `GET_ALL_HASH`/`PART_HASH`/`GET_OFFER` exchange to
//! convergence.

pub mod distribute;
pub mod engine;
pub mod errors;
pub mod state;

pub use distribute::{distribute, DistributionMode};
pub use engine::{SyncEngine, SyncSnapshot};
pub use errors::Error;
pub use state::{is_qualifying_neighbor, NeighborStatus, SyncState};
