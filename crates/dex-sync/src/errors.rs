// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::state::SyncState;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("catalog store error: {0}")]
    Store(#[from] dex_store::Error),

    #[error("wire codec error: {0}")]
    Net(#[from] dex_net::Error),

    #[error("transport or collaborator error: {0}")]
    Transport(#[source] anyhow::Error),

    #[error("reset rejected while in {0:?}")]
    ResetRejected(SyncState),

    #[error("{0} is not a sync-protocol message; route it to OfferManager")]
    NotSyncMessage(&'static str),
}
