// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use dex_types::{MyOfferStatus, OfferHash};
use thiserror::Error;

/// Errors surfaced across the RPC boundary. `Storage` is deliberately
/// flattened to generic text -- callers external to this workspace are not
/// expected to branch on SQLite detail -- while the other variants carry
/// enough structure for a caller to react.
#[derive(Debug, Error)]
pub enum Error {
    #[error("the operation failed")]
    Storage(#[from] dex_store::Error),

    #[error("{0}")]
    Manager(#[from] dex_manager::errors::Error),

    #[error("{0}")]
    Sync(#[from] dex_sync::errors::Error),

    #[error("no offer {0} found in the catalog or unconfirmed pool")]
    NotFound(OfferHash),

    #[error("unchanged data doesn't match")]
    UnchangedDataMismatch,

    #[error("offer {0} is {1:?}; only Draft or Active offers accept edits")]
    EditNotAllowed(OfferHash, MyOfferStatus),
}
