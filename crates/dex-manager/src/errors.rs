// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use crate::lifecycle::Transition;
use dex_types::{CheckError, OfferHash, Penalty};
use thiserror::Error;

pub use dex_types::penalty_for_check_error;

pub const PENALTY_INVALID_SIGNATURE: Penalty = 25;
pub const PENALTY_UNKNOWN_EDIT_TARGET: Penalty = 15;
pub const PENALTY_STALE_EDIT: Penalty = 5;

#[derive(Debug, Error)]
pub enum Error {
    #[error("catalog store error: {0}")]
    Store(#[from] dex_store::Error),

    #[error("signing or verification error: {0}")]
    Crypto(#[from] dex_crypto::errors::Error),

    #[error("wallet error: {0}")]
    Wallet(#[from] dex_types::WalletError),

    #[error("transport error: {0}")]
    Transport(#[source] anyhow::Error),

    #[error("offer {0} has no draft or published record on this node")]
    NotFound(OfferHash),

    #[error("{0}")]
    InvalidTransition(#[from] Transition),

    #[error("unchanged data doesn't match")]
    UnchangedDataMismatch,

    #[error("this wallet does not hold the private key that authored offer {0}")]
    NoPrivateKey(OfferHash),

    #[error("offer fails validation: {0}")]
    Check(#[source] CheckError, Penalty),

    #[error("signature does not verify (penalty {1})")]
    BadSignature(#[source] dex_crypto::errors::Error, Penalty),

    #[error("edit for offer {0} targets unknown or stale editing_version (penalty {1})")]
    BadEdit(OfferHash, Penalty),
}
