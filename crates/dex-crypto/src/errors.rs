// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use dex_types::WalletError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("`{0}` is not a valid secp256k1 public key")]
    InvalidPublicKey(String),

    #[error("`{0}` is not a valid secp256k1 signature")]
    InvalidSignature(String),

    #[error("signature does not verify against the given public key")]
    VerificationFailed,

    #[error("wallet is unavailable: {0}")]
    WalletUnavailable(#[from] WalletError),
}
