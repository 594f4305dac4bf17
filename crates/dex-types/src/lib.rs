// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Canonical offer data model, fee-binding verification and the
//! external-collaborator trait boundaries shared by every crate in the
//! offer mesh workspace.

pub mod constants;
pub mod fee;
pub mod hash;
pub mod offer;
pub mod traits;

#[cfg(feature = "test-support")]
pub mod test_support;

pub use fee::{FeeBinding, FeeBindingError, OutPoint, Script, Transaction, TxOut};
pub use hash::{CanonicalEncoder, OfferHash};
pub use offer::{
    penalty_for_check_error, CheckError, MyOfferRecord, MyOfferStatus, OfferRecord, OfferType,
    Penalty, PaymentMethod, PENALTY_HASH_MISMATCH,
};
pub use traits::{ChainView, MasternodeRegistry, NeighborId, Transport, TransactionSource, Wallet, WalletError};
