// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The canonical offer data model: [`OfferRecord`], its owner-side extension
//! [`MyOfferRecord`], and the small enums that classify them.

use crate::constants::{DETAILS_MAX_BYTES, SHORT_INFO_MAX_BYTES};
use crate::hash::{CanonicalEncoder, OfferHash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Buy or sell side of an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OfferType {
    Buy,
    Sell,
}

/// Bitmask of accepted payment methods. `CASH` and `ONLINE` are the two
/// methods currently defined; additional bits are reserved for future
/// payment rails and round-trip losslessly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentMethod(pub u32);

impl PaymentMethod {
    pub const CASH: PaymentMethod = PaymentMethod(1);
    pub const ONLINE: PaymentMethod = PaymentMethod(128);

    pub fn contains(&self, other: PaymentMethod) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn union(&self, other: PaymentMethod) -> PaymentMethod {
        PaymentMethod(self.0 | other.0)
    }
}

/// Lifecycle status of an offer this node originates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MyOfferStatus {
    Indefined,
    Active,
    Draft,
    Expired,
    Cancelled,
    Suspended,
    Unconfirmed,
}

impl Default for MyOfferStatus {
    fn default() -> Self {
        MyOfferStatus::Indefined
    }
}

/// A single offer as it appears in the shared catalog.
///
/// `hash` and `edit_hash` are not stored inputs -- they are derived from the
/// other fields by [`OfferRecord::compute_hash`] /
/// [`OfferRecord::compute_edit_hash`] and must always agree with them;
/// callers that mutate a record are responsible for recomputing both.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfferRecord {
    pub hash: OfferHash,
    /// Txid of the fee transaction this offer is bound to. `None` for a
    /// draft that has not yet paid its fee; present (and the target of
    /// [`crate::fee::FeeBinding::verify`]) for every broadcastable offer.
    /// Excluded from [`Self::canonical_bytes`]: the content hash identifies
    /// the offer independent of which fee payment happens to fund it.
    pub id_transaction: Option<String>,
    pub offer_type: OfferType,
    pub country_iso: String,
    pub currency_iso: String,
    pub payment_method: PaymentMethod,
    /// Mutable. Excluded from [`Self::canonical_bytes`]: price is editable
    /// post-publication (see [`Self::compute_edit_hash`]), so it cannot
    /// participate in the identity hash without changing `hash` on every
    /// price edit and orphaning the offer's catalog row.
    pub price: u64,
    pub min_amount: u64,
    /// Mutable; see the note on `price`.
    pub short_info: String,
    /// Mutable; see the note on `price`.
    pub details: String,
    pub pub_key: Vec<u8>,
    pub time_create: u64,
    /// Mutable within its fee-coefficient class; see the note on `price`.
    pub time_expiration: u64,
    pub editing_version: u32,
    pub edit_hash: OfferHash,
    /// Signature over `edit_hash` under `pub_key`, authenticating the most
    /// recent edit. `None` while `editing_version == 0`.
    pub edit_sign: Option<Vec<u8>>,
}

/// Failure classification from [`OfferRecord::check`]. Each variant carries
/// enough detail that a caller can translate it into a ban-score penalty.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CheckError {
    #[error("country_iso `{0}` is not a recognized country code")]
    UnknownCountry(String),
    #[error("currency_iso `{0}` is not a recognized currency code")]
    UnknownCurrency(String),
    #[error("payment_method {0:?} has no recognized bits set")]
    UnknownPaymentMethod(u32),
    #[error("short_info is {0} bytes, exceeds the {1}-byte limit")]
    ShortInfoTooLong(usize, usize),
    #[error("details is {0} bytes, exceeds the {1}-byte limit")]
    DetailsTooLong(usize, usize),
    #[error("price must be nonzero")]
    ZeroPrice,
    #[error("time_expiration {0} is not after time_create {1}")]
    ExpirationNotAfterCreate(u64, u64),
    #[error("pub_key is empty")]
    EmptyPubKey,
    #[error("editing_version {0} is nonzero but edit_sign is absent")]
    MissingEditSignature(u32),
}

/// Misbehavior weight assigned to a rejected incoming message, for the host
/// transport to use as a ban-score penalty. Larger weight means a more
/// clear-cut protocol violation. Shared between `dex-manager` (`NEW_OFFER`)
/// and `dex-sync` (Phase 3 `OFFER`), the two callers of [`OfferRecord::check`]
/// that receive offers over the wire.
pub type Penalty = u32;

/// An offer hash that doesn't match its own canonical encoding -- the
/// sender either corrupted or forged the field set. Weighted the same as a
/// missing edit signature: both are unambiguous protocol violations rather
/// than something a benign race could produce.
pub const PENALTY_HASH_MISMATCH: Penalty = 20;

/// Maps an [`OfferRecord::check`] failure to its ban-score weight. A
/// missing edit signature is the more serious protocol violation -- it can
/// only result from a malformed or hostile sender, not a benign race -- so
/// it carries the heavier weight.
pub fn penalty_for_check_error(err: &CheckError) -> Penalty {
    match err {
        CheckError::MissingEditSignature(_) => 20,
        _ => 10,
    }
}

impl OfferRecord {
    /// Builds the canonical byte encoding hashed into [`Self::hash`]. Order
    /// and length-prefixing cover only the fields that make up an offer's
    /// identity: the immutable fields fixed at creation. `price`,
    /// `short_info`, `details` and `time_expiration` are
    /// excluded here -- they are editable post-publication and participate
    /// only in [`Self::compute_edit_hash`], so an edit never changes the
    /// identity a catalog row is keyed by. `editing_version` and `edit_hash`
    /// are likewise excluded.
    fn canonical_bytes(&self) -> Vec<u8> {
        let mut enc = CanonicalEncoder::new();
        enc.push_u8(match self.offer_type {
            OfferType::Buy => 0,
            OfferType::Sell => 1,
        })
        .push_str(&self.country_iso)
        .push_str(&self.currency_iso)
        .push_u32(self.payment_method.0)
        .push_u64(self.min_amount)
        .push_bytes(&self.pub_key)
        .push_u64(self.time_create);
        enc.finish()
    }

    /// Content hash: the offer's stable identifier, independent of its edit
    /// history.
    pub fn compute_hash(&self) -> OfferHash {
        crate::hash::double_sha256(&self.canonical_bytes())
    }

    /// Hash over the content hash, `editing_version` and the mutable
    /// fields an edit may change. This is the value an authenticated edit
    /// actually signs, so a replayed earlier edit
    /// cannot be mistaken for a later one and a tampered mutable field is
    /// caught even though it doesn't change `hash` itself.
    pub fn compute_edit_hash(&self) -> OfferHash {
        let mut enc = CanonicalEncoder::new();
        enc.push_bytes(self.hash.as_bytes())
            .push_u32(self.editing_version)
            .push_u64(self.price)
            .push_str(&self.short_info)
            .push_str(&self.details)
            .push_u64(self.time_expiration);
        crate::hash::double_sha256(&enc.finish())
    }

    /// Field-level validation: bounds and reference-table membership.
    /// `known_countries`/`known_currencies` are passed in because membership
    /// is a catalog concern ([`crate::traits`] does not define storage, and
    /// this crate has no database dependency); the caller typically sources
    /// them from `CatalogStore`'s reference tables.
    pub fn check(
        &self,
        known_countries: &[String],
        known_currencies: &[String],
    ) -> Result<(), CheckError> {
        if !known_countries.iter().any(|c| c == &self.country_iso) {
            return Err(CheckError::UnknownCountry(self.country_iso.clone()));
        }
        if !known_currencies.iter().any(|c| c == &self.currency_iso) {
            return Err(CheckError::UnknownCurrency(self.currency_iso.clone()));
        }
        if self.payment_method.0 == 0 {
            return Err(CheckError::UnknownPaymentMethod(self.payment_method.0));
        }
        if self.short_info.len() > SHORT_INFO_MAX_BYTES {
            return Err(CheckError::ShortInfoTooLong(
                self.short_info.len(),
                SHORT_INFO_MAX_BYTES,
            ));
        }
        if self.details.len() > DETAILS_MAX_BYTES {
            return Err(CheckError::DetailsTooLong(
                self.details.len(),
                DETAILS_MAX_BYTES,
            ));
        }
        if self.price == 0 {
            return Err(CheckError::ZeroPrice);
        }
        if self.time_expiration <= self.time_create {
            return Err(CheckError::ExpirationNotAfterCreate(
                self.time_expiration,
                self.time_create,
            ));
        }
        if self.pub_key.is_empty() {
            return Err(CheckError::EmptyPubKey);
        }
        if self.editing_version > 0 && self.edit_sign.is_none() {
            return Err(CheckError::MissingEditSignature(self.editing_version));
        }
        Ok(())
    }
}

/// An `OfferRecord` this node originates, carrying the local-only lifecycle
/// fields the shared catalog never sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MyOfferRecord {
    pub offer: OfferRecord,
    pub status: MyOfferStatus,
    pub fee_tx_hash: Option<String>,
    pub is_broadcast: bool,
}

impl MyOfferRecord {
    pub fn draft(offer: OfferRecord) -> Self {
        MyOfferRecord {
            offer,
            status: MyOfferStatus::Draft,
            fee_tx_hash: None,
            is_broadcast: false,
        }
    }
}
