// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Fee-transaction binding: the anti-spam mechanism that ties an offer to a
//! confirmed on-chain payment. An offer is only promoted out of the
//! unconfirmed pool once its [`FeeBinding`] verifies against the chain.

use crate::constants::{
    fee_coef, MAX_TRANSACTION_SIZE, PAYOFFER_MIN_TX_HEIGHT, PAYOFFER_RETURN_FEE, PAYOFFER_TX_FEE,
};
use crate::hash::OfferHash;
use thiserror::Error;

/// A transaction input reference. Mirrors the chain's own `OutPoint`
/// narrowly enough for fee-binding arithmetic; this crate does not
/// reimplement transaction validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutPoint {
    pub txid: String,
    pub vout: u32,
}

/// An opaque output script. Only [`Script::is_unspendable`] and
/// [`Script::op_return_data`] are interpreted here; everything else is the
/// host chain's concern.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Script(pub Vec<u8>);

const OP_RETURN: u8 = 0x6a;

impl Script {
    pub fn is_unspendable(&self) -> bool {
        self.0.first() == Some(&OP_RETURN)
    }

    /// Walks a `OP_RETURN <push> <data>` script and returns `data` if this
    /// is exactly that shape. Returns `None` for anything else, including
    /// scripts with trailing bytes after the push -- the original rejects
    /// those as malformed commitments rather than truncating them.
    pub fn op_return_data(&self) -> Option<&[u8]> {
        let bytes = &self.0;
        if bytes.first() != Some(&OP_RETURN) {
            return None;
        }
        let rest = &bytes[1..];
        let (len, payload_start) = match rest.first() {
            Some(&n) if n as usize <= 75 => (n as usize, 1),
            _ => return None,
        };
        let payload = rest.get(payload_start..payload_start + len)?;
        if rest.len() != payload_start + len {
            return None;
        }
        Some(payload)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOut {
    pub value: u64,
    pub script_pubkey: Script,
}

/// The minimal transaction shape fee-binding verification needs: enough to
/// recompute the credit/debit balance and read the commitment output.
/// Sourced through [`crate::traits::TransactionSource`], never constructed
/// by this crate directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub txid: String,
    pub size_bytes: usize,
    pub vout: Vec<TxOut>,
    /// Sum of the values of inputs this wallet controls; zero when none of
    /// the inputs are ours.
    pub credit: u64,
    /// Sum of the values of outputs this wallet controls, excluding the
    /// commitment output.
    pub debit: u64,
    pub confirmations: u32,
}

/// A confirmed payment bound to an offer's hash via an OP_RETURN
/// commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeeBinding {
    pub offer_hash: OfferHash,
    pub outpoint: OutPoint,
}

/// Failure classification for [`FeeBinding::verify`], one variant per check,
/// in the order those checks run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FeeBindingError {
    #[error("fee transaction {0} not found")]
    TxMissing(String),
    #[error("fee transaction {0} has {1} confirmations, requires at least {2}")]
    InsufficientConfirmations(String, u32, u32),
    #[error("fee transaction {0} output 0 is not an unspendable commitment output")]
    NotUnspendable(String),
    #[error("fee transaction {0} output 0 value {1} does not equal the required fee {2}")]
    WrongReturnFeeValue(String, u64, u64),
    #[error("fee transaction {0} commitment does not match offer hash {1}")]
    BadCommitment(String, OfferHash),
    #[error("fee transaction {0} margin {1} is below the required {2}")]
    InsufficientFee(String, u64, u64),
    #[error("fee transaction {0} is {1} bytes, exceeds the {2}-byte limit")]
    TxTooLarge(String, usize, usize),
}

impl FeeBinding {
    /// Verifies this binding against a fetched transaction, matching the
    /// check order of `dex.cpp`'s `CheckTx` (commitment + fee math),
    /// `CheckOfferTx` (confirmations) and `CheckBRCSTOfferTx` (size).
    pub fn verify(
        &self,
        tx: &Transaction,
        time_create: u64,
        time_expiration: u64,
    ) -> Result<(), FeeBindingError> {
        if tx.confirmations < PAYOFFER_MIN_TX_HEIGHT {
            return Err(FeeBindingError::InsufficientConfirmations(
                tx.txid.clone(),
                tx.confirmations,
                PAYOFFER_MIN_TX_HEIGHT,
            ));
        }

        let commitment_out = tx
            .vout
            .first()
            .ok_or_else(|| FeeBindingError::NotUnspendable(tx.txid.clone()))?;

        if !commitment_out.script_pubkey.is_unspendable() {
            return Err(FeeBindingError::NotUnspendable(tx.txid.clone()));
        }
        if commitment_out.value != PAYOFFER_RETURN_FEE {
            return Err(FeeBindingError::WrongReturnFeeValue(
                tx.txid.clone(),
                commitment_out.value,
                PAYOFFER_RETURN_FEE,
            ));
        }

        let commitment = commitment_out
            .script_pubkey
            .op_return_data()
            .ok_or_else(|| FeeBindingError::BadCommitment(tx.txid.clone(), self.offer_hash))?;
        if commitment != self.offer_hash.as_bytes() {
            return Err(FeeBindingError::BadCommitment(tx.txid.clone(), self.offer_hash));
        }

        let required = PAYOFFER_TX_FEE * fee_coef(time_create, time_expiration);
        let margin = tx.debit.saturating_sub(tx.credit);
        if margin < required {
            return Err(FeeBindingError::InsufficientFee(
                tx.txid.clone(),
                margin,
                required,
            ));
        }

        if tx.size_bytes > MAX_TRANSACTION_SIZE {
            return Err(FeeBindingError::TxTooLarge(
                tx.txid.clone(),
                tx.size_bytes,
                MAX_TRANSACTION_SIZE,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commitment_script(hash: &OfferHash) -> Script {
        let mut bytes = vec![OP_RETURN, 32];
        bytes.extend_from_slice(hash.as_bytes());
        Script(bytes)
    }

    fn valid_tx(hash: &OfferHash, time_create: u64, time_expiration: u64) -> Transaction {
        Transaction {
            txid: "abc".into(),
            size_bytes: 250,
            vout: vec![TxOut {
                value: PAYOFFER_RETURN_FEE,
                script_pubkey: commitment_script(hash),
            }],
            credit: 0,
            debit: PAYOFFER_TX_FEE * fee_coef(time_create, time_expiration),
            confirmations: PAYOFFER_MIN_TX_HEIGHT,
        }
    }

    #[test]
    fn op_return_data_parses_push() {
        let hash = OfferHash::zero();
        let script = commitment_script(&hash);
        assert_eq!(script.op_return_data(), Some(hash.as_bytes().as_slice()));
    }

    #[test]
    fn op_return_data_rejects_trailing_bytes() {
        let mut bytes = vec![OP_RETURN, 2, 1, 2, 9];
        let script = Script(std::mem::take(&mut bytes));
        assert_eq!(script.op_return_data(), None);
    }

    #[test]
    fn verify_accepts_well_formed_binding() {
        let hash = OfferHash::zero();
        let binding = FeeBinding {
            offer_hash: hash,
            outpoint: OutPoint {
                txid: "abc".into(),
                vout: 0,
            },
        };
        let tx = valid_tx(&hash, 0, 10 * 86_400);
        assert!(binding.verify(&tx, 0, 10 * 86_400).is_ok());
    }

    #[test]
    fn verify_rejects_insufficient_confirmations() {
        let hash = OfferHash::zero();
        let binding = FeeBinding {
            offer_hash: hash,
            outpoint: OutPoint {
                txid: "abc".into(),
                vout: 0,
            },
        };
        let mut tx = valid_tx(&hash, 0, 10 * 86_400);
        tx.confirmations = PAYOFFER_MIN_TX_HEIGHT - 1;
        assert!(matches!(
            binding.verify(&tx, 0, 10 * 86_400),
            Err(FeeBindingError::InsufficientConfirmations(_, _, _))
        ));
    }

    #[test]
    fn verify_rejects_mismatched_commitment() {
        let hash = OfferHash::zero();
        let other = crate::hash::double_sha256(b"other");
        let binding = FeeBinding {
            offer_hash: other,
            outpoint: OutPoint {
                txid: "abc".into(),
                vout: 0,
            },
        };
        let tx = valid_tx(&hash, 0, 10 * 86_400);
        assert!(matches!(
            binding.verify(&tx, 0, 10 * 86_400),
            Err(FeeBindingError::BadCommitment(_, _))
        ));
    }

    #[test]
    fn verify_rejects_fee_below_scaled_margin() {
        let hash = OfferHash::zero();
        let binding = FeeBinding {
            offer_hash: hash,
            outpoint: OutPoint {
                txid: "abc".into(),
                vout: 0,
            },
        };
        // 25 days of validity needs coef 3, but we only pay for coef 1.
        let mut tx = valid_tx(&hash, 0, 25 * 86_400);
        tx.debit = PAYOFFER_TX_FEE;
        assert!(matches!(
            binding.verify(&tx, 0, 25 * 86_400),
            Err(FeeBindingError::InsufficientFee(_, _, _))
        ));
    }

    #[test]
    fn verify_rejects_oversized_transaction() {
        let hash = OfferHash::zero();
        let binding = FeeBinding {
            offer_hash: hash,
            outpoint: OutPoint {
                txid: "abc".into(),
                vout: 0,
            },
        };
        let mut tx = valid_tx(&hash, 0, 10 * 86_400);
        tx.size_bytes = MAX_TRANSACTION_SIZE + 1;
        assert!(matches!(
            binding.verify(&tx, 0, 10 * 86_400),
            Err(FeeBindingError::TxTooLarge(_, _, _))
        ));
    }
}
