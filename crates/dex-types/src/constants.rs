// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Protocol-wide constants. These mirror the values a mainnet peer is
//! configured with; a testnet deployment overrides [`MIN_NUMBER_DEX_NODE`]
//! via [`min_number_dex_node`].

/// Maximum number of `(hash, editing_version)` pairs per `PART_HASH` message.
pub const PART_SIZE: usize = 100;

/// Lowest peer protocol version allowed to participate in offer gossip.
pub const MIN_DEX_VERSION: u32 = 70207;

/// Minimum number of qualifying neighbors required to start a sync round on mainnet.
pub const MIN_NUMBER_DEX_NODE: usize = 4;

/// Minimum number of qualifying neighbors required to start a sync round on testnet.
pub const MIN_NUMBER_DEX_NODE_TESTNET: usize = 2;

/// Returns the quorum precondition for the given network.
pub fn min_number_dex_node(testnet: bool) -> usize {
    if testnet {
        MIN_NUMBER_DEX_NODE_TESTNET
    } else {
        MIN_NUMBER_DEX_NODE
    }
}

/// Value, in the chain's minor unit, that output 0 of a fee transaction must carry exactly.
pub const PAYOFFER_RETURN_FEE: u64 = 100_000;

/// Per-`coef` anti-spam fee unit required as the margin between debit and credit.
pub const PAYOFFER_TX_FEE: u64 = 10_000_000;

/// Minimum confirmations a fee transaction must have before its offer is confirmed.
pub const PAYOFFER_MIN_TX_HEIGHT: u32 = 6;

/// Maximum serialized size, in bytes, of a fee transaction.
pub const MAX_TRANSACTION_SIZE: usize = 100_000;

/// Maximum length, in bytes, of [`crate::offer::OfferRecord::short_info`].
pub const SHORT_INFO_MAX_BYTES: usize = 140;

/// Maximum length, in bytes, of [`crate::offer::OfferRecord::details`].
pub const DETAILS_MAX_BYTES: usize = 1024;

/// Soft TTL, in seconds, an entry may sit in the unconfirmed pool before eviction.
pub const UNCONFIRMED_POOL_TTL_SECS: u64 = 24 * 3600;

/// Interval, in seconds, of the sync engine's finish and answer timers.
pub const SYNC_TIMER_INTERVAL_SECS: u64 = 30;

/// Seconds in a day, used for the fee-coefficient calculation.
pub const SECONDS_PER_DAY: u64 = 86_400;

/// Days per fee coefficient step.
pub const DAYS_PER_FEE_COEF: u64 = 10;

/// Computes `coef = ceil(ceil((expiration - create) / 86400) / 10)`, the
/// fee-scaling coefficient. `expiration` must be strictly greater than `create`.
pub fn fee_coef(time_create: u64, time_expiration: u64) -> u64 {
    debug_assert!(time_expiration > time_create);
    let seconds = time_expiration.saturating_sub(time_create);
    let days = seconds.div_ceil(SECONDS_PER_DAY).max(1);
    days.div_ceil(DAYS_PER_FEE_COEF)
}

/// Required fee margin for an offer with the given validity window.
pub fn required_fee_margin(time_create: u64, time_expiration: u64) -> u64 {
    PAYOFFER_TX_FEE * fee_coef(time_create, time_expiration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coef_boundaries() {
        assert_eq!(fee_coef(0, 10 * SECONDS_PER_DAY), 1);
        assert_eq!(fee_coef(0, 10 * SECONDS_PER_DAY + 1), 2);
        assert_eq!(fee_coef(0, 20 * SECONDS_PER_DAY), 2);
        assert_eq!(fee_coef(0, 20 * SECONDS_PER_DAY + 1), 3);
        assert_eq!(fee_coef(0, 30 * SECONDS_PER_DAY), 3);
        assert_eq!(fee_coef(0, 30 * SECONDS_PER_DAY + 1), 4);
    }

    #[test]
    fn min_dex_node_by_network() {
        assert_eq!(min_number_dex_node(false), 4);
        assert_eq!(min_number_dex_node(true), 2);
    }
}
