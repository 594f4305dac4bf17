// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The explicit state machine for [`MyOfferStatus`], replacing the scattered
//! boolean flags (`is_broadcast`, presence of `fee_tx_hash`, etc.) the
//! original used to infer an offer's place in its lifecycle. Every status
//! change this crate makes goes through [`require`], so an invalid jump is a
//! rejected transition rather than a silently accepted no-op.

use dex_types::MyOfferStatus;
use std::fmt;

/// A rejected status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: MyOfferStatus,
    pub to: MyOfferStatus,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot move a my-offer from {:?} to {:?}", self.from, self.to)
    }
}

impl std::error::Error for Transition {}

/// Whether moving a [`MyOfferRecord`](dex_types::MyOfferRecord) from `from`
/// to `to` is a legal lifecycle step.
///
/// `Draft` is re-entrant (repeated drafting replaces the previous draft in
/// place); `Unconfirmed` may fall back to `Suspended` if its fee transaction
/// is evicted from the pool and then retried back into `Unconfirmed`;
/// `Active`, `Expired` and `Cancelled` are otherwise one-directional, with
/// `Expired` and `Cancelled` terminal.
pub fn can_transition(from: MyOfferStatus, to: MyOfferStatus) -> bool {
    use MyOfferStatus::*;
    matches!(
        (from, to),
        (Indefined, Draft)
            | (Draft, Draft)
            | (Draft, Unconfirmed)
            | (Draft, Cancelled)
            | (Unconfirmed, Active)
            | (Unconfirmed, Suspended)
            | (Unconfirmed, Cancelled)
            | (Suspended, Unconfirmed)
            | (Suspended, Cancelled)
            | (Active, Active)
            | (Active, Expired)
            | (Active, Cancelled)
    )
}

/// Like [`can_transition`] but returns the rejected [`Transition`] as an
/// error, so call sites can just use `?`.
pub fn require(from: MyOfferStatus, to: MyOfferStatus) -> Result<(), Transition> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(Transition { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MyOfferStatus::*;

    #[test]
    fn draft_can_advance_to_unconfirmed() {
        assert!(can_transition(Draft, Unconfirmed));
    }

    #[test]
    fn draft_is_re_entrant() {
        assert!(can_transition(Draft, Draft));
    }

    #[test]
    fn unconfirmed_can_recover_through_suspended() {
        assert!(can_transition(Unconfirmed, Suspended));
        assert!(can_transition(Suspended, Unconfirmed));
    }

    #[test]
    fn terminal_statuses_reject_every_move() {
        assert!(!can_transition(Expired, Active));
        assert!(!can_transition(Cancelled, Draft));
    }

    #[test]
    fn active_cannot_jump_back_to_draft() {
        assert!(!can_transition(Active, Draft));
    }

    #[test]
    fn require_reports_the_rejected_pair() {
        let err = require(Expired, Draft).unwrap_err();
        assert_eq!(err.from, Expired);
        assert_eq!(err.to, Draft);
    }
}
