// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Pure request-distribution logic for Phase 3 `GET_OFFER` fan-out, kept
//! free of I/O so the threshold and cycling behavior can be unit tested
//! directly. Callers are responsible for excluding `Bad`/`Actual`
//! neighbors from `eligible` before calling in.

use dex_types::{NeighborId, OfferHash};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DistributionMode {
    /// Fewer hashes than `2 * neighbor_count`: ask everyone for everything.
    InterviewAll,
    /// Otherwise: spread hashes one-per-neighbor, round-robin.
    RoundRobin,
}

pub fn distribution_mode(need_download: usize, neighbor_count: usize) -> DistributionMode {
    if need_download < 2 * neighbor_count {
        DistributionMode::InterviewAll
    } else {
        DistributionMode::RoundRobin
    }
}

/// Produces `(neighbor, hash)` dispatch pairs for one fan-out round.
pub fn distribute(hashes: &[OfferHash], eligible: &[NeighborId]) -> Vec<(NeighborId, OfferHash)> {
    if eligible.is_empty() || hashes.is_empty() {
        return Vec::new();
    }
    match distribution_mode(hashes.len(), eligible.len()) {
        DistributionMode::InterviewAll => hashes
            .iter()
            .flat_map(|h| eligible.iter().map(move |n| (*n, *h)))
            .collect(),
        DistributionMode::RoundRobin => hashes
            .iter()
            .enumerate()
            .map(|(i, h)| (eligible[i % eligible.len()], *h))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(n: usize) -> Vec<OfferHash> {
        (0..n)
            .map(|i| {
                let mut bytes = [0u8; 32];
                bytes[0] = i as u8;
                OfferHash(bytes)
            })
            .collect()
    }

    #[test]
    fn mode_switches_at_threshold() {
        assert_eq!(distribution_mode(3, 2), DistributionMode::InterviewAll);
        assert_eq!(distribution_mode(4, 2), DistributionMode::RoundRobin);
    }

    #[test]
    fn interview_all_broadcasts_every_hash_to_every_neighbor() {
        let hs = hashes(2);
        let neighbors = vec![NeighborId(1), NeighborId(2), NeighborId(3)];
        let pairs = distribute(&hs, &neighbors);
        assert_eq!(pairs.len(), hs.len() * neighbors.len());
        for h in &hs {
            assert_eq!(pairs.iter().filter(|(_, hh)| hh == h).count(), neighbors.len());
        }
    }

    #[test]
    fn round_robin_spreads_one_hash_per_neighbor() {
        let hs = hashes(5);
        let neighbors = vec![NeighborId(1), NeighborId(2)];
        let pairs = distribute(&hs, &neighbors);
        assert_eq!(pairs.len(), hs.len());
        assert_eq!(pairs[0].0, NeighborId(1));
        assert_eq!(pairs[1].0, NeighborId(2));
        assert_eq!(pairs[2].0, NeighborId(1));
    }

    #[test]
    fn empty_eligible_list_yields_no_dispatch() {
        assert!(distribute(&hashes(3), &[]).is_empty());
    }
}
