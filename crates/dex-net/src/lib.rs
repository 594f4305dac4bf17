// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Wire message envelope for offer gossip. Framing is the host P2P layer's
//! responsibility; this crate owns only message tags and payload encoding.

pub mod errors;
pub mod message;

pub use dex_types::{MasternodeRegistry, NeighborId, Transport};
pub use errors::Error;
pub use message::{HashVersion, StatusOffers, SyncInfo, WireMessage};
