// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The wire message envelope exchanged between offer-gossip neighbors.
//! Framing (length prefixing, session multiplexing) is the host P2P layer's
//! concern; this module only defines the ten message tags and their
//! payloads, serialized with `serde_json` at the boundary so that encoding
//! bugs show up as ordinary (de)serialization errors rather than manual
//! byte-offset mistakes.

use dex_types::{OfferHash, OfferRecord};
use serde::{Deserialize, Serialize};

/// `(count, last_mod)` snapshot exchanged at the start of a sync session.
/// `check_sum` is a reserved field: always encoded as zero and never
/// interpreted, carried only for wire compatibility with older peers that
/// still send it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncInfo {
    pub count: u64,
    pub last_mod: u64,
    #[serde(default)]
    pub check_sum: u64,
}

impl SyncInfo {
    pub fn new(count: u64, last_mod: u64) -> Self {
        SyncInfo {
            count,
            last_mod,
            check_sum: 0,
        }
    }
}

/// A single `(hash, editing_version)` pair as carried in a `PART_HASH`
/// batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashVersion {
    pub hash: OfferHash,
    pub editing_version: u32,
}

/// The responder's summary when it has nothing new to offer, sent in the
/// first phase of a sync session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusOffers {
    /// Catalogs are identical and non-empty.
    Actual,
    /// Catalog is empty.
    Empty,
}

/// The ten wire messages exchanged between gossip neighbors, tagged with
/// `NetMsgType`-style identifier strings so that logs and protocol traces
/// stay cross-referenceable across peer implementations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "tag", content = "payload")]
pub enum WireMessage {
    #[serde(rename = "DEXSYNCGETALLHASH")]
    GetAllHash(SyncInfo),

    #[serde(rename = "DEXSYNCPARTHASH")]
    PartHash {
        entries: Vec<HashVersion>,
        part_idx: u32,
        part_total: u32,
    },

    #[serde(rename = "DEXSYNCNOOFFERS")]
    NoOffers(StatusOffers),

    #[serde(rename = "DEXSYNCNEEDSYNC")]
    NeedSync,

    #[serde(rename = "DEXSYNCGETOFFER")]
    GetOffer(OfferHash),

    #[serde(rename = "DEXSYNCOFFER")]
    Offer(Box<OfferRecord>),

    #[serde(rename = "DEXSYNCNOHASH")]
    NoHash(OfferHash),

    #[serde(rename = "DEXNEWOFFER")]
    NewOffer { offer: Box<OfferRecord>, sig: Vec<u8> },

    #[serde(rename = "DEXEDITOFFER")]
    EditOffer { offer: Box<OfferRecord>, edit_sig: Vec<u8> },

    #[serde(rename = "DEXDELOFFER")]
    DeleteOffer { hash: OfferHash, sig: Vec<u8> },
}

impl WireMessage {
    /// The `NetMsgType` tag this message would be sent under, for logging.
    pub fn tag(&self) -> &'static str {
        match self {
            WireMessage::GetAllHash(_) => "DEXSYNCGETALLHASH",
            WireMessage::PartHash { .. } => "DEXSYNCPARTHASH",
            WireMessage::NoOffers(_) => "DEXSYNCNOOFFERS",
            WireMessage::NeedSync => "DEXSYNCNEEDSYNC",
            WireMessage::GetOffer(_) => "DEXSYNCGETOFFER",
            WireMessage::Offer(_) => "DEXSYNCOFFER",
            WireMessage::NoHash(_) => "DEXSYNCNOHASH",
            WireMessage::NewOffer { .. } => "DEXNEWOFFER",
            WireMessage::EditOffer { .. } => "DEXEDITOFFER",
            WireMessage::DeleteOffer { .. } => "DEXDELOFFER",
        }
    }

    pub fn encode(&self) -> Result<Vec<u8>, crate::errors::Error> {
        serde_json::to_vec(self).map_err(crate::errors::Error::from)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, crate::errors::Error> {
        serde_json::from_slice(bytes).map_err(crate::errors::Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_info_reserved_field_defaults_to_zero() {
        let info = SyncInfo::new(5, 100);
        assert_eq!(info.check_sum, 0);
    }

    #[test]
    fn wire_message_roundtrips_through_encode() {
        let msg = WireMessage::GetOffer(OfferHash::zero());
        let bytes = msg.encode().unwrap();
        let decoded = WireMessage::decode(&bytes).unwrap();
        assert_eq!(msg, decoded);
    }

    #[test]
    fn part_hash_tag_is_stable() {
        let msg = WireMessage::PartHash {
            entries: vec![],
            part_idx: 1,
            part_total: 3,
        };
        assert_eq!(msg.tag(), "DEXSYNCPARTHASH");
    }
}
