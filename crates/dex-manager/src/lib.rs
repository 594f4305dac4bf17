// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Lifecycle owner for the offers this node originates: drafting,
//! fee-funded publication, editing and deletion, plus the
//! same three operations applied when they arrive from a peer.

pub mod errors;
pub mod lifecycle;
pub mod manager;

pub use errors::Error;
pub use manager::{ActiveEdit, DraftInput, OfferManager};
