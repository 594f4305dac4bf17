// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The unconfirmed-offer staging pool: offers whose fee transaction has not
//! yet reached the confirmation floor live here, not in
//! [`dex_store::CatalogStore`].

pub mod errors;
pub mod pool;

pub use errors::Error;
pub use pool::{InsertOutcome, PendingOffer, PoolOutcome, UnconfirmedPool};
