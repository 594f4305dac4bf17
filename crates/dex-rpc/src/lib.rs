// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! The RPC command surface: a plain handler struct over `Arc`-shared
//! [`dex_store::CatalogStore`], [`dex_pool::UnconfirmedPool`],
//! [`dex_manager::OfferManager`] and [`dex_sync::SyncEngine`] handles, one
//! method per command. Wire/CLI framing (HTTP, JSON-RPC envelopes, exit
//! codes) is the host process's concern; only command behavior lives here.

pub mod errors;
pub mod handler;

pub use errors::Error;
pub use handler::{EditOfferRequest, InfoSnapshot, RpcHandler};
