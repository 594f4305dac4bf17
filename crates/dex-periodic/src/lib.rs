// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Background tickers that drive the sync engine, rescan the unconfirmed
//! pool, and sweep catalog and `my_offers` expirations.

pub mod tasks;

pub use tasks::{PeriodicConfig, PeriodicTasks};
