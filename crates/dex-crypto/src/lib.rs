// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Signing and verification glue between offer records and the external
//! wallet boundary.

pub mod errors;
pub mod signer;

pub use errors::Error;
pub use signer::Signer;
