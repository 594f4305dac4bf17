// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("fee transaction lookup failed: {0}")]
    TransactionSource(#[source] anyhow::Error),
}
