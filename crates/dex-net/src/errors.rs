// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to encode/decode wire message: {0}")]
    Codec(#[from] serde_json::Error),
}
