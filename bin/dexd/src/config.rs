// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Process configuration: a serde struct, TOML on disk, loaded once at
//! startup and otherwise immutable for the life of the process.

use anyhow::Context;
use dex_periodic::PeriodicConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which network's consensus parameters this peer runs under. Only affects
/// [`dex_types::constants::min_number_dex_node`] today, but left as an
/// explicit switch for future growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn is_testnet(self) -> bool {
        matches!(self, Network::Testnet)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PeriodicIntervals {
    pub sync_kickoff_secs: u64,
    pub sync_answer_secs: u64,
    pub sync_finish_secs: u64,
    pub unconfirmed_rescan_secs: u64,
    pub expiration_sweep_secs: u64,
    pub gc_secs: u64,
    pub gc_retention_secs: u64,
}

impl Default for PeriodicIntervals {
    fn default() -> Self {
        let d = PeriodicConfig::default();
        PeriodicIntervals {
            sync_kickoff_secs: d.sync_kickoff_interval.as_secs(),
            sync_answer_secs: d.sync_answer_interval.as_secs(),
            sync_finish_secs: d.sync_finish_interval.as_secs(),
            unconfirmed_rescan_secs: d.unconfirmed_rescan_interval.as_secs(),
            expiration_sweep_secs: d.expiration_sweep_interval.as_secs(),
            gc_secs: d.gc_interval.as_secs(),
            gc_retention_secs: d.gc_retention.as_secs(),
        }
    }
}

impl From<PeriodicIntervals> for PeriodicConfig {
    fn from(v: PeriodicIntervals) -> Self {
        PeriodicConfig {
            sync_kickoff_interval: Duration::from_secs(v.sync_kickoff_secs),
            sync_answer_interval: Duration::from_secs(v.sync_answer_secs),
            sync_finish_interval: Duration::from_secs(v.sync_finish_secs),
            unconfirmed_rescan_interval: Duration::from_secs(v.unconfirmed_rescan_secs),
            expiration_sweep_interval: Duration::from_secs(v.expiration_sweep_secs),
            gc_interval: Duration::from_secs(v.gc_secs),
            gc_retention: Duration::from_secs(v.gc_retention_secs),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DexConfig {
    pub network: Network,
    /// Path to the SQLite catalog file. Relative to the current directory
    /// unless absolute.
    pub store_path: PathBuf,
    /// Path to the plaintext keystore file (see `adapters::FileWallet`).
    pub keystore_path: PathBuf,
    pub max_pool_size: u32,
    pub periodic: PeriodicIntervals,
}

impl Default for DexConfig {
    fn default() -> Self {
        DexConfig {
            network: Network::default(),
            store_path: PathBuf::from("dex-catalog.sqlite3"),
            keystore_path: PathBuf::from("keystore.json"),
            max_pool_size: 16,
            periodic: PeriodicIntervals::default(),
        }
    }
}

impl DexConfig {
    /// Loads config from `path`, falling back to defaults if the file
    /// doesn't exist. Mirrors `MpoolConfig::load_config`'s tolerant-missing
    /// behavior.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(contents) => {
                toml::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(DexConfig::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let rendered = toml::to_string_pretty(self).context("serializing config")?;
        std::fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = DexConfig::load(Path::new("/nonexistent/dexd.toml")).unwrap();
        assert_eq!(cfg.network, Network::Mainnet);
    }

    #[test]
    fn round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dexd.toml");
        let mut cfg = DexConfig::default();
        cfg.network = Network::Testnet;
        cfg.save(&path).unwrap();
        let loaded = DexConfig::load(&path).unwrap();
        assert_eq!(loaded.network, Network::Testnet);
    }
}
