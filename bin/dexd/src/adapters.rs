// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Concrete implementations of the external-collaborator traits
//! (`dex_types::traits`) that this binary supplies at its composition
//! root. The blockchain transaction index, the wallet and the P2P transport
//! are deliberately out of this subsystem's scope -- in a full
//! peer these are owned by the surrounding process and handed in here. A
//! standalone `dexd` has no such peer, so it ships the narrowest adapters
//! that let the catalog, manager and periodic tasks run on one machine:
//! a real (if simple) key-custody wallet, and loopback stand-ins for chain
//! and transport that a future embedder replaces wholesale.

use async_trait::async_trait;
use dex_types::fee::Transaction;
use dex_types::{ChainView, MasternodeRegistry, NeighborId, Transport, TransactionSource, Wallet, WalletError};
use parking_lot::Mutex;
use secp256k1::{Message, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One entry in the plaintext keystore file: a secp256k1 keypair named by
/// its hex-encoded public key. Forgoes a passphrase-encrypted variant -- a
/// standalone single-operator daemon has no second party to protect the
/// file from.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct KeyEntry {
    pub_key_hex: String,
    priv_key_hex: String,
}

#[derive(Default, Serialize, Deserialize)]
struct KeystoreFile {
    keys: Vec<KeyEntry>,
}

/// A file-backed [`Wallet`]: real secp256k1 key generation and signing,
/// persisted as JSON at `path`. `submit_fee_transaction` cannot be made
/// real without a connected chain backend, so it fails with
/// [`WalletError::Unavailable`] -- the seam a full peer's wallet fills in.
pub struct FileWallet {
    path: PathBuf,
    secp: Secp256k1<secp256k1::All>,
    keys: Mutex<HashMap<Vec<u8>, SecretKey>>,
}

impl FileWallet {
    pub fn open(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let secp = Secp256k1::new();
        let mut keys = HashMap::new();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            let file: KeystoreFile = serde_json::from_str(&contents)?;
            for entry in file.keys {
                let pub_key = hex::decode(&entry.pub_key_hex)?;
                let priv_bytes = hex::decode(&entry.priv_key_hex)?;
                let secret = SecretKey::from_slice(&priv_bytes)?;
                keys.insert(pub_key, secret);
            }
        }
        Ok(FileWallet {
            path,
            secp,
            keys: Mutex::new(keys),
        })
    }

    fn persist(&self, keys: &HashMap<Vec<u8>, SecretKey>) -> anyhow::Result<()> {
        let file = KeystoreFile {
            keys: keys
                .iter()
                .map(|(pub_key, secret)| KeyEntry {
                    pub_key_hex: hex::encode(pub_key),
                    priv_key_hex: hex::encode(secret.secret_bytes()),
                })
                .collect(),
        };
        let rendered = serde_json::to_string_pretty(&file)?;
        std::fs::write(&self.path, rendered)?;
        Ok(())
    }
}

#[async_trait]
impl Wallet for FileWallet {
    async fn has_private_key(&self, pub_key: &[u8]) -> Result<bool, WalletError> {
        Ok(self.keys.lock().contains_key(pub_key))
    }

    async fn generate_keypair(&self) -> Result<Vec<u8>, WalletError> {
        let mut rng = rand::thread_rng();
        let (secret, public) = self.secp.generate_keypair(&mut rng);
        let pub_key = public.serialize().to_vec();
        let mut keys = self.keys.lock();
        keys.insert(pub_key.clone(), secret);
        self.persist(&keys).map_err(WalletError::Other)?;
        Ok(pub_key)
    }

    async fn sign(&self, pub_key: &[u8], digest: &[u8; 32]) -> Result<Vec<u8>, WalletError> {
        let secret = {
            let keys = self.keys.lock();
            *keys.get(pub_key).ok_or(WalletError::KeyNotFound)?
        };
        let message = Message::from_digest_slice(digest).map_err(|e| WalletError::Other(e.into()))?;
        let sig = self.secp.sign_ecdsa(&message, &secret);
        Ok(sig.serialize_compact().to_vec())
    }

    async fn submit_fee_transaction(
        &self,
        _pub_key: &[u8],
        _offer_hash: &[u8; 32],
        _required_fee: u64,
    ) -> Result<String, WalletError> {
        Err(WalletError::Unavailable)
    }
}

/// A [`Transport`] with no peers. A standalone process has no P2P session
/// manager of its own; [`dex_sync::SyncEngine::start`] simply stays
/// `NotStarted` against zero neighbors, and `broadcast`/`send_to` are
/// unreachable in that state. A host process embedding these crates
/// supplies its real transport instead of this stand-in.
#[derive(Default)]
pub struct LoopbackTransport;

#[async_trait]
impl Transport for LoopbackTransport {
    async fn send_to(&self, _neighbor: NeighborId, _message: Vec<u8>) -> anyhow::Result<()> {
        anyhow::bail!("no neighbors: standalone dexd has no transport")
    }

    async fn broadcast(&self, _message: Vec<u8>) -> anyhow::Result<()> {
        log::debug!("standalone dexd: broadcast discarded, no transport configured");
        Ok(())
    }

    async fn neighbors(&self) -> anyhow::Result<Vec<NeighborId>> {
        Ok(Vec::new())
    }

    async fn protocol_version(&self, _neighbor: NeighborId) -> anyhow::Result<u32> {
        Ok(dex_types::constants::MIN_DEX_VERSION)
    }

    async fn is_inbound(&self, _neighbor: NeighborId) -> anyhow::Result<bool> {
        Ok(false)
    }
}

/// A [`ChainView`]/[`TransactionSource`] with no transactions and a tip
/// height of zero. Any fee-binding check against it fails with
/// `InsufficientConfirmations`, which is the conservative default for a
/// process that isn't actually watching a chain: offers stay in the
/// unconfirmed pool rather than being (wrongly) treated as funded.
pub struct StandaloneChain {
    testnet: bool,
}

impl StandaloneChain {
    pub fn new(testnet: bool) -> Self {
        StandaloneChain { testnet }
    }
}

#[async_trait]
impl TransactionSource for StandaloneChain {
    async fn get_transaction(&self, _txid: &str) -> anyhow::Result<Option<Transaction>> {
        Ok(None)
    }
}

#[async_trait]
impl ChainView for StandaloneChain {
    async fn tip_height(&self) -> anyhow::Result<u32> {
        Ok(0)
    }

    fn is_version_allowed(&self, protocol_version: u32) -> bool {
        protocol_version >= dex_types::constants::MIN_DEX_VERSION
    }

    fn is_testnet(&self) -> bool {
        self.testnet
    }
}

/// A [`MasternodeRegistry`] that registers nobody and claims no
/// masternode role of its own, consistent with [`LoopbackTransport`]'s
/// empty neighbor set.
#[derive(Default)]
pub struct ClosedMasternodeRegistry;

#[async_trait]
impl MasternodeRegistry for ClosedMasternodeRegistry {
    async fn is_registered(&self, _neighbor: NeighborId) -> anyhow::Result<bool> {
        Ok(false)
    }
}
