// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! In-memory mocks of the external-collaborator traits, for use by this
//! workspace's own tests: a `parking_lot::Mutex`-guarded inner state plus
//! trait impls that never touch the network or disk.

use crate::fee::Transaction;
use crate::traits::{ChainView, MasternodeRegistry, NeighborId, Transport, Wallet, WalletError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};

/// An in-memory [`crate::traits::TransactionSource`] and [`ChainView`] the
/// test sets up by inserting transactions and a tip height directly.
#[derive(Default)]
pub struct TestChain {
    inner: Mutex<TestChainInner>,
}

#[derive(Default)]
struct TestChainInner {
    txs: HashMap<String, Transaction>,
    tip_height: u32,
    testnet: bool,
    min_version: u32,
}

impl TestChain {
    pub fn new(testnet: bool, min_version: u32) -> Self {
        TestChain {
            inner: Mutex::new(TestChainInner {
                txs: HashMap::new(),
                tip_height: 0,
                testnet,
                min_version,
            }),
        }
    }

    pub fn insert_tx(&self, tx: Transaction) {
        self.inner.lock().txs.insert(tx.txid.clone(), tx);
    }

    pub fn set_tip_height(&self, height: u32) {
        self.inner.lock().tip_height = height;
    }
}

#[async_trait]
impl crate::traits::TransactionSource for TestChain {
    async fn get_transaction(&self, txid: &str) -> anyhow::Result<Option<Transaction>> {
        Ok(self.inner.lock().txs.get(txid).cloned())
    }
}

#[async_trait]
impl ChainView for TestChain {
    async fn tip_height(&self) -> anyhow::Result<u32> {
        Ok(self.inner.lock().tip_height)
    }

    fn is_version_allowed(&self, protocol_version: u32) -> bool {
        protocol_version >= self.inner.lock().min_version
    }

    fn is_testnet(&self) -> bool {
        self.inner.lock().testnet
    }
}

/// An in-memory [`Wallet`] holding keys as raw byte strings; `sign` just
/// concatenates the key id and digest rather than performing real
/// cryptography, since wallet-boundary tests care about call wiring, not
/// signature validity (that lives in `dex-crypto`'s own tests).
#[derive(Default)]
pub struct TestWallet {
    keys: Mutex<HashSet<Vec<u8>>>,
    next_keypair: Mutex<u64>,
    next_txid: Mutex<u64>,
    submitted: Mutex<Vec<(Vec<u8>, [u8; 32], u64)>>,
}

impl TestWallet {
    pub fn with_key(pub_key: Vec<u8>) -> Self {
        let mut keys = HashSet::new();
        keys.insert(pub_key);
        TestWallet {
            keys: Mutex::new(keys),
            next_keypair: Mutex::new(0),
            next_txid: Mutex::new(0),
            submitted: Mutex::new(Vec::new()),
        }
    }

    /// Fee transactions this wallet has been asked to submit, in call order.
    pub fn submitted_fee_transactions(&self) -> Vec<(Vec<u8>, [u8; 32], u64)> {
        self.submitted.lock().clone()
    }
}

#[async_trait]
impl Wallet for TestWallet {
    async fn has_private_key(&self, pub_key: &[u8]) -> Result<bool, WalletError> {
        Ok(self.keys.lock().contains(pub_key))
    }

    async fn generate_keypair(&self) -> Result<Vec<u8>, WalletError> {
        let mut counter = self.next_keypair.lock();
        *counter += 1;
        let mut pub_key = vec![0xAA];
        pub_key.extend_from_slice(&counter.to_le_bytes());
        self.keys.lock().insert(pub_key.clone());
        Ok(pub_key)
    }

    async fn sign(&self, pub_key: &[u8], digest: &[u8; 32]) -> Result<Vec<u8>, WalletError> {
        if !self.keys.lock().contains(pub_key) {
            return Err(WalletError::KeyNotFound);
        }
        let mut sig = pub_key.to_vec();
        sig.extend_from_slice(digest);
        Ok(sig)
    }

    async fn submit_fee_transaction(
        &self,
        pub_key: &[u8],
        offer_hash: &[u8; 32],
        required_fee: u64,
    ) -> Result<String, WalletError> {
        if !self.keys.lock().contains(pub_key) {
            return Err(WalletError::KeyNotFound);
        }
        self.submitted
            .lock()
            .push((pub_key.to_vec(), *offer_hash, required_fee));
        let mut counter = self.next_txid.lock();
        *counter += 1;
        Ok(format!("test-fee-tx-{counter}"))
    }
}

/// An in-memory [`Transport`] that records every send for assertions and
/// reports a fixed neighbor list.
#[derive(Default)]
pub struct TestTransport {
    inner: Mutex<TestTransportInner>,
}

#[derive(Default)]
struct TestTransportInner {
    neighbors: Vec<NeighborId>,
    sent: Vec<(Option<NeighborId>, Vec<u8>)>,
    versions: HashMap<NeighborId, u32>,
    inbound: HashSet<NeighborId>,
    penalties: Vec<(NeighborId, crate::offer::Penalty)>,
}

impl TestTransport {
    pub fn with_neighbors(neighbors: Vec<NeighborId>) -> Self {
        TestTransport {
            inner: Mutex::new(TestTransportInner {
                neighbors,
                sent: Vec::new(),
                versions: HashMap::new(),
                inbound: HashSet::new(),
                penalties: Vec::new(),
            }),
        }
    }

    pub fn sent(&self) -> Vec<(Option<NeighborId>, Vec<u8>)> {
        self.inner.lock().sent.clone()
    }

    pub fn set_version(&self, neighbor: NeighborId, version: u32) {
        self.inner.lock().versions.insert(neighbor, version);
    }

    pub fn set_inbound(&self, neighbor: NeighborId) {
        self.inner.lock().inbound.insert(neighbor);
    }

    /// Every `penalize` call this transport has received, in call order.
    pub fn penalties(&self) -> Vec<(NeighborId, crate::offer::Penalty)> {
        self.inner.lock().penalties.clone()
    }
}

#[async_trait]
impl Transport for TestTransport {
    async fn send_to(&self, neighbor: NeighborId, message: Vec<u8>) -> anyhow::Result<()> {
        self.inner.lock().sent.push((Some(neighbor), message));
        Ok(())
    }

    async fn broadcast(&self, message: Vec<u8>) -> anyhow::Result<()> {
        self.inner.lock().sent.push((None, message));
        Ok(())
    }

    async fn neighbors(&self) -> anyhow::Result<Vec<NeighborId>> {
        Ok(self.inner.lock().neighbors.clone())
    }

    async fn protocol_version(&self, neighbor: NeighborId) -> anyhow::Result<u32> {
        Ok(self
            .inner
            .lock()
            .versions
            .get(&neighbor)
            .copied()
            .unwrap_or(crate::constants::MIN_DEX_VERSION))
    }

    async fn is_inbound(&self, neighbor: NeighborId) -> anyhow::Result<bool> {
        Ok(self.inner.lock().inbound.contains(&neighbor))
    }

    async fn penalize(&self, neighbor: NeighborId, weight: crate::offer::Penalty) -> anyhow::Result<()> {
        self.inner.lock().penalties.push((neighbor, weight));
        Ok(())
    }
}

/// An in-memory [`MasternodeRegistry`] backed by a fixed membership set.
#[derive(Default)]
pub struct TestMasternodeRegistry {
    registered: HashSet<NeighborId>,
    self_masternode: bool,
}

impl TestMasternodeRegistry {
    pub fn with_registered(registered: impl IntoIterator<Item = NeighborId>) -> Self {
        TestMasternodeRegistry {
            registered: registered.into_iter().collect(),
            self_masternode: false,
        }
    }

    pub fn as_self_masternode(mut self) -> Self {
        self.self_masternode = true;
        self
    }
}

#[async_trait]
impl MasternodeRegistry for TestMasternodeRegistry {
    async fn is_registered(&self, neighbor: NeighborId) -> anyhow::Result<bool> {
        Ok(self.registered.contains(&neighbor))
    }

    fn is_self_masternode(&self) -> bool {
        self.self_masternode
    }
}
