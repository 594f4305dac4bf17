// Copyright 2025 Offer Mesh Contributors
// SPDX-License-Identifier: Apache-2.0, MIT

//! Signing and verification of offers and edits. Signing is delegated to an
//! external [`dex_types::Wallet`] (this crate never holds a private key);
//! verification is local, since any peer can check a signature against the
//! offer's own `pub_key` field.

use crate::errors::Error;
use dex_types::{OfferRecord, Wallet};
use secp256k1::ecdsa::Signature;
use secp256k1::{Message, PublicKey, Secp256k1};
use std::sync::Arc;

/// Signs offers and edits on behalf of a local wallet, and verifies
/// signatures produced by any peer's wallet.
pub struct Signer {
    wallet: Arc<dyn Wallet>,
    secp: Secp256k1<secp256k1::All>,
}

impl Signer {
    pub fn new(wallet: Arc<dyn Wallet>) -> Self {
        Signer {
            wallet,
            secp: Secp256k1::new(),
        }
    }

    /// Signs `offer.hash` with the key named by `offer.pub_key`.
    pub async fn sign_offer(&self, offer: &OfferRecord) -> Result<Vec<u8>, Error> {
        self.wallet
            .sign(&offer.pub_key, offer.hash.as_bytes())
            .await
            .map_err(Error::from)
    }

    /// Verifies a signature over `offer.hash` produced by `offer.pub_key`.
    pub fn verify_offer(&self, offer: &OfferRecord, signature: &[u8]) -> Result<(), Error> {
        self.verify(&offer.pub_key, offer.hash.as_bytes(), signature)
    }

    /// Signs `offer.edit_hash` with the key named by `offer.pub_key`,
    /// authorizing the edit recorded in `offer.editing_version`.
    pub async fn make_edit_sig(&self, offer: &OfferRecord) -> Result<Vec<u8>, Error> {
        self.wallet
            .sign(&offer.pub_key, offer.edit_hash.as_bytes())
            .await
            .map_err(Error::from)
    }

    /// Verifies a signature over `offer.edit_hash`.
    pub fn verify_edit(&self, offer: &OfferRecord, signature: &[u8]) -> Result<(), Error> {
        self.verify(&offer.pub_key, offer.edit_hash.as_bytes(), signature)
    }

    fn verify(&self, pub_key: &[u8], digest: &[u8; 32], signature: &[u8]) -> Result<(), Error> {
        let pk = PublicKey::from_slice(pub_key)
            .map_err(|e| Error::InvalidPublicKey(e.to_string()))?;
        let sig = Signature::from_compact(signature)
            .or_else(|_| Signature::from_der(signature))
            .map_err(|e| Error::InvalidSignature(e.to_string()))?;
        let msg = Message::from_digest_slice(digest)
            .map_err(|e| Error::InvalidSignature(e.to_string()))?;
        self.secp
            .verify_ecdsa(&msg, &sig, &pk)
            .map_err(|_| Error::VerificationFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dex_types::test_support::TestWallet;
    use dex_types::{OfferType, PaymentMethod};
    use secp256k1::SecretKey;

    fn sample_offer(pub_key: Vec<u8>) -> OfferRecord {
        let mut o = OfferRecord {
            hash: dex_types::OfferHash::zero(),
            id_transaction: None,
            offer_type: OfferType::Sell,
            country_iso: "US".into(),
            currency_iso: "USD".into(),
            payment_method: PaymentMethod::CASH,
            price: 100,
            min_amount: 10,
            short_info: "cash only".into(),
            details: "meet nearby".into(),
            pub_key,
            time_create: 1_000,
            time_expiration: 1_000 + 86_400,
            editing_version: 0,
            edit_hash: dex_types::OfferHash::zero(),
            edit_sign: None,
        };
        o.hash = o.compute_hash();
        o.edit_hash = o.compute_edit_hash();
        o
    }

    #[tokio::test]
    async fn sign_and_verify_offer_roundtrips() {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[7u8; 32]).unwrap();
        let pk = PublicKey::from_secret_key(&secp, &sk);
        let pub_key = pk.serialize().to_vec();

        let wallet = Arc::new(TestWallet::with_key(pub_key.clone()));
        let signer = Signer::new(wallet);
        let offer = sample_offer(pub_key);

        // TestWallet's `sign` is a test double, not a real ECDSA signer, so
        // we sign with secp256k1 directly here and only exercise `verify`.
        let msg = Message::from_digest_slice(offer.hash.as_bytes()).unwrap();
        let sig = secp.sign_ecdsa(&msg, &sk);
        assert!(signer.verify_offer(&offer, &sig.serialize_compact()).is_ok());
    }

    #[tokio::test]
    async fn verify_offer_rejects_wrong_key() {
        let secp = Secp256k1::new();
        let sk = SecretKey::from_slice(&[7u8; 32]).unwrap();
        let other_sk = SecretKey::from_slice(&[9u8; 32]).unwrap();
        let pk = PublicKey::from_secret_key(&secp, &sk);
        let pub_key = pk.serialize().to_vec();

        let wallet = Arc::new(TestWallet::with_key(pub_key.clone()));
        let signer = Signer::new(wallet);
        let offer = sample_offer(pub_key);

        let msg = Message::from_digest_slice(offer.hash.as_bytes()).unwrap();
        let sig = secp.sign_ecdsa(&msg, &other_sk);
        assert!(signer.verify_offer(&offer, &sig.serialize_compact()).is_err());
    }
}
