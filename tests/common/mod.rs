//! Shared fixtures: deterministic maintainer keys and signed release artifacts

#![allow(dead_code)]

use dualsig::trust::signature::{public_key, sign_armored, sign_detached};
use dualsig::trust::{HashComputer, HashDigest, MaintainerIdentity, Sha256Hasher, TrustStore};
use ed25519_dalek::SigningKey;
use std::sync::Arc;

pub const FILENAME: &str = "app.zip";
pub const BINARY: &[u8] = b"release binary contents v1.2.0";

pub fn alice() -> SigningKey {
    SigningKey::from_bytes(&[0x11; 32])
}

pub fn alice_backup() -> SigningKey {
    SigningKey::from_bytes(&[0x12; 32])
}

pub fn bob() -> SigningKey {
    SigningKey::from_bytes(&[0x22; 32])
}

pub fn carol() -> SigningKey {
    SigningKey::from_bytes(&[0x33; 32])
}

/// Key nobody trusts
pub fn mallory() -> SigningKey {
    SigningKey::from_bytes(&[0x66; 32])
}

/// alice (two keys), bob and carol
pub fn trust_store() -> Arc<TrustStore> {
    Arc::new(
        TrustStore::new(vec![
            MaintainerIdentity::new("alice", vec![public_key(&alice()), public_key(&alice_backup())]),
            MaintainerIdentity::new("bob", vec![public_key(&bob())]),
            MaintainerIdentity::new("carol", vec![public_key(&carol())]),
        ])
        .expect("fixture store is valid"),
    )
}

pub fn binary_hash() -> HashDigest {
    Sha256Hasher.digest(BINARY).expect("sha256 never fails")
}

/// Manifest listing the fixture binary among other files
pub fn manifest_text() -> String {
    format!(
        "{}  other-platform.zip\n{}  {}\n",
        "00".repeat(32),
        binary_hash().to_hex(),
        FILENAME
    )
}

/// Armored manifest signed by `first`, detached signature by `second`
pub fn release(first: (&str, &SigningKey), second: &SigningKey, manifest: &str) -> (Vec<u8>, Vec<u8>) {
    let armored = sign_armored(manifest, first.0, first.1);
    let detached = sign_detached(&armored, second).into_bytes();
    (armored, detached)
}
