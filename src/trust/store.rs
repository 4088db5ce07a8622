//! Maintainer identities and the trust store
//!
//! The store is built once from configuration and handed to verifiers behind
//! an `Arc`. It has no interior mutability, so concurrent verifications share
//! it without locking.

use serde::Serialize;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Problems detected while assembling a trust store
#[derive(Error, Debug, PartialEq)]
pub enum StoreError {
    #[error("at least two maintainers are required, found {0}")]
    TooFewMaintainers(usize),

    #[error("maintainer name must not be empty")]
    EmptyName,

    #[error("maintainer {0} is listed more than once")]
    DuplicateMaintainer(String),

    #[error("maintainer {0} has no public keys")]
    NoKeys(String),

    #[error("key {fingerprint} is listed under both {first} and {second}")]
    SharedKey {
        fingerprint: String,
        first: String,
        second: String,
    },
}

/// Opaque public key material, interpreted only by a signature backend
#[derive(Clone, PartialEq, Eq)]
pub struct PublicKey {
    material: Vec<u8>,
}

impl PublicKey {
    pub fn new(material: Vec<u8>) -> Self {
        PublicKey { material }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.material
    }

    /// First 8 bytes of the SHA-256 of the key material, hex encoded
    pub fn fingerprint(&self) -> String {
        let digest = Sha256::digest(&self.material);
        hex::encode(&digest[..8])
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", self.fingerprint())
    }
}

/// A maintainer and the keys they sign releases with
#[derive(Debug, Clone)]
pub struct MaintainerIdentity {
    name: String,
    keys: Vec<PublicKey>,
}

impl MaintainerIdentity {
    pub fn new(name: impl Into<String>, keys: Vec<PublicKey>) -> Self {
        MaintainerIdentity {
            name: name.into(),
            keys,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn keys(&self) -> &[PublicKey] {
        &self.keys
    }
}

/// Identities compare by their stable display name
impl PartialEq for MaintainerIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for MaintainerIdentity {}

/// The maintainer and key that produced a valid signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Signer {
    pub name: String,
    pub key_fingerprint: String,
}

impl Signer {
    /// Whether two signers belong to the same maintainer, regardless of key
    pub fn same_identity(&self, other: &Signer) -> bool {
        self.name == other.name
    }
}

impl fmt::Display for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.key_fingerprint)
    }
}

/// Immutable set of trusted maintainers
#[derive(Debug, Clone)]
pub struct TrustStore {
    identities: Vec<MaintainerIdentity>,
}

impl TrustStore {
    /// Build a store, rejecting layouts that would weaken the two-signer rule
    pub fn new(identities: Vec<MaintainerIdentity>) -> Result<Self, StoreError> {
        if identities.len() < 2 {
            return Err(StoreError::TooFewMaintainers(identities.len()));
        }

        let mut key_owner: HashMap<&[u8], &str> = HashMap::new();
        let mut names: Vec<&str> = Vec::with_capacity(identities.len());

        for identity in &identities {
            if identity.name.trim().is_empty() {
                return Err(StoreError::EmptyName);
            }
            if names.contains(&identity.name.as_str()) {
                return Err(StoreError::DuplicateMaintainer(identity.name.clone()));
            }
            names.push(identity.name.as_str());

            if identity.keys.is_empty() {
                return Err(StoreError::NoKeys(identity.name.clone()));
            }

            for key in &identity.keys {
                if let Some(owner) = key_owner.insert(key.as_bytes(), identity.name.as_str()) {
                    if owner != identity.name {
                        return Err(StoreError::SharedKey {
                            fingerprint: key.fingerprint(),
                            first: owner.to_string(),
                            second: identity.name.clone(),
                        });
                    }
                }
            }
        }

        Ok(TrustStore { identities })
    }

    /// Maintainers in configuration order
    pub fn identities(&self) -> &[MaintainerIdentity] {
        &self.identities
    }

    pub fn get(&self, name: &str) -> Option<&MaintainerIdentity> {
        self.identities.iter().find(|identity| identity.name == name)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    pub fn key_count(&self) -> usize {
        self.identities.iter().map(|identity| identity.keys.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(byte: u8) -> PublicKey {
        PublicKey::new(vec![byte; 32])
    }

    #[test]
    fn test_store_keeps_order() {
        let store = TrustStore::new(vec![
            MaintainerIdentity::new("alice", vec![key(1)]),
            MaintainerIdentity::new("bob", vec![key(2), key(3)]),
        ])
        .unwrap();

        let names: Vec<&str> = store.identities().iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
        assert_eq!(store.key_count(), 3);
        assert!(store.get("bob").is_some());
        assert!(store.get("carol").is_none());
    }

    #[test]
    fn test_store_requires_two_maintainers() {
        let result = TrustStore::new(vec![MaintainerIdentity::new("alice", vec![key(1)])]);
        assert_eq!(result.unwrap_err(), StoreError::TooFewMaintainers(1));
    }

    #[test]
    fn test_store_rejects_duplicate_names() {
        let result = TrustStore::new(vec![
            MaintainerIdentity::new("alice", vec![key(1)]),
            MaintainerIdentity::new("alice", vec![key(2)]),
        ]);
        assert_eq!(
            result.unwrap_err(),
            StoreError::DuplicateMaintainer("alice".to_string())
        );
    }

    #[test]
    fn test_store_rejects_keyless_maintainer() {
        let result = TrustStore::new(vec![
            MaintainerIdentity::new("alice", vec![key(1)]),
            MaintainerIdentity::new("bob", vec![]),
        ]);
        assert_eq!(result.unwrap_err(), StoreError::NoKeys("bob".to_string()));
    }

    #[test]
    fn test_store_rejects_key_shared_between_maintainers() {
        let result = TrustStore::new(vec![
            MaintainerIdentity::new("alice", vec![key(1)]),
            MaintainerIdentity::new("bob", vec![key(2), key(1)]),
        ]);
        assert!(matches!(result, Err(StoreError::SharedKey { .. })));
    }

    #[test]
    fn test_identity_equality_by_name() {
        let a = MaintainerIdentity::new("alice", vec![key(1)]);
        let b = MaintainerIdentity::new("alice", vec![key(9)]);
        assert_eq!(a, b);
    }

    #[test]
    fn test_fingerprint_stable() {
        assert_eq!(key(1).fingerprint(), key(1).fingerprint());
        assert_ne!(key(1).fingerprint(), key(2).fingerprint());
        assert_eq!(key(1).fingerprint().len(), 16);
    }
}
