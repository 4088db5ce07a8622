//! Update verification - the two-maintainer release check
//!
//! A release is trusted only when:
//! 1. the armored manifest verifies under some maintainer key (signer A),
//! 2. the detached signature verifies over the raw armored bytes under some
//!    maintainer key (signer B),
//! 3. A and B are different maintainers,
//! 4. the manifest names a hash for the file,
//! 5. that hash equals the DNS-published one,
//! 6. the downloaded bytes hash to it.
//!
//! Steps run in that order and the first failure is returned. Nothing is
//! cached between calls.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::trust::digest::{HashComputer, HashDigest, Sha256Hasher};
use crate::trust::error::{SignatureSlot, VerifyError};
use crate::trust::manifest::{DuplicatePolicy, ManifestParser};
use crate::trust::signature::{Ed25519Verifier, SignatureError, SignatureVerifier};
use crate::trust::store::{PublicKey, Signer, TrustStore};

/// Manifest text authenticated by two distinct maintainers
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedManifest {
    pub text: String,
    pub signers: (Signer, Signer),
}

/// Release hash that passed the signature and DNS checks
#[derive(Debug, Clone, PartialEq)]
pub struct SignedHash {
    pub hash: HashDigest,
    pub signers: (Signer, Signer),
}

/// Runs the verification protocol against a shared trust store
#[derive(Clone)]
pub struct UpdateVerifier {
    store: Arc<TrustStore>,
    signatures: Arc<dyn SignatureVerifier>,
    hasher: Arc<dyn HashComputer>,
    parser: ManifestParser,
}

impl UpdateVerifier {
    /// Verifier using Ed25519 signatures and SHA-256 digests
    pub fn new(store: Arc<TrustStore>) -> Self {
        Self::with_backends(store, Arc::new(Ed25519Verifier), Arc::new(Sha256Hasher))
    }

    /// Verifier with caller-supplied crypto backends
    pub fn with_backends(
        store: Arc<TrustStore>,
        signatures: Arc<dyn SignatureVerifier>,
        hasher: Arc<dyn HashComputer>,
    ) -> Self {
        UpdateVerifier {
            store,
            signatures,
            hasher,
            parser: ManifestParser::default(),
        }
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.parser = ManifestParser::new(policy);
        self
    }

    pub fn store(&self) -> &TrustStore {
        &self.store
    }

    /// Full check of a downloaded binary; returns both signers on success
    pub fn verify_update(
        &self,
        filename: &str,
        binary: &[u8],
        dns_hash: &[u8],
        armored_manifest: &[u8],
        detached_signature: &[u8],
    ) -> Result<(Signer, Signer), VerifyError> {
        self.run_update(filename, binary, dns_hash, armored_manifest, detached_signature)
            .inspect(|(first, second)| {
                info!(
                    "Update verified: {} signed by {} and {}",
                    filename, first, second
                );
            })
            .inspect_err(VerifyError::log_if_security_critical)
    }

    /// Signature, manifest and DNS checks without the binary
    ///
    /// Used to learn which hash an available update should have before
    /// downloading it.
    pub fn verify_signed_hash(
        &self,
        filename: &str,
        dns_hash: &[u8],
        armored_manifest: &[u8],
        detached_signature: &[u8],
    ) -> Result<SignedHash, VerifyError> {
        self.run_signed_hash(filename, dns_hash, armored_manifest, detached_signature)
            .inspect_err(VerifyError::log_if_security_critical)
    }

    /// Authenticate the manifest with two distinct maintainer signatures
    pub fn verify_manifest(
        &self,
        armored_manifest: &[u8],
        detached_signature: &[u8],
    ) -> Result<VerifiedManifest, VerifyError> {
        self.run_manifest(armored_manifest, detached_signature)
            .inspect_err(VerifyError::log_if_security_critical)
    }

    fn run_update(
        &self,
        filename: &str,
        binary: &[u8],
        dns_hash: &[u8],
        armored_manifest: &[u8],
        detached_signature: &[u8],
    ) -> Result<(Signer, Signer), VerifyError> {
        let signed =
            self.run_signed_hash(filename, dns_hash, armored_manifest, detached_signature)?;

        debug!("Hashing {} ({} bytes)", filename, binary.len());
        let actual = self.hasher.digest(binary)?;
        if actual != signed.hash {
            return Err(VerifyError::BinaryHashMismatch {
                expected: signed.hash,
                actual,
            });
        }

        Ok(signed.signers)
    }

    fn run_signed_hash(
        &self,
        filename: &str,
        dns_hash: &[u8],
        armored_manifest: &[u8],
        detached_signature: &[u8],
    ) -> Result<SignedHash, VerifyError> {
        let manifest = self.run_manifest(armored_manifest, detached_signature)?;

        let expected = self.parser.extract_hash(&manifest.text, filename)?;
        debug!("Signed manifest lists {} as {}", filename, expected);

        if expected.as_bytes() != dns_hash {
            return Err(VerifyError::DnsHashMismatch {
                expected,
                dns: HashDigest::from(dns_hash),
            });
        }

        Ok(SignedHash {
            hash: expected,
            signers: manifest.signers,
        })
    }

    fn run_manifest(
        &self,
        armored_manifest: &[u8],
        detached_signature: &[u8],
    ) -> Result<VerifiedManifest, VerifyError> {
        debug!("Verifying armored manifest signature");
        let (first, text) = self.verify_first(armored_manifest)?;

        debug!("Verifying detached manifest signature");
        let second = self.verify_second(armored_manifest, detached_signature)?;

        if first.same_identity(&second) {
            return Err(VerifyError::SignerCollision { signer: first.name });
        }

        Ok(VerifiedManifest {
            text,
            signers: (first, second),
        })
    }

    fn verify_first(&self, armored_manifest: &[u8]) -> Result<(Signer, String), VerifyError> {
        for identity in self.store.identities() {
            for key in identity.keys() {
                let outcome = self.signatures.verify_armored(armored_manifest, key)?;
                if !outcome.valid {
                    continue;
                }

                if let Some(claimed) = outcome
                    .claimed_signer
                    .as_deref()
                    .filter(|claimed| *claimed != identity.name())
                {
                    warn!(
                        "Armored manifest claims signer {} but verifies under {}",
                        claimed,
                        identity.name()
                    );
                }

                let text = String::from_utf8(outcome.message).map_err(|_| {
                    SignatureError::MalformedArmor("signed message is not valid UTF-8".to_string())
                })?;
                return Ok((signer(identity.name(), key), text));
            }
        }

        Err(VerifyError::SignatureInvalid {
            slot: SignatureSlot::First,
        })
    }

    fn verify_second(
        &self,
        armored_manifest: &[u8],
        detached_signature: &[u8],
    ) -> Result<Signer, VerifyError> {
        for identity in self.store.identities() {
            for key in identity.keys() {
                if self
                    .signatures
                    .verify_detached(armored_manifest, detached_signature, key)?
                {
                    return Ok(signer(identity.name(), key));
                }
            }
        }

        Err(VerifyError::SignatureInvalid {
            slot: SignatureSlot::Second,
        })
    }
}

fn signer(name: &str, key: &PublicKey) -> Signer {
    Signer {
        name: name.to_string(),
        key_fingerprint: key.fingerprint(),
    }
}
