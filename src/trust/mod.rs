//! Release trust - two-maintainer verification of downloaded binaries
//!
//! A binary is accepted only when two different maintainers signed the
//! release manifest and the manifest, DNS record and downloaded bytes all
//! agree on its hash.
//!
//! Design Principles:
//! - Fail closed - every check either passes or names the guarantee that broke
//! - Pluggable crypto - signatures and digests sit behind traits
//! - Immutable keys - the trust store never changes once loaded

pub mod digest;
pub mod error;
pub mod manifest;
pub mod signature;
pub mod store;
pub mod verifier;

pub use digest::{HashComputer, HashDigest, HashError, Sha256Hasher};
pub use error::{SignatureSlot, VerifyError};
pub use manifest::{extract_hash, DuplicatePolicy, ManifestParser};
pub use signature::{Ed25519Verifier, SignatureError, SignatureVerifier};
pub use store::{MaintainerIdentity, PublicKey, Signer, StoreError, TrustStore};
pub use verifier::{SignedHash, UpdateVerifier, VerifiedManifest};
