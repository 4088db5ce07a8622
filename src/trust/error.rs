//! Verification error types
//!
//! Every rejection the protocol can produce has its own variant so callers
//! can report exactly which guarantee broke.

use std::fmt;
use thiserror::Error;

use crate::trust::digest::{HashDigest, HashError};
use crate::trust::signature::SignatureError;

/// Which of the two signature slots a failure refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureSlot {
    /// The armored signature that carries the manifest
    First,
    /// The detached signature over the raw armored bytes
    Second,
}

impl fmt::Display for SignatureSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignatureSlot::First => write!(f, "first (armored)"),
            SignatureSlot::Second => write!(f, "second (detached)"),
        }
    }
}

/// Rejection reasons produced by the update verification protocol
#[derive(Error, Debug)]
pub enum VerifyError {
    /// No trusted maintainer key validates the signature in this slot
    #[error("{slot} signature is not signed by any trusted maintainer")]
    SignatureInvalid { slot: SignatureSlot },

    /// Both signatures were produced by the same maintainer
    #[error("both signatures were generated by the same maintainer: {signer}")]
    SignerCollision { signer: String },

    /// The manifest has no record for the requested file
    #[error("hash for {filename} not found in signed manifest")]
    ManifestHashNotFound { filename: String },

    /// The record for the requested file carries an unreadable hash
    #[error("malformed hash for {filename} on manifest line {line}")]
    ManifestMalformed {
        filename: String,
        line: usize,
        #[source]
        source: Option<hex::FromHexError>,
    },

    /// Two records for the same file disagree (only under the strict duplicate policy)
    #[error("conflicting hashes for {filename} on manifest lines {first_line} and {conflict_line}")]
    ManifestAmbiguous {
        filename: String,
        first_line: usize,
        conflict_line: usize,
    },

    /// The signed manifest hash differs from the DNS-published hash
    #[error("DNS hash mismatch: signed manifest has {expected}, DNS has {dns}")]
    DnsHashMismatch { expected: HashDigest, dns: HashDigest },

    /// The downloaded binary does not hash to the signed value
    #[error("hash sum mismatch: expected {expected}, computed {actual}")]
    BinaryHashMismatch {
        expected: HashDigest,
        actual: HashDigest,
    },

    #[error(transparent)]
    Signature(#[from] SignatureError),

    #[error(transparent)]
    Hash(#[from] HashError),
}

impl VerifyError {
    /// Log rejections that indicate tampering or a compromised key
    pub fn log_if_security_critical(&self) {
        match self {
            VerifyError::SignatureInvalid { .. }
            | VerifyError::SignerCollision { .. }
            | VerifyError::DnsHashMismatch { .. }
            | VerifyError::BinaryHashMismatch { .. } => {
                tracing::error!(target: "security", "UPDATE REJECTED: {}", self);
            }
            _ => {}
        }
    }

    /// Short stable identifier for the failure kind, used in reports
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::SignatureInvalid { .. } => "signature_invalid",
            VerifyError::SignerCollision { .. } => "signer_collision",
            VerifyError::ManifestHashNotFound { .. } => "manifest_hash_not_found",
            VerifyError::ManifestMalformed { .. } => "manifest_malformed",
            VerifyError::ManifestAmbiguous { .. } => "manifest_ambiguous",
            VerifyError::DnsHashMismatch { .. } => "dns_hash_mismatch",
            VerifyError::BinaryHashMismatch { .. } => "binary_hash_mismatch",
            VerifyError::Signature(_) => "signature_capability_error",
            VerifyError::Hash(_) => "hash_capability_error",
        }
    }
}
