//! Signature verification capability and the Ed25519 backend
//!
//! The protocol only needs two questions answered per candidate key: does an
//! armored blob verify (and what message does it carry), and does a detached
//! signature verify over a given byte string. `SignatureVerifier` is that
//! seam; `Ed25519Verifier` is the backend shipped with the crate.
//!
//! Armored layout:
//!
//! ```text
//! -----BEGIN DUALSIG SIGNED MESSAGE-----
//! <message>
//! -----BEGIN DUALSIG SIGNATURE-----
//! signer: <claimed signer>
//! signature: <128 hex chars>
//! -----END DUALSIG SIGNATURE-----
//! ```

use ed25519_dalek::{Signature, Signer as _, SigningKey, VerifyingKey};
use thiserror::Error;

use crate::trust::store::PublicKey;

pub const ARMOR_HEADER: &str = "-----BEGIN DUALSIG SIGNED MESSAGE-----";
pub const SIGNATURE_HEADER: &str = "-----BEGIN DUALSIG SIGNATURE-----";
pub const SIGNATURE_FOOTER: &str = "-----END DUALSIG SIGNATURE-----";

const ED25519_KEY_LEN: usize = 32;
const ED25519_SIGNATURE_LEN: usize = 64;

/// Errors raised by a signature backend
///
/// These are distinct from a signature simply not matching a key: they mean
/// the input or key material could not be interpreted at all.
#[derive(Error, Debug)]
pub enum SignatureError {
    #[error("malformed armored message: {0}")]
    MalformedArmor(String),

    #[error("malformed signature: {0}")]
    MalformedSignature(String),

    #[error("unusable public key {fingerprint}: {reason}")]
    InvalidKey { fingerprint: String, reason: String },
}

/// Outcome of checking an armored blob against one key
#[derive(Debug, Clone, PartialEq)]
pub struct ArmoredVerification {
    /// Whether the embedded signature verifies under the candidate key
    pub valid: bool,
    /// The embedded message bytes, exactly as signed
    pub message: Vec<u8>,
    /// Signer named inside the armor; informational only
    pub claimed_signer: Option<String>,
}

/// Backend capable of checking signatures against a single public key
pub trait SignatureVerifier: Send + Sync {
    /// Check a self-describing signed blob
    fn verify_armored(
        &self,
        blob: &[u8],
        key: &PublicKey,
    ) -> Result<ArmoredVerification, SignatureError>;

    /// Check a detached signature over `message`
    fn verify_detached(
        &self,
        message: &[u8],
        signature: &[u8],
        key: &PublicKey,
    ) -> Result<bool, SignatureError>;
}

/// Ed25519 signatures in the dualsig armor format
#[derive(Debug, Default, Clone, Copy)]
pub struct Ed25519Verifier;

impl SignatureVerifier for Ed25519Verifier {
    fn verify_armored(
        &self,
        blob: &[u8],
        key: &PublicKey,
    ) -> Result<ArmoredVerification, SignatureError> {
        let armored = parse_armored(blob)?;
        let verifying_key = verifying_key(key)?;
        let valid = verifying_key
            .verify_strict(armored.message, &armored.signature)
            .is_ok();

        Ok(ArmoredVerification {
            valid,
            message: armored.message.to_vec(),
            claimed_signer: armored.claimed_signer,
        })
    }

    fn verify_detached(
        &self,
        message: &[u8],
        signature: &[u8],
        key: &PublicKey,
    ) -> Result<bool, SignatureError> {
        let signature = decode_detached(signature)?;
        let verifying_key = verifying_key(key)?;
        Ok(verifying_key.verify_strict(message, &signature).is_ok())
    }
}

/// Decode an Ed25519 public key from hex, as found in configuration
pub fn parse_public_key_hex(hex_str: &str) -> Result<PublicKey, SignatureError> {
    let material = hex::decode(hex_str.trim()).map_err(|e| SignatureError::InvalidKey {
        fingerprint: "<undecodable>".to_string(),
        reason: e.to_string(),
    })?;
    let key = PublicKey::new(material);
    verifying_key(&key)?;
    Ok(key)
}

/// Public half of a signing key
pub fn public_key(signing_key: &SigningKey) -> PublicKey {
    PublicKey::new(signing_key.verifying_key().to_bytes().to_vec())
}

/// Produce an armored signed message (release tooling and tests)
pub fn sign_armored(message: &str, signer_name: &str, signing_key: &SigningKey) -> Vec<u8> {
    let signature = signing_key.sign(message.as_bytes());
    format!(
        "{ARMOR_HEADER}\n{message}\n{SIGNATURE_HEADER}\nsigner: {signer_name}\nsignature: {}\n{SIGNATURE_FOOTER}\n",
        hex::encode(signature.to_bytes())
    )
    .into_bytes()
}

/// Produce a hex detached signature over `message`
pub fn sign_detached(message: &[u8], signing_key: &SigningKey) -> String {
    hex::encode(signing_key.sign(message).to_bytes())
}

struct ArmoredMessage<'a> {
    message: &'a [u8],
    claimed_signer: Option<String>,
    signature: Signature,
}

fn parse_armored(blob: &[u8]) -> Result<ArmoredMessage<'_>, SignatureError> {
    let text = std::str::from_utf8(blob)
        .map_err(|_| SignatureError::MalformedArmor("not valid UTF-8".to_string()))?;

    let body = text
        .trim_start()
        .strip_prefix(ARMOR_HEADER)
        .ok_or_else(|| SignatureError::MalformedArmor("missing message header".to_string()))?;
    let body = body
        .strip_prefix("\r\n")
        .or_else(|| body.strip_prefix('\n'))
        .ok_or_else(|| {
            SignatureError::MalformedArmor("message header must be on its own line".to_string())
        })?;

    // The last marker wins so a message may quote the marker text itself.
    let marker = format!("\n{SIGNATURE_HEADER}");
    let split = body
        .rfind(&marker)
        .ok_or_else(|| SignatureError::MalformedArmor("missing signature block".to_string()))?;
    let message = &body[..split];
    let block = &body[split + marker.len()..];

    let mut claimed_signer = None;
    let mut signature_hex = None;
    let mut closed = false;

    for line in block.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if line == SIGNATURE_FOOTER {
            closed = true;
            break;
        }
        if let Some(value) = line.strip_prefix("signer:") {
            claimed_signer = Some(value.trim().to_string());
        } else if let Some(value) = line.strip_prefix("signature:") {
            signature_hex = Some(value.trim());
        } else {
            return Err(SignatureError::MalformedArmor(format!(
                "unexpected line in signature block: {line}"
            )));
        }
    }

    if !closed {
        return Err(SignatureError::MalformedArmor(
            "signature block is not terminated".to_string(),
        ));
    }

    let signature_hex = signature_hex.ok_or_else(|| {
        SignatureError::MalformedArmor("signature block has no signature".to_string())
    })?;
    let signature_bytes = hex::decode(signature_hex)
        .map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;

    Ok(ArmoredMessage {
        message: message.as_bytes(),
        claimed_signer,
        signature: signature_from_slice(&signature_bytes)?,
    })
}

/// Raw 64-byte signatures are taken as-is, anything else must be hex text
fn decode_detached(signature: &[u8]) -> Result<Signature, SignatureError> {
    if signature.len() == ED25519_SIGNATURE_LEN {
        return signature_from_slice(signature);
    }

    let text = std::str::from_utf8(signature).map_err(|_| {
        SignatureError::MalformedSignature(format!(
            "expected {ED25519_SIGNATURE_LEN} raw bytes or hex text, got {} bytes",
            signature.len()
        ))
    })?;
    let bytes =
        hex::decode(text.trim()).map_err(|e| SignatureError::MalformedSignature(e.to_string()))?;
    signature_from_slice(&bytes)
}

fn signature_from_slice(bytes: &[u8]) -> Result<Signature, SignatureError> {
    Signature::from_slice(bytes).map_err(|_| {
        SignatureError::MalformedSignature(format!(
            "expected {ED25519_SIGNATURE_LEN} bytes, got {}",
            bytes.len()
        ))
    })
}

fn verifying_key(key: &PublicKey) -> Result<VerifyingKey, SignatureError> {
    let invalid = |reason: String| SignatureError::InvalidKey {
        fingerprint: key.fingerprint(),
        reason,
    };
    let bytes: &[u8; ED25519_KEY_LEN] = key.as_bytes().try_into().map_err(|_| {
        invalid(format!(
            "expected {ED25519_KEY_LEN} bytes, got {}",
            key.as_bytes().len()
        ))
    })?;
    VerifyingKey::from_bytes(bytes).map_err(|e| invalid(e.to_string()))
}
