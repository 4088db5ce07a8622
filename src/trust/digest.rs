//! Hash digests and the hashing capability
//!
//! Digests are compared as raw bytes. Hex only appears at the edges
//! (manifest text, DNS records, display).

use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;
use thiserror::Error;

/// Errors raised by a hash backend
#[derive(Error, Debug)]
pub enum HashError {
    #[error("failed to read {path} for hashing")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("hash backend failure: {0}")]
    Backend(String),
}

/// Fixed-length digest bytes
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct HashDigest(Vec<u8>);

impl HashDigest {
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        HashDigest(bytes)
    }

    /// Decode a hex string; surrounding whitespace is ignored, case is not significant
    pub fn from_hex(hex_str: &str) -> Result<Self, hex::FromHexError> {
        hex::decode(hex_str.trim()).map(HashDigest)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Display for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl fmt::Debug for HashDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashDigest({})", self.to_hex())
    }
}

impl From<&[u8]> for HashDigest {
    fn from(bytes: &[u8]) -> Self {
        HashDigest(bytes.to_vec())
    }
}

/// Computes a fixed-size digest over a byte buffer
pub trait HashComputer: Send + Sync {
    fn digest(&self, bytes: &[u8]) -> Result<HashDigest, HashError>;
}

/// SHA-256, the digest published in release manifests
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl HashComputer for Sha256Hasher {
    fn digest(&self, bytes: &[u8]) -> Result<HashDigest, HashError> {
        let mut hasher = Sha256::new();
        hasher.update(bytes);
        Ok(HashDigest(hasher.finalize().to_vec()))
    }
}

/// Hash a file's contents with SHA-256, streaming
pub fn sha256_file(path: &Path) -> Result<HashDigest, HashError> {
    let read_err = |source| HashError::Read {
        path: path.display().to_string(),
        source,
    };
    let mut file = std::fs::File::open(path).map_err(read_err)?;

    let mut hasher = Sha256::new();
    let mut buffer = [0; 64 * 1024];

    loop {
        let bytes_read = file.read(&mut buffer).map_err(read_err)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(HashDigest(hasher.finalize().to_vec()))
}
