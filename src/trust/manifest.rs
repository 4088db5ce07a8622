//! Checksum manifest parsing
//!
//! Manifests list one file per line in either of the two common shasum
//! layouts:
//!
//! ```text
//! <hex digest>  <filename>
//! <filename>  <hex digest>
//! ```
//!
//! Lines that don't mention the requested filename are ignored.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::trust::digest::HashDigest;
use crate::trust::error::VerifyError;

/// How to treat several records for the same filename
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// The first matching line decides; later ones are never looked at
    #[default]
    FirstMatch,
    /// Every matching line must agree with the first one
    RejectConflicting,
}

/// A manifest record for the requested file
#[derive(Debug, Clone, PartialEq)]
pub struct FilenameHashRecord {
    pub filename: String,
    pub hash: HashDigest,
    /// 1-based line number in the manifest text
    pub line: usize,
}

/// Extracts expected hashes from manifest text
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestParser {
    policy: DuplicatePolicy,
}

impl ManifestParser {
    pub fn new(policy: DuplicatePolicy) -> Self {
        ManifestParser { policy }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Find the hash recorded for `filename`
    pub fn extract_hash(&self, manifest_text: &str, filename: &str) -> Result<HashDigest, VerifyError> {
        self.find_record(manifest_text, filename).map(|record| record.hash)
    }

    /// Like [`extract_hash`](Self::extract_hash) but keeps the line number
    pub fn find_record(
        &self,
        manifest_text: &str,
        filename: &str,
    ) -> Result<FilenameHashRecord, VerifyError> {
        if filename.is_empty() {
            return Err(VerifyError::ManifestHashNotFound {
                filename: String::new(),
            });
        }

        let mut found: Option<FilenameHashRecord> = None;

        for (index, line) in manifest_text.split('\n').enumerate() {
            let Some(hash_field) = hash_field(line.trim(), filename) else {
                continue;
            };
            let line_no = index + 1;
            let hash = decode_hash(hash_field, filename, line_no)?;

            match &found {
                None => {
                    debug!("Manifest record for {} on line {}: {}", filename, line_no, hash);
                    found = Some(FilenameHashRecord {
                        filename: filename.to_string(),
                        hash,
                        line: line_no,
                    });
                    if self.policy == DuplicatePolicy::FirstMatch {
                        break;
                    }
                }
                Some(first) if first.hash != hash => {
                    warn!(
                        "Conflicting manifest records for {} on lines {} and {}",
                        filename, first.line, line_no
                    );
                    return Err(VerifyError::ManifestAmbiguous {
                        filename: filename.to_string(),
                        first_line: first.line,
                        conflict_line: line_no,
                    });
                }
                Some(_) => {
                    debug!("Duplicate manifest record for {} on line {} agrees", filename, line_no);
                }
            }
        }

        found.ok_or_else(|| VerifyError::ManifestHashNotFound {
            filename: filename.to_string(),
        })
    }
}

/// Parse with the default first-match policy
pub fn extract_hash(manifest_text: &str, filename: &str) -> Result<HashDigest, VerifyError> {
    ManifestParser::default().extract_hash(manifest_text, filename)
}

/// The hash portion of a trimmed line that names `filename`, if any
///
/// A line naming the file but lacking a space separator is not a record.
fn hash_field<'a>(trimmed: &'a str, filename: &str) -> Option<&'a str> {
    if trimmed.ends_with(filename) {
        trimmed.find(' ').map(|pos| &trimmed[..pos])
    } else if trimmed.starts_with(filename) {
        trimmed.rfind(' ').map(|pos| &trimmed[pos + 1..])
    } else {
        None
    }
}

fn decode_hash(field: &str, filename: &str, line: usize) -> Result<HashDigest, VerifyError> {
    match HashDigest::from_hex(field) {
        Ok(hash) if !hash.is_empty() => Ok(hash),
        Ok(_) => Err(VerifyError::ManifestMalformed {
            filename: filename.to_string(),
            line,
            source: None,
        }),
        Err(e) => Err(VerifyError::ManifestMalformed {
            filename: filename.to_string(),
            line,
            source: Some(e),
        }),
    }
}
