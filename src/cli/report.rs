//! Verification outcome reporting for the CLI

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::app::OutputFormat;
use crate::trust::{HashDigest, Signer, VerifyError};
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Verified,
    Rejected,
}

/// Outcome of one verification, as printed to stdout
#[derive(Debug, Serialize)]
pub struct VerificationReport {
    pub status: Status,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hash: Option<String>,
    pub signers: Vec<Signer>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub checked_at: DateTime<Utc>,
}

impl VerificationReport {
    pub fn verified(filename: &str, hash: Option<&HashDigest>, signers: &(Signer, Signer)) -> Self {
        VerificationReport {
            status: Status::Verified,
            filename: filename.to_string(),
            hash: hash.map(HashDigest::to_hex),
            signers: vec![signers.0.clone(), signers.1.clone()],
            error_kind: None,
            error: None,
            checked_at: Utc::now(),
        }
    }

    pub fn rejected(filename: &str, error: &VerifyError) -> Self {
        VerificationReport {
            status: Status::Rejected,
            filename: filename.to_string(),
            hash: None,
            signers: Vec::new(),
            error_kind: Some(error.kind()),
            error: Some(error.to_string()),
            checked_at: Utc::now(),
        }
    }

    pub fn render(&self, format: OutputFormat) -> Result<String> {
        match format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(self)?),
            OutputFormat::Text => Ok(self.render_text()),
        }
    }

    fn render_text(&self) -> String {
        match self.status {
            Status::Verified => {
                let mut out = format!("VERIFIED {}", self.filename);
                if let Some(hash) = &self.hash {
                    out.push_str(&format!("\n  sha256:    {hash}"));
                }
                let signers: Vec<String> = self.signers.iter().map(ToString::to_string).collect();
                out.push_str(&format!("\n  signed by: {}", signers.join(", ")));
                out
            }
            Status::Rejected => format!(
                "REJECTED {} [{}]\n  {}",
                self.filename,
                self.error_kind.unwrap_or("unknown"),
                self.error.as_deref().unwrap_or_default()
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::SignatureSlot;

    fn signers() -> (Signer, Signer) {
        (
            Signer {
                name: "alice".to_string(),
                key_fingerprint: "0011223344556677".to_string(),
            },
            Signer {
                name: "bob".to_string(),
                key_fingerprint: "8899aabbccddeeff".to_string(),
            },
        )
    }

    #[test]
    fn test_verified_text() {
        let hash = HashDigest::from_hex("abcd1234").unwrap();
        let report = VerificationReport::verified("app.zip", Some(&hash), &signers());
        let text = report.render(OutputFormat::Text).unwrap();

        assert!(text.starts_with("VERIFIED app.zip"));
        assert!(text.contains("abcd1234"));
        assert!(text.contains("alice (0011223344556677), bob (8899aabbccddeeff)"));
    }

    #[test]
    fn test_rejected_json_carries_kind() {
        let error = VerifyError::SignatureInvalid {
            slot: SignatureSlot::First,
        };
        let report = VerificationReport::rejected("app.zip", &error);
        let json: serde_json::Value =
            serde_json::from_str(&report.render(OutputFormat::Json).unwrap()).unwrap();

        assert_eq!(json["status"], "rejected");
        assert_eq!(json["error_kind"], "signature_invalid");
        assert!(json.get("hash").is_none());
        assert_eq!(json["signers"].as_array().unwrap().len(), 0);
    }
}
