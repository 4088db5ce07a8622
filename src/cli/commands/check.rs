use async_trait::async_trait;
use std::path::PathBuf;

use super::{build_verifier, fetch_artifacts, load_runtime, parse_dns_hash, CommandHandler};
use crate::cli::app::OutputFormat;
use crate::cli::report::VerificationReport;
use crate::Result;

/// Signature and DNS checks for a release, before any download
pub struct CheckCommand {
    pub config: Option<PathBuf>,
    pub filename: String,
    pub dns_hash: String,
    pub manifest: Option<String>,
    pub signature: Option<String>,
    pub format: OutputFormat,
}

#[async_trait]
impl CommandHandler for CheckCommand {
    async fn execute(&self) -> Result<()> {
        let dns_hash = parse_dns_hash(&self.dns_hash)?;

        let loaded = load_runtime(self.config.as_deref())?;
        let artifacts =
            fetch_artifacts(&loaded, self.manifest.as_deref(), self.signature.as_deref()).await?;

        let verifier = build_verifier(&loaded);
        match verifier.verify_signed_hash(
            &self.filename,
            dns_hash.as_bytes(),
            &artifacts.manifest,
            &artifacts.signature,
        ) {
            Ok(signed) => {
                let report =
                    VerificationReport::verified(&self.filename, Some(&signed.hash), &signed.signers);
                println!("{}", report.render(self.format)?);
                Ok(())
            }
            Err(error) => {
                let report = VerificationReport::rejected(&self.filename, &error);
                println!("{}", report.render(self.format)?);
                Err(error.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "check"
    }
}
