use async_trait::async_trait;
use std::path::PathBuf;
use tracing::info;

use super::{build_verifier, fetch_artifacts, load_runtime, parse_dns_hash, CommandHandler};
use crate::cli::app::OutputFormat;
use crate::cli::report::VerificationReport;
use crate::{DualsigError, Result};

/// Full verification of a downloaded binary
pub struct VerifyCommand {
    pub config: Option<PathBuf>,
    pub file: PathBuf,
    pub dns_hash: String,
    pub filename: Option<String>,
    pub manifest: Option<String>,
    pub signature: Option<String>,
    pub format: OutputFormat,
}

impl VerifyCommand {
    /// Manifest name of the binary: explicit, else the file's own name
    fn manifest_filename(&self) -> Result<String> {
        if let Some(name) = &self.filename {
            return Ok(name.clone());
        }
        self.file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| {
                DualsigError::Cli(format!(
                    "cannot derive a file name from {}; pass --filename",
                    self.file.display()
                ))
            })
    }
}

#[async_trait]
impl CommandHandler for VerifyCommand {
    async fn execute(&self) -> Result<()> {
        let filename = self.manifest_filename()?;
        let dns_hash = parse_dns_hash(&self.dns_hash)?;

        let loaded = load_runtime(self.config.as_deref())?;
        let artifacts =
            fetch_artifacts(&loaded, self.manifest.as_deref(), self.signature.as_deref()).await?;

        let binary = tokio::fs::read(&self.file).await?;
        info!("Read {} bytes from {}", binary.len(), self.file.display());

        let verifier = build_verifier(&loaded);
        let outcome = verifier.verify_update(
            &filename,
            &binary,
            dns_hash.as_bytes(),
            &artifacts.manifest,
            &artifacts.signature,
        );

        match outcome {
            Ok(signers) => {
                let report = VerificationReport::verified(&filename, Some(&dns_hash), &signers);
                println!("{}", report.render(self.format)?);
                Ok(())
            }
            Err(error) => {
                let report = VerificationReport::rejected(&filename, &error);
                println!("{}", report.render(self.format)?);
                Err(error.into())
            }
        }
    }

    fn name(&self) -> &'static str {
        "verify"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command(file: &str, filename: Option<&str>) -> VerifyCommand {
        VerifyCommand {
            config: None,
            file: PathBuf::from(file),
            dns_hash: "abcd".to_string(),
            filename: filename.map(str::to_string),
            manifest: None,
            signature: None,
            format: OutputFormat::Text,
        }
    }

    #[test]
    fn test_filename_defaults_to_file_name() {
        let cmd = command("/downloads/app-v1.2.zip", None);
        assert_eq!(cmd.manifest_filename().unwrap(), "app-v1.2.zip");
    }

    #[test]
    fn test_explicit_filename_wins() {
        let cmd = command("/tmp/download.part", Some("app-v1.2.zip"));
        assert_eq!(cmd.manifest_filename().unwrap(), "app-v1.2.zip");
    }

    #[test]
    fn test_filename_required_for_root() {
        let cmd = command("/", None);
        assert!(matches!(cmd.manifest_filename(), Err(DualsigError::Cli(_))));
    }
}
