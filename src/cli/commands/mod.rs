pub mod check;
pub mod hash;
pub mod keys;
pub mod verify;

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::config::{discover_config, load_config, LoadedConfig};
use crate::fetch::{fetch_release, LocationFetcher, ReleaseArtifacts};
use crate::trust::{HashDigest, UpdateVerifier};
use crate::{DualsigError, Result};

/// Common trait for all command handlers
#[async_trait]
pub trait CommandHandler {
    /// Execute the command
    async fn execute(&self) -> Result<()>;

    /// Get command name for logging
    fn name(&self) -> &'static str;
}

/// Locate and load the configuration
pub(crate) fn load_runtime(config: Option<&Path>) -> Result<LoadedConfig> {
    let path = discover_config(config)?;
    Ok(load_config(&path)?)
}

/// Verifier configured from the loaded config
pub(crate) fn build_verifier(loaded: &LoadedConfig) -> UpdateVerifier {
    UpdateVerifier::new(loaded.store.clone())
        .with_duplicate_policy(loaded.config.manifest.duplicates)
}

pub(crate) fn parse_dns_hash(value: &str) -> Result<HashDigest> {
    let hash = HashDigest::from_hex(value)
        .map_err(|e| DualsigError::Cli(format!("invalid --dns-hash {value:?}: {e}")))?;
    if hash.is_empty() {
        return Err(DualsigError::Cli("--dns-hash must not be empty".to_string()));
    }
    Ok(hash)
}

/// Fetch manifest and signature, falling back to configured locations
pub(crate) async fn fetch_artifacts(
    loaded: &LoadedConfig,
    manifest: Option<&str>,
    signature: Option<&str>,
) -> Result<ReleaseArtifacts> {
    let release = &loaded.config.release;

    let manifest = manifest
        .or(release.manifest_url.as_deref())
        .ok_or_else(|| {
            DualsigError::Cli(
                "no manifest location: pass --manifest or set release.manifest_url".to_string(),
            )
        })?;
    let signature = signature
        .or(release.signature_url.as_deref())
        .ok_or_else(|| {
            DualsigError::Cli(
                "no signature location: pass --signature or set release.signature_url"
                    .to_string(),
            )
        })?;

    let fetcher = LocationFetcher::new(Duration::from_secs(release.timeout_secs), release.max_bytes)?;
    Ok(fetch_release(&fetcher, manifest, signature).await?)
}
