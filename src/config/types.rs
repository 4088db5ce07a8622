use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::fetch::{DEFAULT_MAX_BYTES, DEFAULT_TIMEOUT};
use crate::trust::DuplicatePolicy;

/// Only schema understood by this build
pub const SCHEMA_VERSION: &str = "1";

/// Root configuration file structure for dualsig.yaml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DualsigConfig {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,

    /// Maintainers whose signatures are accepted, in lookup order
    pub maintainers: Vec<MaintainerConfig>,

    #[serde(default)]
    pub release: ReleaseConfig,

    #[serde(default)]
    pub manifest: ManifestConfig,
}

/// One maintainer and their public keys
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MaintainerConfig {
    pub name: String,
    pub keys: Vec<KeySource>,
}

/// Where a public key comes from; exactly one of `hex` or `file` is set
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct KeySource {
    /// Hex-encoded key inline in the config
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hex: Option<String>,

    /// Key file, relative paths resolve against the config file's directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
}

/// Where release artifacts are fetched from
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReleaseConfig {
    /// URL or path of the armored signed manifest
    #[serde(default)]
    pub manifest_url: Option<String>,

    /// URL or path of the detached second signature
    #[serde(default)]
    pub signature_url: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            manifest_url: None,
            signature_url: None,
            timeout_secs: default_timeout_secs(),
            max_bytes: default_max_bytes(),
        }
    }
}

/// Manifest parsing options
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestConfig {
    #[serde(default)]
    pub duplicates: DuplicatePolicy,
}

fn default_schema_version() -> String {
    SCHEMA_VERSION.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}

fn default_max_bytes() -> usize {
    DEFAULT_MAX_BYTES
}
