use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

use super::types::{DualsigConfig, KeySource, MaintainerConfig, SCHEMA_VERSION};
use crate::trust::signature::{parse_public_key_hex, SignatureError};
use crate::trust::{MaintainerIdentity, PublicKey, StoreError, TrustStore};

/// Environment variable naming the config file
pub const CONFIG_ENV: &str = "DUALSIG_CONFIG";

/// Config file name searched in the working and user config directories
pub const CONFIG_FILE_NAME: &str = "dualsig.yaml";

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no configuration found (searched: {})", .searched.join(", "))]
    NotFound { searched: Vec<String> },

    #[error("failed to read configuration file {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file {path}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml_ng::Error,
    },

    #[error("unsupported schema version: {0}. Expected: {expected}", expected = SCHEMA_VERSION)]
    UnsupportedSchema(String),

    #[error("failed to read key file {path} for maintainer {maintainer}")]
    KeyFile {
        maintainer: String,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid public key for maintainer {maintainer}")]
    Key {
        maintainer: String,
        #[source]
        source: SignatureError,
    },

    #[error("every key of maintainer {maintainer} must set exactly one of `hex` or `file`")]
    KeySource { maintainer: String },

    #[error("invalid maintainer set")]
    Store(#[from] StoreError),
}

/// A parsed config together with the trust store built from it
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: DualsigConfig,
    pub store: Arc<TrustStore>,
}

/// Find the config file: explicit path, then `$DUALSIG_CONFIG`, then
/// `./dualsig.yaml`, then the user config directory
pub fn discover_config(explicit: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    let mut candidates = Vec::new();
    if let Some(env_path) = std::env::var_os(CONFIG_ENV) {
        candidates.push(PathBuf::from(env_path));
    }
    candidates.push(PathBuf::from(CONFIG_FILE_NAME));
    if let Some(dirs) = directories::ProjectDirs::from("org", "dualsig", "dualsig") {
        candidates.push(dirs.config_dir().join(CONFIG_FILE_NAME));
    }

    for candidate in &candidates {
        if candidate.is_file() {
            debug!("Using configuration at {}", candidate.display());
            return Ok(candidate.clone());
        }
    }

    Err(ConfigError::NotFound {
        searched: candidates
            .iter()
            .map(|p| p.display().to_string())
            .collect(),
    })
}

/// Read, validate and build the trust store from a config file
pub fn load_config(path: &Path) -> Result<LoadedConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let config = DualsigConfig::from_yaml_str(&contents).map_err(|e| match e {
        ConfigError::Parse { source, .. } => ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let store = config.build_trust_store(base_dir)?;

    info!(
        "Loaded {} maintainers ({} keys) from {}",
        store.len(),
        store.key_count(),
        path.display()
    );

    Ok(LoadedConfig {
        path: path.to_path_buf(),
        config,
        store: Arc::new(store),
    })
}

impl DualsigConfig {
    /// Parse and check the schema version
    pub fn from_yaml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: DualsigConfig =
            serde_yaml_ng::from_str(contents).map_err(|source| ConfigError::Parse {
                path: PathBuf::from("<inline>"),
                source,
            })?;

        if config.schema_version != SCHEMA_VERSION {
            return Err(ConfigError::UnsupportedSchema(config.schema_version));
        }

        Ok(config)
    }

    /// Resolve every key source and assemble the immutable trust store
    pub fn build_trust_store(&self, base_dir: &Path) -> Result<TrustStore, ConfigError> {
        let identities = self
            .maintainers
            .iter()
            .map(|maintainer| load_identity(maintainer, base_dir))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(TrustStore::new(identities)?)
    }
}

fn load_identity(
    maintainer: &MaintainerConfig,
    base_dir: &Path,
) -> Result<MaintainerIdentity, ConfigError> {
    let keys = maintainer
        .keys
        .iter()
        .map(|source| load_key(&maintainer.name, source, base_dir))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(MaintainerIdentity::new(maintainer.name.clone(), keys))
}

fn load_key(maintainer: &str, source: &KeySource, base_dir: &Path) -> Result<PublicKey, ConfigError> {
    let key_err = |source| ConfigError::Key {
        maintainer: maintainer.to_string(),
        source,
    };

    match (&source.hex, &source.file) {
        (Some(hex_str), None) => parse_public_key_hex(hex_str).map_err(key_err),
        (None, Some(path)) => {
            let path = if path.is_absolute() {
                path.clone()
            } else {
                base_dir.join(path)
            };
            let bytes = std::fs::read(&path).map_err(|source| ConfigError::KeyFile {
                maintainer: maintainer.to_string(),
                path: path.clone(),
                source,
            })?;

            debug!("Read key file {} for {}", path.display(), maintainer);
            key_from_file_bytes(&bytes).map_err(key_err)
        }
        _ => Err(ConfigError::KeySource {
            maintainer: maintainer.to_string(),
        }),
    }
}

/// Key files hold either the raw 32-byte key or its hex encoding
fn key_from_file_bytes(bytes: &[u8]) -> Result<PublicKey, SignatureError> {
    match std::str::from_utf8(bytes) {
        Ok(text) if !text.trim().is_empty() && bytes.len() != 32 => parse_public_key_hex(text),
        _ => parse_public_key_hex(&hex::encode(bytes)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::signature::public_key;
    use crate::trust::DuplicatePolicy;
    use ed25519_dalek::SigningKey;
    use tempfile::TempDir;

    fn key_hex(seed: u8) -> String {
        hex::encode(public_key(&SigningKey::from_bytes(&[seed; 32])).as_bytes())
    }

    #[test]
    fn test_parse_minimal_config() {
        let yaml = format!(
            "maintainers:\n  - name: alice\n    keys:\n      - hex: \"{}\"\n  - name: bob\n    keys:\n      - hex: \"{}\"\n",
            key_hex(1),
            key_hex(2)
        );
        let config = DualsigConfig::from_yaml_str(&yaml).unwrap();

        assert_eq!(config.schema_version, "1");
        assert_eq!(config.maintainers.len(), 2);
        assert_eq!(config.manifest.duplicates, DuplicatePolicy::FirstMatch);
        assert_eq!(config.release.timeout_secs, 30);

        let store = config.build_trust_store(Path::new(".")).unwrap();
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_reject_unknown_schema() {
        let yaml = "schema_version: \"7\"\nmaintainers: []\n";
        let result = DualsigConfig::from_yaml_str(yaml);
        assert!(matches!(result, Err(ConfigError::UnsupportedSchema(v)) if v == "7"));
    }

    #[test]
    fn test_reject_unknown_fields() {
        let yaml = "maintainers: []\ndns_override: [\"1.2.3.4\"]\n";
        assert!(matches!(
            DualsigConfig::from_yaml_str(yaml),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_single_maintainer_rejected() {
        let yaml = format!(
            "maintainers:\n  - name: alice\n    keys:\n      - hex: \"{}\"\n",
            key_hex(1)
        );
        let config = DualsigConfig::from_yaml_str(&yaml).unwrap();
        let result = config.build_trust_store(Path::new("."));
        assert!(matches!(
            result,
            Err(ConfigError::Store(StoreError::TooFewMaintainers(1)))
        ));
    }

    #[test]
    fn test_bad_key_names_maintainer() {
        let yaml = format!(
            "maintainers:\n  - name: alice\n    keys:\n      - hex: \"{}\"\n  - name: bob\n    keys:\n      - hex: \"nothex\"\n",
            key_hex(1)
        );
        let config = DualsigConfig::from_yaml_str(&yaml).unwrap();
        let result = config.build_trust_store(Path::new("."));
        assert!(matches!(result, Err(ConfigError::Key { maintainer, .. }) if maintainer == "bob"));
    }

    #[test]
    fn test_load_config_with_key_files() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let keys_dir = temp_dir.path().join("keys");
        std::fs::create_dir(&keys_dir)?;
        std::fs::write(keys_dir.join("alice.pub"), format!("{}\n", key_hex(1)))?;
        let bob_raw = public_key(&SigningKey::from_bytes(&[2; 32]));
        std::fs::write(keys_dir.join("bob.pub"), bob_raw.as_bytes())?;

        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            "schema_version: \"1\"\n\
             maintainers:\n\
             \x20 - name: alice\n\
             \x20   keys:\n\
             \x20     - file: keys/alice.pub\n\
             \x20 - name: bob\n\
             \x20   keys:\n\
             \x20     - file: keys/bob.pub\n\
             release:\n\
             \x20 manifest_url: https://example.org/hashes.txt\n\
             \x20 signature_url: https://example.org/hashes.txt.sig\n\
             manifest:\n\
             \x20 duplicates: reject-conflicting\n",
        )?;

        let loaded = load_config(&config_path)?;
        assert_eq!(loaded.store.len(), 2);
        assert_eq!(loaded.store.identities()[1].keys()[0], bob_raw);
        assert_eq!(
            loaded.config.release.manifest_url.as_deref(),
            Some("https://example.org/hashes.txt")
        );
        assert_eq!(
            loaded.config.manifest.duplicates,
            DuplicatePolicy::RejectConflicting
        );
        Ok(())
    }

    #[test]
    fn test_missing_key_file() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let config_path = temp_dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &config_path,
            "maintainers:\n  - name: alice\n    keys:\n      - file: missing.pub\n",
        )?;

        let result = load_config(&config_path);
        assert!(matches!(result, Err(ConfigError::KeyFile { .. })));
        Ok(())
    }

    #[test]
    fn test_key_sources_parse_from_maps() {
        let yaml = format!(
            "maintainers:\n  - name: alice\n    keys:\n      - hex: \"{}\"\n      - file: keys/alice.pub\n  - name: bob\n    keys:\n      - hex: \"{}\"\n",
            key_hex(1),
            key_hex(2)
        );
        let config = DualsigConfig::from_yaml_str(&yaml).unwrap();

        let alice_keys = &config.maintainers[0].keys;
        assert_eq!(alice_keys[0].hex.as_deref(), Some(key_hex(1).as_str()));
        assert_eq!(alice_keys[0].file, None);
        assert_eq!(alice_keys[1].file, Some(PathBuf::from("keys/alice.pub")));
        assert_eq!(alice_keys[1].hex, None);
    }

    #[test]
    fn test_key_source_needs_exactly_one_field() {
        let both = format!(
            "maintainers:\n  - name: alice\n    keys:\n      - hex: \"{}\"\n        file: alice.pub\n  - name: bob\n    keys:\n      - hex: \"{}\"\n",
            key_hex(1),
            key_hex(2)
        );
        let config = DualsigConfig::from_yaml_str(&both).unwrap();
        assert!(matches!(
            config.build_trust_store(Path::new(".")),
            Err(ConfigError::KeySource { maintainer }) if maintainer == "alice"
        ));

        let neither = format!(
            "maintainers:\n  - name: alice\n    keys:\n      - hex: \"{}\"\n  - name: bob\n    keys:\n      - {{}}\n",
            key_hex(1)
        );
        let config = DualsigConfig::from_yaml_str(&neither).unwrap();
        assert!(matches!(
            config.build_trust_store(Path::new(".")),
            Err(ConfigError::KeySource { maintainer }) if maintainer == "bob"
        ));
    }

    #[test]
    fn test_unknown_key_source_field_rejected() {
        let yaml = "maintainers:\n  - name: alice\n    keys:\n      - pem: alice.pem\n";
        assert!(matches!(
            DualsigConfig::from_yaml_str(yaml),
            Err(ConfigError::Parse { .. })
        ));
    }

    #[test]
    fn test_explicit_path_wins_discovery() {
        let path = discover_config(Some(Path::new("/etc/dualsig/custom.yaml"))).unwrap();
        assert_eq!(path, PathBuf::from("/etc/dualsig/custom.yaml"));
    }
}
