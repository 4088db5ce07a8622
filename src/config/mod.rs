//! Configuration: maintainer keys and release locations
//!
//! The config file is read once at startup; the trust store built from it is
//! immutable afterwards.

pub mod loader;
pub mod types;

pub use loader::{discover_config, load_config, ConfigError, LoadedConfig, CONFIG_ENV, CONFIG_FILE_NAME};
pub use types::{DualsigConfig, KeySource, MaintainerConfig, ManifestConfig, ReleaseConfig};
