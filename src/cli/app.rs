use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// dualsig: two-maintainer verification for release binaries
#[derive(Parser)]
#[command(name = "dualsig")]
#[command(version)]
#[command(about = "Two-maintainer verification for release binaries")]
#[command(
    long_about = "dualsig accepts a downloaded binary only if two different maintainers signed the release manifest and the manifest, the DNS-published hash and the binary itself all agree."
)]
pub struct Cli {
    /// Configuration file (default: $DUALSIG_CONFIG, ./dualsig.yaml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Log level written to stderr
    #[arg(long, global = true, value_enum, default_value = "warn")]
    pub log_level: LogLevel,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Verify a downloaded binary against the signed release manifest
    Verify {
        /// Downloaded binary
        #[arg(long)]
        file: PathBuf,

        /// Hash published in DNS, hex encoded
        #[arg(long)]
        dns_hash: String,

        /// Name to look up in the manifest (default: the file's name)
        #[arg(long)]
        filename: Option<String>,

        /// Manifest URL or path (default: release.manifest_url from config)
        #[arg(long)]
        manifest: Option<String>,

        /// Detached signature URL or path (default: release.signature_url from config)
        #[arg(long)]
        signature: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Check the signed manifest hash for a file without downloading it
    Check {
        /// Name to look up in the manifest
        #[arg(long)]
        filename: String,

        /// Hash published in DNS, hex encoded
        #[arg(long)]
        dns_hash: String,

        /// Manifest URL or path (default: release.manifest_url from config)
        #[arg(long)]
        manifest: Option<String>,

        /// Detached signature URL or path (default: release.signature_url from config)
        #[arg(long)]
        signature: Option<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the SHA-256 of a file in manifest format
    Hash {
        /// File to hash
        file: PathBuf,
    },

    /// List trusted maintainers and key fingerprints
    Keys {
        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_filter_directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}
