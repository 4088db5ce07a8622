//! Retrieval of the signed manifest and its detached signature
//!
//! Fetching happens before verification starts; the verifier itself never
//! touches the network. Both artifacts are fetched concurrently and the
//! first failure is returned unchanged.

use async_trait::async_trait;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default cap on a downloaded manifest or signature
pub const DEFAULT_MAX_BYTES: usize = 4 * 1024 * 1024;

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors raised while retrieving release artifacts
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("failed to build HTTP client")]
    Client(#[source] reqwest::Error),

    #[error("request to {url} failed")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{location} exceeds the {limit} byte limit")]
    TooLarge { location: String, limit: usize },

    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("no artifact available at {0}")]
    NotFound(String),
}

/// Source of raw release artifact bytes
#[async_trait]
pub trait ManifestFetcher: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError>;
}

/// The two artifacts a verification needs
#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseArtifacts {
    /// Armored signed manifest, exactly as served
    pub manifest: Vec<u8>,
    /// Detached signature over the armored manifest bytes
    pub signature: Vec<u8>,
}

/// Fetch manifest and signature concurrently
pub async fn fetch_release(
    fetcher: &dyn ManifestFetcher,
    manifest_location: &str,
    signature_location: &str,
) -> Result<ReleaseArtifacts, FetchError> {
    debug!(
        "Fetching release manifest {} and signature {}",
        manifest_location, signature_location
    );
    let (manifest, signature) = tokio::try_join!(
        fetcher.fetch(manifest_location),
        fetcher.fetch(signature_location)
    )?;

    Ok(ReleaseArtifacts {
        manifest,
        signature,
    })
}

/// HTTP(S) fetcher with a timeout and a response size cap
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_bytes: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;
        Ok(HttpFetcher { client, max_bytes })
    }
}

#[async_trait]
impl ManifestFetcher for HttpFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let http_err = |source| FetchError::Http {
            url: location.to_string(),
            source,
        };
        let too_large = || FetchError::TooLarge {
            location: location.to_string(),
            limit: self.max_bytes,
        };

        let mut response = self.client.get(location).send().await.map_err(http_err)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: location.to_string(),
                status: status.as_u16(),
            });
        }

        if response
            .content_length()
            .is_some_and(|len| len > self.max_bytes as u64)
        {
            return Err(too_large());
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(http_err)? {
            if body.len() + chunk.len() > self.max_bytes {
                return Err(too_large());
            }
            body.extend_from_slice(&chunk);
        }

        debug!("Fetched {} bytes from {}", body.len(), location);
        Ok(body)
    }
}

/// Reads artifacts from the local filesystem
#[derive(Debug, Clone)]
pub struct FileFetcher {
    max_bytes: usize,
}

impl FileFetcher {
    pub fn new(max_bytes: usize) -> Self {
        FileFetcher { max_bytes }
    }
}

impl Default for FileFetcher {
    fn default() -> Self {
        FileFetcher::new(DEFAULT_MAX_BYTES)
    }
}

#[async_trait]
impl ManifestFetcher for FileFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        let path = location.strip_prefix("file://").unwrap_or(location);
        let io_err = |source| FetchError::Io {
            path: path.to_string(),
            source,
        };

        let metadata = tokio::fs::metadata(Path::new(path)).await.map_err(io_err)?;
        if metadata.len() > self.max_bytes as u64 {
            return Err(FetchError::TooLarge {
                location: location.to_string(),
                limit: self.max_bytes,
            });
        }

        tokio::fs::read(path).await.map_err(io_err)
    }
}

/// Dispatches on the location scheme: http(s) URLs go to HTTP, everything else is a path
#[derive(Clone)]
pub struct LocationFetcher {
    http: HttpFetcher,
    file: FileFetcher,
}

impl LocationFetcher {
    pub fn new(timeout: Duration, max_bytes: usize) -> Result<Self, FetchError> {
        Ok(LocationFetcher {
            http: HttpFetcher::new(timeout, max_bytes)?,
            file: FileFetcher::new(max_bytes),
        })
    }
}

#[async_trait]
impl ManifestFetcher for LocationFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        if is_remote(location) {
            self.http.fetch(location).await
        } else {
            self.file.fetch(location).await
        }
    }
}

/// In-memory artifacts keyed by location, for embedding and tests
#[derive(Debug, Clone, Default)]
pub struct StaticFetcher {
    artifacts: HashMap<String, Vec<u8>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, location: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.artifacts.insert(location.into(), bytes.into());
        self
    }
}

#[async_trait]
impl ManifestFetcher for StaticFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<u8>, FetchError> {
        self.artifacts
            .get(location)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(location.to_string()))
    }
}

pub fn is_remote(location: &str) -> bool {
    location.starts_with("https://") || location.starts_with("http://")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_fetcher_reads_bytes() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("hashes.txt");
        std::fs::write(&path, b"abcd1234  app.zip\n")?;

        let bytes = FileFetcher::default().fetch(path.to_str().unwrap()).await?;
        assert_eq!(bytes, b"abcd1234  app.zip\n");

        let url = format!("file://{}", path.display());
        let bytes = FileFetcher::default().fetch(&url).await?;
        assert_eq!(bytes, b"abcd1234  app.zip\n");
        Ok(())
    }

    #[tokio::test]
    async fn test_file_fetcher_enforces_limit() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("big.sig");
        std::fs::write(&path, vec![0u8; 128])?;

        let result = FileFetcher::new(64).fetch(path.to_str().unwrap()).await;
        assert!(matches!(result, Err(FetchError::TooLarge { limit: 64, .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_file_fetcher_missing_file() {
        let result = FileFetcher::default().fetch("/nonexistent/dualsig/hashes.txt").await;
        assert!(matches!(result, Err(FetchError::Io { .. })));
    }

    #[tokio::test]
    async fn test_fetch_release_pairs_artifacts() -> anyhow::Result<()> {
        let fetcher = StaticFetcher::new()
            .with("hashes.txt", b"manifest".to_vec())
            .with("hashes.txt.sig", b"signature".to_vec());

        let artifacts = fetch_release(&fetcher, "hashes.txt", "hashes.txt.sig").await?;
        assert_eq!(artifacts.manifest, b"manifest");
        assert_eq!(artifacts.signature, b"signature");
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_release_propagates_failure() {
        let fetcher = StaticFetcher::new().with("hashes.txt", b"manifest".to_vec());

        let result = fetch_release(&fetcher, "hashes.txt", "hashes.txt.sig").await;
        assert!(matches!(result, Err(FetchError::NotFound(loc)) if loc == "hashes.txt.sig"));
    }

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/hashes.txt"));
        assert!(is_remote("http://example.org/hashes.txt"));
        assert!(!is_remote("file:///tmp/hashes.txt"));
        assert!(!is_remote("./hashes.txt"));
    }
}
