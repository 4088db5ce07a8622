use async_trait::async_trait;
use std::path::PathBuf;

use super::CommandHandler;
use crate::trust::digest::sha256_file;
use crate::Result;

/// Prints `<sha256>  <filename>`, the checksum-first manifest layout
pub struct HashCommand {
    pub file: PathBuf,
}

#[async_trait]
impl CommandHandler for HashCommand {
    async fn execute(&self) -> Result<()> {
        let path = self.file.clone();
        let digest = tokio::task::spawn_blocking(move || sha256_file(&path))
            .await
            .map_err(|e| crate::DualsigError::Cli(format!("hashing task failed: {e}")))??;

        let name = self
            .file
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.file.display().to_string());
        println!("{digest}  {name}");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "hash"
    }
}
