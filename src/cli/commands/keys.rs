use async_trait::async_trait;
use serde::Serialize;
use std::path::PathBuf;

use super::{load_runtime, CommandHandler};
use crate::cli::app::OutputFormat;
use crate::trust::TrustStore;
use crate::Result;

/// Lists the maintainers the loaded configuration trusts
pub struct KeysCommand {
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

#[derive(Debug, Serialize, PartialEq)]
struct MaintainerListing {
    name: String,
    fingerprints: Vec<String>,
}

fn listings(store: &TrustStore) -> Vec<MaintainerListing> {
    store
        .identities()
        .iter()
        .map(|identity| MaintainerListing {
            name: identity.name().to_string(),
            fingerprints: identity.keys().iter().map(|key| key.fingerprint()).collect(),
        })
        .collect()
}

#[async_trait]
impl CommandHandler for KeysCommand {
    async fn execute(&self) -> Result<()> {
        let loaded = load_runtime(self.config.as_deref())?;
        let listings = listings(&loaded.store);

        match self.format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listings)?),
            OutputFormat::Text => {
                println!("Trusted maintainers ({}):", loaded.path.display());
                for listing in &listings {
                    println!("  {}", listing.name);
                    for fingerprint in &listing.fingerprints {
                        println!("    {fingerprint}");
                    }
                }
            }
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "keys"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trust::{MaintainerIdentity, PublicKey};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_listings_follow_store_order() {
        let alice = PublicKey::new(vec![1; 32]);
        let bob = PublicKey::new(vec![2; 32]);
        let store = TrustStore::new(vec![
            MaintainerIdentity::new("alice", vec![alice.clone()]),
            MaintainerIdentity::new("bob", vec![bob.clone()]),
        ])
        .unwrap();

        assert_eq!(
            listings(&store),
            vec![
                MaintainerListing {
                    name: "alice".to_string(),
                    fingerprints: vec![alice.fingerprint()],
                },
                MaintainerListing {
                    name: "bob".to_string(),
                    fingerprints: vec![bob.fingerprint()],
                },
            ]
        );
    }
}
