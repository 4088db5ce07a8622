//! dualsig
//!
//! Verifies a downloaded release binary before installation:
//! - two signatures over the release manifest, from two different maintainers
//! - the manifest hash agrees with the DNS-published hash
//! - the downloaded bytes hash to the manifest value

pub mod cli;
pub mod config;
pub mod error;
pub mod fetch;
pub mod trust;

pub use error::{DualsigError, Result};
pub use trust::{Signer, TrustStore, UpdateVerifier, VerifyError};
