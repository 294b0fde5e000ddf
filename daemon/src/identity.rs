//! Consumer signing identity loading.

use anyhow::{bail, Context};
use relaymesh_crypto::{generate_keypair, keypair_from_seed};
use relaymesh_dispatch::ConsumerConfig;
use relaymesh_types::KeyPair;

/// Load the consumer's signing identity from the configured key file.
///
/// A missing identity is a fatal configuration error: the consumer cannot
/// submit conflict reports without one, and running degraded would silently
/// disable dispute detection. The only exception is an explicitly allowed
/// ephemeral key for development.
pub fn load_identity(config: &ConsumerConfig) -> anyhow::Result<KeyPair> {
    match &config.key_file {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading key file {}", path.display()))?;
            let bytes = hex::decode(text.trim()).context("key file is not valid hex")?;
            let seed: [u8; 32] = bytes
                .as_slice()
                .try_into()
                .map_err(|_| anyhow::anyhow!("key file must hold a 32-byte hex seed"))?;
            Ok(keypair_from_seed(&seed))
        }
        None if config.allow_ephemeral_key => {
            tracing::warn!("no key file configured, generating an ephemeral identity");
            Ok(generate_keypair())
        }
        None => bail!(
            "no signing identity available: set key_file in the config \
             or pass --allow-ephemeral-key for development"
        ),
    }
}
