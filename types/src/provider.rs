//! Provider identity as delivered by pairing updates.

use crate::keys::PublicKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A provider's stable on-chain address.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProviderAddress(String);

impl ProviderAddress {
    pub fn new(addr: impl Into<String>) -> Self {
        Self(addr.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProviderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProviderAddress({})", self.0)
    }
}

impl fmt::Display for ProviderAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A remote counterparty offering to answer queries for an endpoint.
///
/// Providers are created and replaced only by pairing updates pushed from the
/// chain-state layer; the dispatcher never invents one ad hoc. The stake
/// weight doubles as the provider's voting weight in finalization consensus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provider {
    /// Stable on-chain address, unique within an endpoint's pairing.
    pub address: ProviderAddress,
    /// Network location the consumer relays queries to.
    pub url: String,
    /// Key the provider signs relay responses with.
    pub public_key: PublicKey,
    /// Stake backing this provider, from the pairing list.
    pub stake_weight: u128,
}

impl Provider {
    pub fn new(
        address: ProviderAddress,
        url: impl Into<String>,
        public_key: PublicKey,
        stake_weight: u128,
    ) -> Self {
        Self {
            address,
            url: url.into(),
            public_key,
            stake_weight,
        }
    }
}
