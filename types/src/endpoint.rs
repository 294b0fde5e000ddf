//! Endpoint identity — one logical chain + API surface served by the consumer.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of API surface a provider answers for an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiInterface {
    /// JSON-RPC over HTTP (Ethereum-style chains).
    JsonRpc,
    /// REST query endpoints (Cosmos-SDK chains).
    Rest,
    /// gRPC query services.
    Grpc,
    /// Tendermint RPC.
    Tendermint,
}

impl ApiInterface {
    /// Stable lowercase name, used in endpoint keys and log fields.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JsonRpc => "jsonrpc",
            Self::Rest => "rest",
            Self::Grpc => "grpc",
            Self::Tendermint => "tendermint",
        }
    }
}

impl fmt::Display for ApiInterface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies one logical chain + API surface the consumer serves.
///
/// Immutable after creation. Keys the session pool and finalization tracker:
/// the consumer context holds at most one of each per endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    /// Chain identifier, e.g. `"ETH1"` or `"COS3"`.
    pub chain_id: String,
    /// Which API surface of that chain this endpoint serves.
    pub api_interface: ApiInterface,
}

impl Endpoint {
    pub fn new(chain_id: impl Into<String>, api_interface: ApiInterface) -> Self {
        Self {
            chain_id: chain_id.into(),
            api_interface,
        }
    }

    /// Canonical string key, `"<chain_id>/<interface>"`.
    pub fn key(&self) -> String {
        format!("{}/{}", self.chain_id, self.api_interface)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chain_id, self.api_interface)
    }
}
