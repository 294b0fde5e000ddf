//! Relay transport — how one provider call leaves the process.
//!
//! The per-chain request/response encoding is an external concern; the
//! transport moves opaque query bytes to a provider and brings back the
//! signed relay envelope.

use relaymesh_types::{BlockHash, Endpoint, Provider, RelayError, Signature};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Duration;

/// One client query addressed to an endpoint.
#[derive(Clone, Debug)]
pub struct RelayRequest {
    pub endpoint: Endpoint,
    /// Opaque query bytes; encoding belongs to the chain-API layer.
    pub query: Vec<u8>,
}

/// What a provider returns on the wire: the payload plus the signed
/// finalization claim. The signature covers
/// `sha256(payload) ‖ LE64(height) ‖ block_hash`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelayEnvelope {
    pub payload: Vec<u8>,
    pub finalized_height: u64,
    pub finalized_hash: BlockHash,
    pub signature: Signature,
}

/// Issues one provider call. Implementations must be cheap to share across
/// the dispatcher's fan-out tasks.
pub trait RelayTransport: Send + Sync + 'static {
    fn relay(
        &self,
        provider: &Provider,
        request: &RelayRequest,
    ) -> impl Future<Output = Result<RelayEnvelope, RelayError>> + Send;
}

/// HTTP transport: POSTs the query bytes to the provider's relay URL and
/// decodes the JSON envelope.
pub struct HttpRelayTransport {
    client: reqwest::Client,
}

impl HttpRelayTransport {
    pub fn new(connect_timeout: Duration) -> Result<Self, RelayError> {
        let client = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()
            .map_err(|e| RelayError::Transport(e.to_string()))?;
        Ok(Self { client })
    }
}

impl RelayTransport for HttpRelayTransport {
    async fn relay(
        &self,
        provider: &Provider,
        request: &RelayRequest,
    ) -> Result<RelayEnvelope, RelayError> {
        let url = format!("{}/relay", provider.url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("x-relay-chain-id", &request.endpoint.chain_id)
            .header("x-relay-api-interface", request.endpoint.api_interface.as_str())
            .body(request.query.clone())
            .send()
            .await
            .map_err(|e| RelayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RelayError::Transport(format!(
                "provider returned status {}",
                response.status()
            )));
        }
        response
            .json::<RelayEnvelope>()
            .await
            .map_err(|e| RelayError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serde_roundtrip() {
        let envelope = RelayEnvelope {
            payload: b"{\"result\":\"0x1\"}".to_vec(),
            finalized_height: 42,
            finalized_hash: BlockHash::new([3u8; 32]),
            signature: Signature([9u8; 64]),
        };
        let json = serde_json::to_vec(&envelope).unwrap();
        let decoded: RelayEnvelope = serde_json::from_slice(&json).unwrap();
        assert_eq!(decoded.payload, envelope.payload);
        assert_eq!(decoded.finalized_height, 42);
        assert_eq!(decoded.finalized_hash, envelope.finalized_hash);
        assert_eq!(decoded.signature, envelope.signature);
    }
}
