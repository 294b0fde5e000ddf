//! Relay responses as recorded by the dispatcher.

use crate::finalization::FinalizationMarker;
use crate::hash::DataHash;
use crate::keys::Signature;
use crate::provider::ProviderAddress;
use serde::{Deserialize, Serialize};

/// The result of one provider call, immutable once recorded.
///
/// The signature is the relay proof: it binds the provider to exactly this
/// payload and finalization claim, and is what a conflict report submits as
/// evidence. See `relaymesh_crypto::relay_proof_message` for the signed
/// byte layout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderResponse {
    /// Who answered.
    pub provider: ProviderAddress,
    /// Raw payload bytes, opaque to the consumer.
    pub payload: Vec<u8>,
    /// SHA-256 of the payload.
    pub data_hash: DataHash,
    /// The finalized block the provider asserted alongside the payload.
    pub finalized: FinalizationMarker,
    /// Relay proof binding the provider to this exact response.
    pub signature: Signature,
    /// Round-trip latency in milliseconds, for health scoring.
    pub latency_ms: u64,
}
