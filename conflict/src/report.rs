//! Conflict reports — the evidence the consumer submits to the network.

use relaymesh_crypto::sha256_multi;
use relaymesh_types::{Endpoint, ProviderResponse};
use serde::{Deserialize, Serialize};

/// What kind of disagreement the report documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// Payload content hashes differ for the same query.
    Response,
    /// Finalized-block markers diverge (payloads may agree).
    Finalization,
    /// One provider contradicted its own earlier finalization assertion.
    SameProvider,
}

impl ConflictKind {
    fn tag(&self) -> u8 {
        match self {
            Self::Response => 0,
            Self::Finalization => 1,
            Self::SameProvider => 2,
        }
    }
}

/// Two signed responses that cannot both be honest, bound to an endpoint.
///
/// Append-only once created: the report is the immutable evidence a vote is
/// adjudicated against. Each response carries its relay proof, so any voter
/// can check that both providers really produced what the report claims.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictReport {
    pub endpoint: Endpoint,
    pub kind: ConflictKind,
    pub first: ProviderResponse,
    pub second: ProviderResponse,
}

impl ConflictReport {
    pub fn new(
        endpoint: Endpoint,
        kind: ConflictKind,
        first: ProviderResponse,
        second: ProviderResponse,
    ) -> Self {
        Self {
            endpoint,
            kind,
            first,
            second,
        }
    }

    /// Deterministic identity for deduplication and vote keying.
    ///
    /// Order-normalized over the two responses, so reporting (A, B) and
    /// (B, A) for the same disagreement produces the same id. Detecting the
    /// same disagreement twice must not open a second vote.
    pub fn report_id(&self) -> [u8; 32] {
        let a = (
            self.first.provider.as_str().as_bytes(),
            self.first.data_hash.as_bytes(),
            self.first.finalized.height,
        );
        let b = (
            self.second.provider.as_str().as_bytes(),
            self.second.data_hash.as_bytes(),
            self.second.finalized.height,
        );
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };

        let endpoint_key = self.endpoint.key();
        sha256_multi(&[
            endpoint_key.as_bytes(),
            &[self.kind.tag()],
            lo.0,
            lo.1,
            &lo.2.to_le_bytes(),
            hi.0,
            hi.1,
            &hi.2.to_le_bytes(),
        ])
    }

    /// Hex form of the report id, used as the vote key and in log fields.
    pub fn id_hex(&self) -> String {
        hex::encode(self.report_id())
    }
}
