//! Finalized-block markers asserted by providers.

use crate::hash::BlockHash;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A provider's claim of which block height/hash is finalized.
///
/// Carried on every relay response and compared across providers to detect
/// consensus disagreement independent of payload content.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FinalizationMarker {
    pub height: u64,
    pub block_hash: BlockHash,
}

impl FinalizationMarker {
    pub fn new(height: u64, block_hash: BlockHash) -> Self {
        Self { height, block_hash }
    }
}

impl fmt::Display for FinalizationMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}@{}", self.height, self.block_hash)
    }
}
