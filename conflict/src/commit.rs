//! The commit-reveal binding.
//!
//! A committed vote is `SHA-256( LE64(nonce) ‖ dataHash )`: the voter's
//! secret nonce encoded as 8 little-endian bytes, concatenated with the raw
//! bytes of the chosen data hash. Nothing about the choice leaks during the
//! commit window, yet any observer can verify after the reveal that no voter
//! changed their mind in between. The byte layout is wire-frozen.

use relaymesh_crypto::sha256_multi;
use relaymesh_types::DataHash;

/// Compute the commitment for a vote on `data_hash` with the given nonce.
pub fn commit_vote_data(nonce: u64, data_hash: &DataHash) -> [u8; 32] {
    sha256_multi(&[&nonce.to_le_bytes(), data_hash.as_bytes()])
}

/// Whether a revealed `(nonce, data_hash)` pair reproduces `commitment`.
pub fn reveal_matches(nonce: u64, data_hash: &DataHash, commitment: &[u8; 32]) -> bool {
    commit_vote_data(nonce, data_hash) == *commitment
}
