//! Cryptographic primitives for relaymesh.
//!
//! - **Ed25519** for relay-proof signing and verification
//! - **SHA-256** for response payload hashing and dispute vote commitments
//!   (the dispute wire format pins SHA-256, so it is used throughout)

pub mod hash;
pub mod keys;
pub mod sign;

pub use hash::{hash_payload, sha256, sha256_multi};
pub use keys::{generate_keypair, keypair_from_private, keypair_from_seed, public_from_private};
pub use sign::{relay_proof_message, sign_message, verify_signature};
