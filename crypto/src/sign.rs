//! Ed25519 message signing, verification, and the relay-proof layout.

use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use relaymesh_types::{BlockHash, DataHash, PrivateKey, PublicKey, Signature};

/// Sign a message with a private key, returning the signature.
pub fn sign_message(message: &[u8], private_key: &PrivateKey) -> Signature {
    let signing_key = SigningKey::from_bytes(&private_key.0);
    let sig = signing_key.sign(message);
    Signature(sig.to_bytes())
}

/// Verify a signature against a message and public key.
///
/// Returns `true` if the signature is valid, `false` otherwise.
pub fn verify_signature(message: &[u8], signature: &Signature, public_key: &PublicKey) -> bool {
    let Ok(verifying_key) = VerifyingKey::from_bytes(&public_key.0) else {
        return false;
    };
    let dalek_sig = ed25519_dalek::Signature::from_bytes(&signature.0);
    verifying_key.verify(message, &dalek_sig).is_ok()
}

/// Build the byte string a provider signs as its relay proof:
/// `data_hash ‖ LE64(height) ‖ block_hash`.
///
/// Binding the finalization marker into the proof means a provider cannot
/// later claim a different finalized block for the same payload.
pub fn relay_proof_message(data_hash: &DataHash, height: u64, block_hash: &BlockHash) -> Vec<u8> {
    let mut msg = Vec::with_capacity(32 + 8 + 32);
    msg.extend_from_slice(data_hash.as_bytes());
    msg.extend_from_slice(&height.to_le_bytes());
    msg.extend_from_slice(block_hash.as_bytes());
    msg
}
