//! # Message Authorization
//!
//! HMAC-SHA256 authorization proofs for external messages.
//!
//! A contract's code doubles as its verification key: a message is
//! authorized for a contract when its signature is the HMAC of the message
//! hash under that code. This is what the storage-backed execution state
//! checks when asked to verify an external message.

use crate::entities::Message;
use crate::value_objects::Hash;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the authorization proof for `msg_hash` under `key`.
#[must_use]
pub fn authorization_proof(key: &[u8], msg_hash: &Hash) -> Vec<u8> {
    // HMAC accepts keys of any length.
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return Vec::new();
    };
    mac.update(msg_hash.as_bytes());
    mac.finalize().into_bytes().to_vec()
}

/// Checks `proof` against `msg_hash` under `key` in constant time.
#[must_use]
pub fn verify_authorization(key: &[u8], msg_hash: &Hash, proof: &[u8]) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(key) else {
        return false;
    };
    mac.update(msg_hash.as_bytes());
    mac.verify_slice(proof).is_ok()
}

impl Message {
    /// Signs the message for a contract whose code is `key`.
    pub fn authorize(&mut self, key: &[u8]) {
        self.signature = authorization_proof(key, &self.hash());
    }
}
