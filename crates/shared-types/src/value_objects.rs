//! # Value Objects
//!
//! Immutable primitives shared by every shard component. These types are
//! defined by their value, not identity.

use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;

// Re-export U256 from primitive-types for 256-bit arithmetic
pub use primitive_types::{U256, U512};

/// Shard identifier. Shard 0 is the main shard.
pub type ShardId = u16;

/// Sequential block number within one shard.
pub type BlockNumber = u64;

/// The main (master) shard.
pub const MAIN_SHARD_ID: ShardId = 0;

// =============================================================================
// HASH (32 bytes)
// =============================================================================

/// A 32-byte Keccak-256 hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Hash(pub [u8; 32]);

impl Hash {
    /// The zero hash.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Keccak-256 of arbitrary bytes.
    #[must_use]
    pub fn keccak(data: &[u8]) -> Self {
        let digest = Keccak256::digest(data);
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Creates a hash from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 32]>::try_from(slice).ok().map(Self)
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns true if this is the zero hash.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Debug for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}..{}", hex::encode(&self.0[..4]), hex::encode(&self.0[30..]))
    }
}

// =============================================================================
// ADDRESS (20 bytes, shard-qualified)
// =============================================================================

/// A 20-byte shard-qualified address.
///
/// The first two bytes carry the owning shard id (big-endian); the remaining
/// eighteen come from the account's content hash.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address (0x0000...0000).
    pub const ZERO: Self = Self([0u8; 20]);

    /// Creates an address from a 20-byte array.
    #[must_use]
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// Creates an address from a slice. Returns None if wrong length.
    #[must_use]
    pub fn from_slice(slice: &[u8]) -> Option<Self> {
        <[u8; 20]>::try_from(slice).ok().map(Self)
    }

    /// Content-addressed deployment target for `code` on `shard_id`.
    ///
    /// The same code deployed to the same shard always lands on the same
    /// address, which is what deploy validation checks `Message.to` against.
    #[must_use]
    pub fn create(shard_id: ShardId, code: &[u8]) -> Self {
        let hash = Hash::keccak(code);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&hash.0[12..]);
        bytes[..2].copy_from_slice(&shard_id.to_be_bytes());
        Self(bytes)
    }

    /// Builds an address on `shard_id` from 18 bytes of account payload.
    #[must_use]
    pub fn on_shard(shard_id: ShardId, payload: [u8; 18]) -> Self {
        let mut bytes = [0u8; 20];
        bytes[..2].copy_from_slice(&shard_id.to_be_bytes());
        bytes[2..].copy_from_slice(&payload);
        Self(bytes)
    }

    /// The shard this address lives on.
    #[must_use]
    pub fn shard_id(&self) -> ShardId {
        u16::from_be_bytes([self.0[0], self.0[1]])
    }

    /// Returns the underlying bytes.
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Returns true if this is the zero address.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}...{}", hex::encode(&self.0[..4]), hex::encode(&self.0[18..]))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl std::str::FromStr for Address {
    type Err = hex::FromHexError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 20];
        hex::decode_to_slice(s.trim_start_matches("0x"), &mut bytes)?;
        Ok(Self(bytes))
    }
}

/// The system wallet: the only sender allowed to deploy onto the main shard.
pub const MAIN_WALLET_ADDRESS: Address = Address([
    0x00, 0x00, 0x1f, 0x3d, 0x4b, 0x2a, 0x90, 0x11, 0x5c, 0x7e, 0x3a, 0x82, 0x6d, 0x44, 0x0b,
    0xe1, 0xc9, 0x05, 0x77, 0x3b,
]);

// =============================================================================
// GAS
// =============================================================================

/// Amount of gas units.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Gas(pub u64);

impl Gas {
    /// Zero gas.
    pub const ZERO: Self = Self(0);

    /// Price of this much gas at `price` per unit.
    ///
    /// The product is taken at 512 bits and narrowed back to 256; `None`
    /// means it does not fit.
    #[must_use]
    pub fn to_value(self, price: U256) -> Option<U256> {
        let full: U512 = U256::from(self.0).full_mul(price);
        U256::try_from(full).ok()
    }

    /// Saturating subtraction.
    #[must_use]
    pub fn saturating_sub(self, other: Gas) -> Gas {
        Gas(self.0.saturating_sub(other.0))
    }

    /// Saturating addition.
    #[must_use]
    pub fn saturating_add(self, other: Gas) -> Gas {
        Gas(self.0.saturating_add(other.0))
    }
}

impl fmt::Debug for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}gas", self.0)
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Gas {
    fn from(value: u64) -> Self {
        Self(value)
    }
}
