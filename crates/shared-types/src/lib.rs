//! # Shared Types Crate
//!
//! Domain entities shared by every shard component.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: messages, receipts, blocks and proposals are
//!   defined once here and passed between the execution, collation, replay
//!   and propagation crates unchanged.
//! - **Shard-Qualified Addresses**: every `Address` names its shard, so
//!   routing never needs a side table.
//! - **Content Identity**: messages and blocks are identified by the
//!   Keccak-256 hash of their encoding.

pub mod entities;
pub mod errors;
pub mod security;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use security::{authorization_proof, verify_authorization};
pub use value_objects::*;
