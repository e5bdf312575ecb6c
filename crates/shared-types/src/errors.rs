//! # Error Types
//!
//! Errors shared by every crate that encodes domain entities.

use thiserror::Error;

/// Encoding or decoding of an entity failed.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The bytes are not a valid bincode encoding of the entity.
    #[error("bincode: {0}")]
    Bincode(#[from] bincode::Error),
}
