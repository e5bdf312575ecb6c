//! # Propagation Errors

use shared_bus::{NetworkError, SubscriptionError};
use shared_types::CodecError;
use thiserror::Error;

/// Errors raised while publishing or listening for blocks.
#[derive(Debug, Error)]
pub enum PropagationError {
    /// The transport failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The subscription closed.
    #[error("subscription error: {0}")]
    Subscription(#[from] SubscriptionError),

    /// A block could not be encoded.
    #[error("block encoding failed: {0}")]
    Codec(#[from] CodecError),
}
