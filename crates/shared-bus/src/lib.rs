//! # Shared Bus - Topic-Scoped Network Transport
//!
//! The narrow publish/subscribe surface shard components use to talk to
//! peers. Topics are plain strings; block distribution uses one topic per
//! shard (`shard/<id>/blocks`).
//!
//! ```text
//! ┌──────────────┐                    ┌──────────────┐
//! │ Publisher    │    publish()       │ Listener     │
//! │ (shard N)    │ ──────┐            │ (shard N)    │
//! └──────────────┘       │            └──────────────┘
//!                        ▼                    ↑
//!                  ┌──────────────┐          │
//!                  │   Network    │          │
//!                  │   Manager    │ ─────────┘
//!                  └──────────────┘  subscribe()
//! ```
//!
//! `InMemoryNetwork` serves single-process deployments and tests; a P2P
//! transport implements the same `NetworkManager` trait.

#![allow(clippy::missing_const_for_fn)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod publisher;
pub mod subscriber;
pub mod topics;

pub use publisher::{InMemoryNetwork, NetworkError, NetworkManager};
pub use subscriber::{Subscription, SubscriptionError};
pub use topics::Topic;

/// Maximum payloads buffered per topic before slow subscribers lag.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
